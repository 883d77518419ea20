use log::warn;

use crate::error::{Error, LinkFailure, Result};
use crate::generator::config::formats::{is_obfs_plugin, parse_plugin_opts, EffectiveFlags};
use crate::generator::config::remark::unique_remarks;
use crate::generator::document::{to_ini, Node};
use crate::generator::Generator;
use crate::models::{GenerateOptions, Proxy, ProxyType};

/// Built-in policies and group names proxies may not take.
const RESERVED_NAMES: &[&str] = &["DIRECT", "REJECT", "PROXY"];

const BASELINE_RULES: &[&str] = &["DOMAIN-SUFFIX,local,DIRECT", "GEOIP,CN,DIRECT", "FINAL,PROXY"];

#[derive(Debug, Default, Clone, Copy)]
pub struct SurgeGenerator;

impl Generator for SurgeGenerator {
    fn target_name(&self) -> &'static str {
        "surge"
    }

    fn output_format(&self) -> &'static str {
        "conf"
    }

    fn supports(&self, proxy_type: ProxyType) -> bool {
        matches!(
            proxy_type,
            ProxyType::Shadowsocks
                | ProxyType::VMess
                | ProxyType::Trojan
                | ProxyType::HTTP
                | ProxyType::HTTPS
                | ProxyType::Socks5
        )
    }

    fn generate(&self, proxies: &[Proxy], options: &GenerateOptions) -> Result<Vec<u8>> {
        let names = unique_remarks(proxies, false, true, RESERVED_NAMES);

        let mut proxy_section = Node::mapping().with("DIRECT", Node::str("direct"));
        let mut converted = 0;
        let mut failures = Vec::new();
        for (proxy, name) in proxies.iter().zip(names) {
            match proxy_to_surge(proxy, options) {
                Ok(line) => {
                    proxy_section.insert(&name, line);
                    converted += 1;
                }
                Err(error) => {
                    warn!("Skipping proxy '{}' for Surge: {}", name, error);
                    failures.push(LinkFailure { link: name, error });
                }
            }
        }
        if converted == 0 {
            return Err(Error::EmptyResult {
                context: "no proxies could be converted for target 'surge'".to_string(),
                failures,
            });
        }

        let mut doc = Node::mapping()
            .with("General", Node::mapping().with("loglevel", Node::str("notify")))
            .with("Proxy", proxy_section)
            .with(
                "Proxy Group",
                Node::mapping().with("PROXY", Node::str_list(["select", "DIRECT"])),
            );
        if options.emit_rules {
            doc.insert("Rule", Node::str_list(BASELINE_RULES.iter().copied()));
        }

        Ok(to_ini(&doc)?.into_bytes())
    }
}

/// Right-hand side of a `[Proxy]` line: `type, host, port, key=value...`
pub fn proxy_to_surge(proxy: &Proxy, options: &GenerateOptions) -> Result<Node> {
    let flags = EffectiveFlags::resolve(proxy, options);
    let mut items = Vec::new();
    let mut params = Node::mapping();

    let kind = match proxy.proxy_type {
        ProxyType::Shadowsocks => "ss",
        ProxyType::VMess => "vmess",
        ProxyType::Trojan => "trojan",
        ProxyType::HTTP => "http",
        ProxyType::HTTPS => "https",
        ProxyType::Socks5 => "socks5",
        other => {
            return Err(Error::UnsupportedProxyForTarget {
                target: "surge".to_string(),
                proxy_type: other.to_string(),
            })
        }
    };
    items.push(Node::str(kind));
    items.push(Node::str(proxy.hostname.as_str()));
    items.push(Node::int(proxy.port));

    match proxy.proxy_type {
        ProxyType::Shadowsocks => {
            params.insert(
                "encrypt-method",
                Node::str(proxy.encrypt_method.as_deref().unwrap_or_default()),
            );
            params.insert("password", Node::str(proxy.password.as_deref().unwrap_or_default()));
            if let Some(plugin) = proxy.plugin.as_deref().filter(|p| !p.is_empty()) {
                if !is_obfs_plugin(plugin) {
                    return Err(Error::NotSupported {
                        what: format!("Shadowsocks plugin '{}' on Surge", plugin),
                    });
                }
                for (key, value) in
                    parse_plugin_opts(proxy.plugin_option.as_deref().unwrap_or_default())
                {
                    if key == "obfs" || key == "obfs-host" {
                        params.insert(&key, Node::str(value));
                    }
                }
            }
        }
        ProxyType::VMess => {
            params.insert("username", Node::str(proxy.user_id.as_deref().unwrap_or_default()));
            match proxy.transfer_protocol.as_deref().unwrap_or("tcp") {
                "tcp" => {}
                "ws" => {
                    params.insert("ws", Node::bool(true));
                    if let Some(path) = proxy.path.as_deref().filter(|p| !p.is_empty()) {
                        params.insert("ws-path", Node::str(path));
                    }
                    if let Some(host) = proxy.host.as_deref().filter(|h| !h.is_empty()) {
                        params.insert("ws-headers", Node::str(format!("Host:{}", host)));
                    }
                }
                other => {
                    return Err(Error::NotSupported {
                        what: format!("VMess transport '{}' on Surge", other),
                    })
                }
            }
            if proxy.tls_secure {
                params.insert("tls", Node::bool(true));
                if let Some(sni) = proxy.sni.as_deref().filter(|s| !s.is_empty()) {
                    params.insert("sni", Node::str(sni));
                }
            }
            if options.surge.version >= 4 && proxy.alter_id == 0 {
                params.insert("vmess-aead", Node::bool(true));
            }
        }
        ProxyType::Trojan => {
            params.insert("password", Node::str(proxy.password.as_deref().unwrap_or_default()));
            let sni = proxy
                .sni
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(proxy.hostname.as_str());
            params.insert("sni", Node::str(sni));
        }
        _ => {
            // http, https and socks5 take positional credentials
            if let Some(user) = proxy.username.as_deref().filter(|u| !u.is_empty()) {
                items.push(Node::str(user));
                items.push(Node::str(proxy.password.as_deref().unwrap_or_default()));
            }
        }
    }

    if options.surge.version >= 4 {
        if let Some(udp) = flags.udp.as_option() {
            params.insert("udp-relay", Node::bool(udp));
        }
        if let Some(tfo) = flags.tfo.as_option() {
            params.insert("tfo", Node::bool(tfo));
        }
        if let Some(scv) = flags.skip_cert_verify.as_option() {
            params.insert("skip-cert-verify", Node::bool(scv));
        }
    }

    if params != Node::mapping() {
        items.push(params);
    }
    Ok(Node::List(items))
}
