use log::warn;

use crate::error::{Error, LinkFailure, Result};
use crate::generator::config::formats::{is_obfs_plugin, parse_plugin_opts, EffectiveFlags};
use crate::generator::config::remark::unique_remarks;
use crate::generator::document::{to_ini, Node};
use crate::generator::Generator;
use crate::models::{GenerateOptions, Proxy, ProxyType};

/// Policy names used by `[filter_local]`; tags may not take them.
const RESERVED_NAMES: &[&str] = &["direct", "proxy", "reject"];

const BASELINE_FILTERS: &[&str] = &["host-suffix, local, direct", "geoip, cn, direct", "final, proxy"];

#[derive(Debug, Default, Clone, Copy)]
pub struct QuantumultXGenerator;

impl Generator for QuantumultXGenerator {
    fn target_name(&self) -> &'static str {
        "quanx"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["quantumultx"]
    }

    fn output_format(&self) -> &'static str {
        "conf"
    }

    fn supports(&self, proxy_type: ProxyType) -> bool {
        matches!(
            proxy_type,
            ProxyType::Shadowsocks | ProxyType::VMess | ProxyType::Trojan
        )
    }

    fn generate(&self, proxies: &[Proxy], options: &GenerateOptions) -> Result<Vec<u8>> {
        let names = unique_remarks(proxies, options.quanx.append_type, true, RESERVED_NAMES);

        let mut servers = Vec::with_capacity(proxies.len());
        let mut failures = Vec::new();
        for (proxy, name) in proxies.iter().zip(names) {
            match proxy_to_quanx(proxy, &name, options) {
                Ok(line) => servers.push(line),
                Err(error) => {
                    warn!("Skipping proxy '{}' for QuantumultX: {}", name, error);
                    failures.push(LinkFailure { link: name, error });
                }
            }
        }
        if servers.is_empty() {
            return Err(Error::EmptyResult {
                context: "no proxies could be converted for target 'quanx'".to_string(),
                failures,
            });
        }

        let mut doc = Node::mapping()
            .with("general", Node::mapping())
            .with("server_local", Node::List(servers));
        if options.emit_rules {
            doc.insert("filter_local", Node::str_list(BASELINE_FILTERS.iter().copied()));
        }

        Ok(to_ini(&doc)?.into_bytes())
    }
}

/// One `[server_local]` line as `key=value` pairs ending with `tag`.
pub fn proxy_to_quanx(proxy: &Proxy, name: &str, options: &GenerateOptions) -> Result<Node> {
    let flags = EffectiveFlags::resolve(proxy, options);
    let address = if proxy.hostname.contains(':') {
        format!("[{}]:{}", proxy.hostname, proxy.port)
    } else {
        format!("{}:{}", proxy.hostname, proxy.port)
    };

    let mut line = Node::mapping();
    let mut tls = false;
    match proxy.proxy_type {
        ProxyType::Shadowsocks => {
            line.insert("shadowsocks", Node::str(address));
            line.insert("method", Node::str(proxy.encrypt_method.as_deref().unwrap_or_default()));
            line.insert("password", Node::str(proxy.password.as_deref().unwrap_or_default()));
            if let Some(plugin) = proxy.plugin.as_deref().filter(|p| !p.is_empty()) {
                if !is_obfs_plugin(plugin) {
                    return Err(Error::NotSupported {
                        what: format!("Shadowsocks plugin '{}' on QuantumultX", plugin),
                    });
                }
                for (key, value) in
                    parse_plugin_opts(proxy.plugin_option.as_deref().unwrap_or_default())
                {
                    if key == "obfs" || key == "obfs-host" {
                        line.insert(&key, Node::str(value));
                    }
                }
            }
        }
        ProxyType::VMess => {
            let method = match proxy.encrypt_method.as_deref() {
                None | Some("") | Some("auto") => "chacha20-poly1305",
                Some(method) => method,
            };
            line.insert("vmess", Node::str(address));
            line.insert("method", Node::str(method));
            line.insert("password", Node::str(proxy.user_id.as_deref().unwrap_or_default()));
            match proxy.transfer_protocol.as_deref().unwrap_or("tcp") {
                "tcp" => {
                    if proxy.tls_secure {
                        line.insert("obfs", Node::str("over-tls"));
                    }
                }
                "ws" => {
                    line.insert("obfs", Node::str(if proxy.tls_secure { "wss" } else { "ws" }));
                    if let Some(path) = proxy.path.as_deref().filter(|p| !p.is_empty()) {
                        line.insert("obfs-uri", Node::str(path));
                    }
                }
                other => {
                    return Err(Error::NotSupported {
                        what: format!("VMess transport '{}' on QuantumultX", other),
                    })
                }
            }
            if let Some(host) = proxy
                .host
                .as_deref()
                .or(proxy.sni.as_deref())
                .filter(|h| !h.is_empty())
            {
                line.insert("obfs-host", Node::str(host));
            }
            tls = proxy.tls_secure;
        }
        ProxyType::Trojan => {
            line.insert("trojan", Node::str(address));
            line.insert("password", Node::str(proxy.password.as_deref().unwrap_or_default()));
            line.insert("over-tls", Node::bool(true));
            let sni = proxy
                .sni
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(proxy.hostname.as_str());
            line.insert("tls-host", Node::str(sni));
            tls = true;
        }
        other => {
            return Err(Error::UnsupportedProxyForTarget {
                target: "quanx".to_string(),
                proxy_type: other.to_string(),
            })
        }
    }

    if tls {
        if let Some(scv) = flags.skip_cert_verify.as_option() {
            line.insert("tls-verification", Node::bool(!scv));
        }
        if let Some(tls13) = flags.tls13.as_option() {
            line.insert("tls13", Node::bool(tls13));
        }
    }
    if let Some(tfo) = flags.tfo.as_option() {
        line.insert("fast-open", Node::bool(tfo));
    }
    if let Some(udp) = flags.udp.as_option() {
        line.insert("udp-relay", Node::bool(udp));
    }
    line.insert("tag", Node::str(name));
    Ok(line)
}
