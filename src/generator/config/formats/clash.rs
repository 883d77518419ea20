use log::warn;

use crate::error::{Error, LinkFailure, Result};
use crate::generator::config::formats::{is_obfs_plugin, parse_plugin_opts, EffectiveFlags};
use crate::generator::config::remark::unique_remarks;
use crate::generator::document::{to_yaml, Node};
use crate::generator::Generator;
use crate::models::{GenerateOptions, Proxy, ProxyType, TriBool};

pub const PROXY_GROUP: &str = "PROXY";
pub const AUTO_GROUP: &str = "Auto";
/// Group and built-in policy names proxies may not take.
const RESERVED_NAMES: &[&str] = &[PROXY_GROUP, AUTO_GROUP, "DIRECT", "REJECT"];
const TEST_URL: &str = "http://www.gstatic.com/generate_204";
const TEST_INTERVAL: i64 = 300;

const BASELINE_RULES: &[&str] = &[
    "DOMAIN-SUFFIX,local,DIRECT",
    "IP-CIDR,127.0.0.0/8,DIRECT",
    "IP-CIDR,172.16.0.0/12,DIRECT",
    "IP-CIDR,192.168.0.0/16,DIRECT",
    "IP-CIDR,10.0.0.0/8,DIRECT",
    "IP-CIDR,17.0.0.0/8,DIRECT",
    "IP-CIDR,100.64.0.0/10,DIRECT",
    "GEOIP,CN,DIRECT",
    "MATCH,PROXY",
];

/// Clash (and Clash.Meta for VLESS) YAML configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClashGenerator;

impl Generator for ClashGenerator {
    fn target_name(&self) -> &'static str {
        "clash"
    }

    fn output_format(&self) -> &'static str {
        "yaml"
    }

    fn supports(&self, proxy_type: ProxyType) -> bool {
        matches!(
            proxy_type,
            ProxyType::Shadowsocks
                | ProxyType::ShadowsocksR
                | ProxyType::VMess
                | ProxyType::Vless
                | ProxyType::Trojan
                | ProxyType::HTTP
                | ProxyType::HTTPS
                | ProxyType::Socks5
        )
    }

    fn generate(&self, proxies: &[Proxy], options: &GenerateOptions) -> Result<Vec<u8>> {
        let names = unique_remarks(proxies, options.clash.append_type, false, RESERVED_NAMES);

        let mut entries = Vec::with_capacity(proxies.len());
        let mut kept_names = Vec::with_capacity(proxies.len());
        let mut failures = Vec::new();
        for (proxy, name) in proxies.iter().zip(names) {
            match proxy_to_clash(proxy, &name, options) {
                Ok(node) => {
                    entries.push(node);
                    kept_names.push(name);
                }
                Err(error) => {
                    warn!("Skipping proxy '{}' for Clash: {}", name, error);
                    failures.push(LinkFailure { link: name, error });
                }
            }
        }
        if entries.is_empty() {
            return Err(Error::EmptyResult {
                context: "no proxies could be converted for target 'clash'".to_string(),
                failures,
            });
        }

        let select_members = std::iter::once(AUTO_GROUP.to_string()).chain(kept_names.iter().cloned());
        let groups = Node::list([
            Node::mapping()
                .with("name", Node::str(PROXY_GROUP))
                .with("type", Node::str("select"))
                .with("proxies", Node::str_list(select_members)),
            Node::mapping()
                .with("name", Node::str(AUTO_GROUP))
                .with("type", Node::str("url-test"))
                .with("proxies", Node::str_list(kept_names))
                .with("url", Node::str(TEST_URL))
                .with("interval", Node::int(TEST_INTERVAL)),
        ]);

        let mut doc = Node::mapping()
            .with("port", Node::int(7890))
            .with("socks-port", Node::int(7891))
            .with("allow-lan", Node::bool(options.clash.allow_lan))
            .with("mode", Node::str("rule"))
            .with("log-level", Node::str("info"))
            .with("external-controller", Node::str("127.0.0.1:9090"))
            .with("proxies", Node::List(entries))
            .with("proxy-groups", groups);
        if options.emit_rules {
            doc.insert("rules", Node::str_list(BASELINE_RULES.iter().copied()));
        }

        Ok(to_yaml(&doc)?.into_bytes())
    }
}

fn opt_str(value: &Option<String>) -> Option<Node> {
    value.as_deref().filter(|v| !v.is_empty()).map(Node::str)
}

fn tri(value: TriBool) -> Option<Node> {
    value.as_option().map(Node::bool)
}

fn required<'a>(value: &'a Option<String>, field: &'static str, proxy: &Proxy) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidProxy {
            name: proxy.display_name(),
            reason: format!("{} is required", field),
        })
}

/// `ws-opts` / `grpc-opts` for VMess and VLESS transports.
fn with_transport(mut node: Node, proxy: &Proxy, network: &str) -> Node {
    match network {
        "ws" => {
            let mut ws = Node::mapping().with_opt("path", opt_str(&proxy.path));
            if let Some(host) = opt_str(&proxy.host) {
                ws.insert("headers", Node::mapping().with("Host", host));
            }
            node.insert("ws-opts", ws);
        }
        "grpc" => {
            if let Some(service) = opt_str(&proxy.grpc_service_name) {
                node.insert(
                    "grpc-opts",
                    Node::mapping().with("grpc-service-name", service),
                );
            }
        }
        "h2" | "http" => {
            let mut opts = Node::mapping().with_opt("path", opt_str(&proxy.path));
            if let Some(host) = opt_str(&proxy.host) {
                opts.insert("host", Node::list([host]));
            }
            node.insert(&format!("{}-opts", network), opts);
        }
        _ => {}
    }
    node
}

fn with_alpn(node: Node, proxy: &Proxy) -> Node {
    if proxy.alpn.is_empty() {
        node
    } else {
        node.with("alpn", Node::str_list(proxy.alpn.iter().cloned()))
    }
}

fn ss_plugin(node: Node, proxy: &Proxy) -> Node {
    let Some(plugin) = proxy.plugin.as_deref().filter(|p| !p.is_empty()) else {
        return node;
    };
    let opts = parse_plugin_opts(proxy.plugin_option.as_deref().unwrap_or_default());
    if is_obfs_plugin(plugin) {
        let mut plugin_opts = Node::mapping();
        for (key, value) in opts {
            match key.as_str() {
                "obfs" => plugin_opts.insert("mode", Node::str(value)),
                "obfs-host" => plugin_opts.insert("host", Node::str(value)),
                _ => {}
            }
        }
        node.with("plugin", Node::str("obfs"))
            .with("plugin-opts", plugin_opts)
    } else {
        let mut plugin_opts = Node::mapping();
        for (key, value) in opts {
            if value.is_empty() {
                // bare flags such as `tls`
                plugin_opts.insert(&key, Node::bool(true));
            } else {
                plugin_opts.insert(&key, Node::str(value));
            }
        }
        node.with("plugin", Node::str(plugin))
            .with("plugin-opts", plugin_opts)
    }
}

/// Maps one proxy onto a Clash `proxies` entry.
pub fn proxy_to_clash(proxy: &Proxy, name: &str, options: &GenerateOptions) -> Result<Node> {
    let flags = EffectiveFlags::resolve(proxy, options);
    let base = |kind: &str| {
        Node::mapping()
            .with("name", Node::str(name))
            .with("type", Node::str(kind))
            .with("server", Node::str(proxy.hostname.as_str()))
            .with("port", Node::int(proxy.port))
    };

    let node = match proxy.proxy_type {
        ProxyType::Shadowsocks => {
            let node = base("ss")
                .with("cipher", Node::str(required(&proxy.encrypt_method, "cipher", proxy)?))
                .with("password", Node::str(required(&proxy.password, "password", proxy)?));
            ss_plugin(node, proxy)
        }
        ProxyType::ShadowsocksR => base("ssr")
            .with("cipher", Node::str(required(&proxy.encrypt_method, "cipher", proxy)?))
            .with("password", Node::str(required(&proxy.password, "password", proxy)?))
            .with("protocol", Node::str(proxy.protocol.as_deref().unwrap_or("origin")))
            .with_opt("protocol-param", opt_str(&proxy.protocol_param))
            .with("obfs", Node::str(proxy.obfs.as_deref().unwrap_or("plain")))
            .with_opt("obfs-param", opt_str(&proxy.obfs_param)),
        ProxyType::VMess => {
            let network = proxy.transfer_protocol.as_deref().unwrap_or("tcp");
            let node = base("vmess")
                .with("uuid", Node::str(required(&proxy.user_id, "uuid", proxy)?))
                .with("alterId", Node::int(proxy.alter_id))
                .with("cipher", Node::str(proxy.encrypt_method.as_deref().unwrap_or("auto")))
                .with("network", Node::str(network))
                .with("tls", Node::bool(proxy.tls_secure))
                .with_opt("servername", opt_str(&proxy.sni));
            with_alpn(with_transport(node, proxy, network), proxy)
        }
        ProxyType::Vless => {
            let network = proxy.transfer_protocol.as_deref().unwrap_or("tcp");
            let mut node = base("vless")
                .with("uuid", Node::str(required(&proxy.user_id, "uuid", proxy)?))
                .with("network", Node::str(network))
                .with("tls", Node::bool(proxy.tls_secure))
                .with_opt("servername", opt_str(&proxy.sni))
                .with_opt("flow", opt_str(&proxy.flow))
                .with_opt("client-fingerprint", opt_str(&proxy.fingerprint));
            if proxy.tls_str.as_deref() == Some("reality") {
                node.insert(
                    "reality-opts",
                    Node::mapping()
                        .with_opt("public-key", opt_str(&proxy.public_key))
                        .with_opt("short-id", opt_str(&proxy.short_id)),
                );
            }
            with_alpn(with_transport(node, proxy, network), proxy)
        }
        ProxyType::Trojan => {
            let sni = opt_str(&proxy.sni).unwrap_or_else(|| Node::str(proxy.hostname.as_str()));
            let network = proxy.transfer_protocol.as_deref().unwrap_or("tcp");
            let mut node = base("trojan")
                .with("password", Node::str(required(&proxy.password, "password", proxy)?))
                .with("sni", sni);
            if network != "tcp" {
                node.insert("network", Node::str(network));
                node = with_transport(node, proxy, network);
            }
            with_alpn(node, proxy)
        }
        ProxyType::HTTP | ProxyType::HTTPS => {
            let node = base("http")
                .with_opt("username", opt_str(&proxy.username))
                .with_opt("password", opt_str(&proxy.password));
            if proxy.proxy_type == ProxyType::HTTPS {
                node.with("tls", Node::bool(true))
            } else {
                node
            }
        }
        ProxyType::Socks5 => base("socks5")
            .with_opt("username", opt_str(&proxy.username))
            .with_opt("password", opt_str(&proxy.password)),
        ProxyType::Unknown => {
            return Err(Error::UnsupportedProxyForTarget {
                target: "clash".to_string(),
                proxy_type: proxy.proxy_type.to_string(),
            })
        }
    };

    Ok(node
        .with_opt("udp", tri(flags.udp))
        .with_opt("tfo", tri(flags.tfo))
        .with_opt("skip-cert-verify", tri(flags.skip_cert_verify)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss(remark: &str) -> Proxy {
        Proxy {
            remark: remark.to_string(),
            encrypt_method: Some("aes-256-gcm".to_string()),
            password: Some("test".to_string()),
            ..Proxy::new(ProxyType::Shadowsocks, "127.0.0.1", 8388)
        }
    }

    fn parse(output: Vec<u8>) -> serde_yaml::Value {
        serde_yaml::from_slice(&output).unwrap()
    }

    #[test]
    fn test_clash_fixed_fields_and_groups() {
        let output = ClashGenerator
            .generate(&[ss("A"), ss("B")], &GenerateOptions::new("clash"))
            .unwrap();
        let doc = parse(output);
        assert_eq!(doc["port"], 7890);
        assert_eq!(doc["socks-port"], 7891);
        assert_eq!(doc["allow-lan"], false);
        assert_eq!(doc["mode"], "rule");
        assert_eq!(doc["log-level"], "info");
        assert_eq!(doc["external-controller"], "127.0.0.1:9090");
        assert!(doc.get("rules").is_none());

        let groups = doc["proxy-groups"].as_sequence().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["name"], "PROXY");
        assert_eq!(groups[0]["type"], "select");
        assert_eq!(
            groups[0]["proxies"],
            serde_yaml::from_str::<serde_yaml::Value>("[Auto, A, B]").unwrap()
        );
        assert_eq!(groups[1]["name"], "Auto");
        assert_eq!(groups[1]["type"], "url-test");
        assert_eq!(groups[1]["interval"], 300);
        assert_eq!(groups[1]["url"], TEST_URL);
    }

    #[test]
    fn test_clash_rules_when_requested() {
        let output = ClashGenerator
            .generate(&[ss("A")], &GenerateOptions::new("clash").with_rules(true))
            .unwrap();
        let doc = parse(output);
        let rules = doc["rules"].as_sequence().unwrap();
        assert_eq!(rules.len(), BASELINE_RULES.len());
        assert_eq!(rules.last().unwrap(), "MATCH,PROXY");
        assert!(rules.iter().any(|r| r == "GEOIP,CN,DIRECT"));
    }

    #[test]
    fn test_clash_proxy_mappings() {
        let options = GenerateOptions::new("clash").with_skip_cert_verify(TriBool::True);

        let mut vmess = Proxy::new(ProxyType::VMess, "v.example.com", 443);
        vmess.user_id = Some("b831381d-6324-4d53-ad4f-8cda48b30811".to_string());
        vmess.transfer_protocol = Some("ws".to_string());
        vmess.path = Some("/ws".to_string());
        vmess.host = Some("cdn.example.com".to_string());
        vmess.tls_secure = true;
        vmess.sni = Some("v.example.com".to_string());
        let node = proxy_to_clash(&vmess, "V", &options).unwrap();
        assert_eq!(node.get("uuid").and_then(Node::as_str), vmess.user_id.as_deref());
        assert_eq!(node.get("network").and_then(Node::as_str), Some("ws"));
        assert_eq!(node.get("tls"), Some(&Node::bool(true)));
        assert_eq!(node.get("servername").and_then(Node::as_str), Some("v.example.com"));
        assert_eq!(node.get("skip-cert-verify"), Some(&Node::bool(true)));
        assert!(node.get("ws-opts").is_some());
        assert!(node.get("udp").is_none());

        let mut trojan = Proxy::new(ProxyType::Trojan, "t.example.com", 443);
        trojan.password = Some("pw".to_string());
        let node = proxy_to_clash(&trojan, "T", &options).unwrap();
        assert_eq!(node.get("sni").and_then(Node::as_str), Some("t.example.com"));

        let mut https = Proxy::new(ProxyType::HTTPS, "h.example.com", 443);
        https.username = Some("u".to_string());
        let node = proxy_to_clash(&https, "H", &options).unwrap();
        assert_eq!(node.get("type").and_then(Node::as_str), Some("http"));
        assert_eq!(node.get("tls"), Some(&Node::bool(true)));
        assert_eq!(node.get("username").and_then(Node::as_str), Some("u"));
        assert!(node.get("password").is_none());
    }

    #[test]
    fn test_clash_obfs_plugin() {
        let mut proxy = ss("P");
        proxy.plugin = Some("obfs-local".to_string());
        proxy.plugin_option = Some("obfs=http;obfs-host=bing.com".to_string());
        let node = proxy_to_clash(&proxy, "P", &GenerateOptions::new("clash")).unwrap();
        assert_eq!(node.get("plugin").and_then(Node::as_str), Some("obfs"));
        let opts = node.get("plugin-opts").unwrap();
        assert_eq!(opts.get("mode").and_then(Node::as_str), Some("http"));
        assert_eq!(opts.get("host").and_then(Node::as_str), Some("bing.com"));
    }

    #[test]
    fn test_clash_drops_unconvertible_proxies() {
        let mut broken = ss("Broken");
        broken.password = None;
        let output = ClashGenerator
            .generate(&[broken, ss("Good")], &GenerateOptions::new("clash"))
            .unwrap();
        let doc = parse(output);
        assert_eq!(doc["proxies"].as_sequence().unwrap().len(), 1);
        assert_eq!(doc["proxy-groups"][1]["proxies"][0], "Good");
    }
}
