use std::collections::BTreeMap;

use log::{info, warn};
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Error, LinkFailure, Result};
use crate::models::{Proxy, ProxyType, TriBool};
use crate::parser::yaml::clash::proxy_types::{ClashProxyYamlInput, GrpcOpts, WsOpts};

#[derive(Debug, Deserialize)]
struct ClashYamlInput {
    #[serde(default)]
    proxies: Vec<Value>,
}

/// Proxies recovered from a Clash document plus the entries that were
/// skipped.
#[derive(Debug, Default)]
pub struct ClashParseOutput {
    pub proxies: Vec<Proxy>,
    pub failures: Vec<LinkFailure>,
}

/// Parse the `proxies` section of a Clash configuration.
///
/// Each entry is converted on its own; an entry of an unsupported type or
/// missing a mandatory key is reported in `failures` and skipped.
pub fn parse_clash_yaml(content: &str) -> Result<ClashParseOutput> {
    let input: ClashYamlInput = serde_yaml::from_str(content)?;
    let mut output = ClashParseOutput::default();

    for entry in input.proxies {
        let label = entry_label(&entry);
        let converted = serde_yaml::from_value::<ClashProxyYamlInput>(entry)
            .map_err(|e| Error::malformed(&label, e.to_string()))
            .and_then(|parsed| into_proxy(&label, parsed));
        match converted {
            Ok(proxy) => output.proxies.push(proxy),
            Err(error) => {
                warn!("Skipping Clash proxy: {}", error);
                output.failures.push(LinkFailure { link: label, error });
            }
        }
    }

    info!(
        "Parsed {} Clash proxies, {} skipped",
        output.proxies.len(),
        output.failures.len()
    );
    Ok(output)
}

fn entry_label(entry: &Value) -> String {
    let field = |key: &str| entry.get(key).and_then(Value::as_str).unwrap_or("?");
    format!("clash:{}:{}", field("type"), field("name"))
}

fn require_port(label: &str, port: Option<u16>) -> Result<u16> {
    match port {
        Some(0) => Err(Error::malformed(label, "port must be within 1-65535")),
        Some(port) => Ok(port),
        None => Err(Error::missing(label, "port")),
    }
}

fn plugin_opts_string(opts: BTreeMap<String, Value>) -> String {
    opts.into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(format!("{}={}", key, value))
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn apply_transport(proxy: &mut Proxy, ws: Option<WsOpts>, grpc: Option<GrpcOpts>) {
    if let Some(ws) = ws {
        proxy.path = ws.path;
        proxy.host = ws
            .headers
            .and_then(|headers| headers.get("Host").or_else(|| headers.get("host")).cloned());
    }
    if let Some(grpc) = grpc {
        proxy.grpc_service_name = grpc.grpc_service_name;
    }
}

fn into_proxy(label: &str, input: ClashProxyYamlInput) -> Result<Proxy> {
    let proxy = match input {
        ClashProxyYamlInput::Shadowsocks {
            name,
            server,
            port,
            cipher,
            password,
            udp,
            tfo,
            plugin,
            plugin_opts,
        } => Proxy {
            remark: name,
            encrypt_method: Some(cipher),
            password: Some(password),
            udp: udp.into(),
            tcp_fast_open: tfo.into(),
            plugin,
            plugin_option: plugin_opts.map(plugin_opts_string),
            ..Proxy::new(ProxyType::Shadowsocks, &server, require_port(label, port)?)
        },
        ClashProxyYamlInput::ShadowsocksR {
            name,
            server,
            port,
            cipher,
            password,
            protocol,
            obfs,
            protocol_param,
            obfs_param,
            udp,
        } => Proxy {
            remark: name,
            encrypt_method: Some(cipher),
            password: Some(password),
            protocol: Some(protocol),
            protocol_param,
            obfs: Some(obfs),
            obfs_param,
            udp: udp.into(),
            ..Proxy::new(ProxyType::ShadowsocksR, &server, require_port(label, port)?)
        },
        ClashProxyYamlInput::VMess {
            name,
            server,
            port,
            uuid,
            alter_id,
            cipher,
            network,
            tls,
            servername,
            ws_opts,
            grpc_opts,
            skip_cert_verify,
            udp,
        } => {
            let tls = tls.unwrap_or(false);
            let mut proxy = Proxy {
                remark: name,
                user_id: Some(uuid),
                alter_id: alter_id.unwrap_or(0),
                encrypt_method: Some(cipher.unwrap_or_else(|| "auto".to_string())),
                transfer_protocol: Some(network.unwrap_or_else(|| "tcp".to_string())),
                tls_secure: tls,
                tls_str: tls.then(|| "tls".to_string()),
                sni: servername,
                allow_insecure: skip_cert_verify.into(),
                udp: udp.into(),
                ..Proxy::new(ProxyType::VMess, &server, require_port(label, port)?)
            };
            apply_transport(&mut proxy, ws_opts, grpc_opts);
            proxy
        }
        ClashProxyYamlInput::Vless {
            name,
            server,
            port,
            uuid,
            network,
            tls,
            servername,
            flow,
            client_fingerprint,
            reality_opts,
            ws_opts,
            grpc_opts,
            skip_cert_verify,
            udp,
        } => {
            let security = match (&reality_opts, tls.unwrap_or(false)) {
                (Some(_), _) => Some("reality".to_string()),
                (None, true) => Some("tls".to_string()),
                (None, false) => None,
            };
            let reality = reality_opts.unwrap_or_default();
            let mut proxy = Proxy {
                remark: name,
                user_id: Some(uuid),
                encrypt_method: Some("none".to_string()),
                transfer_protocol: Some(network.unwrap_or_else(|| "tcp".to_string())),
                tls_secure: security.is_some(),
                tls_str: security,
                sni: servername,
                flow,
                fingerprint: client_fingerprint,
                public_key: reality.public_key,
                short_id: reality.short_id,
                allow_insecure: skip_cert_verify.into(),
                udp: udp.into(),
                ..Proxy::new(ProxyType::Vless, &server, require_port(label, port)?)
            };
            apply_transport(&mut proxy, ws_opts, grpc_opts);
            proxy
        }
        ClashProxyYamlInput::Trojan {
            name,
            server,
            port,
            password,
            sni,
            network,
            alpn,
            skip_cert_verify,
            udp,
        } => Proxy {
            remark: name,
            password: Some(password),
            sni: sni.or_else(|| Some(server.clone())),
            transfer_protocol: Some(network.unwrap_or_else(|| "tcp".to_string())),
            alpn: alpn.unwrap_or_default(),
            tls_secure: true,
            tls_str: Some("tls".to_string()),
            allow_insecure: skip_cert_verify.into(),
            udp: udp.into(),
            ..Proxy::new(ProxyType::Trojan, &server, require_port(label, port)?)
        },
        ClashProxyYamlInput::Http {
            name,
            server,
            port,
            username,
            password,
            tls,
            skip_cert_verify,
        } => {
            let tls = tls.unwrap_or(false);
            let proxy_type = if tls { ProxyType::HTTPS } else { ProxyType::HTTP };
            Proxy {
                remark: name,
                username,
                password,
                tls_secure: tls,
                allow_insecure: skip_cert_verify.into(),
                ..Proxy::new(proxy_type, &server, require_port(label, port)?)
            }
        }
        ClashProxyYamlInput::Socks5 {
            name,
            server,
            port,
            username,
            password,
            udp,
        } => Proxy {
            remark: name,
            username,
            password,
            udp: TriBool::from(udp),
            ..Proxy::new(ProxyType::Socks5, &server, require_port(label, port)?)
        },
    };

    if proxy.hostname.is_empty() {
        return Err(Error::missing(label, "server"));
    }
    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clash_yaml_mixed_entries() {
        let yaml = r#"
port: 7890
proxies:
  - name: "Test SS"
    type: ss
    server: example.com
    port: "8388"
    cipher: aes-256-gcm
    password: password
    udp: true
    plugin: obfs
    plugin-opts:
      mode: http
      host: bing.com
  - name: "VM"
    type: vmess
    server: v.example.com
    port: 443
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    network: ws
    tls: true
    ws-opts:
      path: /ws
      headers:
        Host: cdn.example.com
  - name: "Snell"
    type: snell
    server: s.example.com
    port: 1
    psk: abc
  - name: "NoPort"
    type: trojan
    server: t.example.com
    password: pw
"#;
        let output = parse_clash_yaml(yaml).unwrap();
        assert_eq!(output.proxies.len(), 2);
        assert_eq!(output.failures.len(), 2);

        let ss = &output.proxies[0];
        assert_eq!(ss.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(ss.port, 8388);
        assert_eq!(ss.udp, TriBool::True);
        assert_eq!(ss.plugin_option.as_deref(), Some("host=bing.com;mode=http"));

        let vmess = &output.proxies[1];
        assert_eq!(vmess.transfer_protocol.as_deref(), Some("ws"));
        assert_eq!(vmess.path.as_deref(), Some("/ws"));
        assert_eq!(vmess.host.as_deref(), Some("cdn.example.com"));
        assert!(vmess.tls_secure);

        assert!(output.failures[0].link.contains("snell"));
        assert!(matches!(
            output.failures[1].error,
            Error::MissingRequiredField { field: "port", .. }
        ));
    }

    #[test]
    fn test_parse_clash_yaml_invalid_document() {
        assert!(matches!(parse_clash_yaml("proxies: [unclosed"), Err(Error::Yaml(_))));
    }
}
