use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType};
use crate::parser::deserialize::deserialize_u16_lenient;
use crate::parser::explodes::LinkDecoder;
use crate::utils::base64::decode_lenient;

#[derive(Debug, Default, Clone, Copy)]
pub struct VmessDecoder;

impl LinkDecoder for VmessDecoder {
    fn name(&self) -> &'static str {
        "VMess"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["vmess://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_vmess(link)
    }
}

/// The JSON object carried by a `vmess://` link (v2rayN layout).
#[derive(Debug, Deserialize)]
struct VmessJson {
    #[serde(default)]
    ps: Option<String>,
    #[serde(default)]
    add: Option<String>,
    #[serde(default, deserialize_with = "deserialize_u16_lenient")]
    port: Option<u16>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_u16_lenient")]
    aid: Option<u16>,
    #[serde(default)]
    scy: Option<String>,
    #[serde(default)]
    net: Option<String>,
    #[serde(default, rename = "type")]
    header_type: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    tls: Option<String>,
    #[serde(default)]
    sni: Option<String>,
    #[serde(default)]
    alpn: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a VMess link into a Proxy object
pub fn explode_vmess(link: &str) -> Result<Proxy> {
    let encoded = link
        .strip_prefix("vmess://")
        .ok_or_else(|| Error::UnsupportedScheme {
            link: link.to_string(),
        })?;

    let decoded = decode_lenient(encoded)
        .ok_or_else(|| Error::malformed(link, "payload is not valid base64"))?;
    let json: VmessJson = serde_json::from_str(&decoded)
        .map_err(|e| Error::malformed(link, format!("invalid JSON: {}", e)))?;

    let hostname = filled(json.add).ok_or_else(|| Error::missing(link, "add"))?;
    let port = json.port.ok_or_else(|| Error::missing(link, "port"))?;
    if port == 0 {
        return Err(Error::malformed(link, "port must be within 1-65535"));
    }
    let user_id = filled(json.id).ok_or_else(|| Error::missing(link, "id"))?;

    let network = filled(json.net).unwrap_or_else(|| "tcp".to_string());
    let path = filled(json.path);
    let tls_secure = json.tls.as_deref() == Some("tls");

    let mut proxy = Proxy {
        proxy_type: ProxyType::VMess,
        remark: json.ps.unwrap_or_default(),
        hostname,
        port,
        user_id: Some(user_id),
        alter_id: json.aid.unwrap_or(0),
        encrypt_method: Some(filled(json.scy).unwrap_or_else(|| "auto".to_string())),
        fake_type: Some(filled(json.header_type).unwrap_or_else(|| "none".to_string())),
        host: filled(json.host),
        tls_secure,
        ..Default::default()
    };

    if network == "grpc" {
        proxy.grpc_service_name = path;
    } else {
        proxy.path = path;
    }
    proxy.transfer_protocol = Some(network);

    if tls_secure {
        proxy.tls_str = Some("tls".to_string());
        proxy.sni = filled(json.sni);
    }
    if let Some(alpn) = filled(json.alpn) {
        proxy.alpn = alpn
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    Ok(proxy)
}
