//! Proxy model definitions
//!
//! Contains the canonical record every link decoder produces and every
//! generator reads.

use std::fmt;

use crate::error::{Error, Result};
use crate::utils::base64::url_safe_base64_encode;

pub const SS_DEFAULT_GROUP: &str = "SSProvider";
pub const SSR_DEFAULT_GROUP: &str = "SSRProvider";
pub const V2RAY_DEFAULT_GROUP: &str = "V2RayProvider";
pub const TROJAN_DEFAULT_GROUP: &str = "TrojanProvider";
pub const HTTP_DEFAULT_GROUP: &str = "HTTPProvider";
pub const SOCKS_DEFAULT_GROUP: &str = "SocksProvider";
pub const UNKNOWN_DEFAULT_GROUP: &str = "Unknown";

/// A feature toggle that distinguishes "not set" from an explicit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriBool {
    #[default]
    Unspecified,
    True,
    False,
}

impl TriBool {
    /// Returns `self` when defined, otherwise `other`.
    pub fn or(self, other: TriBool) -> TriBool {
        match self {
            TriBool::Unspecified => other,
            defined => defined,
        }
    }

    pub fn get_or(self, default: bool) -> bool {
        match self {
            TriBool::True => true,
            TriBool::False => false,
            TriBool::Unspecified => default,
        }
    }

    pub fn is_defined(self) -> bool {
        self != TriBool::Unspecified
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            TriBool::True => Some(true),
            TriBool::False => Some(false),
            TriBool::Unspecified => None,
        }
    }
}

impl From<bool> for TriBool {
    fn from(value: bool) -> Self {
        if value {
            TriBool::True
        } else {
            TriBool::False
        }
    }
}

impl From<Option<bool>> for TriBool {
    fn from(value: Option<bool>) -> Self {
        value.map(TriBool::from).unwrap_or_default()
    }
}

/// Represents the type of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ProxyType {
    #[default]
    Unknown,
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Vless,
    Trojan,
    HTTP,
    HTTPS,
    Socks5,
}

impl ProxyType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "SS",
            ProxyType::ShadowsocksR => "SSR",
            ProxyType::VMess => "VMess",
            ProxyType::Vless => "VLESS",
            ProxyType::Trojan => "Trojan",
            ProxyType::HTTP => "HTTP",
            ProxyType::HTTPS => "HTTPS",
            ProxyType::Socks5 => "SOCKS5",
            ProxyType::Unknown => "Unknown",
        }
    }

    /// Provider bucket used when a link carries no group of its own.
    pub fn default_group(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => SS_DEFAULT_GROUP,
            ProxyType::ShadowsocksR => SSR_DEFAULT_GROUP,
            ProxyType::VMess | ProxyType::Vless => V2RAY_DEFAULT_GROUP,
            ProxyType::Trojan => TROJAN_DEFAULT_GROUP,
            ProxyType::HTTP | ProxyType::HTTPS => HTTP_DEFAULT_GROUP,
            ProxyType::Socks5 => SOCKS_DEFAULT_GROUP,
            ProxyType::Unknown => UNKNOWN_DEFAULT_GROUP,
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a proxy configuration.
///
/// All fields are owned values, so a clone never shares state with the
/// record it was cloned from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Proxy {
    pub proxy_type: ProxyType,
    pub group: String,
    pub remark: String,
    pub hostname: String,
    pub port: u16,

    pub username: Option<String>,
    pub password: Option<String>,
    pub user_id: Option<String>,
    pub alter_id: u16,

    pub encrypt_method: Option<String>,
    pub plugin: Option<String>,
    /// Plugin options in the format of `key1=value1;key2=value2`
    pub plugin_option: Option<String>,
    pub protocol: Option<String>,
    pub protocol_param: Option<String>,
    pub obfs: Option<String>,
    pub obfs_param: Option<String>,

    pub transfer_protocol: Option<String>,
    /// Header type of the transport (`none`, `http`, ...)
    pub fake_type: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub grpc_service_name: Option<String>,

    pub tls_secure: bool,
    /// Raw security value, `tls` or `reality`
    pub tls_str: Option<String>,
    pub sni: Option<String>,
    pub alpn: Vec<String>,
    pub fingerprint: Option<String>,
    pub flow: Option<String>,
    pub short_id: Option<String>,
    pub public_key: Option<String>,

    pub udp: TriBool,
    pub tcp_fast_open: TriBool,
    pub allow_insecure: TriBool,
    pub tls13: TriBool,
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

impl Proxy {
    pub fn new(proxy_type: ProxyType, hostname: &str, port: u16) -> Self {
        Proxy {
            proxy_type,
            hostname: hostname.to_string(),
            port,
            ..Default::default()
        }
    }

    /// Checks the well-formedness invariant: known type, host, port and
    /// every field the type requires.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidProxy {
            name: self.display_name(),
            reason,
        };

        if self.proxy_type == ProxyType::Unknown {
            return Err(invalid("unknown proxy type".to_string()));
        }
        if self.hostname.is_empty() {
            return Err(invalid("hostname is empty".to_string()));
        }
        if self.port == 0 {
            return Err(invalid("port must be within 1-65535".to_string()));
        }

        let required: Vec<(&str, &Option<String>)> = match self.proxy_type {
            ProxyType::Shadowsocks | ProxyType::ShadowsocksR => vec![
                ("password", &self.password),
                ("encrypt_method", &self.encrypt_method),
            ],
            ProxyType::Trojan => vec![("password", &self.password)],
            ProxyType::VMess | ProxyType::Vless => vec![("user_id", &self.user_id)],
            _ => Vec::new(),
        };
        for (name, value) in required {
            if !non_empty(value) {
                return Err(invalid(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The explicit group, or the per-type provider constant.
    pub fn default_group(&self) -> &str {
        if self.group.is_empty() {
            self.proxy_type.default_group()
        } else {
            &self.group
        }
    }

    /// `hostname:port:type`, used by callers that want to de-duplicate.
    pub fn get_key(&self) -> String {
        format!("{}:{}:{}", self.hostname, self.port, self.proxy_type)
    }

    /// The remark, or `TYPE-hostname-port` when the source carried none.
    pub fn display_name(&self) -> String {
        if self.remark.is_empty() {
            format!("{}-{}-{}", self.proxy_type, self.hostname, self.port)
        } else {
            self.remark.clone()
        }
    }

    /// Serialises the proxy back into a share link.
    ///
    /// Only Shadowsocks has a stable link form (SIP002).
    pub fn to_url(&self) -> Result<String> {
        match self.proxy_type {
            ProxyType::Shadowsocks => {
                let user_info = url_safe_base64_encode(&format!(
                    "{}:{}",
                    self.encrypt_method.as_deref().unwrap_or_default(),
                    self.password.as_deref().unwrap_or_default()
                ));
                let host = if self.hostname.contains(':') {
                    format!("[{}]", self.hostname)
                } else {
                    self.hostname.clone()
                };
                let mut link = format!("ss://{}@{}:{}", user_info, host, self.port);
                if let Some(plugin) = self.plugin.as_deref().filter(|p| !p.is_empty()) {
                    let mut value = plugin.to_string();
                    if let Some(opts) = self.plugin_option.as_deref().filter(|o| !o.is_empty()) {
                        value.push(';');
                        value.push_str(opts);
                    }
                    link.push_str("/?plugin=");
                    link.push_str(&urlencoding::encode(&value));
                }
                if !self.remark.is_empty() {
                    link.push('#');
                    link.push_str(&urlencoding::encode(&self.remark));
                }
                Ok(link)
            }
            other => Err(Error::NotSupported {
                what: format!("share link export for {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss() -> Proxy {
        Proxy {
            remark: "HK 01".to_string(),
            encrypt_method: Some("aes-256-gcm".to_string()),
            password: Some("secret".to_string()),
            alpn: vec!["h2".to_string()],
            ..Proxy::new(ProxyType::Shadowsocks, "1.2.3.4", 8388)
        }
    }

    #[test]
    fn test_tribool_or_prefers_defined_value() {
        assert_eq!(TriBool::Unspecified.or(TriBool::True), TriBool::True);
        assert_eq!(TriBool::False.or(TriBool::True), TriBool::False);
        assert_eq!(
            TriBool::Unspecified.or(TriBool::Unspecified),
            TriBool::Unspecified
        );
        assert!(TriBool::Unspecified.get_or(true));
        assert_eq!(TriBool::from(Some(false)), TriBool::False);
        assert_eq!(TriBool::from(None), TriBool::Unspecified);
    }

    #[test]
    fn test_validate_requires_type_fields() {
        assert!(ss().is_valid());

        let mut proxy = ss();
        proxy.password = Some(String::new());
        assert!(!proxy.is_valid());

        let vmess = Proxy::new(ProxyType::VMess, "example.com", 443);
        assert!(vmess.validate().is_err());

        let socks = Proxy::new(ProxyType::Socks5, "example.com", 1080);
        assert!(socks.is_valid());

        let zero_port = Proxy::new(ProxyType::Socks5, "example.com", 0);
        assert!(!zero_port.is_valid());

        assert!(!Proxy::default().is_valid());
    }

    #[test]
    fn test_default_group_and_key() {
        let mut proxy = ss();
        assert_eq!(proxy.default_group(), SS_DEFAULT_GROUP);
        proxy.group = "MyGroup".to_string();
        assert_eq!(proxy.default_group(), "MyGroup");
        assert_eq!(proxy.get_key(), "1.2.3.4:8388:SS");
        assert_eq!(
            Proxy::new(ProxyType::Vless, "a", 1).default_group(),
            V2RAY_DEFAULT_GROUP
        );
        assert_eq!(Proxy::default().default_group(), UNKNOWN_DEFAULT_GROUP);
    }

    #[test]
    fn test_display_name_falls_back_to_type_host_port() {
        let proxy = Proxy::new(ProxyType::Trojan, "t.example", 443);
        assert_eq!(proxy.display_name(), "Trojan-t.example-443");
        assert_eq!(ss().display_name(), "HK 01");
    }

    #[test]
    fn test_clone_is_independent() {
        let original = ss();
        let mut copy = original.clone();
        copy.remark.push_str(" changed");
        copy.password = Some("other".to_string());
        copy.alpn.push("http/1.1".to_string());
        copy.udp = TriBool::True;

        assert_eq!(original.remark, "HK 01");
        assert_eq!(original.password.as_deref(), Some("secret"));
        assert_eq!(original.alpn, vec!["h2".to_string()]);
        assert_eq!(original.udp, TriBool::Unspecified);
    }

    #[test]
    fn test_to_url_shadowsocks() {
        let mut proxy = ss();
        proxy.plugin = Some("obfs-local".to_string());
        proxy.plugin_option = Some("obfs=http;obfs-host=a.com".to_string());
        let link = proxy.to_url().unwrap();
        assert!(link.starts_with("ss://YWVzLTI1Ni1nY206c2VjcmV0@1.2.3.4:8388/?plugin="));
        assert!(link.ends_with("#HK%2001"));

        let trojan = Proxy::new(ProxyType::Trojan, "a", 1);
        assert!(matches!(trojan.to_url(), Err(Error::NotSupported { .. })));
    }
}
