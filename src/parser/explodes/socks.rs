use crate::error::Result;
use crate::models::{Proxy, ProxyType};
use crate::parser::explodes::common::parse_link_url;
use crate::parser::explodes::http::explode_authority;
use crate::parser::explodes::LinkDecoder;

const DEFAULT_SOCKS_PORT: u16 = 1080;

#[derive(Debug, Default, Clone, Copy)]
pub struct SocksDecoder;

impl LinkDecoder for SocksDecoder {
    fn name(&self) -> &'static str {
        "SOCKS5"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["socks5://", "socks://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_socks(link)
    }
}

/// Parse a SOCKS link into a Proxy object
pub fn explode_socks(link: &str) -> Result<Proxy> {
    let url = parse_link_url(link)?;
    let port = url.port().unwrap_or(DEFAULT_SOCKS_PORT);
    explode_authority(link, &url, ProxyType::Socks5, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_explode_socks() {
        let proxy = explode_socks("socks5://u:p@1.2.3.4:7890#Local").unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::Socks5);
        assert_eq!(proxy.port, 7890);
        assert_eq!(proxy.username.as_deref(), Some("u"));
        assert_eq!(proxy.password.as_deref(), Some("p"));
        assert_eq!(proxy.remark, "Local");

        let defaulted = explode_socks("socks://1.2.3.4").unwrap();
        assert_eq!(defaulted.port, DEFAULT_SOCKS_PORT);
        assert_eq!(defaulted.username, None);
    }

    #[test]
    fn test_explode_socks_without_host() {
        assert!(matches!(
            explode_socks("socks5://:1080"),
            Err(Error::MissingRequiredField { .. }) | Err(Error::MalformedPayload { .. })
        ));
    }
}
