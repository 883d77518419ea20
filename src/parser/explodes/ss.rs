use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType};
use crate::parser::explodes::common::{parse_link_url, query_map};
use crate::parser::explodes::LinkDecoder;
use crate::utils::base64::decode_lenient;
use crate::utils::url::{bare_host, split_host_port, url_decode};

/// `ss://` links, both SIP002 and the legacy fully-encoded layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SsDecoder;

impl LinkDecoder for SsDecoder {
    fn name(&self) -> &'static str {
        "Shadowsocks"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["ss://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_ss(link)
    }
}

/// Parse a Shadowsocks link into a Proxy object
///
/// Accepts `ss://base64(method:password)@host:port[/?query][#remark]`
/// and `ss://base64(method:password@host:port)[?query][#remark]`.
pub fn explode_ss(link: &str) -> Result<Proxy> {
    let url = parse_link_url(link)?;

    let (auth, hostname, port) = if url.username().is_empty() {
        // Legacy layout: the whole authority (and any path it spilled into
        // when the payload contains '/') is one base64 blob.
        let payload = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
        let decoded = decode_lenient(&url_decode(payload.trim_end_matches('/')))
            .ok_or_else(|| Error::malformed(link, "payload is not valid base64"))?;
        let (auth, server) = decoded
            .rsplit_once('@')
            .ok_or_else(|| Error::malformed(link, "decoded payload has no '@'"))?;
        let (hostname, port) = split_host_port(server).ok_or_else(|| {
            Error::malformed(link, format!("invalid server address '{}'", server))
        })?;
        (auth.to_string(), hostname, port)
    } else {
        let user_info = url_decode(url.username());
        // base64 never contains ':', so a password part means plain
        // `method:password` user info
        let auth = match url.password() {
            Some(password) => format!("{}:{}", user_info, url_decode(password)),
            None => decode_lenient(&user_info)
                .ok_or_else(|| Error::malformed(link, "user info is not valid base64"))?,
        };
        let hostname = bare_host(&url);
        if hostname.is_empty() {
            return Err(Error::missing(link, "host"));
        }
        let port = url
            .port()
            .filter(|p| *p != 0)
            .ok_or_else(|| Error::malformed(link, "missing or invalid port"))?;
        (auth, hostname, port)
    };

    let (method, password) = auth.split_once(':').unwrap_or((auth.as_str(), ""));
    if method.is_empty() {
        return Err(Error::missing(link, "method"));
    }
    if password.is_empty() {
        return Err(Error::missing(link, "password"));
    }

    let mut proxy = Proxy::new(ProxyType::Shadowsocks, &hostname, port);
    proxy.encrypt_method = Some(method.to_string());
    proxy.password = Some(password.to_string());
    proxy.remark = url.fragment().map(url_decode).unwrap_or_default();

    let mut query = query_map(&url);
    if let Some(name) = query.remove("name") {
        proxy.remark = name;
    }
    proxy.group = query.remove("group").unwrap_or_default();
    if let Some(plugin) = query.remove("plugin") {
        match plugin.split_once(';') {
            Some((name, opts)) => {
                proxy.plugin = Some(name.to_string());
                proxy.plugin_option = Some(opts.to_string());
            }
            None => proxy.plugin = Some(plugin),
        }
    }

    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_ss_sip002() {
        let proxy = explode_ss("ss://YWVzLTI1Ni1nY206dGVzdA==@127.0.0.1:8388#Test%20SS").unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(proxy.hostname, "127.0.0.1");
        assert_eq!(proxy.port, 8388);
        assert_eq!(proxy.encrypt_method.as_deref(), Some("aes-256-gcm"));
        assert_eq!(proxy.password.as_deref(), Some("test"));
        assert_eq!(proxy.remark, "Test SS");
        assert!(proxy.group.is_empty());
    }

    #[test]
    fn test_explode_ss_legacy_layout() {
        // base64("chacha20-ietf-poly1305:p@ss:word@example.com:443")
        let proxy = explode_ss(
            "ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwQHNzOndvcmRAZXhhbXBsZS5jb206NDQz#Legacy",
        )
        .unwrap();
        assert_eq!(proxy.hostname, "example.com");
        assert_eq!(proxy.port, 443);
        assert_eq!(proxy.encrypt_method.as_deref(), Some("chacha20-ietf-poly1305"));
        assert_eq!(proxy.password.as_deref(), Some("p@ss:word"));
        assert_eq!(proxy.remark, "Legacy");
    }

    #[test]
    fn test_explode_ss_query_parameters() {
        let proxy = explode_ss(
            "ss://YWVzLTI1Ni1nY206dGVzdA@[2001:db8::1]:8388/?plugin=obfs-local%3Bobfs%3Dhttp%3Bobfs-host%3Da.com&name=From%20Query&group=Mine#Fragment",
        )
        .unwrap();
        assert_eq!(proxy.hostname, "2001:db8::1");
        assert_eq!(proxy.remark, "From Query");
        assert_eq!(proxy.group, "Mine");
        assert_eq!(proxy.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(proxy.plugin_option.as_deref(), Some("obfs=http;obfs-host=a.com"));
    }

    #[test]
    fn test_explode_ss_errors() {
        assert!(matches!(
            explode_ss("ss://!!!@1.2.3.4:80"),
            Err(Error::MalformedPayload { .. })
        ));
        // base64("aes-256-gcm")
        assert!(matches!(
            explode_ss("ss://YWVzLTI1Ni1nY20@1.2.3.4:80"),
            Err(Error::MissingRequiredField { field: "password", .. })
        ));
        assert!(matches!(
            explode_ss("ss://YWVzLTI1Ni1nY206dGVzdA@1.2.3.4"),
            Err(Error::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_explode_ss_plain_user_info() {
        let proxy = explode_ss("ss://2022-blake3-aes-128-gcm:a2V5@1.2.3.4:8388#Plain").unwrap();
        assert_eq!(proxy.encrypt_method.as_deref(), Some("2022-blake3-aes-128-gcm"));
        assert_eq!(proxy.password.as_deref(), Some("a2V5"));
    }
}
