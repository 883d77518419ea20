use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType, TriBool};
use crate::parser::explodes::common::{parse_flag, parse_link_url, query_map, split_list};
use crate::parser::explodes::LinkDecoder;
use crate::utils::url::{bare_host, url_decode};

#[derive(Debug, Default, Clone, Copy)]
pub struct TrojanDecoder;

impl LinkDecoder for TrojanDecoder {
    fn name(&self) -> &'static str {
        "Trojan"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["trojan://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_trojan(link)
    }
}

/// Parse a Trojan link: `trojan://password@host:port?params#remark`
///
/// Trojan runs over TLS unless the link says otherwise.
pub fn explode_trojan(link: &str) -> Result<Proxy> {
    let url = parse_link_url(link)?;

    let hostname = bare_host(&url);
    if hostname.is_empty() {
        return Err(Error::missing(link, "host"));
    }
    let port = url.port().ok_or_else(|| Error::missing(link, "port"))?;
    if port == 0 {
        return Err(Error::malformed(link, "port must be within 1-65535"));
    }
    let password = url_decode(url.username());
    if password.is_empty() {
        return Err(Error::missing(link, "password"));
    }

    let mut query = query_map(&url);
    let sni = query
        .remove("sni")
        .or_else(|| query.remove("peer"))
        .unwrap_or_else(|| hostname.clone());

    let mut proxy = Proxy {
        proxy_type: ProxyType::Trojan,
        hostname,
        port,
        password: Some(password),
        transfer_protocol: Some(query.remove("type").unwrap_or_else(|| "tcp".to_string())),
        sni: Some(sni),
        host: query.remove("host"),
        path: query.remove("path"),
        fingerprint: query.remove("fp"),
        grpc_service_name: query.remove("serviceName"),
        fake_type: query.remove("headerType"),
        alpn: query.remove("alpn").map(|a| split_list(&a)).unwrap_or_default(),
        allow_insecure: query
            .remove("allowInsecure")
            .map(|v| parse_flag(&v))
            .unwrap_or(TriBool::Unspecified),
        remark: url.fragment().map(url_decode).unwrap_or_default(),
        ..Default::default()
    };

    match query.remove("security").as_deref() {
        None | Some("tls") => {
            proxy.tls_secure = true;
            proxy.tls_str = Some("tls".to_string());
        }
        Some("reality") => {
            proxy.tls_secure = true;
            proxy.tls_str = Some("reality".to_string());
            proxy.public_key = query.remove("pbk");
            proxy.short_id = query.remove("sid");
        }
        Some(_) => {}
    }

    Ok(proxy)
}
