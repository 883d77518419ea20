use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType, TriBool};
use crate::parser::explodes::common::{parse_flag, parse_link_url, query_map, split_list};
use crate::parser::explodes::LinkDecoder;
use crate::utils::url::{bare_host, url_decode};

#[derive(Debug, Default, Clone, Copy)]
pub struct VlessDecoder;

impl LinkDecoder for VlessDecoder {
    fn name(&self) -> &'static str {
        "VLESS"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["vless://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_vless(link)
    }
}

/// Parse a VLESS link: `vless://uuid@host:port?params#remark`
pub fn explode_vless(link: &str) -> Result<Proxy> {
    let url = parse_link_url(link)?;

    let hostname = bare_host(&url);
    if hostname.is_empty() {
        return Err(Error::missing(link, "host"));
    }
    let port = url.port().ok_or_else(|| Error::missing(link, "port"))?;
    if port == 0 {
        return Err(Error::malformed(link, "port must be within 1-65535"));
    }
    let user_id = url_decode(url.username());
    if user_id.is_empty() {
        return Err(Error::missing(link, "uuid"));
    }

    let mut query = query_map(&url);
    let mut proxy = Proxy {
        proxy_type: ProxyType::Vless,
        hostname,
        port,
        user_id: Some(user_id),
        encrypt_method: Some(query.remove("encryption").unwrap_or_else(|| "none".to_string())),
        transfer_protocol: Some(query.remove("type").unwrap_or_else(|| "tcp".to_string())),
        sni: query.remove("sni"),
        host: query.remove("host"),
        path: query.remove("path"),
        flow: query.remove("flow"),
        fingerprint: query.remove("fp"),
        short_id: query.remove("sid"),
        public_key: query.remove("pbk"),
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

    if let Some(security) = query.remove("security") {
        if security == "tls" || security == "reality" {
            proxy.tls_secure = true;
            proxy.tls_str = Some(security);
        }
    }

    Ok(proxy)
}
