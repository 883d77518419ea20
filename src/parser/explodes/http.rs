use url::Url;

use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType};
use crate::parser::explodes::common::{parse_link_url, query_map};
use crate::parser::explodes::LinkDecoder;
use crate::utils::url::{bare_host, url_decode};

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDecoder;

impl LinkDecoder for HttpDecoder {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["http://", "https://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_http(link)
    }
}

/// Parse an HTTP/HTTPS proxy link: `http(s)://[user:pass@]host[:port][?name=][#remark]`
pub fn explode_http(link: &str) -> Result<Proxy> {
    let url = parse_link_url(link)?;
    let proxy_type = if url.scheme() == "https" {
        ProxyType::HTTPS
    } else {
        ProxyType::HTTP
    };

    // port_or_known_default fills in 80/443 when the link omits the port
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::missing(link, "port"))?;
    let mut proxy = explode_authority(link, &url, proxy_type, port)?;
    proxy.tls_secure = proxy_type == ProxyType::HTTPS;
    Ok(proxy)
}

/// Host, credentials and remark shared by HTTP and SOCKS links.
pub(crate) fn explode_authority(
    link: &str,
    url: &Url,
    proxy_type: ProxyType,
    port: u16,
) -> Result<Proxy> {
    let hostname = bare_host(url);
    if hostname.is_empty() {
        return Err(Error::missing(link, "host"));
    }
    if port == 0 {
        return Err(Error::malformed(link, "port must be within 1-65535"));
    }

    let mut proxy = Proxy::new(proxy_type, &hostname, port);
    if !url.username().is_empty() {
        proxy.username = Some(url_decode(url.username()));
    }
    proxy.password = url.password().map(url_decode).filter(|p| !p.is_empty());

    let mut query = query_map(url);
    proxy.group = query.remove("group").unwrap_or_default();
    proxy.remark = match query.remove("name") {
        Some(name) => name,
        None => url.fragment().map(url_decode).unwrap_or_default(),
    };

    Ok(proxy)
}
