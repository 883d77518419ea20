use log::debug;

use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType};
use crate::parser::explodes::LinkDecoder;
use crate::utils::base64::decode_lenient;
use crate::utils::url::parse_query;

#[derive(Debug, Default, Clone, Copy)]
pub struct SsrDecoder;

impl LinkDecoder for SsrDecoder {
    fn name(&self) -> &'static str {
        "ShadowsocksR"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["ssr://"]
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_ssr(link)
    }
}

/// Parse a ShadowsocksR link
///
/// The payload is `base64(host:port:protocol:method:obfs:base64(password)/?params)`.
/// The split happens on the first literal `/?`, so a payload whose encoded
/// fields happen to contain that sequence is rejected rather than guessed at.
pub fn explode_ssr(link: &str) -> Result<Proxy> {
    let encoded = link
        .strip_prefix("ssr://")
        .ok_or_else(|| Error::UnsupportedScheme {
            link: link.to_string(),
        })?;

    let decoded = decode_lenient(encoded)
        .ok_or_else(|| Error::malformed(link, "payload is not valid base64"))?;

    let sections: Vec<&str> = decoded.split("/?").collect();
    if sections.len() != 2 {
        return Err(Error::malformed(
            link,
            format!("expected 'main/?params', found {} section(s)", sections.len()),
        ));
    }

    let fields: Vec<&str> = sections[0].split(':').collect();
    if fields.len() != 6 {
        return Err(Error::malformed(
            link,
            format!("expected 6 ':'-separated fields, found {}", fields.len()),
        ));
    }

    let port = fields[1]
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| Error::malformed(link, format!("invalid port '{}'", fields[1])))?;
    let password = decode_lenient(fields[5])
        .ok_or_else(|| Error::malformed(link, "password is not valid base64"))?;

    if fields[0].is_empty() {
        return Err(Error::missing(link, "host"));
    }
    if fields[3].is_empty() {
        return Err(Error::missing(link, "method"));
    }
    if password.is_empty() {
        return Err(Error::missing(link, "password"));
    }

    let mut proxy = Proxy {
        proxy_type: ProxyType::ShadowsocksR,
        hostname: fields[0].to_string(),
        port,
        protocol: Some(fields[2].to_string()),
        encrypt_method: Some(fields[3].to_string()),
        obfs: Some(fields[4].to_string()),
        password: Some(password),
        ..Default::default()
    };

    // A broken optional parameter only blanks that field.
    for (key, value) in parse_query(sections[1]) {
        if value.is_empty() {
            continue;
        }
        let Some(text) = decode_lenient(&value) else {
            debug!("Ignoring undecodable SSR parameter '{}'", key);
            continue;
        };
        match key.as_str() {
            "obfsparam" => proxy.obfs_param = Some(text),
            "protoparam" => proxy.protocol_param = Some(text),
            "remarks" => proxy.remark = text,
            "group" => proxy.group = text,
            _ => {}
        }
    }

    Ok(proxy)
}
