use std::collections::HashMap;

use log::{debug, info, warn};
use url::Url;

use crate::error::{Error, LinkFailure, Result};
use crate::models::{Proxy, ProxyList, TriBool};
use crate::parser::explodes::{
    HttpDecoder, LinkDecoder, SocksDecoder, SsDecoder, SsrDecoder, TrojanDecoder, VlessDecoder,
    VmessDecoder,
};

/// Ordered set of link decoders. The first decoder that claims a link
/// decodes it.
///
/// Built once at start-up and only read afterwards, so it can be shared
/// across threads without locking.
pub struct LinkRegistry {
    decoders: Vec<Box<dyn LinkDecoder>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        LinkRegistry {
            decoders: Vec::new(),
        }
    }

    /// Registry holding every built-in decoder.
    pub fn with_builtin_decoders() -> Self {
        LinkRegistry::new()
            .with(SsDecoder)
            .with(SsrDecoder)
            .with(VmessDecoder)
            .with(VlessDecoder)
            .with(TrojanDecoder)
            .with(HttpDecoder)
            .with(SocksDecoder)
    }

    pub fn with(mut self, decoder: impl LinkDecoder + 'static) -> Self {
        self.decoders.push(Box::new(decoder));
        self
    }

    pub fn decoder_names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    /// Decode a single link.
    pub fn decode_one(&self, link: &str) -> Result<Proxy> {
        let link = link.trim();
        if link.is_empty() {
            return Err(Error::malformed(link, "link is empty"));
        }

        let decoder = self
            .decoders
            .iter()
            .find(|d| d.can_decode(link))
            .ok_or_else(|| Error::UnsupportedScheme {
                link: link.to_string(),
            })?;
        debug!("Decoding {} link", decoder.name());
        decoder.decode(link)
    }

    /// Decode every link independently, keeping input order.
    ///
    /// Failed links are logged and skipped. Fails only when the input is
    /// non-empty and nothing decodes, listing the cause for every link.
    pub fn decode_many<S: AsRef<str>>(&self, links: &[S]) -> Result<ProxyList> {
        let mut proxies = ProxyList::new();
        let mut failures = Vec::new();

        for link in links {
            let link = link.as_ref();
            match self.decode_one(link) {
                Ok(proxy) => proxies.push(proxy),
                Err(error) => {
                    warn!("Skipping link: {}", error);
                    failures.push(LinkFailure {
                        link: link.trim().to_string(),
                        error,
                    });
                }
            }
        }

        if proxies.is_empty() && !links.is_empty() {
            return Err(Error::EmptyResult {
                context: format!("none of the {} link(s) could be decoded", links.len()),
                failures,
            });
        }

        info!(
            "Decoded {} of {} link(s), {} skipped",
            proxies.len(),
            links.len(),
            failures.len()
        );
        Ok(proxies)
    }
}

impl Default for LinkRegistry {
    fn default() -> Self {
        LinkRegistry::with_builtin_decoders()
    }
}

/// Parse a share link as a URL, mapping failures to a typed error.
pub(crate) fn parse_link_url(link: &str) -> Result<Url> {
    Url::parse(link).map_err(|e| Error::malformed(link, format!("invalid URL: {}", e)))
}

/// Query parameters with non-empty values. Later duplicates win.
pub(crate) fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Splits a comma-separated list such as `alpn=h2,http/1.1`.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_flag(value: &str) -> TriBool {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => TriBool::True,
        "0" | "false" => TriBool::False,
        _ => TriBool::Unspecified,
    }
}
