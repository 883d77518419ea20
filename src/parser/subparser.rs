use log::{debug, info};

use crate::error::{Error, Result};
use crate::models::ProxyList;
use crate::parser::explodes::LinkRegistry;
use crate::parser::types::SubscriptionFormat;
use crate::parser::yaml::clash::parse_clash_yaml;
use crate::utils::base64::decode_body;

/// Turns an opaque subscription body into proxies.
///
/// Holds a reference to the link registry built at start-up; it keeps no
/// state of its own between calls.
pub struct SubscriptionDecoder<'a> {
    links: &'a LinkRegistry,
}

impl<'a> SubscriptionDecoder<'a> {
    pub fn new(links: &'a LinkRegistry) -> Self {
        SubscriptionDecoder { links }
    }

    /// Detects the layout of `body` without decoding any link.
    pub fn detect(body: &str) -> SubscriptionFormat {
        if decode_body(body).is_some() {
            return SubscriptionFormat::Base64Links;
        }
        SubscriptionFormat::sniff(body).unwrap_or(SubscriptionFormat::PlainLinks)
    }

    pub fn decode(&self, body: &[u8]) -> Result<ProxyList> {
        let text = std::str::from_utf8(body)
            .map_err(|e| Error::malformed("<subscription>", format!("body is not UTF-8: {}", e)))?;
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(Error::EmptyResult {
                context: "subscription body is empty".to_string(),
                failures: Vec::new(),
            });
        }

        if let Some(decoded) = decode_body(text) {
            debug!("Subscription is a {}", SubscriptionFormat::Base64Links);
            return self.decode_links(&decoded);
        }

        match SubscriptionFormat::sniff(text) {
            Some(SubscriptionFormat::Clash) => {
                debug!("Subscription is a {}", SubscriptionFormat::Clash);
                let output = parse_clash_yaml(text)?;
                if output.proxies.is_empty() {
                    return Err(Error::EmptyResult {
                        context: "no proxies could be read from the Clash configuration"
                            .to_string(),
                        failures: output.failures,
                    });
                }
                Ok(output.proxies.into())
            }
            Some(format) => Err(Error::NotSupported {
                what: format!("subscription format '{}'", format),
            }),
            None => {
                debug!("Subscription is a {}", SubscriptionFormat::PlainLinks);
                self.decode_links(text)
            }
        }
    }

    fn decode_links(&self, text: &str) -> Result<ProxyList> {
        let links = split_links(text);
        info!("Subscription carries {} link(s)", links.len());
        if links.is_empty() {
            return Err(Error::EmptyResult {
                context: "subscription contains no links".to_string(),
                failures: Vec::new(),
            });
        }
        self.links.decode_many(&links)
    }
}

/// Non-blank, non-comment lines.
pub fn split_links(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}
