//! Per-scheme link decoders.
//!
//! Each decoder is self-contained: it claims links by scheme prefix and
//! turns one link into one [`Proxy`], never consulting another decoder.

pub mod common;
pub mod http;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vless;
pub mod vmess;

use crate::error::Result;
use crate::models::Proxy;

pub use common::LinkRegistry;
pub use http::HttpDecoder;
pub use socks::SocksDecoder;
pub use ss::SsDecoder;
pub use ssr::SsrDecoder;
pub use trojan::TrojanDecoder;
pub use vless::VlessDecoder;
pub use vmess::VmessDecoder;

/// Decodes one kind of share link.
pub trait LinkDecoder: Send + Sync {
    /// Human readable protocol name, used in logs
    fn name(&self) -> &'static str;

    /// Scheme prefixes this decoder claims, e.g. `ss://`
    fn schemes(&self) -> &'static [&'static str];

    fn can_decode(&self, link: &str) -> bool {
        self.schemes().iter().any(|scheme| link.starts_with(scheme))
    }

    fn decode(&self, link: &str) -> Result<Proxy>;
}
