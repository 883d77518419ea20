use regex::Regex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::proxy::{Proxy, ProxyType};

const HOSTNAME_PATTERN: &str =
    r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$";

/// Proxy checks applied before generation.
///
/// Constructed once by the caller and passed down by reference. In
/// non-strict mode only the model invariant is enforced; strict mode also
/// checks the hostname syntax and that VMess/VLESS ids are real UUIDs.
#[derive(Debug, Clone)]
pub struct ProxyValidator {
    strict: bool,
    hostname: Regex,
}

impl ProxyValidator {
    pub fn new(strict: bool) -> Result<Self> {
        let hostname = Regex::new(HOSTNAME_PATTERN)
            .map_err(|e| Error::Config(format!("invalid hostname pattern: {}", e)))?;
        Ok(ProxyValidator { strict, hostname })
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn validate(&self, proxy: &Proxy) -> Result<()> {
        proxy.validate()?;
        if !self.strict {
            return Ok(());
        }

        let invalid = |reason: &str| Error::InvalidProxy {
            name: proxy.display_name(),
            reason: reason.to_string(),
        };

        if !self.is_valid_host(&proxy.hostname) {
            return Err(invalid("hostname is not a valid domain or IP address"));
        }
        if matches!(proxy.proxy_type, ProxyType::VMess | ProxyType::Vless) {
            let id = proxy.user_id.as_deref().unwrap_or_default();
            if Uuid::parse_str(id).is_err() {
                return Err(invalid("user id is not a valid UUID"));
            }
        }
        Ok(())
    }

    fn is_valid_host(&self, host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_ok() || self.hostname.is_match(host)
    }
}
