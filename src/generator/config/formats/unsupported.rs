use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::models::{GenerateOptions, Proxy, ProxyType};

/// A target that is recognised but has no generator yet. Every request
/// for it fails with [`Error::NotSupported`] instead of producing partial
/// output.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedGenerator {
    target: &'static str,
    format: &'static str,
}

impl UnsupportedGenerator {
    pub const fn new(target: &'static str, format: &'static str) -> Self {
        UnsupportedGenerator { target, format }
    }
}

impl Generator for UnsupportedGenerator {
    fn target_name(&self) -> &'static str {
        self.target
    }

    fn output_format(&self) -> &'static str {
        self.format
    }

    fn supports(&self, _proxy_type: ProxyType) -> bool {
        false
    }

    fn is_implemented(&self) -> bool {
        false
    }

    fn generate(&self, _proxies: &[Proxy], _options: &GenerateOptions) -> Result<Vec<u8>> {
        Err(Error::NotSupported {
            what: format!("target '{}'", self.target),
        })
    }
}
