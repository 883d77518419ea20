pub mod clash;
pub mod quanx;
pub mod surge;
pub mod unsupported;

pub use clash::ClashGenerator;
pub use quanx::QuantumultXGenerator;
pub use surge::SurgeGenerator;
pub use unsupported::UnsupportedGenerator;

use crate::models::{GenerateOptions, Proxy, TriBool};

/// Feature flags after applying request overrides over the proxy's own.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EffectiveFlags {
    pub udp: TriBool,
    pub tfo: TriBool,
    pub skip_cert_verify: TriBool,
    pub tls13: TriBool,
}

impl EffectiveFlags {
    pub fn resolve(proxy: &Proxy, options: &GenerateOptions) -> Self {
        EffectiveFlags {
            udp: options.udp.or(proxy.udp),
            tfo: options.tfo.or(proxy.tcp_fast_open),
            skip_cert_verify: options.skip_cert_verify.or(proxy.allow_insecure),
            tls13: options.tls13.or(proxy.tls13),
        }
    }
}

/// Splits `key1=value1;key2=value2` plugin options, keeping order.
pub(crate) fn parse_plugin_opts(opts: &str) -> Vec<(String, String)> {
    opts.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None => (item.to_string(), String::new()),
        })
        .collect()
}

pub(crate) fn is_obfs_plugin(plugin: &str) -> bool {
    matches!(plugin, "obfs-local" | "simple-obfs" | "obfs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    #[test]
    fn test_effective_flags_prefer_request() {
        let mut proxy = Proxy::new(ProxyType::Trojan, "h", 1);
        proxy.udp = TriBool::False;
        proxy.allow_insecure = TriBool::True;
        let options = GenerateOptions::new("clash").with_udp(TriBool::True);
        let flags = EffectiveFlags::resolve(&proxy, &options);
        assert_eq!(flags.udp, TriBool::True);
        assert_eq!(flags.skip_cert_verify, TriBool::True);
        assert_eq!(flags.tfo, TriBool::Unspecified);
    }

    #[test]
    fn test_parse_plugin_opts() {
        assert_eq!(
            parse_plugin_opts("obfs=http; obfs-host=a.com;tls"),
            vec![
                ("obfs".to_string(), "http".to_string()),
                ("obfs-host".to_string(), "a.com".to_string()),
                ("tls".to_string(), String::new()),
            ]
        );
    }
}
