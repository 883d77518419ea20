use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::GenerateOptions;
use crate::utils::http_std::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

fn default_listen_address() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    25500
}

fn default_target() -> String {
    "clash".to_string()
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval() -> u32 {
    300
}

/// A named ruleset that `/getruleset` can serve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RulesetConfig {
    pub name: String,
    /// `http(s)://` URL or a local file path
    pub url: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

/// Application configuration, loaded once at start-up and passed around
/// explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_target")]
    pub default_target: String,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    pub include_remarks: Vec<String>,
    pub exclude_remarks: Vec<String>,
    pub sort: bool,
    pub emit_rules: bool,
    pub udp: Option<bool>,
    pub tfo: Option<bool>,
    pub skip_cert_verify: Option<bool>,
    pub tls13: Option<bool>,

    /// Also require well-formed hosts and UUIDs
    pub strict: bool,

    pub rulesets: Vec<RulesetConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            default_target: default_target(),
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            log_level: default_log_level(),
            include_remarks: Vec::new(),
            exclude_remarks: Vec::new(),
            sort: false,
            emit_rules: false,
            udp: None,
            tfo: None,
            skip_cert_verify: None,
            tls13: None,
            strict: false,
            rulesets: Vec::new(),
        }
    }
}

impl Settings {
    /// Parses TOML, falling back to YAML when the content is not TOML.
    pub fn from_content(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings: Settings = if toml::from_str::<toml::Value>(content).is_ok() {
            debug!("Parsing settings as TOML");
            toml::from_str(content)?
        } else {
            debug!("Parsing settings as YAML");
            serde_yaml::from_str(content)?
        };
        settings.check()?;
        Ok(settings)
    }

    /// Reads settings from a file. An empty path yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        if path.is_empty() {
            info!("No configuration file given, using defaults");
            return Ok(Settings::default());
        }
        if !Path::new(path).is_file() {
            return Err(Error::Config(format!("configuration file '{}' not found", path)));
        }

        let content = fs::read_to_string(path)?;
        let settings = Settings::from_content(&content)?;
        info!("Loaded configuration from {}", path);
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Config("fetch_timeout_secs must be positive".to_string()));
        }
        for ruleset in &self.rulesets {
            if ruleset.name.trim().is_empty() || ruleset.url.trim().is_empty() {
                return Err(Error::Config(
                    "every ruleset needs a name and a url".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Options seeded from the configured defaults; an empty target falls
    /// back to `default_target`.
    pub fn base_options(&self, target: &str) -> GenerateOptions {
        let target = if target.trim().is_empty() {
            self.default_target.as_str()
        } else {
            target
        };
        GenerateOptions::new(target)
            .with_include(self.include_remarks.clone())
            .with_exclude(self.exclude_remarks.clone())
            .with_sort(self.sort)
            .with_rules(self.emit_rules)
            .with_udp(self.udp.into())
            .with_tfo(self.tfo.into())
            .with_skip_cert_verify(self.skip_cert_verify.into())
            .with_tls13(self.tls13.into())
    }

    /// `host:port` to bind, unless `listen_address` already carries a port.
    pub fn bind_address(&self) -> String {
        let address = self.listen_address.trim();
        if address.is_empty() {
            format!("127.0.0.1:{}", self.listen_port)
        } else if address.parse::<std::net::SocketAddr>().is_ok() {
            address.to_string()
        } else {
            format!("{}:{}", address, self.listen_port)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::TriBool;

    #[test]
    fn test_defaults_from_empty_content() {
        let settings = Settings::from_content("").unwrap();
        assert_eq!(settings.default_target, "clash");
        assert_eq!(settings.fetch_timeout_secs, 15);
        assert_eq!(settings.listen_port, 25500);
        assert!(settings.rulesets.is_empty());
    }

    #[test]
    fn test_toml_settings() {
        let content = r#"
default_target = "surge"
exclude_remarks = ["expire"]
udp = true

[[rulesets]]
name = "direct"
url = "https://example.com/direct.list"
"#;
        let settings = Settings::from_content(content).unwrap();
        assert_eq!(settings.default_target, "surge");
        assert_eq!(settings.exclude_remarks, vec!["expire".to_string()]);
        assert_eq!(settings.udp, Some(true));
        assert_eq!(settings.rulesets.len(), 1);
        assert_eq!(settings.rulesets[0].interval, 300);
    }

    #[test]
    fn test_yaml_settings() {
        let content = "listen_port: 8080\nsort: true\nrulesets:\n  - name: ads\n    url: ./ads.list\n    interval: 60\n";
        let settings = Settings::from_content(content).unwrap();
        assert_eq!(settings.listen_port, 8080);
        assert!(settings.sort);
        assert_eq!(settings.rulesets[0].interval, 60);
        assert_eq!(settings.default_target, "clash");
    }

    #[test]
    fn test_invalid_settings() {
        assert!(Settings::from_content("listen_port: [not, a, port]").is_err());
        assert!(matches!(
            Settings::from_content("fetch_timeout_secs = 0"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_target = \"quanx\"").unwrap();
        let settings = Settings::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.default_target, "quanx");

        assert_eq!(Settings::load("").unwrap().default_target, "clash");
        assert!(matches!(
            Settings::load("/nonexistent/subconv.toml"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_base_options() {
        let settings = Settings {
            include_remarks: vec!["HK".to_string()],
            tfo: Some(false),
            ..Settings::default()
        };
        let options = settings.base_options("");
        assert_eq!(options.target, "clash");
        assert_eq!(options.include_remarks, vec!["HK".to_string()]);
        assert_eq!(options.tfo, TriBool::False);
        assert_eq!(options.udp, TriBool::Unspecified);

        assert_eq!(settings.base_options("Surge").target, "surge");
    }

    #[test]
    fn test_bind_address() {
        let mut settings = Settings::default();
        assert_eq!(settings.bind_address(), "127.0.0.1:25500");
        settings.listen_address = "0.0.0.0:9000".to_string();
        assert_eq!(settings.bind_address(), "0.0.0.0:9000");
        settings.listen_address = String::new();
        assert_eq!(settings.bind_address(), "127.0.0.1:25500");
    }
}
