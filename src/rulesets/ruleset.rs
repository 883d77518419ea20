use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::settings::RulesetConfig;
use crate::utils::Fetcher;

/// Serves ruleset text by name.
pub trait RulesetProvider: Send + Sync {
    fn get_ruleset(&self, name: &str) -> Result<Vec<u8>>;

    fn names(&self) -> Vec<String>;
}

/// Rulesets declared in the settings, read from a local file or fetched
/// on every request.
pub struct ConfiguredRulesets {
    rulesets: Vec<RulesetConfig>,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl ConfiguredRulesets {
    pub fn new(rulesets: Vec<RulesetConfig>, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        info!("{} ruleset(s) configured", rulesets.len());
        ConfiguredRulesets {
            rulesets,
            fetcher,
            timeout,
        }
    }
}

impl RulesetProvider for ConfiguredRulesets {
    fn get_ruleset(&self, name: &str) -> Result<Vec<u8>> {
        let ruleset = self
            .rulesets
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnknownRuleset(name.to_string()))?;
        let location = ruleset.url.as_str();

        if Path::new(location).is_file() {
            debug!("Reading ruleset '{}' from {}", name, location);
            return Ok(fs::read(location)?);
        }

        if !location.starts_with("http://") && !location.starts_with("https://") {
            return Err(Error::Config(format!(
                "ruleset '{}' points to neither a file nor a URL: {}",
                name, location
            )));
        }

        debug!("Fetching ruleset '{}' from {}", name, location);
        self.fetcher.fetch(location, self.timeout)
    }

    fn names(&self) -> Vec<String> {
        self.rulesets.iter().map(|r| r.name.clone()).collect()
    }
}

/// Fixed ruleset bodies held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRulesets {
    bodies: HashMap<String, Vec<u8>>,
}

impl InMemoryRulesets {
    pub fn new() -> Self {
        InMemoryRulesets::default()
    }

    pub fn with(mut self, name: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(name.to_string(), body.into());
        self
    }
}

impl RulesetProvider for InMemoryRulesets {
    fn get_ruleset(&self, name: &str) -> Result<Vec<u8>> {
        self.bodies
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownRuleset(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bodies.keys().cloned().collect();
        names.sort();
        names
    }
}
