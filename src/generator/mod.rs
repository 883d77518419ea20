pub mod config;
pub mod document;

use log::{debug, info, warn};

use crate::error::{Error, LinkFailure, Result};
use crate::generator::config::filter::{filter_remarks, sort_by_remark};
use crate::generator::config::formats::{
    ClashGenerator, QuantumultXGenerator, SurgeGenerator, UnsupportedGenerator,
};
use crate::models::{GenerateOptions, Proxy, ProxyList, ProxyType, ProxyValidator};

/// Produces one client's configuration document.
pub trait Generator: Send + Sync {
    fn target_name(&self) -> &'static str;

    /// Other names the target is requested by
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// File format of the output, e.g. `yaml` or `conf`
    fn output_format(&self) -> &'static str;

    fn supports(&self, proxy_type: ProxyType) -> bool;

    fn validate(&self, proxy: &Proxy) -> Result<()> {
        if !self.supports(proxy.proxy_type) {
            return Err(Error::UnsupportedProxyForTarget {
                target: self.target_name().to_string(),
                proxy_type: proxy.proxy_type.to_string(),
            });
        }
        proxy.validate()
    }

    /// False for targets that are registered but have no generator yet.
    fn is_implemented(&self) -> bool {
        true
    }

    fn generate(&self, proxies: &[Proxy], options: &GenerateOptions) -> Result<Vec<u8>>;
}

/// Generators keyed by target name, built once at start-up.
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        GeneratorRegistry {
            generators: Vec::new(),
        }
    }

    pub fn with_builtin_generators() -> Self {
        GeneratorRegistry::new()
            .with(ClashGenerator)
            .with(SurgeGenerator)
            .with(QuantumultXGenerator)
            .with(UnsupportedGenerator::new("loon", "conf"))
            .with(UnsupportedGenerator::new("singbox", "json"))
            .with(UnsupportedGenerator::new("v2ray", "json"))
            .with(UnsupportedGenerator::new("ss", "json"))
    }

    /// Registers a generator; a later one with the same target replaces
    /// the earlier.
    pub fn with(mut self, generator: impl Generator + 'static) -> Self {
        self.generators
            .retain(|g| g.target_name() != generator.target_name());
        self.generators.push(Box::new(generator));
        self
    }

    pub fn get(&self, target: &str) -> Option<&dyn Generator> {
        self.generators
            .iter()
            .find(|g| {
                g.target_name().eq_ignore_ascii_case(target)
                    || g.aliases().iter().any(|a| a.eq_ignore_ascii_case(target))
            })
            .map(|g| g.as_ref())
    }

    /// Registered target names, sorted.
    pub fn supported_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .generators
            .iter()
            .map(|g| g.target_name().to_string())
            .collect();
        targets.sort();
        targets
    }

    /// Runs the generation pipeline: filter, sort, validate, then render.
    ///
    /// Invalid proxies are dropped one by one; the call fails only when
    /// the options are unusable or nothing survives.
    pub fn generate(
        &self,
        proxies: &ProxyList,
        options: &GenerateOptions,
        validator: &ProxyValidator,
    ) -> Result<Vec<u8>> {
        if options.target.trim().is_empty() {
            return Err(Error::InvalidOptions("target is required".to_string()));
        }
        let generator = self
            .get(&options.target)
            .ok_or_else(|| Error::UnknownTarget(options.target.clone()))?;

        let mut selected = filter_remarks(
            proxies.to_vec(),
            &options.include_remarks,
            &options.exclude_remarks,
        );
        if options.sort {
            sort_by_remark(&mut selected);
        }

        if !generator.is_implemented() {
            return Err(Error::NotSupported {
                what: format!("target '{}'", generator.target_name()),
            });
        }

        let mut valid = Vec::with_capacity(selected.len());
        let mut failures = Vec::new();
        for proxy in selected {
            match generator
                .validate(&proxy)
                .and_then(|_| validator.validate(&proxy))
            {
                Ok(()) => valid.push(proxy),
                Err(error) => {
                    warn!("Dropping proxy for {}: {}", generator.target_name(), error);
                    failures.push(LinkFailure {
                        link: proxy.display_name(),
                        error,
                    });
                }
            }
        }

        if valid.is_empty() {
            return Err(Error::EmptyResult {
                context: format!("no valid proxies for target '{}'", generator.target_name()),
                failures,
            });
        }

        debug!(
            "Generating {} with {} proxies ({} dropped)",
            generator.target_name(),
            valid.len(),
            failures.len()
        );
        let output = generator.generate(&valid, options)?;
        info!(
            "Generated {} bytes of {} output",
            output.len(),
            generator.target_name()
        );
        Ok(output)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        GeneratorRegistry::with_builtin_generators()
    }
}
