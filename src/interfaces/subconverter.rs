use std::time::Duration;

use log::{info, warn};

use crate::error::{Error, LinkFailure, Result};
use crate::generator::GeneratorRegistry;
use crate::models::{GenerateOptions, ProxyList, ProxyValidator};
use crate::parser::{LinkRegistry, SubscriptionDecoder};
use crate::utils::Fetcher;

/// The decode-then-generate pipeline with its registries wired in.
pub struct Subconverter {
    links: LinkRegistry,
    generators: GeneratorRegistry,
    validator: ProxyValidator,
}

impl Subconverter {
    pub fn new(links: LinkRegistry, generators: GeneratorRegistry, validator: ProxyValidator) -> Self {
        Subconverter {
            links,
            generators,
            validator,
        }
    }

    /// Built-in decoders and generators.
    pub fn with_defaults(strict: bool) -> Result<Self> {
        Ok(Subconverter::new(
            LinkRegistry::with_builtin_decoders(),
            GeneratorRegistry::with_builtin_generators(),
            ProxyValidator::new(strict)?,
        ))
    }

    pub fn validator(&self) -> &ProxyValidator {
        &self.validator
    }

    pub fn decode_subscription(&self, body: &[u8]) -> Result<ProxyList> {
        SubscriptionDecoder::new(&self.links).decode(body)
    }

    pub fn generate(&self, proxies: &ProxyList, options: &GenerateOptions) -> Result<Vec<u8>> {
        self.generate_with(proxies, options, &self.validator)
    }

    pub fn generate_with(
        &self,
        proxies: &ProxyList,
        options: &GenerateOptions,
        validator: &ProxyValidator,
    ) -> Result<Vec<u8>> {
        self.generators.generate(proxies, options, validator)
    }

    pub fn supported_targets(&self) -> Vec<String> {
        self.generators.supported_targets()
    }

    /// Output format of a target, e.g. `yaml`.
    pub fn output_format(&self, target: &str) -> Option<&'static str> {
        self.generators.get(target).map(|g| g.output_format())
    }

    pub fn convert_content(&self, body: &[u8], options: &GenerateOptions) -> Result<Vec<u8>> {
        let proxies = self.decode_subscription(body)?;
        self.generate(&proxies, options)
    }

    pub fn convert_url(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
        timeout: Duration,
        options: &GenerateOptions,
    ) -> Result<Vec<u8>> {
        self.convert_url_with(fetcher, url, timeout, options, &self.validator)
    }

    /// Fetches and decodes one or more `|`-separated subscription URLs,
    /// then generates a single document from everything that decoded.
    pub fn convert_url_with(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
        timeout: Duration,
        options: &GenerateOptions,
        validator: &ProxyValidator,
    ) -> Result<Vec<u8>> {
        if options.target.trim().is_empty() {
            return Err(Error::InvalidOptions("target is required".to_string()));
        }
        if self.generators.get(&options.target).is_none() {
            return Err(Error::UnknownTarget(options.target.clone()));
        }

        let sources: Vec<&str> = url
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if sources.is_empty() {
            return Err(Error::InvalidOptions("subscription url is required".to_string()));
        }

        let mut merged = ProxyList::new();
        let mut failures = Vec::new();
        for source in &sources {
            match fetcher
                .fetch(source, timeout)
                .and_then(|body| self.decode_subscription(&body))
            {
                Ok(proxies) => {
                    info!("Decoded {} proxies from {}", proxies.len(), source);
                    merged.extend(proxies);
                }
                Err(error) => {
                    warn!("Skipping subscription {}: {}", source, error);
                    failures.push(LinkFailure {
                        link: source.to_string(),
                        error,
                    });
                }
            }
        }

        if merged.is_empty() {
            if failures.len() == 1 {
                return Err(failures.remove(0).error);
            }
            return Err(Error::EmptyResult {
                context: format!("none of the {} subscription(s) yielded proxies", sources.len()),
                failures,
            });
        }

        self.generate_with(&merged, options, validator)
    }
}
