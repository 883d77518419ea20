use std::fmt;

use thiserror::Error;

/// A single item that was dropped from a batch, kept so aggregate errors
/// can report every root cause.
#[derive(Debug)]
pub struct LinkFailure {
    pub link: String,
    pub error: Error,
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", abbreviate(&self.link), self.error)
    }
}

/// Errors produced while decoding subscriptions or generating documents.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported scheme in link '{}'", abbreviate(.link))]
    UnsupportedScheme { link: String },

    #[error("malformed payload in link '{}': {reason}", abbreviate(.link))]
    MalformedPayload { link: String, reason: String },

    #[error("link '{}' is missing required field '{field}'", abbreviate(.link))]
    MissingRequiredField { link: String, field: &'static str },

    #[error("invalid proxy '{name}': {reason}")]
    InvalidProxy { name: String, reason: String },

    #[error("target '{target}' does not support {proxy_type} proxies")]
    UnsupportedProxyForTarget { target: String, proxy_type: String },

    #[error("{context}{}", format_failures(.failures))]
    EmptyResult {
        context: String,
        failures: Vec<LinkFailure>,
    },

    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    #[error("unknown ruleset '{0}'")]
    UnknownRuleset(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("{what} is not supported yet")]
    NotSupported { what: String },

    #[error("failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("document error: {0}")]
    Document(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(link: &str, reason: impl Into<String>) -> Self {
        Error::MalformedPayload {
            link: link.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(link: &str, field: &'static str) -> Self {
        Error::MissingRequiredField {
            link: link.to_string(),
            field,
        }
    }

    /// True for errors caused by the caller rather than by the data.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownTarget(_) | Error::InvalidOptions(_) | Error::NotSupported { .. }
        )
    }
}

fn format_failures(failures: &[LinkFailure]) -> String {
    let mut out = String::new();
    for failure in failures {
        out.push_str("\n  - ");
        out.push_str(&failure.to_string());
    }
    out
}

// Links can carry long base64 blobs; keep messages readable.
fn abbreviate(link: &str) -> String {
    const MAX: usize = 64;
    if link.chars().count() <= MAX {
        return link.to_string();
    }
    let head: String = link.chars().take(MAX).collect();
    format!("{}...", head)
}
