pub mod error;
pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod rulesets;
pub mod settings;
pub mod utils;
#[cfg(feature = "web-api")]
pub mod web_handlers;

pub use error::{Error, LinkFailure, Result};
pub use generator::{Generator, GeneratorRegistry};
pub use interfaces::Subconverter;
pub use models::{GenerateOptions, Proxy, ProxyList, ProxyType, ProxyValidator, TriBool};
pub use parser::{LinkDecoder, LinkRegistry, SubscriptionDecoder, SubscriptionFormat};
pub use settings::Settings;
