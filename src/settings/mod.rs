pub mod config;

pub use config::{RulesetConfig, Settings};
