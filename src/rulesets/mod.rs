pub mod ruleset;

pub use ruleset::{ConfiguredRulesets, InMemoryRulesets, RulesetProvider};
