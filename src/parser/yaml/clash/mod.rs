mod parsers;
mod proxy_types;

pub use parsers::{parse_clash_yaml, ClashParseOutput};
pub use proxy_types::ClashProxyYamlInput;
