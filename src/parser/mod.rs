pub mod deserialize;
pub mod explodes;
pub mod subparser;
pub mod types;
pub mod yaml;

pub use explodes::{LinkDecoder, LinkRegistry};
pub use subparser::SubscriptionDecoder;
pub use types::SubscriptionFormat;
