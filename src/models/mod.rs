pub mod generate_options;
pub mod proxy;
pub mod proxy_list;
pub mod validator;

pub use generate_options::{ClashOptions, GenerateOptions, QuantumultXOptions, SurgeOptions};
pub use proxy::{
    Proxy, ProxyType, TriBool, HTTP_DEFAULT_GROUP, SOCKS_DEFAULT_GROUP, SSR_DEFAULT_GROUP,
    SS_DEFAULT_GROUP, TROJAN_DEFAULT_GROUP, UNKNOWN_DEFAULT_GROUP, V2RAY_DEFAULT_GROUP,
};
pub use proxy_list::ProxyList;
pub use validator::ProxyValidator;
