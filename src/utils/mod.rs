pub mod base64;
pub mod http_std;
pub mod url;

pub use http_std::{Fetcher, HttpFetcher, StaticFetcher};
pub use self::url::url_decode;
