// jstage-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::HttpDownloader;
pub use validation::{validate_url, verify_checksum};
