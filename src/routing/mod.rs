//! Routing module
//!
//! Turns request paths into the paths the static file layer serves:
//! - Percent-decoding of the request path
//! - Clean URL resolution (default document, `.html` suffix)

mod clean_url;

pub use clean_url::{decode_request_path, CleanUrlResolver};
