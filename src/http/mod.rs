//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! clean URL and file lookup logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used items
pub use cache::Validators;
pub use response::{
    build_304_response, build_403_response, build_404_page_response, build_404_response,
    build_405_response, build_413_response, build_500_response, build_file_response,
    build_options_response, build_redirect_response,
};
