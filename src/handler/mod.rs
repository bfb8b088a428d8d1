//! Request handler module
//!
//! Resolves clean URLs and serves files from the site root.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
