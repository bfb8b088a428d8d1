//! Offline site maintenance: the manifest, the consistency checker and the
//! batch rewriter.

mod check;
mod manifest;
mod rewrite;

pub use check::{format_report, run_check};
pub use manifest::Manifest;
pub use rewrite::{list_jobs, run_rewrite};
