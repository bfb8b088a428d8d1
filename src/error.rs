//! Error types for site operations
//!
//! Not-found pages and missing patterns are reported as status lines, not
//! errors. Everything here aborts the running command.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("site root {} is not accessible: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid pattern `{pattern}` in job `{job}`: {source}")]
    Pattern {
        job: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("job `{job}` references unknown fragment `{name}`")]
    UnknownFragment { job: String, name: String },

    #[error("unknown rewrite job `{0}`")]
    UnknownJob(String),
}

impl SiteError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
