// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub clean_urls: CleanUrlConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Site layout: where pages live and how the tools find them
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory served by `serve` and edited by `rewrite`
    pub root: PathBuf,
    /// Manifest file, relative to `root` unless absolute
    pub manifest: PathBuf,
    /// Files tried when a directory is requested with a trailing slash
    pub index_files: Vec<String>,
    /// Page served as the body of 404 responses (relative to `root`)
    #[serde(default)]
    pub not_found_document: Option<String>,
}

impl SiteConfig {
    pub fn manifest_path(&self) -> PathBuf {
        if self.manifest.is_absolute() {
            self.manifest.clone()
        } else {
            self.root.join(&self.manifest)
        }
    }
}

/// How extensionless request paths are mapped to page files.
///
/// Only one strategy is active per server.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Append the suffix when `<path><suffix>` exists below the site root
    #[default]
    Probe,
    /// Append the suffix only for paths listed in `clean_urls.aliases`
    AllowList,
}

impl ResolveStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::AllowList => "allow_list",
        }
    }
}

/// Clean URL configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CleanUrlConfig {
    pub strategy: ResolveStrategy,
    pub default_document: String,
    pub suffix: String,
    /// Known extensionless page slugs (allow-list strategy only)
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
