// Configuration module entry point
// Loads layered configuration and holds the per-process server state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    CleanUrlConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ResolveStrategy,
    ServerConfig, SiteConfig,
};

/// Default config file, looked up without requiring it to exist
pub const DEFAULT_CONFIG_FILE: &str = "sitekit.toml";

/// Command-line values that take precedence over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<String>,
    pub manifest: Option<String>,
    pub strategy: Option<ResolveStrategy>,
}

impl Config {
    /// Load configuration from specified file path
    ///
    /// Sources in increasing precedence: defaults, the config file (optional),
    /// `SITEKIT_*` environment variables, command-line overrides.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("site.root", ".")?
            .set_default("site.manifest", "site.toml")?
            .set_default("site.index_files", vec!["index.html"])?
            .set_default("clean_urls.strategy", ResolveStrategy::default().as_str())?
            .set_default("clean_urls.default_document", "index.html")?
            .set_default("clean_urls.suffix", ".html")?
            .set_default("clean_urls.aliases", Vec::<String>::new())?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 5)?
            .set_default(
                "http.server_name",
                concat!("sitekit/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SITEKIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("site.root", overrides.root.clone())?
            .set_override_option("site.manifest", overrides.manifest.clone())?
            .set_override_option(
                "clean_urls.strategy",
                overrides.strategy.map(ResolveStrategy::as_str),
            )?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(overrides: &Overrides) -> Config {
        Config::load_from("does-not-exist.toml", overrides).expect("defaults should deserialize")
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&Overrides::default());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.clean_urls.strategy, ResolveStrategy::Probe);
        assert_eq!(cfg.clean_urls.default_document, "index.html");
        assert_eq!(cfg.clean_urls.suffix, ".html");
        assert!(cfg.clean_urls.aliases.is_empty());
        assert_eq!(cfg.site.index_files, vec!["index.html".to_string()]);
        assert!(cfg.site.not_found_document.is_none());
        assert!(cfg.performance.max_connections.is_none());
        assert!(cfg.http.server_name.starts_with("sitekit/"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let cfg = load(&Overrides {
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            root: Some("public".to_string()),
            manifest: None,
            strategy: Some(ResolveStrategy::AllowList),
        });
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.site.root, std::path::PathBuf::from("public"));
        assert_eq!(cfg.clean_urls.strategy, ResolveStrategy::AllowList);
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitekit.toml");
        std::fs::write(
            &path,
            r#"
[clean_urls]
strategy = "allow_list"
aliases = ["spectacles", "about"]

[site]
not_found_document = "404.html"
"#,
        )
        .unwrap();

        let cfg = load_path(&path);
        assert_eq!(cfg.clean_urls.strategy, ResolveStrategy::AllowList);
        assert_eq!(cfg.clean_urls.aliases, vec!["spectacles", "about"]);
        assert_eq!(cfg.site.not_found_document.as_deref(), Some("404.html"));
        // Untouched keys keep their defaults
        assert_eq!(cfg.clean_urls.suffix, ".html");
    }

    #[test]
    fn test_manifest_path_relative_to_root() {
        let cfg = load(&Overrides {
            root: Some("site".to_string()),
            ..Overrides::default()
        });
        assert_eq!(
            cfg.site.manifest_path(),
            std::path::Path::new("site").join("site.toml")
        );
    }

    fn load_path(path: &std::path::Path) -> Config {
        Config::load_from(path.to_str().unwrap(), &Overrides::default()).unwrap()
    }
}
