//! Clean URL resolution module
//!
//! Maps request paths without an extension (`/about`) onto page files
//! (`/about.html`). The resolver never fails: when nothing applies, the path
//! is handed to the static file layer unchanged and that layer decides
//! between content and 404.

use std::collections::HashSet;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;

use crate::config::{CleanUrlConfig, ResolveStrategy};

/// Resolves clean URLs to page paths using a single configured strategy
#[derive(Debug, Clone)]
pub struct CleanUrlResolver {
    strategy: ResolveStrategy,
    default_document: String,
    suffix: String,
    aliases: HashSet<String>,
    root: PathBuf,
}

impl CleanUrlResolver {
    /// Create a resolver probing below `root` (only used by the probe strategy)
    pub fn new(config: &CleanUrlConfig, root: PathBuf) -> Self {
        Self {
            strategy: config.strategy,
            default_document: config.default_document.clone(),
            suffix: config.suffix.clone(),
            aliases: config.aliases.iter().cloned().collect(),
            root,
        }
    }

    pub const fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Resolve a decoded request path (no query string) to the path to serve.
    ///
    /// The result always starts with `/` and is never empty.
    pub fn resolve(&self, request_path: &str) -> String {
        let name = request_path.strip_prefix('/').unwrap_or(request_path);

        if name.is_empty() || name == "/" {
            return format!("/{}", self.default_document);
        }

        let with_suffix = match self.strategy {
            ResolveStrategy::AllowList => self.aliases.contains(name),
            ResolveStrategy::Probe => !name.contains('.') && self.suffixed_file_exists(name),
        };

        if with_suffix {
            format!("/{name}{}", self.suffix)
        } else {
            format!("/{name}")
        }
    }

    fn suffixed_file_exists(&self, name: &str) -> bool {
        // `//etc/x` leaves an absolute name, which `join` would honor
        if name.starts_with('/') {
            return false;
        }
        self.root.join(format!("{name}{}", self.suffix)).is_file()
    }
}

/// Percent-decode the path component of a request URI.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; the file
/// lookup then simply fails with 404.
pub fn decode_request_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(strategy: ResolveStrategy, aliases: &[&str]) -> CleanUrlConfig {
        CleanUrlConfig {
            strategy,
            default_document: "index.html".to_string(),
            suffix: ".html".to_string(),
            aliases: aliases.iter().map(ToString::to_string).collect(),
        }
    }

    fn site_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, "<html></html>").unwrap();
        }
        dir
    }

    #[test]
    fn test_root_resolves_to_default_document() {
        let site = site_with(&[]);
        for strategy in [ResolveStrategy::Probe, ResolveStrategy::AllowList] {
            let resolver = CleanUrlResolver::new(&config(strategy, &[]), site.path().to_path_buf());
            assert_eq!(resolver.resolve("/"), "/index.html");
            assert_eq!(resolver.resolve(""), "/index.html");
            assert_eq!(resolver.resolve("//"), "/index.html");
        }
    }

    #[test]
    fn test_custom_default_document() {
        let site = site_with(&[]);
        let mut cfg = config(ResolveStrategy::Probe, &[]);
        cfg.default_document = "home.htm".to_string();
        let resolver = CleanUrlResolver::new(&cfg, site.path().to_path_buf());
        assert_eq!(resolver.resolve("/"), "/home.htm");
    }

    #[test]
    fn test_probe_appends_suffix_when_file_exists() {
        let site = site_with(&["about.html", "blog/post.html"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );
        assert_eq!(resolver.resolve("/about"), "/about.html");
        assert_eq!(resolver.resolve("/blog/post"), "/blog/post.html");
    }

    #[test]
    fn test_probe_leaves_unknown_paths_unchanged() {
        let site = site_with(&["about.html"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );
        assert_eq!(resolver.resolve("/unknown-page"), "/unknown-page");
        assert_eq!(resolver.resolve("/about.html"), "/about.html");
        assert_eq!(resolver.resolve("/assets/css/style.css"), "/assets/css/style.css");
    }

    #[test]
    fn test_probe_skips_paths_with_a_dot() {
        // `v1.2.html` exists, but `v1.2` already looks like it has an extension
        let site = site_with(&["v1.2.html"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );
        assert_eq!(resolver.resolve("/v1.2"), "/v1.2");
    }

    #[test]
    fn test_probe_ignores_directories_named_like_pages() {
        let site = site_with(&["gallery.html/keep"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );
        assert_eq!(resolver.resolve("/gallery"), "/gallery");
    }

    #[test]
    fn test_allow_list_ignores_disk() {
        let site = site_with(&["contact.html"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::AllowList, &["spectacles", "spectacle-antigone"]),
            site.path().to_path_buf(),
        );
        // Listed but absent on disk: suffix still appended
        assert_eq!(resolver.resolve("/spectacles"), "/spectacles.html");
        assert_eq!(
            resolver.resolve("/spectacle-antigone"),
            "/spectacle-antigone.html"
        );
        // On disk but not listed: left alone
        assert_eq!(resolver.resolve("/contact"), "/contact");
        // Exact match only
        assert_eq!(resolver.resolve("/spectacles/"), "/spectacles/");
    }

    #[test]
    fn test_suffix_lookup_stays_below_root() {
        let site = site_with(&[]);
        let outside = tempfile::Builder::new().prefix("outside").tempdir().unwrap();
        fs::write(outside.path().join("secret.html"), "<html></html>").unwrap();
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );

        let request = format!("/{}", outside.path().join("secret").display());
        assert_eq!(resolver.resolve(&request), request);
    }

    #[test]
    fn test_path_without_leading_slash() {
        let site = site_with(&["about.html"]);
        let resolver = CleanUrlResolver::new(
            &config(ResolveStrategy::Probe, &[]),
            site.path().to_path_buf(),
        );
        assert_eq!(resolver.resolve("about"), "/about.html");
    }

    #[test]
    fn test_decode_request_path() {
        assert_eq!(decode_request_path("/caf%C3%A9"), "/café");
        assert_eq!(decode_request_path("/a%20b"), "/a b");
        assert_eq!(decode_request_path("/plain"), "/plain");
        assert_eq!(decode_request_path("/bad%FF"), "/bad\u{FFFD}");
    }
}
