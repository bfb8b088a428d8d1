// Application state module
// Read-only state shared by every connection of the dev server

use std::path::PathBuf;

use super::types::{Config, ResolveStrategy};
use crate::error::SiteError;
use crate::logger;
use crate::routing::CleanUrlResolver;
use crate::site::Manifest;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical site root, every served file must live below it
    pub root: PathBuf,
    pub resolver: CleanUrlResolver,
}

impl AppState {
    /// Build the server state, canonicalizing the site root.
    ///
    /// With the allow-list strategy and no configured aliases, the alias list
    /// comes from the manifest pages so the page list lives in one place.
    pub fn new(config: Config) -> Result<Self, SiteError> {
        let root = config
            .site
            .root
            .canonicalize()
            .map_err(|source| SiteError::Root {
                path: config.site.root.clone(),
                source,
            })?;

        let mut clean_urls = config.clean_urls.clone();
        if clean_urls.strategy == ResolveStrategy::AllowList && clean_urls.aliases.is_empty() {
            let manifest_path = config.site.manifest_path();
            match Manifest::load(&manifest_path) {
                Ok(manifest) => {
                    clean_urls.aliases = manifest.page_slugs(&clean_urls.suffix);
                    logger::log_info(&format!(
                        "Alias list derived from {} ({} pages)",
                        manifest_path.display(),
                        clean_urls.aliases.len()
                    ));
                }
                Err(e) => {
                    logger::log_warning(&format!(
                        "Allow-list strategy without aliases and no usable manifest: {e}"
                    ));
                }
            }
        }

        let resolver = CleanUrlResolver::new(&clean_urls, root.clone());

        Ok(Self {
            config,
            root,
            resolver,
        })
    }
}
