//! Static file serving module
//!
//! Maps a resolved request path onto the site root, loads the file and
//! builds the response. Existence, MIME type and not-found handling all
//! live here; the clean URL resolver only rewrites the path.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, mime, Validators};
use crate::logger;

/// A file loaded from below the site root
#[derive(Debug)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content: Bytes,
    pub content_type: &'static str,
    pub modified: Option<SystemTime>,
}

/// Outcome of mapping a request path onto the site root
#[derive(Debug)]
pub enum Lookup {
    Found(StaticFile),
    /// Directory requested without trailing slash
    AddSlash,
    NotFound,
    Forbidden,
    Failed,
}

/// Serve the resolved path of a request
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match lookup(&state.root, ctx.resolved_path, &state.config.site.index_files).await {
        Lookup::Found(file) => {
            let validators = Validators::new(&file.content, file.modified);
            if validators.is_not_modified(ctx.if_none_match, ctx.if_modified_since) {
                return http::build_304_response(&validators);
            }
            http::build_file_response(file.content, file.content_type, &validators, ctx.is_head)
        }
        Lookup::AddSlash => http::build_redirect_response(&format!("{}/", ctx.raw_path)),
        Lookup::NotFound => serve_not_found(ctx, state).await,
        Lookup::Forbidden => http::build_403_response(ctx.is_head),
        Lookup::Failed => http::build_500_response(ctx.is_head),
    }
}

/// 404 with the site's own error page when one is configured and present
async fn serve_not_found(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(document) = &state.config.site.not_found_document {
        let path = format!("/{}", document.trim_start_matches('/'));
        if let Lookup::Found(page) = lookup(&state.root, &path, &[]).await {
            return http::build_404_page_response(page.content, ctx.is_head);
        }
        logger::log_debug(&format!("Not-found document '{document}' is unavailable"));
    }
    http::build_404_response(ctx.is_head)
}

/// Map `request_path` onto `root` (which must be canonical) and load the file.
///
/// Directories are served through `index_files` when requested with a
/// trailing slash. Paths escaping the root are reported as not found.
pub async fn lookup(root: &Path, request_path: &str, index_files: &[String]) -> Lookup {
    let relative = request_path.trim_start_matches('/');
    if !is_plain_relative(relative) {
        logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
        return Lookup::NotFound;
    }

    let mut file_path = root.join(relative);
    let mut metadata = match fs::metadata(&file_path).await {
        Ok(m) => m,
        Err(e) => return classify_missing(&e),
    };

    if metadata.is_dir() {
        if !relative.is_empty() && !request_path.ends_with('/') {
            return Lookup::AddSlash;
        }
        let Some((index_path, index_metadata)) = find_index_file(&file_path, index_files).await
        else {
            return Lookup::NotFound;
        };
        file_path = index_path;
        metadata = index_metadata;
    }

    // Symlinks may still point outside the root
    match fs::canonicalize(&file_path).await {
        Ok(canonical) if canonical.starts_with(root) => {}
        Ok(canonical) => {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                request_path,
                canonical.display()
            ));
            return Lookup::NotFound;
        }
        Err(e) => return classify_missing(&e),
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Lookup::Forbidden,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return Lookup::Failed;
        }
    };

    Lookup::Found(StaticFile {
        content_type: mime::content_type_for(&file_path),
        modified: metadata.modified().ok(),
        content: Bytes::from(content),
        path: file_path,
    })
}

async fn find_index_file(
    dir: &Path,
    index_files: &[String],
) -> Option<(PathBuf, std::fs::Metadata)> {
    for index_file in index_files {
        let candidate = dir.join(index_file);
        if let Ok(metadata) = fs::metadata(&candidate).await {
            if metadata.is_file() {
                return Some((candidate, metadata));
            }
        }
    }
    None
}

/// Only normal segments (and `.`) may appear in a served path
fn is_plain_relative(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn classify_missing(err: &io::Error) -> Lookup {
    if err.kind() == io::ErrorKind::PermissionDenied {
        Lookup::Forbidden
    } else {
        Lookup::NotFound
    }
}
