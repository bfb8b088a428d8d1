//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, body size
//! check, clean URL resolution, static file serving and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::decode_request_path;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Path as sent by the client (still percent-encoded)
    pub raw_path: &'a str,
    /// Path after decoding and clean URL resolution
    pub resolved_path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Only the head is needed; release the body before any await point
    let (parts, body) = req.into_parts();
    drop(body);

    let (mut response, resolved_path) = route_request(&parts, &state).await;

    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if state.config.logging.access_log {
        log_access(&parts, &response, resolved_path, peer_addr, started, &state);
    }

    Ok(response)
}

async fn route_request(
    req: &Parts,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>) {
    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&req.method, state.config.http.enable_cors) {
        return (resp, None);
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(req, state.config.http.max_body_size) {
        return (resp, None);
    }

    // 3. Resolve clean URL
    let raw_path = req.uri.path();
    let decoded = decode_request_path(raw_path);
    let resolved = state.resolver.resolve(&decoded);
    if resolved != decoded {
        logger::log_debug(&format!("Resolved {decoded} -> {resolved}"));
    }

    // 4. Serve
    let headers = &req.headers;
    let ctx = RequestContext {
        raw_path,
        resolved_path: &resolved,
        is_head: req.method == Method::HEAD,
        if_none_match: headers.get("if-none-match").and_then(|v| v.to_str().ok()),
        if_modified_since: headers
            .get("if-modified-since")
            .and_then(|v| v.to_str().ok()),
    };

    let response = static_files::serve(&ctx, state).await;
    (response, Some(resolved))
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(req: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers.get("content-length")?;
    let size = content_length.to_str().ok()?.trim().parse::<u64>().ok()?;
    if size > max_body_size {
        logger::log_warning(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        return Some(http::build_413_response());
    }
    None
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    resolved_path: Option<String>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: &str| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    if let Some(resolved) = resolved_path {
        entry.resolved_path = resolved;
    }
    entry.http_version = match req.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
