//! Request classification.

use crate::net::Request;

/// Path prefix served cache-first
const STATIC_PATH_PREFIX: &str = "/static/";

/// Host substrings served cache-first (CDN libraries, web fonts)
const STATIC_HOST_MARKERS: &[&str] = &["cdnjs", "fonts"];

/// How a request is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// Not intercepted at all (non-GET)
  Bypass,
  /// Cache-first
  Static,
  /// Network-first with cache fallback
  Dynamic,
}

/// Classify a request. First match wins.
pub fn classify(request: &Request) -> Route {
  if !request.is_get() {
    return Route::Bypass;
  }

  let url = &request.url;
  let host = url.host_str().unwrap_or_default();

  if url.path().starts_with(STATIC_PATH_PREFIX)
    || STATIC_HOST_MARKERS.iter().any(|marker| host.contains(marker))
  {
    Route::Static
  } else {
    Route::Dynamic
  }
}
