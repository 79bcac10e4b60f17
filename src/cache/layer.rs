//! Cache layer that orchestrates caching strategies with network fetching.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{CacheStorage, CachedResponse};
use super::traits::CacheResult;
use crate::net::{Request, Response};

/// Cache layer bound to one bucket.
///
/// This layer sits between the interceptor and the network client and
/// implements the two fetch strategies. All reads and writes target the
/// bucket it was created for.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  bucket: String,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer over `bucket` in the given storage backend.
  pub fn new(storage: Arc<S>, bucket: impl Into<String>) -> Self {
    Self {
      storage,
      bucket: bucket.into(),
    }
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Look up a request in the bucket.
  pub fn lookup(&self, request: &Request) -> Result<Option<CachedResponse>> {
    self.storage.match_request(&self.bucket, request)
  }

  /// Store a response for a request, opening the bucket if needed.
  pub fn store(&self, request: &Request, response: &Response) -> Result<()> {
    self.storage.put(&self.bucket, request, response)
  }

  /// Store a batch of responses atomically.
  pub fn store_all(&self, entries: &[(Request, Response)]) -> Result<()> {
    self.storage.put_all(&self.bucket, entries)
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - on a hit, return immediately without touching the network
  /// 2. On a miss, fetch from network; failures propagate
  /// 3. Store a clone of the response, return the original
  pub async fn cache_first<F, Fut>(
    &self,
    request: &Request,
    fetcher: F,
  ) -> Result<CacheResult<Response>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Response>>,
  {
    if let Some(cached) = self.lookup(request)? {
      debug!(url = %request.url, bucket = %self.bucket, "cache hit");
      return Ok(CacheResult::from_cache(cached.response, cached.cached_at));
    }

    debug!(url = %request.url, bucket = %self.bucket, "cache miss");
    let response = fetcher().await?;

    if response.is_storable() {
      // A failed write loses the entry but not the response
      if let Err(e) = self.store(request, &response) {
        warn!(url = %request.url, error = %e, "failed to cache response");
      }
    } else {
      debug!(url = %request.url, status = response.status, "response not storable");
    }

    Ok(CacheResult::from_network(response))
  }

  /// Fetch with network-first strategy.
  ///
  /// 1. Fetch from network - on success, return as-is (never stored)
  /// 2. On network failure, return the cached entry (offline mode)
  /// 3. `None` when the network failed and nothing is cached
  pub async fn network_first<F, Fut>(
    &self,
    request: &Request,
    fetcher: F,
  ) -> Result<Option<CacheResult<Response>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Response>>,
  {
    match fetcher().await {
      Ok(response) => Ok(Some(CacheResult::from_network(response))),
      Err(e) => {
        warn!(url = %request.url, error = %e, "network failed, falling back to cache");
        let cached = self.lookup(request)?;
        Ok(cached.map(|c| CacheResult::offline(c.response, c.cached_at)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, SqliteStorage};
  use color_eyre::eyre::eyre;
  use url::Url;

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(Arc::new(SqliteStorage::open_in_memory().unwrap()), "v1")
  }

  fn get(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
  }

  #[tokio::test]
  async fn cache_first_hit_skips_fetcher() {
    let layer = layer();
    let req = get("http://localhost:5000/static/css/main.css");
    layer.store(&req, &Response::new(200, "cached")).unwrap();

    let result = layer
      .cache_first(&req, || async { Err(eyre!("network must not be called")) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Cache);
    assert_eq!(result.data.body, b"cached");
    assert!(result.cached_at.is_some());
  }

  #[tokio::test]
  async fn cache_first_miss_stores_response() {
    let layer = layer();
    let req = get("http://localhost:5000/static/js/app.js");

    let result = layer
      .cache_first(&req, || async { Ok(Response::new(200, "fresh")) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(layer.lookup(&req).unwrap().unwrap().response.body, b"fresh");
  }

  #[tokio::test]
  async fn cache_first_skips_partial_content() {
    let layer = layer();
    let req = get("http://localhost:5000/static/video.mp4");

    let result = layer
      .cache_first(&req, || async { Ok(Response::new(206, "part")) })
      .await
      .unwrap();

    assert_eq!(result.data.status, 206);
    assert!(layer.lookup(&req).unwrap().is_none());
  }

  #[tokio::test]
  async fn cache_first_propagates_network_failure() {
    let layer = layer();
    let req = get("http://localhost:5000/static/missing.css");

    let result = layer
      .cache_first(&req, || async { Err(eyre!("offline")) })
      .await;

    assert!(result.is_err());
  }

  #[tokio::test]
  async fn network_first_falls_back_then_misses() {
    let layer = layer();
    let cached = get("http://localhost:5000/items");
    let uncached = get("http://localhost:5000/api/items");
    layer.store(&cached, &Response::new(200, "page")).unwrap();

    let hit = layer
      .network_first(&cached, || async { Err(eyre!("offline")) })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(hit.source, CacheSource::Offline);
    assert_eq!(hit.data.body, b"page");

    let miss = layer
      .network_first(&uncached, || async { Err(eyre!("offline")) })
      .await
      .unwrap();
    assert!(miss.is_none());
  }
}
