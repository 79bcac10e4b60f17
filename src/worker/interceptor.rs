//! The three lifecycle handlers: install, activate and fetch.

use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheLayer, CacheResult, CacheStorage};
use crate::config::WorkerConfig;
use crate::net::{Network, Request, Response};

use super::route::{classify, Route};

/// What the fetch handler did with a request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
  /// Not intercepted; the caller applies its default handling
  Passthrough,
  /// A response, tagged with where it came from
  Response(CacheResult<Response>),
  /// The network failed and the bucket had no entry
  Miss,
}

impl FetchOutcome {
  pub fn into_response(self) -> Option<Response> {
    match self {
      Self::Response(result) => Some(result.data),
      _ => None,
    }
  }
}

/// Request interceptor with one current cache bucket.
///
/// Wraps a network client and a storage backend; the only state shared
/// between handler invocations lives in the storage.
pub struct CacheInterceptor<S: CacheStorage, N: Network> {
  config: WorkerConfig,
  cache: CacheLayer<S>,
  network: N,
}

impl<S: CacheStorage, N: Network> CacheInterceptor<S, N> {
  pub fn new(config: WorkerConfig, storage: Arc<S>, network: N) -> Self {
    let cache = CacheLayer::new(storage, config.cache_name.clone());

    Self {
      config,
      cache,
      network,
    }
  }

  pub fn config(&self) -> &WorkerConfig {
    &self.config
  }

  pub fn storage(&self) -> &S {
    self.cache.storage()
  }

  pub fn network(&self) -> &N {
    &self.network
  }

  /// Pre-cache every static asset into the current bucket.
  ///
  /// All assets are fetched before anything is written. A transport error
  /// or a non-2xx status on any of them fails the install and leaves the
  /// storage untouched.
  pub async fn handle_install(&self) -> Result<()> {
    info!(
      bucket = %self.config.cache_name,
      assets = self.config.static_assets.len(),
      "install: pre-caching static assets"
    );

    let fetches = self.config.static_assets.iter().map(|url| async move {
      let request = Request::get(url.clone());
      let response = self
        .network
        .fetch(&request)
        .await
        .map_err(|e| eyre!("Install failed: {}", e))?;

      if !response.is_ok() {
        return Err(eyre!(
          "Install failed: {} returned status {}",
          url,
          response.status
        ));
      }

      Ok::<_, color_eyre::Report>((request, response))
    });

    let entries = try_join_all(fetches).await?;
    self.cache.store_all(&entries)?;

    info!(bucket = %self.config.cache_name, "install: complete");
    Ok(())
  }

  /// Delete every bucket other than the current one.
  ///
  /// Returns the names that were actually removed. A bucket that vanished
  /// in the meantime is skipped silently.
  pub async fn handle_activate(&self) -> Result<Vec<String>> {
    let storage = self.cache.storage();
    let mut deleted = Vec::new();

    for name in storage.bucket_names()? {
      if name == self.config.cache_name {
        continue;
      }
      if storage.delete_bucket(&name)? {
        info!(bucket = %name, "activate: deleted stale bucket");
        deleted.push(name);
      }
    }

    Ok(deleted)
  }

  /// Route one request through the matching strategy.
  ///
  /// - non-GET: `Passthrough`, no cache or network access
  /// - static: cache-first; a network failure on a miss is an error
  /// - dynamic: network-first, never cached; network failure falls back to
  ///   the bucket and yields `Miss` when nothing is there
  pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome> {
    let route = classify(request);
    debug!(method = %request.method, url = %request.url, ?route, "fetch");

    match route {
      Route::Bypass => Ok(FetchOutcome::Passthrough),
      Route::Static => {
        let result = self
          .cache
          .cache_first(request, || self.network.fetch(request))
          .await?;
        Ok(FetchOutcome::Response(result))
      }
      Route::Dynamic => {
        let result = self
          .cache
          .network_first(request, || self.network.fetch(request))
          .await?;
        Ok(result.map_or(FetchOutcome::Miss, FetchOutcome::Response))
      }
    }
  }
}
