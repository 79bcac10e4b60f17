//! Drives the interceptor through install and activate before serving.

use color_eyre::Result;
use tracing::info;

use crate::cache::CacheStorage;
use crate::net::{Network, Request};

use super::interceptor::{CacheInterceptor, FetchOutcome};

/// What happened while bringing the worker up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartReport {
  /// Install ran during this start
  pub installed: bool,
  /// Stale buckets removed by activate
  pub deleted: Vec<String>,
}

/// An interceptor that has been installed and activated.
///
/// Fetches can only be served through this handle, so none run before
/// activation has finished.
pub struct ActiveWorker<S: CacheStorage, N: Network> {
  interceptor: CacheInterceptor<S, N>,
  report: StartReport,
}

impl<S: CacheStorage, N: Network> ActiveWorker<S, N> {
  /// Install (once per cache generation), then activate.
  ///
  /// Install runs when the current bucket does not exist yet. A failed
  /// install leaves no bucket behind, so the next start tries again.
  pub async fn start(interceptor: CacheInterceptor<S, N>) -> Result<Self> {
    let bucket = &interceptor.config().cache_name;

    let installed = if interceptor.storage().has_bucket(bucket)? {
      info!(bucket = %bucket, "already installed");
      false
    } else {
      interceptor.handle_install().await?;
      true
    };

    let deleted = interceptor.handle_activate().await?;
    info!(bucket = %bucket, removed = deleted.len(), "activated");

    Ok(Self {
      interceptor,
      report: StartReport { installed, deleted },
    })
  }

  pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome> {
    self.interceptor.handle_fetch(request).await
  }

  pub fn report(&self) -> &StartReport {
    &self.report
  }

  pub fn interceptor(&self) -> &CacheInterceptor<S, N> {
    &self.interceptor
  }
}
