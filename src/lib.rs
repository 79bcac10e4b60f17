//! Request-interception cache.
//!
//! Static assets are served cache-first from one named bucket, everything
//! else network-first with the bucket as an offline fallback. Install fills
//! the bucket, activate drops older generations.

pub mod cache;
pub mod config;
pub mod logging;
pub mod net;
pub mod worker;
