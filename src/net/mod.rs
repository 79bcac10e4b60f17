//! Request/response types and the network seam.

mod client;
mod types;

pub use client::{HttpClient, Network};
pub use types::{Request, Response};
