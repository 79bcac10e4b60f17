//! Request interception: routing, lifecycle handlers and the start-up driver.

mod interceptor;
mod lifecycle;
pub mod route;

pub use interceptor::{CacheInterceptor, FetchOutcome};
pub use lifecycle::{ActiveWorker, StartReport};
pub use route::{classify, Route};
