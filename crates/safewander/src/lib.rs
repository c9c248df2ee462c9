//! `safewander` - client library for the SafeWander travel-review service
//!
//! Fetches places and reviews from the backend with timeouts and retries,
//! reshapes its loosely typed records into one view model, and degrades to
//! a local cache or built-in samples when the backend is unreachable.
//! Reviews that cannot be delivered wait in a local outbox.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod map;
pub mod model;
pub mod reshape;
pub mod service;
pub mod upload;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use service::{SafeWander, Sourced, SubmitOutcome};
