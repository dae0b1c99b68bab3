//! kubectl binary resolution
//!
//! This module provides:
//! - A per-user cache keyed by cluster version
//! - Streaming downloads with progress reporting
//! - Per-version locking and atomic installs
//! - Fallback to a kubectl found on PATH

mod cache;
mod lock;
mod platform;
mod transport;


pub use cache::{BinaryResolver, Resolution, ResolverConfig, DEFAULT_BINARY_NAME, DEFAULT_URL_TEMPLATE};
pub use lock::CacheLock;
pub use platform::Platform;
pub use transport::{Download, DownloadProgress, HttpTransport, NoProgress, Transport, TransportError};
