//! Display Bundle Server Library
//!
//! This module exports the server components for use in integration tests
//! and external tooling.

pub mod bundle;
pub mod config;
mod test_utils;

// Re-export commonly used types
pub use bundle::{
    BundleAppState, BundleError, BundleService, LocalBundleService, PanelRequest, ResolverConfig,
    bundle_routes,
};
pub use config::Config;
