//! Bundle module for serving a rendered display bundle
//!
//! This module provides:
//! - `BundleService` trait for abstracting bundle sources
//! - `LocalBundleService` for resolving requests against a directory
//! - Content type tables for panels and static assets
//! - HTTP routes for panels, display listing, health and static files

mod local;
pub mod mime;
pub mod routes;
mod service;
mod types;

pub use local::{DISPLAY_INFO_FILE, DISPLAYS_DIR, LocalBundleService, ResolverConfig};
pub use routes::{BundleAppState, bundle_routes};
pub use service::BundleService;
pub use types::{
    BundleError, DEFAULT_PANEL_EXTENSION, DisplayEntry, DisplayListing, FileDescriptor,
    PanelRequest,
};
