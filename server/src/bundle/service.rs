//! BundleService trait definition

use std::path::Path;

use async_trait::async_trait;

use super::types::{BundleError, DisplayListing, FileDescriptor, PanelRequest};

/// Trait for resolving requests against an output bundle
#[async_trait]
pub trait BundleService: Send + Sync {
    /// Root directory all lookups are confined to
    fn output_root(&self) -> &Path;

    /// Resolve a path relative to the output root
    async fn resolve_static(&self, relative_path: &str) -> Result<FileDescriptor, BundleError>;

    /// Resolve a panel image of a display
    async fn resolve_panel(&self, request: &PanelRequest) -> Result<FileDescriptor, BundleError>;

    /// List displays that carry a `displayInfo.json`
    async fn list_displays(&self) -> Result<DisplayListing, BundleError>;

    /// Check if the `displays/` directory exists
    async fn displays_dir_exists(&self) -> bool;
}
