//! Bundle-related types and error definitions

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension used when a panel request does not carry one
pub const DEFAULT_PANEL_EXTENSION: &str = "png";

/// Errors that can occur when resolving bundle resources
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("File not found: {0}")]
    NotFound(String),

    /// Same user-facing message as `NotFound` so the layout outside the
    /// output root is never revealed.
    #[error("File not found: {0}")]
    TraversalRejected(String),

    #[error("Failed to read {resource}")]
    ReadFault {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

impl BundleError {
    /// True for every variant the caller should see as absence
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::TraversalRejected(_))
    }
}

/// A resolved file ready to be streamed back to the client
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Location on disk (inside the output root)
    pub path: PathBuf,
    /// File contents
    pub bytes: Bytes,
    /// Content type to report
    pub content_type: &'static str,
}

/// Request for a single panel of a display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRequest {
    /// Display name, verbatim from the URL
    pub display: String,
    /// Opaque panel identifier
    pub panel_id: String,
    /// Explicit extension, `None` means the default
    pub extension: Option<String>,
}

impl PanelRequest {
    /// Request with the default extension
    pub fn new(display: impl Into<String>, panel_id: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            panel_id: panel_id.into(),
            extension: None,
        }
    }

    /// Request with an explicit extension
    pub fn with_extension(
        display: impl Into<String>,
        panel_id: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            display: display.into(),
            panel_id: panel_id.into(),
            extension: Some(extension.into()),
        }
    }

    /// Parse the last URL segment of a panel route.
    ///
    /// `3.jpg` becomes panel `3` with extension `jpg`; a segment without a
    /// usable `.<ext>` suffix (`3`, `.png`, `3.`) is taken whole as the panel id.
    pub fn from_segment(display: impl Into<String>, segment: &str) -> Self {
        match segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                Self::with_extension(display, stem, ext)
            }
            _ => Self::new(display, segment),
        }
    }

    /// Extension to resolve against
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_PANEL_EXTENSION)
    }

    /// File name under `panels/`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.panel_id, self.extension())
    }

    /// Human-readable name as the client asked for it
    pub fn label(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}/{}.{}", self.display, self.panel_id, ext),
            None => format!("{}/{}", self.display, self.panel_id),
        }
    }
}

/// One entry of the display listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    /// Directory name under `displays/`
    pub name: String,
    /// Path relative to the output root, always `/`-separated
    pub path: String,
}

/// Result of enumerating `displays/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayListing {
    /// Displays sorted by name
    pub displays: Vec<DisplayEntry>,
    /// Whether the `displays/` directory exists at all
    pub directory_present: bool,
}

impl DisplayListing {
    /// Listing for an output root without a `displays/` directory
    pub fn absent() -> Self {
        Self {
            displays: Vec::new(),
            directory_present: false,
        }
    }
}
