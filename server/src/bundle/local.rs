//! Local bundle service reading straight from the filesystem

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use tracing::{debug, error, warn};

use super::mime::{panel_content_type, static_content_type};
use super::service::BundleService;
use super::types::{BundleError, DisplayEntry, DisplayListing, FileDescriptor, PanelRequest};

/// Directory under the output root holding one subdirectory per display
pub const DISPLAYS_DIR: &str = "displays";

/// Marker file that makes a subdirectory of `displays/` a display
pub const DISPLAY_INFO_FILE: &str = "displayInfo.json";

/// Directory inside a display holding its panels
const PANELS_DIR: &str = "panels";

/// Immutable resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Output bundle directory
    pub output_root: PathBuf,
}

impl ResolverConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }
}

/// Bundle service backed by a directory on disk
#[derive(Debug, Clone)]
pub struct LocalBundleService {
    output_root: PathBuf,
}

impl LocalBundleService {
    /// Create a new local bundle service.
    ///
    /// The output root does not have to exist yet; every lookup probes the
    /// filesystem at request time.
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            output_root: config.output_root.clone(),
        }
    }

    fn displays_dir(&self) -> PathBuf {
        self.output_root.join(DISPLAYS_DIR)
    }

    /// Read a confined file, mapping absence (including races where the file
    /// vanishes after the metadata probe) to `NotFound`.
    ///
    /// Only a file that passed the metadata probe can produce `ReadFault`;
    /// names the filesystem rejects outright (too long, NUL bytes) never exist.
    async fn read_file(&self, path: &Path, resource: &str) -> Result<Bytes, BundleError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!("Not a regular file: {:?}", path);
                return Err(BundleError::NotFound(resource.to_string()));
            }
            Err(e) => {
                debug!("No file at {:?}: {}", path, e);
                return Err(BundleError::NotFound(resource.to_string()));
            }
        }

        tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| io_failure(e, path, resource))
    }
}

#[async_trait]
impl BundleService for LocalBundleService {
    fn output_root(&self) -> &Path {
        &self.output_root
    }

    async fn resolve_static(&self, relative_path: &str) -> Result<FileDescriptor, BundleError> {
        let path = confine(&self.output_root, Path::new(relative_path)).ok_or_else(|| {
            warn!("Rejected static path outside output root: {:?}", relative_path);
            BundleError::TraversalRejected(relative_path.to_string())
        })?;
        debug!("Static request {:?} -> {:?}", relative_path, path);

        let bytes = self.read_file(&path, relative_path).await?;
        let content_type = static_content_type(path.extension().and_then(|e| e.to_str()));

        Ok(FileDescriptor {
            path,
            bytes,
            content_type,
        })
    }

    async fn resolve_panel(&self, request: &PanelRequest) -> Result<FileDescriptor, BundleError> {
        let start = Instant::now();
        counter!("bundle_panel_requests_total").increment(1);

        let relative = Path::new(DISPLAYS_DIR)
            .join(&request.display)
            .join(PANELS_DIR)
            .join(request.file_name());

        let result = match confine(&self.output_root, &relative) {
            Some(path) => {
                debug!("Panel request {} -> {:?}", request.label(), path);
                self.read_file(&path, &request.label())
                    .await
                    .map(|bytes| FileDescriptor {
                        path,
                        bytes,
                        content_type: panel_content_type(request.extension()),
                    })
            }
            None => {
                warn!("Rejected panel path outside output root: {}", request.label());
                Err(BundleError::TraversalRejected(request.label()))
            }
        };

        histogram!("bundle_panel_duration_seconds").record(start.elapsed());
        if matches!(&result, Err(e) if e.is_not_found()) {
            counter!("bundle_panel_not_found_total").increment(1);
        }

        result
    }

    async fn list_displays(&self) -> Result<DisplayListing, BundleError> {
        let displays_dir = self.displays_dir();

        let mut entries = match tokio::fs::read_dir(&displays_dir).await {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                debug!("Displays directory does not exist: {:?}", displays_dir);
                return Ok(DisplayListing::absent());
            }
            Err(e) => return Err(io_failure(e, &displays_dir, DISPLAYS_DIR)),
        };

        let mut displays = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(io_failure(e, &displays_dir, DISPLAYS_DIR)),
            };

            let path = entry.path();
            // Follows symlinks, like the existence probe below
            let is_dir = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping display with non UTF-8 name: {:?}", path);
                continue;
            };

            if tokio::fs::try_exists(path.join(DISPLAY_INFO_FILE))
                .await
                .unwrap_or(false)
            {
                debug!("Found display '{}' at {:?}", name, path);
                displays.push(DisplayEntry {
                    path: format!("{}/{}", DISPLAYS_DIR, name),
                    name,
                });
            } else {
                debug!("Skipping '{}': no {}", name, DISPLAY_INFO_FILE);
            }
        }

        displays.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(DisplayListing {
            displays,
            directory_present: true,
        })
    }

    async fn displays_dir_exists(&self) -> bool {
        tokio::fs::metadata(self.displays_dir())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

/// Join `relative` onto `root`, resolving `.` and `..` lexically.
///
/// Returns `None` when the path is absolute or climbs above `root`.
fn confine(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let mut path = root.to_path_buf();
    path.extend(parts);
    Some(path)
}

/// Classify an I/O error: absence is `NotFound`, anything else is a read fault
fn io_failure(e: std::io::Error, path: &Path, resource: &str) -> BundleError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::IsADirectory => {
            debug!("Not found: {:?}", path);
            BundleError::NotFound(resource.to_string())
        }
        _ => {
            error!("Failed to read {:?}: {}", path, e);
            counter!("bundle_read_faults_total").increment(1);
            BundleError::ReadFault {
                resource: resource.to_string(),
                source: e,
            }
        }
    }
}
