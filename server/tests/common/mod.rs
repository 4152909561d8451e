//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use bundle_server::bundle::{DisplayListing, FileDescriptor};
use bundle_server::{
    BundleAppState, BundleError, BundleService, LocalBundleService, PanelRequest, ResolverConfig,
    bundle_routes,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use tower_http::cors::{Any, CorsLayer};

/// Output bundle on disk with a sibling directory for out-of-tree files
pub struct TestBundle {
    temp: TempDir,
    root: PathBuf,
}

impl TestBundle {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("output");
        fs::create_dir_all(&root).unwrap();
        Self { temp, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        write_file(&self.root.join(relative), contents);
    }

    pub fn write_outside(&self, relative: &str, contents: &[u8]) {
        write_file(&self.temp.path().join(relative), contents);
    }

    pub fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.root.join(relative)).unwrap();
    }

    /// Router serving this bundle, layered like the binary
    pub fn app(&self) -> Router {
        create_test_app(Arc::new(LocalBundleService::new(&ResolverConfig::new(
            &self.root,
        ))))
    }

    /// Issue a GET and return status, content type and body
    pub async fn get(&self, uri: &str) -> TestResponse {
        send(self.app(), Method::GET, uri).await
    }

    /// Issue a request with an arbitrary method
    pub async fn request(&self, method: Method, uri: &str) -> TestResponse {
        send(self.app(), method, uri).await
    }
}

/// Router around any bundle service, with the binary's CORS layer
pub fn create_test_app(bundle_service: Arc<dyn BundleService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    bundle_routes(BundleAppState { bundle_service }).layer(cors)
}

/// Send one request through `app` and collect the response
pub async fn send(app: Router, method: Method, uri: &str) -> TestResponse {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    TestResponse::from_response(response).await
}

/// Bundle service whose files all exist but cannot be read
pub struct UnreadableBundleService;

impl UnreadableBundleService {
    fn fault(resource: &str) -> BundleError {
        BundleError::ReadFault {
            resource: resource.to_string(),
            source: std::io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
        }
    }
}

#[async_trait]
impl BundleService for UnreadableBundleService {
    fn output_root(&self) -> &Path {
        Path::new("/srv/unreadable")
    }

    async fn resolve_static(&self, relative_path: &str) -> Result<FileDescriptor, BundleError> {
        Err(Self::fault(relative_path))
    }

    async fn resolve_panel(&self, request: &PanelRequest) -> Result<FileDescriptor, BundleError> {
        Err(Self::fault(&request.label()))
    }

    async fn list_displays(&self) -> Result<DisplayListing, BundleError> {
        Err(Self::fault("displays"))
    }

    async fn displays_dir_exists(&self) -> bool {
        true
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Collected response parts
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn from_response(response: Response<Body>) -> Self {
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}
