//! HTTP route handlers for the bundle API
//!
//! Routes are declared as a plain `(pattern, handler)` table and folded into
//! an axum `Router`; static assets are served by the router fallback.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::BundleService;
use super::types::{BundleError, DisplayEntry, FileDescriptor, PanelRequest};

/// Document served at `/`
const INDEX_FILE: &str = "index.html";

/// Application state containing the bundle service
#[derive(Clone)]
pub struct BundleAppState {
    pub bundle_service: Arc<dyn BundleService>,
}

/// Plain-text error response for the bundle API
#[derive(Debug)]
pub struct BundleErrorResponse {
    pub status: StatusCode,
    pub message: String,
}

impl BundleErrorResponse {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<BundleError> for BundleErrorResponse {
    fn from(e: BundleError) -> Self {
        let status = match &e {
            BundleError::NotFound(_) | BundleError::TraversalRejected(_) => StatusCode::NOT_FOUND,
            BundleError::ReadFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for BundleErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

/// Response for GET /api/displays
#[derive(Debug, Serialize, Deserialize)]
pub struct DisplaysResponse {
    pub displays: Vec<DisplayEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for GET /api/health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub output_dir: String,
    pub displays_dir_exists: bool,
}

fn file_response(file: FileDescriptor) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, file.content_type)],
        file.bytes,
    )
        .into_response()
}

/// GET / - Serve the bundle's index document
pub async fn index(State(state): State<BundleAppState>) -> Result<Response, BundleErrorResponse> {
    match state.bundle_service.resolve_static(INDEX_FILE).await {
        Ok(file) => Ok(file_response(file)),
        Err(e) if e.is_not_found() => {
            tracing::warn!(
                "No {} in {:?}",
                INDEX_FILE,
                state.bundle_service.output_root()
            );
            Err(BundleErrorResponse::not_found(format!(
                "{} not found in {}. Render the display bundle into this directory first.",
                INDEX_FILE,
                state.bundle_service.output_root().display()
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /<any path> - Serve a static asset relative to the output root
pub async fn serve_static(
    State(state): State<BundleAppState>,
    uri: Uri,
) -> Result<Response, BundleErrorResponse> {
    let raw = uri.path().trim_start_matches('/');
    let relative = urlencoding::decode(raw).map_err(|_| {
        tracing::debug!("Undecodable static path: {}", raw);
        BundleErrorResponse::from(BundleError::NotFound(raw.to_string()))
    })?;

    let file = state
        .bundle_service
        .resolve_static(&relative)
        .await
        .map_err(|e| {
            tracing::debug!("Static request failed for {}: {}", relative, e);
            BundleErrorResponse::from(e)
        })?;

    Ok(file_response(file))
}

/// GET /api/panels/:display/:panel - Serve a panel, `:panel` may end in `.<ext>`
pub async fn get_panel(
    State(state): State<BundleAppState>,
    Path((display, segment)): Path<(String, String)>,
) -> Result<Response, BundleErrorResponse> {
    let request = PanelRequest::from_segment(display, &segment);

    match state.bundle_service.resolve_panel(&request).await {
        Ok(file) => Ok(file_response(file)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("Panel not found: {}", request.label());
            Err(BundleErrorResponse::not_found(format!(
                "Panel not found: {}",
                request.label()
            )))
        }
        Err(e) => {
            tracing::error!("Failed to serve panel {}: {}", request.label(), e);
            Err(e.into())
        }
    }
}

/// GET /api/displays - List displays with a `displayInfo.json`
pub async fn list_displays(
    State(state): State<BundleAppState>,
) -> Result<Json<DisplaysResponse>, BundleErrorResponse> {
    let listing = state.bundle_service.list_displays().await.map_err(|e| {
        tracing::error!("Failed to list displays: {}", e);
        BundleErrorResponse::from(e)
    })?;

    if !listing.directory_present {
        return Ok(Json(DisplaysResponse {
            displays: Vec::new(),
            count: None,
            error: Some("Displays directory not found".to_string()),
        }));
    }

    let count = listing.displays.len();
    Ok(Json(DisplaysResponse {
        displays: listing.displays,
        count: Some(count),
        error: None,
    }))
}

/// GET /api/health - Report the output directory and whether it has displays
pub async fn health(State(state): State<BundleAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        output_dir: state.bundle_service.output_root().display().to_string(),
        displays_dir_exists: state.bundle_service.displays_dir_exists().await,
    })
}

/// Every named route of the bundle API
pub fn route_table() -> Vec<(&'static str, MethodRouter<BundleAppState>)> {
    vec![
        ("/", get(index)),
        ("/api/health", get(health)),
        ("/api/displays", get(list_displays)),
        ("/api/panels/:display/:panel", get(get_panel)),
    ]
}

/// Build bundle routes, with static assets as the fallback
pub fn bundle_routes(state: BundleAppState) -> Router {
    route_table()
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| {
            router.route(path, handler)
        })
        .fallback(get(serve_static))
        .with_state(state)
}
