use axum::{Router, http::HeaderValue, response::IntoResponse, routing::get};
use bundle_server::bundle::{BundleAppState, DISPLAYS_DIR, LocalBundleService, bundle_routes};
use bundle_server::config::{Config, CorsConfig};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus metrics handle for exposing metrics in Prometheus format
static PROMETHEUS_HANDLE: std::sync::OnceLock<PrometheusHandle> = std::sync::OnceLock::new();

/// Endpoint to expose metrics in Prometheus format
async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Log what the bundle looks like at startup. Missing pieces are warnings,
/// the server still starts and probes the filesystem per request.
fn check_output_dir(output_dir: &Path) {
    if !output_dir.is_dir() {
        warn!(
            "Output directory {:?} does not exist - render a display bundle into it",
            output_dir
        );
        return;
    }
    if !output_dir.join("index.html").is_file() {
        warn!("No index.html in {:?} - / will return 404", output_dir);
    }
    if !output_dir.join(DISPLAYS_DIR).is_dir() {
        warn!(
            "No {} directory in {:?} - no displays will be listed",
            DISPLAYS_DIR, output_dir
        );
    }
}

fn build_cors(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bundle_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;
    PROMETHEUS_HANDLE.set(prometheus_handle).ok();

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        "Loaded configuration: host={}, port={}, output_dir={:?}",
        config.host, config.port, config.output_dir
    );

    check_output_dir(&config.output_dir);

    let bundle_service = LocalBundleService::new(&config.resolver());
    let bundle_state = BundleAppState {
        bundle_service: Arc::new(bundle_service),
    };

    let app = Router::new()
        .route("/metrics/prometheus", get(prometheus_metrics))
        .merge(bundle_routes(bundle_state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config.cors));

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Serving display bundle from {:?}", config.output_dir);
    info!("Bundle server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
