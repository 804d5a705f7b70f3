//! HTTP surface for the extraction service.
//!
//! Exposes a liveness route, a health check, and the single
//! `POST /extract-audio` endpoint.

use crate::config::Settings;
use crate::error::LydtrekkError;
use crate::fetch::DriveFetcher;
use crate::pipeline::{ExtractionRequest, Extractor};
use crate::store;
use crate::transcode::{
    AudioFormat, FfmpegTranscoder, DEFAULT_BITRATE_K, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state.
pub struct AppState {
    pub extractor: Extractor,
}

/// Build the router with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/extract-audio", post(extract_audio))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until shutdown.
pub async fn run_serve(settings: Settings) -> anyhow::Result<()> {
    let fetcher = Arc::new(DriveFetcher::new(
        &settings.file_api_base,
        settings.file_api_token.clone(),
    )?);

    let store = store::from_settings(&settings)?;
    if store.is_none() {
        warn!("No storage bucket configured; extraction requests will fail until AUDIO_BUCKET is set");
    }

    let work_root = settings.work_root();
    std::fs::create_dir_all(&work_root)?;

    let extractor = Extractor::new(fetcher, Arc::new(FfmpegTranscoder), store, work_root);
    let state = Arc::new(AppState { extractor });

    let app = create_router(state);
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

/// Wire format of `POST /extract-audio`.
///
/// Numeric fields tolerate any JSON value: anything that isn't a positive
/// finite number falls back to the documented default instead of rejecting
/// the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExtractAudioRequest {
    file_id: Option<String>,
    format: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    sample_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    channels: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    bitrate_k: Option<f64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Accept any JSON value, keeping only positive finite numbers.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite() && *v > 0.0))
}

/// Truncate a lenient numeric option to `u32`, falling back to `default`
/// when absent or when truncation lands on zero.
fn numeric_or(value: Option<f64>, default: u32) -> u32 {
    value
        .map(|v| v as u32)
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn status_for(error: &LydtrekkError) -> StatusCode {
    match error {
        LydtrekkError::MissingFileId => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn index() -> &'static str {
    "lydtrekk audio extraction service\n"
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

async fn extract_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractAudioRequest>,
) -> impl IntoResponse {
    let request = ExtractionRequest {
        file_id: req.file_id.unwrap_or_default(),
        format: req
            .format
            .unwrap_or_else(|| AudioFormat::default().to_string()),
        sample_rate: numeric_or(req.sample_rate, DEFAULT_SAMPLE_RATE),
        channels: numeric_or(req.channels, DEFAULT_CHANNELS),
        bitrate_k: numeric_or(req.bitrate_k, DEFAULT_BITRATE_K),
    };

    match state.extractor.extract(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!("Extraction failed for {:?}: {}", request.file_id, e);
            (
                status_for(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
