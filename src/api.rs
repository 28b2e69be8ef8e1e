// src/api.rs
//! HTTP surface over the detector.
//!
//! - `GET  /health`                → `OK`
//! - `GET  /model`                 → published model info (503 before training)
//! - `POST /train`                 → corpus JSON; trains and publishes a new generation
//! - `POST /classify`              → `{"texts": [...]}` → `{"labels": [...], "generation": n}`
//! - `POST /classify/discussions`  → corpus JSON → same corpus with `insult` labels
//! - `GET  /explain?text=...`      → tokens and window features (no model needed)
//!
//! CPU-bound work (training, feature assembly) runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::classifier::{InsultDetector, ModelInfo};
use crate::discussion::{label_forest, parse_corpus_value, Discussion};
use crate::error::InsultError;
use crate::features::Analysis;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<InsultDetector>,
}

impl AppState {
    pub fn new(detector: InsultDetector) -> Self {
        Self {
            detector: Arc::new(detector),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/model", get(model_info))
        .route("/train", post(train))
        .route("/classify", post(classify))
        .route("/classify/discussions", post(classify_discussions))
        .route("/explain", get(explain))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors
---------------------------- */

pub struct ApiError(InsultError);

impl From<InsultError> for ApiError {
    fn from(e: InsultError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InsultError::Input(_) | InsultError::Json(_) => StatusCode::BAD_REQUEST,
            InsultError::Training(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InsultError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            InsultError::Classifier(_) | InsultError::Lexicon { .. } | InsultError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            warn!(target: "api", error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run CPU-bound detector work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(InsultError::Classifier(format!("worker failed: {e}"))))?
        .map_err(ApiError)
}

/* ----------------------------
Handlers
---------------------------- */

async fn model_info(State(state): State<AppState>) -> ApiResult<ModelInfo> {
    Ok(Json(state.detector.model_info()?))
}

async fn train(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<ModelInfo> {
    let corpus = parse_corpus_value(body)?;
    let detector = state.detector.clone();
    let info = blocking(move || detector.train_discussions(&corpus)).await?;
    info!(target: "api", generation = info.generation, samples = info.samples, "retrained");
    Ok(Json(info))
}

#[derive(Deserialize)]
struct ClassifyReq {
    texts: Vec<String>,
}

#[derive(Serialize)]
struct ClassifyResp {
    labels: Vec<bool>,
    generation: u64,
}

async fn classify(
    State(state): State<AppState>,
    Json(body): Json<ClassifyReq>,
) -> ApiResult<ClassifyResp> {
    let detector = state.detector.clone();
    let (labels, generation) =
        blocking(move || detector.classify_with_generation(&body.texts)).await?;
    Ok(Json(ClassifyResp { labels, generation }))
}

async fn classify_discussions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Vec<Discussion>> {
    let corpus = parse_corpus_value(body)?;
    let detector = state.detector.clone();
    // Fail before walking if there is no model, even for all-empty corpora.
    detector.current()?;
    let labeled = blocking(move || label_forest(&corpus, detector.as_ref())).await?;
    Ok(Json(labeled))
}

#[derive(Deserialize)]
struct ExplainQuery {
    #[serde(default)]
    text: String,
}

async fn explain(State(state): State<AppState>, Query(q): Query<ExplainQuery>) -> Json<Analysis> {
    Json(state.detector.explain(&q.text))
}
