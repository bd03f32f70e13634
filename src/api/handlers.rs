//! API request handlers
//!
//! Workbook processing is blocking file I/O, so every job runs on the
//! blocking pool and the handler only awaits its result.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::MergeResult;
use crate::runner::{self, ColumnsReport, ConsolidateReport, SplitReport};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "sheetmerge API Server".to_string(),
        version: state.version.clone(),
        description: "HTTP API for workbook consolidation and vendor splitting".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint(
                "/api/v1/consolidate",
                "POST",
                "Combine sheets and attach ordered quantities",
            ),
            endpoint("/api/v1/split", "POST", "Split a PO list by vendor"),
            endpoint("/api/v1/columns", "POST", "List the PO list header columns"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "consolidate".to_string(),
            "split".to_string(),
            "columns".to_string(),
        ],
    }))
}

/// Run `job` on the blocking pool and wrap its outcome.
///
/// Processing errors are the caller's fault (bad path, wrong layout) and map
/// to 422; a panicked job maps to 500.
async fn run_blocking<T, F>(job: F) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> MergeResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(data)) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Ok(Err(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::err(e.to_string())),
        ),
        Err(e) => {
            error!("worker task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Internal error while processing the request")),
            )
        }
    }
}

/// Consolidate request
#[derive(Debug, Deserialize)]
pub struct ConsolidateRequest {
    pub main_file: String,
    pub order_file: String,
    #[serde(default)]
    pub output_file: Option<String>,
}

/// POST /api/v1/consolidate - Combine sheets and attach ordered quantities
pub async fn consolidate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConsolidateRequest>,
) -> (StatusCode, Json<ApiResponse<ConsolidateReport>>) {
    let config = Arc::clone(&state.config);
    run_blocking(move || {
        let output = req.output_file.map(PathBuf::from);
        runner::run_consolidate(
            &PathBuf::from(&req.main_file),
            &PathBuf::from(&req.order_file),
            output.as_deref(),
            &config,
        )
    })
    .await
}

/// Split request
#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub input_file: String,
    #[serde(default)]
    pub vendor_column: Option<String>,
    #[serde(default)]
    pub model_year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// POST /api/v1/split - One workbook per vendor
pub async fn split(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SplitRequest>,
) -> (StatusCode, Json<ApiResponse<SplitReport>>) {
    let mut settings = state.config.split.clone();
    if let Some(year) = req.model_year {
        settings.model_year = year;
    }
    if let Some(month) = req.month {
        settings.month = month;
    }
    let output_dir = PathBuf::from(req.output_dir.unwrap_or_else(|| settings.output_dir.clone()));

    run_blocking(move || {
        runner::run_split(
            &PathBuf::from(&req.input_file),
            req.vendor_column.as_deref(),
            &output_dir,
            &settings,
            Local::now().date_naive(),
        )
    })
    .await
}

/// Columns request
#[derive(Debug, Deserialize)]
pub struct ColumnsRequest {
    pub input_file: String,
}

/// POST /api/v1/columns - PO list header columns
pub async fn columns(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ColumnsRequest>,
) -> (StatusCode, Json<ApiResponse<ColumnsReport>>) {
    let config = Arc::clone(&state.config);
    run_blocking(move || runner::inspect_columns(&PathBuf::from(&req.input_file), &config.split))
        .await
}
