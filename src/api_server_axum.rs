use crate::alerts;
use crate::export;
use crate::provider::MarketDataProvider;
use crate::scanner::aggregator;
use crate::scanner::config::ScanConfig;
use crate::scanner::models::ScanReport;
use crate::watchlist;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    /// Free text, comma or newline separated
    pub watchlist: Option<String>,
    pub tickers: Option<Vec<String>>,
    pub config: Option<ScanConfig>,
    /// Defaults to today's local date
    pub evaluation_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn err(error: impl ToString, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub has_report: bool,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn MarketDataProvider>,
    default_tickers: Arc<Vec<String>>,
    last_report: Arc<RwLock<Option<ScanReport>>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MarketDataProvider>, default_tickers: Vec<String>) -> Self {
        Self {
            provider,
            default_tickers: Arc::new(default_tickers),
            last_report: Arc::new(RwLock::new(None)),
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/health
async fn health(State(app_state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let start_time = Instant::now();
    let has_report = app_state.last_report.read().await.is_some();

    Json(ApiResponse::ok(
        HealthResponse {
            status: "ok".to_string(),
            provider: app_state.provider.name().to_string(),
            has_report,
        },
        start_time,
    ))
}

/// GET /api/config/defaults - Default scan thresholds
async fn config_defaults() -> Json<ApiResponse<ScanConfig>> {
    let start_time = Instant::now();
    let today = chrono::Local::now().date_naive();
    Json(ApiResponse::ok(ScanConfig::for_date(today), start_time))
}

/// POST /api/scan - Run the scanner and cache the report
async fn run_scan(
    State(app_state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> (StatusCode, Json<ApiResponse<ScanReport>>) {
    let start_time = Instant::now();

    // A config sent without a date deserializes to `NaiveDate::default()`
    let config_date = request
        .config
        .as_ref()
        .map(|c| c.evaluation_date)
        .filter(|d| *d != NaiveDate::default());
    let mut config = request.config.unwrap_or_default();
    config.evaluation_date = request
        .evaluation_date
        .or(config_date)
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    // Step 1: Resolve the watchlist
    let tickers = if let Some(tickers) = request.tickers.filter(|t| !t.is_empty()) {
        watchlist::parse_watchlist(&tickers.join(","))
    } else if let Some(text) = request.watchlist.filter(|t| !t.trim().is_empty()) {
        watchlist::parse_watchlist(&text)
    } else {
        app_state.default_tickers.as_ref().clone()
    };

    // Step 2: Scan
    match aggregator::aggregate(Arc::clone(&app_state.provider), &tickers, &config).await {
        Ok(report) => {
            info!(
                tickers = tickers.len(),
                signals = report.total_signals(),
                "api scan finished"
            );
            *app_state.last_report.write().await = Some(report.clone());
            (StatusCode::OK, Json(ApiResponse::ok(report, start_time)))
        }
        Err(e) => {
            let status = if e.is_skippable() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(ApiResponse::err(e, start_time)))
        }
    }
}

/// GET /api/export/{collection} - CSV of the last report
async fn export_collection(
    Path(collection): Path<String>,
    State(app_state): State<AppState>,
) -> Response {
    let start_time = Instant::now();
    let guard = app_state.last_report.read().await;
    let Some(report) = guard.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err("No scan has been run yet", start_time)),
        )
            .into_response();
    };

    let csv = match collection.as_str() {
        "breakouts" => export::to_csv(&report.breakouts),
        "covered-calls" => export::to_csv(&report.covered_calls),
        "put-spreads" => export::to_csv(&report.put_spreads),
        other => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::err(
                    format!("Unknown collection '{}'", other),
                    start_time,
                )),
            )
                .into_response();
        }
    };

    match csv {
        Ok(body) => ([(header::CONTENT_TYPE, "text/csv")], body).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::err(e, start_time)),
        )
            .into_response(),
    }
}

/// GET /api/summary - Plain-text summary of the last report
async fn summary(State(app_state): State<AppState>) -> Response {
    match app_state.last_report.read().await.as_ref() {
        Some(report) => alerts::build_summary(report).into_response(),
        None => (StatusCode::NOT_FOUND, "No scan has been run yet").into_response(),
    }
}

// -----------------------------------------------
// SERVER
// -----------------------------------------------

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/config/defaults", get(config_defaults))
        .route("/api/scan", post(run_scan))
        .route("/api/export/{collection}", get(export_collection))
        .route("/api/summary", get(summary))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16, app_state: AppState) -> Result<()> {
    let app = build_router(app_state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 Options Scanner API running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /api/health");
    println!("   GET  /api/config/defaults");
    println!("   POST /api/scan");
    println!("   GET  /api/export/{{breakouts|covered-calls|put-spreads}}");
    println!("   GET  /api/summary");
    println!();

    info!(%addr, "api server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
