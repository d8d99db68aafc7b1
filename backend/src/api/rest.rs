// =============================================================================
// REST API Endpoints: Axum 0.8
// =============================================================================
//
// All endpoints live under `/api/v1/`. Analysis endpoints are public; the
// journal, the threshold controls and the WebSocket feed require the bearer
// token checked by `AuthBearer`.
//
// CORS is configured permissively for the dashboard; tighten
// `allow_origin` in production.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::NoAnalysis;
use crate::api::auth::AuthBearer;
use crate::app_state::{AppState, Thresholds};
use crate::decision::{ClassifierStatus, Decision, FeatureVector};
use crate::market_data::FetchOutcome;
use crate::market_hours::is_market_open;
use crate::runtime_config::SymbolEntry;
use crate::scanner::analyze_and_record;
use crate::signals::SignalReport;

const DEFAULT_RECORD_LIMIT: usize = 100;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/analyze/{symbol}", get(analyze))
        .route("/api/v1/signals/{symbol}", get(signals))
        .route("/api/v1/latest", get(latest))
        .route("/api/v1/predict", post(predict))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/records", get(records))
        .route("/api/v1/thresholds", get(get_thresholds).post(set_thresholds))
        // ── WebSocket (handled in the ws module but mounted here) ───
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// JSON error body `{"error": "..."}` with a status code.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn symbol_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Symbol not found")
    }

    fn no_data() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "No data available")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<NoAnalysis> for ApiError {
    fn from(e: NoAnalysis) -> Self {
        match e {
            NoAnalysis::NoData | NoAnalysis::FetchFailed(_) => Self::no_data(),
            NoAnalysis::WorkerFailed(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed"),
        }
    }
}

fn lookup(state: &AppState, name: &str) -> Result<SymbolEntry, ApiError> {
    state
        .config
        .read()
        .find_symbol(name)
        .cloned()
        .ok_or_else(ApiError::symbol_not_found)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    market_open: bool,
    classifier: ClassifierStatus,
    providers: Vec<&'static str>,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: now.timestamp_millis(),
        market_open: is_market_open(now),
        classifier: state.classifier.status(),
        providers: state.fetcher.provider_names(),
    })
}

// =============================================================================
// Symbols, analysis, signals, latest (public)
// =============================================================================

async fn symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.read().symbol_names())
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = lookup(&state, &symbol)?;
    let analysis = analyze_and_record(&state, &entry).await?;
    Ok(Json(analysis.result))
}

async fn signals(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = lookup(&state, &symbol)?;
    let (period, interval, params) = {
        let config = state.config.read();
        (config.period.clone(), config.interval.clone(), config.indicators.clone())
    };

    let series = match state.fetcher.fetch(&entry.ticker, &period, &interval).await {
        FetchOutcome::Data(series) => series,
        FetchOutcome::Empty => return Err(ApiError::no_data()),
        FetchOutcome::Failed(reason) => {
            warn!(symbol = %entry.name, reason = %reason, "signal fetch failed");
            return Err(ApiError::no_data());
        }
    };

    let name = entry.name.clone();
    let report = tokio::task::spawn_blocking(move || SignalReport::build(&name, &series, &params))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("signal worker failed: {e}")))?;
    Ok(Json(report))
}

async fn latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.latest_results())
}

// =============================================================================
// Predict (public)
// =============================================================================

#[derive(Deserialize)]
struct PredictRequest {
    #[serde(alias = "indicators")]
    features: HashMap<String, f64>,
    /// Latest close, used for the price-like defaults.
    #[serde(default)]
    close: Option<f64>,
}

#[derive(Serialize)]
struct PredictResponse {
    #[serde(flatten)]
    decision: Decision,
    features: FeatureVector,
    defaulted: Vec<&'static str>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (features, defaulted) = FeatureVector::from_named(&req.features, req.close)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("{e:#}")))?;

    let analyzer = state.analyzer();
    let decision = tokio::task::spawn_blocking(move || analyzer.engine().decide(&features))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("predict worker failed: {e}")))?;

    Ok(Json(PredictResponse {
        decision,
        features,
        defaulted,
    }))
}

// =============================================================================
// Journal (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct RecordsQuery {
    symbol: Option<String>,
    limit: Option<usize>,
}

async fn records(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecordsQuery>,
) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    Json(state.journal.recent(q.symbol.as_deref(), limit))
}

// =============================================================================
// Thresholds (authenticated)
// =============================================================================

async fn get_thresholds(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(state.thresholds())
}

async fn set_thresholds(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<Thresholds>,
) -> Result<impl IntoResponse, ApiError> {
    update
        .validate()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("{e:#}")))?;

    let persisted = match state.update_thresholds(update) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to persist thresholds");
            false
        }
    };
    info!(persisted, "thresholds changed via API");

    Ok(Json(serde_json::json!({
        "thresholds": state.thresholds(),
        "persisted": persisted,
    })))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::tests::test_state;
    use crate::decision::ClassifierHandle;
    use crate::journal::Journal;
    use crate::market_data::provider::tests::StaticProvider;
    use crate::market_data::{FallbackFetcher, SeriesProvider};
    use crate::runtime_config::AdvisorConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    async fn call(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn authed(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {TOKEN}"))
            .header("content-type", "application/json");
        match body {
            Some(v) => builder.body(Body::from(v.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_state() -> Arc<AppState> {
        let providers: Vec<Arc<dyn SeriesProvider>> = vec![Arc::new(StaticProvider {
            name: "empty",
            outcome: FetchOutcome::Empty,
        })];
        Arc::new(AppState::new(
            AdvisorConfig::default(),
            None,
            Arc::new(ClassifierHandle::unavailable("none")),
            FallbackFetcher::new(providers),
            Journal::in_memory(10),
            None,
        ))
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = call(test_state(None), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["classifier"]["state"], "not_loaded");
        assert_eq!(body["providers"][0], "synthetic");
    }

    #[tokio::test]
    async fn symbols_lists_configured_names() {
        let (status, body) = call(test_state(None), get("/api/v1/symbols")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert_eq!(body[0], serde_json::json!("Sensex"));
        assert!(body.as_array().unwrap().iter().all(serde_json::Value::is_string));
    }

    #[tokio::test]
    async fn analyze_unknown_symbol_is_404() {
        let (status, body) = call(test_state(None), get("/api/v1/analyze/DowJones")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Symbol not found");
    }

    #[tokio::test]
    async fn analyze_without_data_is_503() {
        let (status, body) = call(empty_state(), get("/api/v1/analyze/Sensex")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "No data available");
    }

    #[tokio::test]
    async fn analyze_returns_result_and_caches_it() {
        let state = test_state(None);
        let (status, body) = call(state.clone(), get("/api/v1/analyze/sensex")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "Sensex");
        assert!(["BUY", "SELL", "HOLD"].contains(&body["action"].as_str().unwrap()));
        assert!(body.get("option_targets").is_some());

        let (_, latest) = call(state, get("/api/v1/latest")).await;
        assert_eq!(latest.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn signals_report_board_and_stage() {
        let (status, body) = call(test_state(None), get("/api/v1/signals/Nifty50")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["signals"]["rsi"].get("buy").is_some());
        assert!(body.get("stage").is_some());
    }

    #[tokio::test]
    async fn predict_rejects_unknown_features() {
        let req = post_json("/api/v1/predict", serde_json::json!({ "features": { "rsi": 25.0, "vwap": 1.0 } }));
        let (status, body) = call(test_state(None), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("vwap"));
    }

    #[tokio::test]
    async fn predict_uses_fallback_and_reports_defaults() {
        let req = post_json(
            "/api/v1/predict",
            serde_json::json!({ "features": { "rsi": 25.0, "macd": 1.5 }, "close": 100.0 }),
        );
        let (status, body) = call(test_state(None), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "buy");
        assert_eq!(body["source"], "rule_fallback");
        assert_eq!(body["confidence"], 0.6);
        assert_eq!(body["features"]["sma"], 100.0);
        let defaulted: Vec<&str> = body["defaulted"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
        assert!(defaulted.contains(&"macd_signal"));
        assert!(!defaulted.contains(&"rsi"));
    }

    #[tokio::test]
    async fn predict_accepts_indicators_key() {
        let req = post_json(
            "/api/v1/predict",
            serde_json::json!({ "indicators": { "rsi": 80.0, "macd": -2.0 } }),
        );
        let (status, body) = call(test_state(None), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "sell");
        assert_eq!(body["features"]["rsi"], 80.0);
    }

    #[tokio::test]
    async fn records_require_token() {
        let (status, _) = call(test_state(Some(TOKEN)), get("/api/v1/records")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(test_state(None), authed("GET", "/api/v1/records", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(test_state(Some(TOKEN)), authed("GET", "/api/v1/records", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn threshold_update_roundtrip() {
        let state = test_state(Some(TOKEN));
        let mut t = state.thresholds();
        t.decision.confidence_threshold = 0.7;
        let body = serde_json::to_value(&t).unwrap();

        let (status, resp) = call(state.clone(), authed("POST", "/api/v1/thresholds", Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["thresholds"]["decision"]["confidence_threshold"], 0.7);
        assert_eq!(resp["persisted"], true);

        let (_, current) = call(state, authed("GET", "/api/v1/thresholds", None)).await;
        assert_eq!(current["decision"]["confidence_threshold"], 0.7);
    }

    #[tokio::test]
    async fn invalid_thresholds_are_400() {
        let state = test_state(Some(TOKEN));
        let body = serde_json::json!({ "decision": { "confidence_threshold": 2.0 } });
        let (status, _) = call(state.clone(), authed("POST", "/api/v1/thresholds", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.thresholds().decision.confidence_threshold, 0.6);
    }
}
