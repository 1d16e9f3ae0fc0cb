pub mod config;
pub mod metrics;

use axum::http::StatusCode;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use config::Config;
use parking_lot::RwLock;
use platerank_core::{
    recommend as rank, AreaFilter, CostRange, FeaturedCorpus, QueryParams, RankError,
    RankedRestaurant,
};
use platerank_storage::{Catalog, RecordSource};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub source: Arc<dyn RecordSource>,
    pub config: Arc<Config>,
    loaded_at: Arc<RwLock<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(catalog: Catalog, source: Arc<dyn RecordSource>, config: Config) -> Self {
        Self {
            catalog,
            source,
            config: Arc::new(config),
            loaded_at: Arc::new(RwLock::new(Utc::now())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/recommend", post(recommend))
        .route("/v1/options", get(options))
        .route("/v1/catalog", get(catalog))
        .route("/admin/reload", post(admin_reload))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Body of `POST /v1/recommend`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendRequest {
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub cost_range: Option<CostRange>,
    #[serde(default)]
    pub area: Option<AreaFilter>,
    #[serde(default)]
    pub top_n: Option<i64>,
}

impl RecommendRequest {
    /// Fills gaps the way the filter form does: full cost span, any area, configured top_n.
    pub fn into_params(
        self,
        corpus: &FeaturedCorpus,
        config: &Config,
    ) -> Result<QueryParams, RankError> {
        let top_n = match self.top_n {
            None => config.default_top_n,
            Some(n) if n <= 0 => {
                return Err(RankError::InvalidParameter(format!(
                    "top_n must be positive, got {}",
                    n
                )))
            }
            Some(n) if n as u64 > config.max_top_n as u64 => {
                return Err(RankError::InvalidParameter(format!(
                    "top_n {} exceeds limit {}",
                    n, config.max_top_n
                )))
            }
            Some(n) => n as usize,
        };
        let (lo, hi) = corpus.cost_bounds();
        let cost_range = self.cost_range.unwrap_or(CostRange::new(lo, hi));
        Ok(QueryParams::new()
            .with_cuisines(self.cuisines)
            .with_cost_range(cost_range.min, cost_range.max)
            .with_area(self.area.unwrap_or_default())
            .with_top_n(top_n))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub results: Vec<RankedRestaurant>,
    pub count: usize,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn recommend(
    State(app): State<AppState>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> impl IntoResponse {
    let _timer = metrics::OP_DURATION
        .with_label_values(&["recommend"])
        .start_timer();
    metrics::REQUESTS_TOTAL.with_label_values(&["recommend"]).inc();
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            metrics::REQUEST_ERRORS_TOTAL
                .with_label_values(&["recommend"])
                .inc();
            let msg = format!("invalid request body: {}", rejection.body_text());
            tracing::debug!(error = %msg, "recommend body rejected");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
        }
    };
    let corpus = app.catalog.snapshot();
    let result = req
        .into_params(&corpus, &app.config)
        .and_then(|params| rank(&corpus, &params));
    match result {
        Ok(results) => {
            metrics::RESULTS_RETURNED.observe(results.len() as f64);
            let count = results.len();
            (StatusCode::OK, Json(RecommendResponse { results, count })).into_response()
        }
        Err(e) => {
            metrics::REQUEST_ERRORS_TOTAL
                .with_label_values(&["recommend"])
                .inc();
            tracing::debug!(error = %e, "recommend rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn options(State(app): State<AppState>) -> impl IntoResponse {
    metrics::REQUESTS_TOTAL.with_label_values(&["options"]).inc();
    let corpus = app.catalog.snapshot();
    let (cost_min, cost_max) = corpus.cost_bounds();
    Json(json!({
        "cuisines": corpus.cuisines(),
        "areas": corpus.areas(),
        "cost_min": cost_min,
        "cost_max": cost_max,
    }))
}

async fn catalog(State(app): State<AppState>) -> impl IntoResponse {
    metrics::REQUESTS_TOTAL.with_label_values(&["catalog"]).inc();
    let corpus = app.catalog.snapshot();
    let stats = corpus.stats();
    Json(json!({
        "records": stats.record_count,
        "cuisines": corpus.vocabulary().len(),
        "mean_num_ratings": stats.mean_num_ratings,
        "median_num_ratings": stats.median_num_ratings,
        "global_avg_rating": stats.global_avg_rating,
        "min_cost": stats.min_cost,
        "max_cost": stats.max_cost,
        "fingerprint": corpus.fingerprint(),
        "source": app.source.describe(),
        "loaded_at": app.loaded_at.read().to_rfc3339(),
    }))
}

async fn admin_reload(State(app): State<AppState>) -> impl IntoResponse {
    metrics::REQUESTS_TOTAL.with_label_values(&["reload"]).inc();
    let t0 = std::time::Instant::now();
    let catalog = app.catalog.clone();
    let source = app.source.clone();
    // file read + feature build are blocking work
    let outcome = tokio::task::spawn_blocking(move || catalog.reload(source.as_ref())).await;
    metrics::OP_DURATION
        .with_label_values(&["reload"])
        .observe(t0.elapsed().as_secs_f64());
    match outcome {
        Ok(Ok(swapped)) => {
            if swapped {
                *app.loaded_at.write() = Utc::now();
            }
            let corpus = app.catalog.snapshot();
            (
                StatusCode::OK,
                Json(json!({
                    "swapped": swapped,
                    "records": corpus.len(),
                    "fingerprint": corpus.fingerprint(),
                })),
            )
                .into_response()
        }
        Ok(Err(e)) => {
            metrics::REQUEST_ERRORS_TOTAL.with_label_values(&["reload"]).inc();
            tracing::warn!(error = %e, "reload failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}
