//! HTTP API for statistics reports, scope controls, health and metrics

use crate::state::{lock, AppState};
use analysis_lib::{
    AnalysisCache, AnalysisError, DataKey, DataSet, DataType, Interval, IntervalRegistry,
    MetricSeriesSource, Statistic,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Error returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// Response bodies

/// Interval as shown to clients; bounds are resolved against the dataset
#[derive(Debug, Serialize)]
pub struct IntervalView {
    pub start: i64,
    pub end: i64,
    pub name: String,
    pub label: String,
    pub is_default: bool,
}

impl IntervalView {
    fn new(dataset: &DataSet, interval: &Interval) -> Self {
        let (start, end) = dataset.resolve_bounds(interval);
        Self {
            start,
            end,
            name: interval.name().to_string(),
            label: interval.to_string(),
            is_default: interval.is_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntervalsResponse {
    pub current: IntervalView,
    pub intervals: Vec<IntervalView>,
}

impl IntervalsResponse {
    fn new(dataset: &DataSet, registry: &IntervalRegistry) -> Self {
        Self {
            current: IntervalView::new(dataset, registry.current_interval()),
            intervals: registry
                .intervals()
                .map(|i| IntervalView::new(dataset, i))
                .collect(),
        }
    }
}

/// One statistic value; `NaN` serializes as `null`
#[derive(Debug, Serialize)]
pub struct StatisticValue {
    pub id: &'static str,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct KeyStatistics {
    #[serde(rename = "type")]
    pub type_id: String,
    pub field: String,
    pub count: i64,
    pub statistics: Vec<StatisticValue>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub interval: IntervalView,
    pub granularity_ms: i64,
    pub rows: Vec<KeyStatistics>,
}

#[derive(Debug, Serialize)]
pub struct GranularityResponse {
    pub granularity_ms: i64,
    pub peak_name: String,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub fields: Vec<DataKey>,
}

// Request bodies

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    #[serde(rename = "type")]
    pub type_id: String,
    pub field: String,
}

#[derive(Debug, Deserialize)]
pub struct NewInterval {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntervalBounds {
    pub start: i64,
    pub end: i64,
}

/// Omitting both bounds selects all data
#[derive(Debug, Deserialize)]
pub struct SelectInterval {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RenameInterval {
    pub start: i64,
    pub end: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GranularityRequest {
    pub granularity_ms: i64,
}

/// A whole type when `field` is absent
#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldKey {
    #[serde(rename = "type")]
    pub type_id: String,
    pub field: String,
}

fn key_statistics(
    cache: &mut AnalysisCache<DataSet>,
    type_id: &str,
    field: &str,
) -> Result<KeyStatistics, AnalysisError> {
    let granularity = cache.granularity();
    let count = cache.count(type_id, field)?;
    let statistics = Statistic::ALL
        .iter()
        .map(|stat| {
            Ok(StatisticValue {
                id: stat.id(),
                name: stat.name(granularity),
                value: stat.value(cache, type_id, field)?,
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    Ok(KeyStatistics {
        type_id: type_id.to_string(),
        field: field.to_string(),
        count,
        statistics,
    })
}

fn require_field(dataset: &DataSet, type_id: &str, field: &str) -> ApiResult<()> {
    if dataset.has_field(type_id, field) {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!(
            "no field '{}' for type '{}'",
            field, type_id
        )))
    }
}

/// Health check: the service is up once the dataset is loaded
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "node": state.logger.node_name(),
        "hostname": state.dataset.hostname(),
        "types": state.dataset.types().count(),
        "records": state.dataset.record_count(),
    }))
}

/// Readiness check: 503 while the dataset has no records
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ready = !state.dataset.is_empty();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(json!({ "ready": ready })))
}

/// Prometheus metrics endpoint
async fn metrics() -> ApiResult<impl IntoResponse> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn list_types(State(state): State<Arc<AppState>>) -> Json<Vec<DataType>> {
    Json(state.dataset.types().cloned().collect())
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Json<ReportResponse>> {
    let key = DataKey::new(query.type_id, query.field)?;
    require_field(&state.dataset, &key.type_id, &key.field)?;

    let mut cache = lock(&state.cache);
    let row = key_statistics(&mut cache, &key.type_id, &key.field)?;

    Ok(Json(ReportResponse {
        interval: IntervalView::new(&state.dataset, cache.interval()),
        granularity_ms: cache.granularity(),
        rows: vec![row],
    }))
}

async fn report(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReportResponse>> {
    let keys: Vec<DataKey> = lock(&state.fields).keys().cloned().collect();

    let mut cache = lock(&state.cache);
    let rows = keys
        .iter()
        .map(|key| key_statistics(&mut cache, &key.type_id, &key.field))
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let empty = rows.iter().filter(|row| row.count == 0).count();
    state
        .logger
        .log_report_generated(rows.len(), Statistic::ALL.len(), empty);

    Ok(Json(ReportResponse {
        interval: IntervalView::new(&state.dataset, cache.interval()),
        granularity_ms: cache.granularity(),
        rows,
    }))
}

async fn list_intervals(State(state): State<Arc<AppState>>) -> Json<IntervalsResponse> {
    let registry = lock(&state.registry);
    Json(IntervalsResponse::new(&state.dataset, &registry))
}

async fn add_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewInterval>,
) -> ApiResult<(StatusCode, Json<IntervalView>)> {
    let interval = match req.name {
        Some(name) => Interval::named(req.start, req.end, name)?,
        None => Interval::new(req.start, req.end)?,
    };

    let mut registry = lock(&state.registry);
    if !registry.add_interval(interval.clone()) {
        return Err(ApiError::Conflict(format!(
            "interval {}..{} is already registered or reserved",
            req.start, req.end
        )));
    }

    Ok((
        StatusCode::CREATED,
        Json(IntervalView::new(&state.dataset, &interval)),
    ))
}

async fn clear_intervals(State(state): State<Arc<AppState>>) -> StatusCode {
    lock(&state.registry).clear_intervals();
    StatusCode::NO_CONTENT
}

async fn remove_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IntervalBounds>,
) -> ApiResult<StatusCode> {
    let interval = Interval::new(req.start, req.end)?;

    if lock(&state.registry).remove_interval(&interval) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "interval {}..{} is not registered",
            req.start, req.end
        )))
    }
}

async fn set_current_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectInterval>,
) -> ApiResult<Json<IntervalsResponse>> {
    let interval = match (req.start, req.end) {
        (None, None) => Interval::DEFAULT,
        (Some(start), Some(end)) => Interval::new(start, end)?,
        _ => {
            return Err(ApiError::BadRequest(
                "start and end must be given together".to_string(),
            ))
        }
    };

    let mut registry = lock(&state.registry);
    if !interval.is_default() && !registry.contains(&interval) {
        return Err(ApiError::NotFound(format!(
            "interval {}..{} is not registered",
            interval.start(),
            interval.end()
        )));
    }
    registry.set_current_interval(&interval);

    Ok(Json(IntervalsResponse::new(&state.dataset, &registry)))
}

async fn rename_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenameInterval>,
) -> ApiResult<Json<IntervalView>> {
    let mut interval = Interval::new(req.start, req.end)?;

    let mut registry = lock(&state.registry);
    if !registry.contains(&interval) {
        return Err(ApiError::NotFound(format!(
            "interval {}..{} is not registered",
            req.start, req.end
        )));
    }
    registry.rename_interval(&interval, &req.name);

    interval.set_name(req.name);
    Ok(Json(IntervalView::new(&state.dataset, &interval)))
}

async fn get_granularity(State(state): State<Arc<AppState>>) -> Json<GranularityResponse> {
    let granularity_ms = lock(&state.cache).granularity();
    Json(GranularityResponse {
        granularity_ms,
        peak_name: Statistic::GranularityMaximum.name(granularity_ms),
    })
}

async fn set_granularity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GranularityRequest>,
) -> ApiResult<Json<GranularityResponse>> {
    let mut cache = lock(&state.cache);
    let old = cache.granularity();
    cache.set_granularity(req.granularity_ms)?;

    if old != req.granularity_ms {
        state.logger.log_granularity_changed(old, req.granularity_ms);
    }

    Ok(Json(GranularityResponse {
        granularity_ms: req.granularity_ms,
        peak_name: Statistic::GranularityMaximum.name(req.granularity_ms),
    }))
}

async fn list_fields(State(state): State<Arc<AppState>>) -> Json<FieldsResponse> {
    Json(FieldsResponse {
        fields: lock(&state.fields).keys().cloned().collect(),
    })
}

async fn add_fields(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FieldRequest>,
) -> ApiResult<Json<FieldsResponse>> {
    let data_type = state
        .dataset
        .data_type(&req.type_id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown type '{}'", req.type_id)))?;

    let mut fields = lock(&state.fields);
    match req.field {
        Some(field) => {
            require_field(&state.dataset, &req.type_id, &field)?;
            fields.add_field(DataKey::new(req.type_id, field)?);
        }
        None => fields.add_type(data_type),
    }

    info!(tracked = fields.len(), "Tracked fields updated");
    Ok(Json(FieldsResponse {
        fields: fields.keys().cloned().collect(),
    }))
}

async fn remove_field(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FieldKey>,
) -> ApiResult<StatusCode> {
    let key = DataKey::new(req.type_id, req.field)?;

    if lock(&state.fields).remove_field(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("{} is not tracked", key)))
    }
}

async fn clear_fields(State(state): State<Arc<AppState>>) -> StatusCode {
    lock(&state.fields).clear();
    StatusCode::NO_CONTENT
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/types", get(list_types))
        .route("/api/v1/statistics", get(statistics))
        .route("/api/v1/report", get(report))
        .route(
            "/api/v1/intervals",
            get(list_intervals)
                .post(add_interval)
                .delete(clear_intervals),
        )
        .route("/api/v1/intervals/current", put(set_current_interval))
        .route("/api/v1/intervals/rename", put(rename_interval))
        .route("/api/v1/intervals/remove", post(remove_interval))
        .route(
            "/api/v1/granularity",
            get(get_granularity).put(set_granularity),
        )
        .route(
            "/api/v1/fields",
            get(list_fields).post(add_fields).delete(clear_fields),
        )
        .route("/api/v1/fields/remove", post(remove_field))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(e) = axum::serve(listener, app).await {
        warn!(error = %e, "API server stopped");
        return Err(e.into());
    }

    Ok(())
}
