use crate::infra::{deserialize_optional_date, reporting_instant, AppState};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use paytrack::dashboard::{DashboardOverview, DashboardService};
use paytrack::error::AppError;
use paytrack::ledger::{ClientId, ClientSummary};
use paytrack::source::DataSource;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Optional `?now=YYYY-MM-DD` override for the reporting instant.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) now: Option<NaiveDate>,
}

pub(crate) fn dashboard_router<D>(service: Arc<DashboardService<D>>) -> Router
where
    D: DataSource + 'static,
{
    Router::new()
        .route("/api/v1/dashboard", get(overview_handler::<D>))
        .route("/api/v1/clients/:client_id", get(client_handler::<D>))
        .with_state(service)
}

pub(crate) fn with_dashboard_routes<D>(service: Arc<DashboardService<D>>) -> Router
where
    D: DataSource + 'static,
{
    dashboard_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn overview_handler<D>(
    State(service): State<Arc<DashboardService<D>>>,
    Query(query): Query<AsOfQuery>,
) -> Json<DashboardOverview>
where
    D: DataSource + 'static,
{
    Json(service.overview(reporting_instant(query.now)))
}

pub(crate) async fn client_handler<D>(
    State(service): State<Arc<DashboardService<D>>>,
    Path(client_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Result<Response, AppError>
where
    D: DataSource + 'static,
{
    let id = ClientId(client_id);
    let summary: Option<ClientSummary> =
        service.client_summary(&id, reporting_instant(query.now))?;

    Ok(match summary {
        Some(summary) => (StatusCode::OK, Json(summary)).into_response(),
        None => {
            let payload = json!({
                "client_id": id.0,
                "error": "client not found",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    })
}
