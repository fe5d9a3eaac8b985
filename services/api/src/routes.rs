use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use freedom_riders::workflows::fare::{fare_router, FareEstimator};
use freedom_riders::workflows::rider_application::{
    form_router, ApplicationIntake, FormSessionStore,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ServiceStatus {
    Ok,
    Ready,
    Initializing,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: ServiceStatus,
}

pub(crate) fn with_form_routes<I>(
    store: Arc<FormSessionStore<I>>,
    estimator: Arc<FareEstimator>,
) -> axum::Router
where
    I: ApplicationIntake + 'static,
{
    form_router(store)
        .merge(fare_router(estimator))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: ServiceStatus::Ok,
    })
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (code, status) = if ready {
        (StatusCode::OK, ServiceStatus::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ServiceStatus::Initializing)
    };

    (code, Json(StatusResponse { status }))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
