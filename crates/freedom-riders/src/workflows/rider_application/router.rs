use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{FieldPath, FieldUpdateError, FieldValue, SessionId, WizardStep};
use super::intake::ApplicationIntake;
use super::session::{FormSessionStore, SessionError, SharedSession};

/// Field update body: `{ "path": "motorbikeDetails.make", "value": "Honda" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdateRequest {
    pub path: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ValidateStepRequest {
    pub step: u8,
}

/// Router builder exposing the rider application wizard over HTTP.
pub fn form_router<I>(store: Arc<FormSessionStore<I>>) -> Router
where
    I: ApplicationIntake + 'static,
{
    Router::new()
        .route(
            "/api/v1/rider-applications/sessions",
            post(open_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id",
            get(view_handler::<I>).delete(close_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/fields",
            patch(update_field_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/validate",
            post(validate_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/next",
            post(next_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/previous",
            post(previous_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/submit",
            post(submit_handler::<I>),
        )
        .route(
            "/api/v1/rider-applications/sessions/:session_id/reset",
            post(reset_handler::<I>),
        )
        .with_state(store)
}

pub(crate) async fn open_handler<I>(State(store): State<Arc<FormSessionStore<I>>>) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = store.open().await;
    let view = session.lock().await.view();
    (StatusCode::CREATED, axum::Json(view)).into_response()
}

pub(crate) async fn view_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let view = session.lock().await.view();
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn close_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    match store.close(&SessionId(session_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn update_field_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<FieldUpdateRequest>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let path = match request.path.parse::<FieldPath>() {
        Ok(path) => path,
        Err(err) => return field_error_response(FieldUpdateError::from(err)),
    };

    let mut session = session.lock().await;
    match session.engine.update_field(path, request.value) {
        Ok(()) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(err) => field_error_response(err),
    }
}

pub(crate) async fn validate_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<ValidateStepRequest>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let Some(step) = WizardStep::from_number(request.step) else {
        let payload = json!({
            "error": format!("step must be between 1 and {}", WizardStep::COUNT),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    let mut session = session.lock().await;
    let valid = session.engine.validate_step(step);
    let mut view = session.view();
    view.valid = Some(valid);
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn next_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut session = session.lock().await;
    session.engine.next_step();
    let valid = session.engine.validation_errors().is_empty();
    let mut view = session.view();
    view.valid = Some(valid);
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn previous_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut session = session.lock().await;
    session.engine.previous_step();
    (StatusCode::OK, axum::Json(session.view())).into_response()
}

pub(crate) async fn submit_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    // The form stays readable while the intake call is in flight.
    let (pending, intake) = {
        let mut guard = session.lock().await;
        match guard.engine.begin_submit() {
            Some(pending) => (pending, guard.engine.intake()),
            None => return (StatusCode::OK, axum::Json(guard.view())).into_response(),
        }
    };
    let outcome = intake.deliver(pending.payload()).await;

    let mut session = session.lock().await;
    session.engine.finish_submit(pending, outcome);
    (StatusCode::OK, axum::Json(session.view())).into_response()
}

pub(crate) async fn reset_handler<I>(
    State(store): State<Arc<FormSessionStore<I>>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: ApplicationIntake + 'static,
{
    let session = match lookup(&store, session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut session = session.lock().await;
    session.engine.reset();
    (StatusCode::OK, axum::Json(session.view())).into_response()
}

async fn lookup<I>(
    store: &FormSessionStore<I>,
    session_id: String,
) -> Result<SharedSession<I>, Response>
where
    I: ApplicationIntake + 'static,
{
    store
        .get(&SessionId(session_id))
        .await
        .map_err(session_error_response)
}

fn session_error_response(err: SessionError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn field_error_response(err: FieldUpdateError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
