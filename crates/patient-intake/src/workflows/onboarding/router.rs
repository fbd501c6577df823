use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::SectionInput;
use super::repository::{
    FollowUpKind, FollowUpPublisher, RegistrationSink, RepositoryError, SessionId,
    SessionRepository,
};
use super::rules::{format_phone, is_canonical_phone};
use super::schema::ValidationResult;
use super::service::{OnboardingService, OnboardingServiceError};

type SharedService<R, S, F> = Arc<OnboardingService<R, S, F>>;

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub step_index: usize,
    #[serde(default)]
    pub data: SectionInput,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpBody {
    pub kind: FollowUpKind,
}

#[derive(Debug, Deserialize)]
pub struct PhoneFormatRequest {
    pub raw: String,
}

/// Router exposing the wizard to HTTP presentation clients.
pub fn onboarding_router<R, S, F>(service: SharedService<R, S, F>) -> Router
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/onboarding/sessions",
            post(open_session_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id",
            get(session_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/start",
            post(start_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/advance",
            post(advance_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/retreat",
            post(retreat_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/reset",
            post(reset_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/record",
            get(record_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/summary",
            get(summary_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/follow-ups",
            post(follow_up_handler::<R, S, F>),
        )
        .route(
            "/api/v1/onboarding/steps/:step_index/validate",
            post(validate_step_handler::<R, S, F>),
        )
        .route("/api/v1/onboarding/phone/format", post(format_phone_handler))
        .with_state(service)
}

pub(crate) async fn open_session_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.open_session() {
        Ok(record) => {
            let view = record.view(service.blueprint());
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.current_step(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.start(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view(service.blueprint()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.advance(&SessionId(session_id), request.step_index, &request.data) {
        Ok(record) => (StatusCode::OK, Json(record.view(service.blueprint()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.retreat(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view(service.blueprint()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reset_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.reset(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view(service.blueprint()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.assembled_record(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.summary(&SessionId(session_id)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn follow_up_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(session_id): Path<String>,
    Json(body): Json<FollowUpBody>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    match service.request_follow_up(&SessionId(session_id), body.kind) {
        Ok(request) => (StatusCode::ACCEPTED, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validate_step_handler<R, S, F>(
    State(service): State<SharedService<R, S, F>>,
    Path(step_index): Path<usize>,
    Json(input): Json<SectionInput>,
) -> Response
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    let payload = match service.preview_step(step_index, &input) {
        ValidationResult::Accepted(data) => json!({ "accepted": true, "normalized": data }),
        ValidationResult::Rejected(error) => {
            json!({ "accepted": false, "errors": error.errors() })
        }
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn format_phone_handler(Json(request): Json<PhoneFormatRequest>) -> Response {
    let formatted = format_phone(&request.raw);
    let valid = is_canonical_phone(&formatted);
    (
        StatusCode::OK,
        Json(json!({ "formatted": formatted, "valid": valid })),
    )
        .into_response()
}

fn error_response(error: OnboardingServiceError) -> Response {
    match error {
        OnboardingServiceError::Validation(rejection) => {
            let payload = json!({ "errors": rejection.errors() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        OnboardingServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "session not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        pending @ OnboardingServiceError::NotComplete(_) => {
            let payload = json!({ "error": pending.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
