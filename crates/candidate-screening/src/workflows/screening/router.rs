use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{PositionDraft, PositionId, PositionPatch};
use super::evaluation::{PresetDraft, PresetPatch};
use super::outreach::{MessageTransport, TemplateDraft, TemplatePatch};
use super::presentation::StatusFilter;
use super::repository::{RepositoryError, ScreeningStore};
use super::service::{
    CandidateQuery, OverrideRequest, ScreeningService, ScreeningServiceError, SendRequest,
};
use crate::workflows::sheets::{CandidateSource, SheetImportError};

type SharedService<S, C, T> = Arc<ScreeningService<S, C, T>>;

/// Router exposing the candidate dashboard, screening presets, positions and outreach.
pub fn screening_router<S, C, T>(service: SharedService<S, C, T>) -> Router
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    Router::new()
        .route("/api/v1/candidates", get(candidates_handler::<S, C, T>))
        .route(
            "/api/v1/screening/presets",
            get(list_presets_handler::<S, C, T>).post(create_preset_handler::<S, C, T>),
        )
        .route(
            "/api/v1/screening/presets/:preset_id",
            get(preset_handler::<S, C, T>).put(update_preset_handler::<S, C, T>),
        )
        .route(
            "/api/v1/screening/overrides",
            post(override_handler::<S, C, T>),
        )
        .route(
            "/api/v1/positions",
            get(list_positions_handler::<S, C, T>).post(create_position_handler::<S, C, T>),
        )
        .route(
            "/api/v1/positions/:position_id",
            get(position_handler::<S, C, T>)
                .put(update_position_handler::<S, C, T>)
                .delete(delete_position_handler::<S, C, T>),
        )
        .route(
            "/api/v1/email/templates",
            get(list_templates_handler::<S, C, T>).post(create_template_handler::<S, C, T>),
        )
        .route(
            "/api/v1/email/templates/:template_id",
            put(update_template_handler::<S, C, T>),
        )
        .route("/api/v1/email/send", post(send_handler::<S, C, T>))
        .route("/api/v1/email/logs", get(contact_log_handler::<S, C, T>))
        .route("/api/v1/settings", get(settings_handler::<S, C, T>))
        .route(
            "/api/v1/settings/sheets/test",
            get(test_source_handler::<S, C, T>),
        )
        .route(
            "/api/v1/settings/email/test",
            get(test_transport_handler::<S, C, T>),
        )
        .with_state(service)
}

/// Maps service failures onto HTTP statuses with an `{ "error": ... }` body.
pub(crate) fn error_response(err: ScreeningServiceError) -> Response {
    let status = match &err {
        ScreeningServiceError::NotFound { .. }
        | ScreeningServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ScreeningServiceError::Validation(_) | ScreeningServiceError::UnknownCandidate(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ScreeningServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ScreeningServiceError::Import(
            SheetImportError::NotConfigured | SheetImportError::InvalidLocation(_),
        ) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ScreeningServiceError::Import(_) | ScreeningServiceError::Transport(_) => {
            StatusCode::BAD_GATEWAY
        }
        ScreeningServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "screening request failed");
    }

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

/// Runs a service call on the blocking pool. Every service operation touches
/// the JSON store or the spreadsheet export.
async fn blocking<V, F>(call: F) -> Result<V, Response>
where
    F: FnOnce() -> Result<V, ScreeningServiceError> + Send + 'static,
    V: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(outcome) => outcome.map_err(error_response),
        Err(join_error) => {
            error!(error = %join_error, "screening task aborted");
            let payload = json!({
                "error": "screening task aborted",
            });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response())
        }
    }
}

async fn respond_blocking<V, F>(status: StatusCode, call: F) -> Response
where
    F: FnOnce() -> Result<V, ScreeningServiceError> + Send + 'static,
    V: Serialize + Send + 'static,
{
    match blocking(call).await {
        Ok(value) => (status, Json(value)).into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateParams {
    #[serde(default)]
    pub(crate) position_id: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
}

pub(crate) async fn candidates_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Query(params): Query<CandidateParams>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    let status = match params.status.as_deref().map(str::parse::<StatusFilter>) {
        None => StatusFilter::All,
        Some(Ok(filter)) => filter,
        Some(Err(err)) => {
            let payload = json!({
                "error": err.to_string(),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let query = CandidateQuery {
        position_id: params
            .position_id
            .filter(|id| !id.trim().is_empty())
            .map(PositionId),
        status,
        search: params.search,
    };

    respond_blocking(StatusCode::OK, move || service.candidate_snapshot(query)).await
}

pub(crate) async fn list_presets_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.presets()).await
}

pub(crate) async fn preset_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(preset_id): Path<String>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.preset(&preset_id)).await
}

pub(crate) async fn create_preset_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Json(draft): Json<PresetDraft>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::CREATED, move || service.create_preset(draft)).await
}

pub(crate) async fn update_preset_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(preset_id): Path<String>,
    Json(patch): Json<PresetPatch>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.update_preset(&preset_id, patch)).await
}

pub(crate) async fn override_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Json(request): Json<OverrideRequest>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.override_status(request)).await
}

pub(crate) async fn list_positions_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.positions()).await
}

pub(crate) async fn position_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(position_id): Path<String>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.position(&PositionId(position_id))).await
}

pub(crate) async fn create_position_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Json(draft): Json<PositionDraft>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::CREATED, move || service.create_position(draft)).await
}

pub(crate) async fn update_position_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(position_id): Path<String>,
    Json(patch): Json<PositionPatch>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || {
        service.update_position(&PositionId(position_id), patch)
    })
    .await
}

pub(crate) async fn delete_position_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(position_id): Path<String>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    match blocking(move || service.delete_position(&PositionId(position_id))).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn list_templates_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.templates()).await
}

pub(crate) async fn create_template_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Json(draft): Json<TemplateDraft>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::CREATED, move || service.create_template(draft)).await
}

pub(crate) async fn update_template_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Path(template_id): Path<String>,
    Json(patch): Json<TemplatePatch>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.update_template(&template_id, patch)).await
}

pub(crate) async fn send_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Json(request): Json<SendRequest>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    // bulk sends sleep between messages
    respond_blocking(StatusCode::OK, move || service.send_messages(request)).await
}

pub(crate) async fn contact_log_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    respond_blocking(StatusCode::OK, move || service.contact_log()).await
}

pub(crate) async fn settings_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    (StatusCode::OK, Json(service.settings_status())).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SourceTestParams {
    #[serde(default)]
    position_id: Option<String>,
}

pub(crate) async fn test_source_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
    Query(params): Query<SourceTestParams>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    let position_id = params.position_id.map(PositionId);
    match blocking(move || service.test_source(position_id.as_ref())).await {
        Ok(headers) => {
            let payload = json!({
                "headers": headers,
                "message": "spreadsheet export readable",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn test_transport_handler<S, C, T>(
    State(service): State<SharedService<S, C, T>>,
) -> Response
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    match blocking(move || service.test_transport()).await {
        Ok(()) => {
            let payload = json!({
                "success": true,
                "message": "message transport ready",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}
