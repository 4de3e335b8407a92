//! HTTP route handlers for the renderer API.

use argform::SessionError;
use argform::args_spec::ArgsSpec;
use argform::core::arg_tree::ArgGroup;
use argform::io::batch::BatchPayload;
use argform::{SessionSnapshot, ValidationReport};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/spec", get(get_spec))
        .route("/tree", get(get_tree))
        .route("/state", get(get_state))
        .route("/args/{key}", put(put_arg))
        .route("/validate", post(post_validate))
        .route("/batch", post(post_batch))
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/spec - the args spec this session was built from.
async fn get_spec(State(state): State<AppState>) -> Json<ArgsSpec> {
    Json(state.session.spec().clone())
}

/// GET /api/tree - display groups.
async fn get_tree(State(state): State<AppState>) -> Json<Vec<ArgGroup>> {
    Json(state.session.arg_tree())
}

/// GET /api/state - args, validation and the overall flag.
async fn get_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

/// PUT /api/args/:key - record an edit (body is the new value) and revalidate.
async fn put_arg(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<ValidationReport>, ApiError> {
    let report = state.session.update(&key, value).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct ValidateQuery {
    limit_to: Option<String>,
}

/// POST /api/validate?limit_to=key - run a full or scoped round.
async fn post_validate(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<ValidationReport>, ApiError> {
    let report = state.session.validate(query.limit_to.as_deref()).await?;
    Ok(Json(report))
}

/// POST /api/batch - replace the whole argument set.
async fn post_batch(
    State(state): State<AppState>,
    Json(payload): Json<BatchPayload>,
) -> Result<Json<ValidationReport>, ApiError> {
    let report = state.session.batch_update(payload).await?;
    Ok(Json(report))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Session errors mapped onto HTTP status codes.
pub struct ApiError(SessionError);

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            SessionError::UnknownArg(_) => StatusCode::NOT_FOUND,
            SessionError::ModuleMismatch { .. } => StatusCode::CONFLICT,
            SessionError::Validator(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
