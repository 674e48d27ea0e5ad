//! API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::flows::{AnswerInput, AnswerOutput, FlowError, SummarizeInput, SummarizeOutput};
use crate::widget::{KeyPress, SessionView, WidgetError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct WidgetInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    #[serde(flatten)]
    pub press: KeyPress,
    /// Contents of the input box when the key was pressed
    #[serde(default)]
    pub draft: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Model returned no output")]
    EmptyOutput,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Widget(WidgetError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Flow(FlowError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Flow(FlowError::Provider(_)) | ApiError::EmptyOutput => StatusCode::BAD_GATEWAY,
            ApiError::Flow(FlowError::Knowledge(_)) | ApiError::Flow(FlowError::Template(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn widget_info(State(state): State<AppState>) -> Json<WidgetInfo> {
    Json(WidgetInfo {
        name: state.site_name.to_string(),
    })
}

async fn summarize(
    State(state): State<AppState>,
    Json(input): Json<SummarizeInput>,
) -> Result<Json<SummarizeOutput>, ApiError> {
    let output = state.widget.flows().summarize(input).await?;
    output.map(Json).ok_or(ApiError::EmptyOutput)
}

async fn answer(
    State(state): State<AppState>,
    Json(input): Json<AnswerInput>,
) -> Result<Json<AnswerOutput>, ApiError> {
    let output = state.widget.flows().answer_with_knowledge(input).await?;
    output.map(Json).ok_or(ApiError::EmptyOutput)
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.widget.mount().await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.widget.view(id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.widget.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.widget.toggle(id).await?))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.widget.submit(id, &request.text).await?))
}

async fn press_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<KeyRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(
        state
            .widget
            .press_key(id, request.draft, &request.press)
            .await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/widget", get(widget_info))
        .route("/v1/flows/summarize", post(summarize))
        .route("/v1/flows/answer", post(answer))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:id", get(get_session).delete(delete_session))
        .route("/v1/sessions/:id/toggle", post(toggle_session))
        .route("/v1/sessions/:id/messages", post(send_message))
        .route("/v1/sessions/:id/keys", post(press_key))
}
