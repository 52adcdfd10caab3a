//! JSON REST handlers for managed covers.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use sunshade_app::ports::{AutomationStateRepository, EventPublisher};
use sunshade_domain::event::ToggleReason;
use sunshade_domain::runtime::CoverStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for the automation switch.
#[derive(Deserialize)]
pub struct SetAutomationRequest {
    pub enabled: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<CoverStatus>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<CoverStatus>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/covers` — every managed cover with its runtime record.
pub async fn list<R, P>(State(state): State<AppState<R, P>>) -> ListResponse
where
    R: AutomationStateRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.automation_service.list()))
}

/// `GET /api/covers/:id` — one managed cover.
pub async fn get<R, P>(
    State(state): State<AppState<R, P>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: AutomationStateRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let status = state.automation_service.status(&id)?;
    Ok(GetResponse::Ok(Json(status)))
}

/// `PUT /api/covers/:id/automation` — switch automation on or off.
pub async fn set_automation<R, P>(
    State(state): State<AppState<R, P>>,
    Path(id): Path<String>,
    Json(req): Json<SetAutomationRequest>,
) -> Result<GetResponse, ApiError>
where
    R: AutomationStateRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let status = state
        .automation_service
        .set_enabled(&id, req.enabled, ToggleReason::User)
        .await?;
    Ok(GetResponse::Ok(Json(status)))
}
