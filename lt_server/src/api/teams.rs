//! Team API handlers.
//!
//! ```bash
//! curl -X POST http://localhost:5000/api/team \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Alpha", "region": "NA"}'
//! ```

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use lol_tournament::TeamId;
use lol_tournament::dto::{CreateTeamRequest, TeamResponse, UpdateTeamRequest};

use super::{AppState, error::ApiError};

/// Create a team.
///
/// Returns `201 Created` with the team and a `Location` header, `400` for a
/// missing or invalid body, `409` when the name is taken.
pub async fn create_team(
    State(state): State<AppState>,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let team = state.team_service.create(request).await?;
    let location = format!("/api/team/{}", team.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(team)))
}

/// Get a team by ID
pub async fn get_team(
    State(state): State<AppState>,
    path: Result<Path<TeamId>, PathRejection>,
) -> Result<Json<TeamResponse>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.team_service.get(id).await?))
}

/// List all teams
pub async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    Ok(Json(state.team_service.list().await?))
}

/// Replace a team. The body `id` must match the path.
pub async fn update_team(
    State(state): State<AppState>,
    path: Result<Path<TeamId>, PathRejection>,
    payload: Result<Json<UpdateTeamRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    state.team_service.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a team. `409` while matches still reference it.
pub async fn delete_team(
    State(state): State<AppState>,
    path: Result<Path<TeamId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    state.team_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
