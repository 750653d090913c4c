//! Match API handlers.
//!
//! Clients never choose the winner on creation; the server flips a coin.
//!
//! ```bash
//! curl -X POST http://localhost:5000/api/match \
//!   -H "Content-Type: application/json" \
//!   -d '{"teamAId": 1, "teamBId": 2, "tournamentId": 1}'
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
use lol_tournament::MatchId;
use lol_tournament::dto::{CreateMatchRequest, MatchResponse, UpdateMatchRequest};

use super::{AppState, error::ApiError, request_id::RequestId};
use crate::metrics;

/// Create a match and resolve its winner.
///
/// `404` when either team or the tournament does not exist.
pub async fn create_match(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let (created, side) = state.match_service.create(request).await?;

    metrics::matches_created_total(side);
    tracing::info!(
        request_id = %request_id,
        match_id = created.id,
        winner_id = created.winner.id,
        side = side.as_str(),
        "Match winner resolved"
    );

    let location = format!("/api/match/{}", created.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

pub async fn get_match(
    State(state): State<AppState>,
    path: Result<Path<MatchId>, PathRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.match_service.get(id).await?))
}

pub async fn list_matches(
    State(state): State<AppState>,
) -> Result<Json<Vec<MatchResponse>>, ApiError> {
    Ok(Json(state.match_service.list().await?))
}

/// Replace a match. `winnerId`, when given, must be one of the two teams.
pub async fn update_match(
    State(state): State<AppState>,
    path: Result<Path<MatchId>, PathRejection>,
    payload: Result<Json<UpdateMatchRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    state.match_service.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_match(
    State(state): State<AppState>,
    path: Result<Path<MatchId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    state.match_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
