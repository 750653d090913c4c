//! Tournament API handlers, including the winner query.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use lol_tournament::dto::{
    CreateTournamentRequest, MatchResponse, TournamentResponse, UpdateTournamentRequest,
};
use lol_tournament::{TeamId, TournamentId};

use super::{AppState, error::ApiError};

/// Create a tournament.
///
/// The start date may be today but not earlier (server UTC date).
pub async fn create_tournament(
    State(state): State<AppState>,
    payload: Result<Json<CreateTournamentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    request.validate_start_date(Utc::now().date_naive())?;

    let tournament = state.tournament_service.create(request).await?;
    let location = format!("/api/tournament/{}", tournament.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(tournament),
    ))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    path: Result<Path<TournamentId>, PathRejection>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.tournament_service.get(id).await?))
}

pub async fn list_tournaments(
    State(state): State<AppState>,
) -> Result<Json<Vec<TournamentResponse>>, ApiError> {
    Ok(Json(state.tournament_service.list().await?))
}

/// Replace name and start date. The winner is never taken from the body.
pub async fn update_tournament(
    State(state): State<AppState>,
    path: Result<Path<TournamentId>, PathRejection>,
    payload: Result<Json<UpdateTournamentRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    state.tournament_service.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_tournament(
    State(state): State<AppState>,
    path: Result<Path<TournamentId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    state.tournament_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Winner team id as a bare JSON number.
///
/// `404` both for an unknown tournament and one without matches yet.
pub async fn get_tournament_winner(
    State(state): State<AppState>,
    path: Result<Path<TournamentId>, PathRejection>,
) -> Result<Json<TeamId>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.tournament_service.winner(id).await?))
}

/// Matches of a tournament, newest first
pub async fn list_tournament_matches(
    State(state): State<AppState>,
    path: Result<Path<TournamentId>, PathRejection>,
) -> Result<Json<Vec<MatchResponse>>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.match_service.list_by_tournament(id).await?))
}
