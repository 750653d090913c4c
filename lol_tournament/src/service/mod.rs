//! Entity services.
//!
//! Each service validates its input, calls the repositories, applies winner
//! resolution where needed, and maps entities to response DTOs. Store
//! constraint violations come back as [`ServiceError::Conflict`]; missing rows
//! as [`ServiceError::NotFound`].

use std::collections::HashMap;

use crate::db::{MatchRepository, TeamRepository, TournamentRepository};
use crate::dto::TournamentResponse;
use crate::error::{DbError, EntityKind, ServiceError, ServiceResult};
use crate::models::{Match, Team, TeamId, Tournament, TournamentId};

pub mod matches;
pub mod team;
pub mod tournament;

pub use matches::MatchService;
pub use team::TeamService;
pub use tournament::TournamentService;

/// Translate constraint violations into conflicts, everything else into a store error
fn map_constraint(err: DbError, duplicate: &str, referenced: &str) -> ServiceError {
    match err {
        DbError::UniqueViolation { .. } => ServiceError::Conflict(duplicate.to_string()),
        DbError::ForeignKeyViolation { .. } => ServiceError::Conflict(referenced.to_string()),
        other => ServiceError::Store(other),
    }
}

async fn require_team(teams: &dyn TeamRepository, id: TeamId) -> ServiceResult<Team> {
    teams
        .find_team(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Team, id))
}

async fn require_tournament(
    tournaments: &dyn TournamentRepository,
    id: TournamentId,
) -> ServiceResult<Tournament> {
    tournaments
        .find_tournament(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Tournament, id))
}

/// Whether `team` won at least one of `matches`
fn won_any(team: TeamId, matches: &[Match]) -> bool {
    matches.iter().any(|m| m.winner_id == team)
}

/// Clear a tournament's stored winner once that team no longer won any of
/// its matches. The winner query resolves a replacement on its next call.
async fn release_unbacked_winner(
    tournaments: &dyn TournamentRepository,
    matches: &dyn MatchRepository,
    id: TournamentId,
) -> ServiceResult<()> {
    let Some(tournament) = tournaments.find_tournament(id).await? else {
        return Ok(());
    };
    let Some(winner_id) = tournament.winner_id else {
        return Ok(());
    };

    let played = matches.list_matches_by_tournament(id).await?;
    if !won_any(winner_id, &played) {
        tournaments.set_tournament_winner(id, None).await?;
        log::info!(
            "Cleared winner {} of tournament {}: no remaining match won",
            winner_id,
            id
        );
    }
    Ok(())
}

/// Per-call cache of teams, so listings don't reload the same team per row
struct TeamLookup<'a> {
    repo: &'a dyn TeamRepository,
    cache: HashMap<TeamId, Team>,
}

impl<'a> TeamLookup<'a> {
    fn new(repo: &'a dyn TeamRepository) -> Self {
        Self {
            repo,
            cache: HashMap::new(),
        }
    }

    fn seed(&mut self, team: &Team) {
        self.cache.insert(team.id, team.clone());
    }

    async fn get(&mut self, id: TeamId) -> ServiceResult<Team> {
        if let Some(team) = self.cache.get(&id) {
            return Ok(team.clone());
        }
        let team = require_team(self.repo, id).await?;
        self.cache.insert(id, team.clone());
        Ok(team)
    }

    async fn tournament_response(
        &mut self,
        tournament: Tournament,
    ) -> ServiceResult<TournamentResponse> {
        let winner = match tournament.winner_id {
            Some(winner_id) => Some(self.get(winner_id).await?),
            None => None,
        };
        Ok(TournamentResponse::new(tournament, winner))
    }
}
