//! Tournament service, including the tournament winner query.

use std::sync::Arc;

use super::{TeamLookup, map_constraint, require_tournament, won_any};
use crate::db::{MatchRepository, TeamRepository, TournamentRepository};
use crate::dto::{CreateTournamentRequest, TournamentResponse, UpdateTournamentRequest};
use crate::error::{EntityKind, ServiceError, ServiceResult};
use crate::models::{Match, NewTournament, TeamId, TournamentId};
use crate::winner::resolve_tournament_winner;

const DUPLICATE_NAME: &str = "A tournament with the same name already exists.";
const STILL_REFERENCED: &str = "The tournament still has matches.";

/// Tournament service
#[derive(Clone)]
pub struct TournamentService {
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
    teams: Arc<dyn TeamRepository>,
}

impl TournamentService {
    pub fn new(
        tournaments: Arc<dyn TournamentRepository>,
        matches: Arc<dyn MatchRepository>,
        teams: Arc<dyn TeamRepository>,
    ) -> Self {
        Self {
            tournaments,
            matches,
            teams,
        }
    }

    /// Create a tournament.
    ///
    /// Winner resolution runs once right after the insert. A brand-new
    /// tournament has no matches, so this leaves `winner_id` empty.
    pub async fn create(
        &self,
        request: CreateTournamentRequest,
    ) -> ServiceResult<TournamentResponse> {
        request.validate()?;

        let mut tournament = self
            .tournaments
            .create_tournament(&NewTournament {
                name: request.name.trim().to_string(),
                start_date: request.start_date,
            })
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        log::info!("Created tournament {} ({})", tournament.id, tournament.name);

        let matches = self.matches.list_matches_by_tournament(tournament.id).await?;
        tournament.winner_id = self
            .resolve_and_store(tournament.id, tournament.winner_id, &matches)
            .await?;

        TeamLookup::new(self.teams.as_ref())
            .tournament_response(tournament)
            .await
    }

    /// Get a tournament by ID
    pub async fn get(&self, id: TournamentId) -> ServiceResult<TournamentResponse> {
        let tournament = require_tournament(self.tournaments.as_ref(), id).await?;
        TeamLookup::new(self.teams.as_ref())
            .tournament_response(tournament)
            .await
    }

    /// List all tournaments
    pub async fn list(&self) -> ServiceResult<Vec<TournamentResponse>> {
        let tournaments = self.tournaments.list_tournaments().await?;
        let mut lookup = TeamLookup::new(self.teams.as_ref());

        let mut responses = Vec::with_capacity(tournaments.len());
        for tournament in tournaments {
            responses.push(lookup.tournament_response(tournament).await?);
        }
        Ok(responses)
    }

    /// Replace name and start date. The stored winner is kept.
    pub async fn update(
        &self,
        id: TournamentId,
        request: UpdateTournamentRequest,
    ) -> ServiceResult<()> {
        request.validate(id)?;

        require_tournament(self.tournaments.as_ref(), id).await?;
        let tournament = NewTournament {
            name: request.name.trim().to_string(),
            start_date: request.start_date,
        };

        let updated = self
            .tournaments
            .update_tournament(id, &tournament)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        if !updated {
            return Err(ServiceError::not_found(EntityKind::Tournament, id));
        }
        Ok(())
    }

    /// Delete a tournament. Fails with `Conflict` while it still has matches.
    pub async fn delete(&self, id: TournamentId) -> ServiceResult<()> {
        require_tournament(self.tournaments.as_ref(), id).await?;

        self.tournaments
            .delete_tournament(id)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        log::info!("Deleted tournament {}", id);
        Ok(())
    }

    /// Tournament winner query.
    ///
    /// A stored winner is returned as long as that team still won at least
    /// one match in the tournament. Otherwise the winner is resolved again
    /// from the current matches and stored, so repeated calls keep returning
    /// the same team.
    pub async fn winner(&self, id: TournamentId) -> ServiceResult<TeamId> {
        let tournament = require_tournament(self.tournaments.as_ref(), id).await?;
        let matches = self.matches.list_matches_by_tournament(id).await?;

        if let Some(winner_id) = tournament.winner_id {
            if won_any(winner_id, &matches) {
                return Ok(winner_id);
            }
            log::info!(
                "Tournament {} winner {} no longer won a match there, resolving again",
                id,
                winner_id
            );
        }

        self.resolve_and_store(id, tournament.winner_id, &matches)
            .await?
            .ok_or(ServiceError::NoWinner(id))
    }

    async fn resolve_and_store(
        &self,
        id: TournamentId,
        current: Option<TeamId>,
        matches: &[Match],
    ) -> ServiceResult<Option<TeamId>> {
        let resolved = resolve_tournament_winner(matches);
        if resolved == current {
            return Ok(resolved);
        }

        if !self.tournaments.set_tournament_winner(id, resolved).await? {
            return Err(ServiceError::not_found(EntityKind::Tournament, id));
        }
        log::info!(
            "Tournament {} winner resolved to {:?} from {} match(es)",
            id,
            resolved,
            matches.len()
        );
        Ok(resolved)
    }
}
