//! Match service. Winners are decided by the injected coin at creation.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    TeamLookup, map_constraint, release_unbacked_winner, require_team, require_tournament,
};
use crate::db::{MatchRepository, TeamRepository, TournamentRepository};
use crate::dto::{CreateMatchRequest, MatchResponse, TournamentResponse, UpdateMatchRequest};
use crate::error::{EntityKind, ServiceError, ServiceResult};
use crate::models::{Match, MatchId, NewMatch, TeamId, TournamentId};
use crate::winner::{CoinFlip, CoinSide, resolve_match_winner};

const MISSING_PARENT: &str = "A referenced team or tournament no longer exists.";

/// Match service
#[derive(Clone)]
pub struct MatchService {
    matches: Arc<dyn MatchRepository>,
    teams: Arc<dyn TeamRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    coin: Arc<dyn CoinFlip>,
}

impl MatchService {
    pub fn new(
        matches: Arc<dyn MatchRepository>,
        teams: Arc<dyn TeamRepository>,
        tournaments: Arc<dyn TournamentRepository>,
        coin: Arc<dyn CoinFlip>,
    ) -> Self {
        Self {
            matches,
            teams,
            tournaments,
            coin,
        }
    }

    /// Create a match and decide its winner with a coin flip.
    ///
    /// Both teams and the tournament must exist. Returns the hydrated match
    /// together with the side the coin landed on.
    pub async fn create(
        &self,
        request: CreateMatchRequest,
    ) -> ServiceResult<(MatchResponse, CoinSide)> {
        let team_a = require_team(self.teams.as_ref(), request.team_a_id).await?;
        let team_b = require_team(self.teams.as_ref(), request.team_b_id).await?;
        let tournament = require_tournament(self.tournaments.as_ref(), request.tournament_id).await?;

        let (winner_id, side) = resolve_match_winner(self.coin.as_ref(), team_a.id, team_b.id);

        let created = self
            .matches
            .create_match(&NewMatch {
                team_a_id: team_a.id,
                team_b_id: team_b.id,
                tournament_id: tournament.id,
                winner_id,
            })
            .await
            .map_err(|e| map_constraint(e, MISSING_PARENT, MISSING_PARENT))?;

        log::info!(
            "Created match {}: team {} vs team {} in tournament {}, winner {} ({})",
            created.id,
            team_a.id,
            team_b.id,
            tournament.id,
            winner_id,
            side.as_str()
        );

        let mut lookup = TeamLookup::new(self.teams.as_ref());
        lookup.seed(&team_a);
        lookup.seed(&team_b);
        let tournament = lookup.tournament_response(tournament).await?;

        let winner = lookup.get(created.winner_id).await?;
        let response = MatchResponse::new(&created, team_a, team_b, tournament, winner);
        Ok((response, side))
    }

    /// Get a match by ID with its teams, tournament and winner
    pub async fn get(&self, id: MatchId) -> ServiceResult<MatchResponse> {
        let m = self.require_match(id).await?;
        let mut hydrator = Hydrator::new(self);
        hydrator.hydrate(&m).await
    }

    /// List all matches
    pub async fn list(&self) -> ServiceResult<Vec<MatchResponse>> {
        let matches = self.matches.list_matches().await?;
        self.hydrate_all(&matches).await
    }

    /// List a tournament's matches, newest first
    pub async fn list_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<MatchResponse>> {
        require_tournament(self.tournaments.as_ref(), tournament_id).await?;
        let matches = self.matches.list_matches_by_tournament(tournament_id).await?;
        self.hydrate_all(&matches).await
    }

    /// Replace the sides and tournament of a match.
    ///
    /// An explicit `winner_id` must be one of the new sides. Without one, the
    /// stored winner is kept when it still plays in the match; otherwise the
    /// coin is flipped again.
    pub async fn update(&self, id: MatchId, request: UpdateMatchRequest) -> ServiceResult<()> {
        request.validate(id)?;

        let existing = self.require_match(id).await?;
        require_team(self.teams.as_ref(), request.team_a_id).await?;
        require_team(self.teams.as_ref(), request.team_b_id).await?;
        require_tournament(self.tournaments.as_ref(), request.tournament_id).await?;

        let winner_id = match request.winner_id {
            Some(winner_id) => winner_id,
            None => self.carry_winner(&existing, request.team_a_id, request.team_b_id),
        };

        let updated = self
            .matches
            .update_match(&Match {
                id,
                team_a_id: request.team_a_id,
                team_b_id: request.team_b_id,
                tournament_id: request.tournament_id,
                winner_id,
                created_at: existing.created_at,
            })
            .await
            .map_err(|e| map_constraint(e, MISSING_PARENT, MISSING_PARENT))?;

        if !updated {
            return Err(ServiceError::not_found(EntityKind::Match, id));
        }

        if existing.winner_id != winner_id || existing.tournament_id != request.tournament_id {
            release_unbacked_winner(
                self.tournaments.as_ref(),
                self.matches.as_ref(),
                existing.tournament_id,
            )
            .await?;
        }
        Ok(())
    }

    /// Delete a match. A tournament winner backed only by this match is cleared.
    pub async fn delete(&self, id: MatchId) -> ServiceResult<()> {
        let existing = self.require_match(id).await?;
        self.matches.delete_match(id).await?;
        log::info!("Deleted match {}", id);

        release_unbacked_winner(
            self.tournaments.as_ref(),
            self.matches.as_ref(),
            existing.tournament_id,
        )
        .await
    }

    fn carry_winner(&self, existing: &Match, team_a: TeamId, team_b: TeamId) -> TeamId {
        if existing.winner_id == team_a || existing.winner_id == team_b {
            existing.winner_id
        } else {
            resolve_match_winner(self.coin.as_ref(), team_a, team_b).0
        }
    }

    async fn require_match(&self, id: MatchId) -> ServiceResult<Match> {
        self.matches
            .find_match(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Match, id))
    }

    async fn hydrate_all(&self, matches: &[Match]) -> ServiceResult<Vec<MatchResponse>> {
        let mut hydrator = Hydrator::new(self);
        let mut responses = Vec::with_capacity(matches.len());
        for m in matches {
            responses.push(hydrator.hydrate(m).await?);
        }
        Ok(responses)
    }
}

/// Resolves match references, caching teams and tournaments across rows
struct Hydrator<'a> {
    teams: TeamLookup<'a>,
    tournaments: &'a dyn TournamentRepository,
    tournament_cache: HashMap<TournamentId, TournamentResponse>,
}

impl<'a> Hydrator<'a> {
    fn new(service: &'a MatchService) -> Self {
        Self {
            teams: TeamLookup::new(service.teams.as_ref()),
            tournaments: service.tournaments.as_ref(),
            tournament_cache: HashMap::new(),
        }
    }

    async fn tournament(&mut self, id: TournamentId) -> ServiceResult<TournamentResponse> {
        if let Some(cached) = self.tournament_cache.get(&id) {
            return Ok(cached.clone());
        }
        let tournament = require_tournament(self.tournaments, id).await?;
        let response = self.teams.tournament_response(tournament).await?;
        self.tournament_cache.insert(id, response.clone());
        Ok(response)
    }

    async fn hydrate(&mut self, m: &Match) -> ServiceResult<MatchResponse> {
        let team_a = self.teams.get(m.team_a_id).await?;
        let team_b = self.teams.get(m.team_b_id).await?;
        let winner = self.teams.get(m.winner_id).await?;
        let tournament = self.tournament(m.tournament_id).await?;
        Ok(MatchResponse::new(m, team_a, team_b, tournament, winner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewTeam, NewTournament};
    use crate::service::TournamentService;
    use crate::winner::{FixedCoin, SequenceCoin};
    use chrono::NaiveDate;

    struct Fixture {
        store: Arc<MemoryStore>,
        alpha: TeamId,
        beta: TeamId,
        cup: TournamentId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alpha = store
            .create_team(&NewTeam {
                name: "Alpha".to_string(),
                region: "NA".to_string(),
            })
            .await
            .unwrap()
            .id;
        let beta = store
            .create_team(&NewTeam {
                name: "Beta".to_string(),
                region: "EU".to_string(),
            })
            .await
            .unwrap()
            .id;
        let cup = store
            .create_tournament(&NewTournament {
                name: "Cup".to_string(),
                start_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            })
            .await
            .unwrap()
            .id;
        Fixture {
            store,
            alpha,
            beta,
            cup,
        }
    }

    fn service(store: &Arc<MemoryStore>, coin: impl CoinFlip + 'static) -> MatchService {
        MatchService::new(store.clone(), store.clone(), store.clone(), Arc::new(coin))
    }

    fn create_request(f: &Fixture) -> CreateMatchRequest {
        CreateMatchRequest {
            team_a_id: f.alpha,
            team_b_id: f.beta,
            tournament_id: f.cup,
        }
    }

    #[tokio::test]
    async fn test_heads_picks_team_a() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));

        let (created, side) = matches.create(create_request(&f)).await.unwrap();
        assert_eq!(side, CoinSide::Heads);
        assert_eq!(created.team_a.name, "Alpha");
        assert_eq!(created.team_b.name, "Beta");
        assert_eq!(created.tournament.name, "Cup");
        assert_eq!(created.winner.id, f.alpha);
    }

    #[tokio::test]
    async fn test_tails_picks_team_b() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Tails));

        let (created, _) = matches.create(create_request(&f)).await.unwrap();
        assert_eq!(created.winner.id, f.beta);

        let fetched = matches.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_unknown_team_is_not_found() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));

        let err = matches
            .create(CreateMatchRequest {
                team_a_id: f.alpha,
                team_b_id: 404,
                tournament_id: f.cup,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Team,
                id: 404
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_tournament_is_not_found() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));

        let err = matches
            .create(CreateMatchRequest {
                team_a_id: f.alpha,
                team_b_id: f.beta,
                tournament_id: 77,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Tournament,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_self_match_is_allowed() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Tails));

        let (created, _) = matches
            .create(CreateMatchRequest {
                team_a_id: f.alpha,
                team_b_id: f.alpha,
                tournament_id: f.cup,
            })
            .await
            .unwrap();
        assert_eq!(created.winner.id, f.alpha);
    }

    #[tokio::test]
    async fn test_list_by_tournament_newest_first() {
        let f = fixture().await;
        let matches = service(
            &f.store,
            SequenceCoin::new(vec![CoinSide::Heads, CoinSide::Tails]),
        );

        let (first, _) = matches.create(create_request(&f)).await.unwrap();
        let (second, _) = matches.create(create_request(&f)).await.unwrap();

        let listed = matches.list_by_tournament(f.cup).await.unwrap();
        let ids: Vec<MatchId> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(listed[0].winner.id, f.beta);
        assert_eq!(listed[1].winner.id, f.alpha);

        assert!(matches!(
            matches.list_by_tournament(999).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_winner_still_playing() {
        let f = fixture().await;
        let gamma = f
            .store
            .create_team(&NewTeam {
                name: "Gamma".to_string(),
                region: "KR".to_string(),
            })
            .await
            .unwrap()
            .id;
        let matches = service(
            &f.store,
            SequenceCoin::new(vec![CoinSide::Heads, CoinSide::Tails]),
        );
        let (created, _) = matches.create(create_request(&f)).await.unwrap();
        assert_eq!(created.winner.id, f.alpha);

        // Alpha still plays, so it stays the winner
        matches
            .update(
                created.id,
                UpdateMatchRequest {
                    id: created.id,
                    team_a_id: f.alpha,
                    team_b_id: gamma,
                    tournament_id: f.cup,
                    winner_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(matches.get(created.id).await.unwrap().winner.id, f.alpha);

        // Alpha dropped: the coin decides again (tails -> team B)
        matches
            .update(
                created.id,
                UpdateMatchRequest {
                    id: created.id,
                    team_a_id: f.beta,
                    team_b_id: gamma,
                    tournament_id: f.cup,
                    winner_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(matches.get(created.id).await.unwrap().winner.id, gamma);
    }

    #[tokio::test]
    async fn test_update_with_explicit_winner() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));
        let (created, _) = matches.create(create_request(&f)).await.unwrap();

        matches
            .update(
                created.id,
                UpdateMatchRequest {
                    id: created.id,
                    team_a_id: f.alpha,
                    team_b_id: f.beta,
                    tournament_id: f.cup,
                    winner_id: Some(f.beta),
                },
            )
            .await
            .unwrap();
        assert_eq!(matches.get(created.id).await.unwrap().winner.id, f.beta);
    }

    #[tokio::test]
    async fn test_editing_deciding_match_moves_tournament_winner() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));
        let tournaments =
            TournamentService::new(f.store.clone(), f.store.clone(), f.store.clone());
        let (created, _) = matches.create(create_request(&f)).await.unwrap();
        assert_eq!(tournaments.winner(f.cup).await.unwrap(), f.alpha);

        matches
            .update(
                created.id,
                UpdateMatchRequest {
                    id: created.id,
                    team_a_id: f.alpha,
                    team_b_id: f.beta,
                    tournament_id: f.cup,
                    winner_id: Some(f.beta),
                },
            )
            .await
            .unwrap();

        // Alpha no longer won anything in the cup
        assert_eq!(tournaments.get(f.cup).await.unwrap().winner_id, None);
        assert_eq!(tournaments.winner(f.cup).await.unwrap(), f.beta);
    }

    #[tokio::test]
    async fn test_moving_deciding_match_releases_tournament_winner() {
        let f = fixture().await;
        let other = f
            .store
            .create_tournament(&NewTournament {
                name: "Other Cup".to_string(),
                start_date: NaiveDate::from_ymd_opt(2099, 2, 1).unwrap(),
            })
            .await
            .unwrap()
            .id;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));
        let tournaments =
            TournamentService::new(f.store.clone(), f.store.clone(), f.store.clone());
        let (created, _) = matches.create(create_request(&f)).await.unwrap();
        tournaments.winner(f.cup).await.unwrap();

        matches
            .update(
                created.id,
                UpdateMatchRequest {
                    id: created.id,
                    team_a_id: f.alpha,
                    team_b_id: f.beta,
                    tournament_id: other,
                    winner_id: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            tournaments.winner(f.cup).await,
            Err(ServiceError::NoWinner(id)) if id == f.cup
        ));
        assert_eq!(tournaments.winner(other).await.unwrap(), f.alpha);
    }

    #[tokio::test]
    async fn test_deleting_only_match_clears_tournament_winner() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));
        let tournaments =
            TournamentService::new(f.store.clone(), f.store.clone(), f.store.clone());
        let (created, _) = matches.create(create_request(&f)).await.unwrap();
        assert_eq!(tournaments.winner(f.cup).await.unwrap(), f.alpha);

        matches.delete(created.id).await.unwrap();

        assert_eq!(tournaments.get(f.cup).await.unwrap().winner_id, None);
        assert!(matches!(
            tournaments.winner(f.cup).await,
            Err(ServiceError::NoWinner(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_other_match_keeps_tournament_winner() {
        let f = fixture().await;
        let matches = service(
            &f.store,
            SequenceCoin::new(vec![CoinSide::Heads, CoinSide::Heads, CoinSide::Tails]),
        );
        let tournaments =
            TournamentService::new(f.store.clone(), f.store.clone(), f.store.clone());
        let (first, _) = matches.create(create_request(&f)).await.unwrap();
        matches.create(create_request(&f)).await.unwrap();
        assert_eq!(tournaments.winner(f.cup).await.unwrap(), f.alpha);

        // Alpha still won the second match
        matches.delete(first.id).await.unwrap();
        assert_eq!(tournaments.get(f.cup).await.unwrap().winner_id, Some(f.alpha));

        // A newer match won by Beta does not unseat a backed winner
        matches.create(create_request(&f)).await.unwrap();
        assert_eq!(tournaments.winner(f.cup).await.unwrap(), f.alpha);
    }

    #[tokio::test]
    async fn test_update_unknown_match_is_not_found() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));

        let err = matches
            .update(
                9,
                UpdateMatchRequest {
                    id: 9,
                    team_a_id: f.alpha,
                    team_b_id: f.beta,
                    tournament_id: f.cup,
                    winner_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Match,
                id: 9
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let f = fixture().await;
        let matches = service(&f.store, FixedCoin(CoinSide::Heads));
        let (created, _) = matches.create(create_request(&f)).await.unwrap();

        matches.delete(created.id).await.unwrap();
        assert!(matches!(
            matches.get(created.id).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            matches.delete(created.id).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches.list().await.unwrap().is_empty());
    }
}
