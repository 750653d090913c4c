//! In-memory entity store.
//!
//! Implements all three repository traits over a single mutex-protected set
//! of tables and enforces the same rules as the PostgreSQL schema: unique team
//! and tournament names, existing parents for matches, restricted deletes, and
//! `SET NULL` on a deleted tournament winner. Used by tests and by the server's
//! `--in-memory` mode.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{MatchRepository, TeamRepository, TournamentRepository};
use crate::error::{DbError, DbResult};
use crate::models::{
    Match, MatchId, NewMatch, NewTeam, NewTournament, Team, TeamId, Tournament, TournamentId,
};

#[derive(Default)]
struct Tables {
    teams: BTreeMap<TeamId, Team>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    matches: BTreeMap<MatchId, Match>,
    next_team_id: TeamId,
    next_tournament_id: TournamentId,
    next_match_id: MatchId,
}

impl Tables {
    fn team_name_taken(&self, name: &str, except: Option<TeamId>) -> bool {
        self.teams
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }

    fn tournament_name_taken(&self, name: &str, except: Option<TournamentId>) -> bool {
        self.tournaments
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }

    fn check_match_parents(
        &self,
        team_a_id: TeamId,
        team_b_id: TeamId,
        tournament_id: TournamentId,
        winner_id: TeamId,
    ) -> DbResult<()> {
        for (team_id, constraint) in [
            (team_a_id, "matches_team_a_id_fkey"),
            (team_b_id, "matches_team_b_id_fkey"),
            (winner_id, "matches_winner_id_fkey"),
        ] {
            if !self.teams.contains_key(&team_id) {
                return Err(fk_violation(constraint));
            }
        }
        if !self.tournaments.contains_key(&tournament_id) {
            return Err(fk_violation("matches_tournament_id_fkey"));
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn fk_violation(constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

/// Mutex-backed store implementing every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn create_team(&self, team: &NewTeam) -> DbResult<Team> {
        let mut tables = self.lock();
        if tables.team_name_taken(&team.name, None) {
            return Err(unique_violation("teams_name_key"));
        }

        tables.next_team_id += 1;
        let team = Team {
            id: tables.next_team_id,
            name: team.name.clone(),
            region: team.region.clone(),
        };
        tables.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn find_team(&self, id: TeamId) -> DbResult<Option<Team>> {
        Ok(self.lock().teams.get(&id).cloned())
    }

    async fn list_teams(&self) -> DbResult<Vec<Team>> {
        Ok(self.lock().teams.values().cloned().collect())
    }

    async fn update_team(&self, team: &Team) -> DbResult<bool> {
        let mut tables = self.lock();
        if !tables.teams.contains_key(&team.id) {
            return Ok(false);
        }
        if tables.team_name_taken(&team.name, Some(team.id)) {
            return Err(unique_violation("teams_name_key"));
        }
        tables.teams.insert(team.id, team.clone());
        Ok(true)
    }

    async fn delete_team(&self, id: TeamId) -> DbResult<()> {
        let mut tables = self.lock();
        if tables
            .matches
            .values()
            .any(|m| m.involves(id) || m.winner_id == id)
        {
            return Err(fk_violation("matches_team_fkey"));
        }
        if tables.teams.remove(&id).is_some() {
            for tournament in tables.tournaments.values_mut() {
                if tournament.winner_id == Some(id) {
                    tournament.winner_id = None;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn create_tournament(&self, tournament: &NewTournament) -> DbResult<Tournament> {
        let mut tables = self.lock();
        if tables.tournament_name_taken(&tournament.name, None) {
            return Err(unique_violation("tournaments_name_key"));
        }

        tables.next_tournament_id += 1;
        let tournament = Tournament {
            id: tables.next_tournament_id,
            name: tournament.name.clone(),
            start_date: tournament.start_date,
            winner_id: None,
        };
        tables.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn find_tournament(&self, id: TournamentId) -> DbResult<Option<Tournament>> {
        Ok(self.lock().tournaments.get(&id).cloned())
    }

    async fn list_tournaments(&self) -> DbResult<Vec<Tournament>> {
        Ok(self.lock().tournaments.values().cloned().collect())
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        tournament: &NewTournament,
    ) -> DbResult<bool> {
        let mut tables = self.lock();
        if !tables.tournaments.contains_key(&id) {
            return Ok(false);
        }
        if tables.tournament_name_taken(&tournament.name, Some(id)) {
            return Err(unique_violation("tournaments_name_key"));
        }
        match tables.tournaments.get_mut(&id) {
            Some(existing) => {
                existing.name = tournament.name.clone();
                existing.start_date = tournament.start_date;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: Option<TeamId>,
    ) -> DbResult<bool> {
        let mut tables = self.lock();
        if let Some(winner_id) = winner_id {
            if !tables.teams.contains_key(&winner_id) {
                return Err(fk_violation("tournaments_winner_id_fkey"));
            }
        }
        match tables.tournaments.get_mut(&id) {
            Some(tournament) => {
                tournament.winner_id = winner_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tournament(&self, id: TournamentId) -> DbResult<()> {
        let mut tables = self.lock();
        if tables.matches.values().any(|m| m.tournament_id == id) {
            return Err(fk_violation("matches_tournament_id_fkey"));
        }
        tables.tournaments.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn create_match(&self, new_match: &NewMatch) -> DbResult<Match> {
        let mut tables = self.lock();
        tables.check_match_parents(
            new_match.team_a_id,
            new_match.team_b_id,
            new_match.tournament_id,
            new_match.winner_id,
        )?;

        tables.next_match_id += 1;
        let m = Match {
            id: tables.next_match_id,
            team_a_id: new_match.team_a_id,
            team_b_id: new_match.team_b_id,
            tournament_id: new_match.tournament_id,
            winner_id: new_match.winner_id,
            created_at: Utc::now(),
        };
        tables.matches.insert(m.id, m.clone());
        Ok(m)
    }

    async fn find_match(&self, id: MatchId) -> DbResult<Option<Match>> {
        Ok(self.lock().matches.get(&id).cloned())
    }

    async fn list_matches(&self) -> DbResult<Vec<Match>> {
        Ok(self.lock().matches.values().cloned().collect())
    }

    async fn list_matches_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> DbResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .lock()
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(matches)
    }

    async fn update_match(&self, m: &Match) -> DbResult<bool> {
        let mut tables = self.lock();
        if !tables.matches.contains_key(&m.id) {
            return Ok(false);
        }
        tables.check_match_parents(m.team_a_id, m.team_b_id, m.tournament_id, m.winner_id)?;

        // created_at is store-owned
        let created_at = tables.matches.get(&m.id).map(|existing| existing.created_at);
        let mut updated = m.clone();
        if let Some(created_at) = created_at {
            updated.created_at = created_at;
        }
        tables.matches.insert(m.id, updated);
        Ok(true)
    }

    async fn delete_match(&self, id: MatchId) -> DbResult<()> {
        self.lock().matches.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_team(name: &str) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            region: "NA".to_string(),
        }
    }

    fn new_tournament(name: &str) -> NewTournament {
        NewTournament {
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();
        let b = store.create_team(&new_team("Beta")).await.unwrap();

        assert_eq!(a.id, 1, "First team should have ID 1");
        assert_eq!(b.id, 2, "Second team should have ID 2");
    }

    #[tokio::test]
    async fn test_duplicate_team_name_rejected() {
        let store = MemoryStore::new();
        store.create_team(&new_team("Alpha")).await.unwrap();

        let err = store.create_team(&new_team("Alpha")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_rejected() {
        let store = MemoryStore::new();
        store.create_team(&new_team("Alpha")).await.unwrap();
        let mut beta = store.create_team(&new_team("Beta")).await.unwrap();

        beta.name = "Alpha".to_string();
        let err = store.update_team(&beta).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_team_reports_false() {
        let store = MemoryStore::new();
        let ghost = Team {
            id: 99,
            name: "Ghost".to_string(),
            region: "EU".to_string(),
        };
        assert!(!store.update_team(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = MemoryStore::new();
        assert!(store.delete_team(42).await.is_ok());
        assert!(store.delete_tournament(42).await.is_ok());
        assert!(store.delete_match(42).await.is_ok());
    }

    #[tokio::test]
    async fn test_match_requires_existing_parents() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();

        let err = store
            .create_match(&NewMatch {
                team_a_id: a.id,
                team_b_id: 77,
                tournament_id: 1,
                winner_id: a.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();
        let b = store.create_team(&new_team("Beta")).await.unwrap();
        let cup = store
            .create_tournament(&new_tournament("Cup"))
            .await
            .unwrap();
        let m = store
            .create_match(&NewMatch {
                team_a_id: a.id,
                team_b_id: b.id,
                tournament_id: cup.id,
                winner_id: b.id,
            })
            .await
            .unwrap();

        assert!(matches!(
            store.delete_team(a.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
        assert!(matches!(
            store.delete_tournament(cup.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));

        store.delete_match(m.id).await.unwrap();
        store.delete_team(a.id).await.unwrap();
        store.delete_tournament(cup.id).await.unwrap();
        assert!(store.find_team(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_winner_clears_tournament_winner() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();
        let cup = store
            .create_tournament(&new_tournament("Cup"))
            .await
            .unwrap();

        assert!(store.set_tournament_winner(cup.id, Some(a.id)).await.unwrap());
        store.delete_team(a.id).await.unwrap();

        let cup = store.find_tournament(cup.id).await.unwrap().unwrap();
        assert_eq!(cup.winner_id, None);
    }

    #[tokio::test]
    async fn test_update_tournament_leaves_winner_alone() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();
        let cup = store
            .create_tournament(&new_tournament("Cup"))
            .await
            .unwrap();
        assert!(store.set_tournament_winner(cup.id, Some(a.id)).await.unwrap());

        assert!(
            store
                .update_tournament(cup.id, &new_tournament("Cup 2"))
                .await
                .unwrap()
        );
        let cup = store.find_tournament(cup.id).await.unwrap().unwrap();
        assert_eq!(cup.name, "Cup 2");
        assert_eq!(cup.winner_id, Some(a.id));

        assert!(store.set_tournament_winner(cup.id, None).await.unwrap());
        let cup = store.find_tournament(cup.id).await.unwrap().unwrap();
        assert_eq!(cup.winner_id, None);
    }

    #[tokio::test]
    async fn test_matches_by_tournament_newest_first() {
        let store = MemoryStore::new();
        let a = store.create_team(&new_team("Alpha")).await.unwrap();
        let b = store.create_team(&new_team("Beta")).await.unwrap();
        let cup = store
            .create_tournament(&new_tournament("Cup"))
            .await
            .unwrap();
        let other = store
            .create_tournament(&new_tournament("Other"))
            .await
            .unwrap();

        for tournament_id in [cup.id, other.id, cup.id] {
            store
                .create_match(&NewMatch {
                    team_a_id: a.id,
                    team_b_id: b.id,
                    tournament_id,
                    winner_id: a.id,
                })
                .await
                .unwrap();
        }

        let ids: Vec<MatchId> = store
            .list_matches_by_tournament(cup.id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
