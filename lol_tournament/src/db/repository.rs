//! Repository traits and their PostgreSQL implementations.
//!
//! The traits are the entity store contract the services depend on. Deletes
//! are silent no-ops for missing rows; updates report whether a row matched.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::with_default_timeout;
use crate::error::DbResult;
use crate::models::{
    Match, MatchId, NewMatch, NewTeam, NewTournament, Team, TeamId, Tournament, TournamentId,
};

/// Trait for team repository operations
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a team and return it with its assigned id
    async fn create_team(&self, team: &NewTeam) -> DbResult<Team>;

    /// Find team by ID
    async fn find_team(&self, id: TeamId) -> DbResult<Option<Team>>;

    /// All teams, ordered by id
    async fn list_teams(&self) -> DbResult<Vec<Team>>;

    /// Overwrite a team; `false` if no row has that id
    async fn update_team(&self, team: &Team) -> DbResult<bool>;

    /// Delete a team (no-op if absent)
    async fn delete_team(&self, id: TeamId) -> DbResult<()>;
}

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Insert a tournament and return it with its assigned id
    async fn create_tournament(&self, tournament: &NewTournament) -> DbResult<Tournament>;

    /// Find tournament by ID
    async fn find_tournament(&self, id: TournamentId) -> DbResult<Option<Tournament>>;

    /// All tournaments, ordered by id
    async fn list_tournaments(&self) -> DbResult<Vec<Tournament>>;

    /// Replace name and start date; `false` if no row has that id.
    /// The winner column is left alone.
    async fn update_tournament(
        &self,
        id: TournamentId,
        tournament: &NewTournament,
    ) -> DbResult<bool>;

    /// Record or clear the tournament winner; `false` if no row has that id
    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: Option<TeamId>,
    ) -> DbResult<bool>;

    /// Delete a tournament (no-op if absent)
    async fn delete_tournament(&self, id: TournamentId) -> DbResult<()>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert a match and return it with its assigned id and timestamp
    async fn create_match(&self, new_match: &NewMatch) -> DbResult<Match>;

    /// Find match by ID
    async fn find_match(&self, id: MatchId) -> DbResult<Option<Match>>;

    /// All matches, ordered by id
    async fn list_matches(&self) -> DbResult<Vec<Match>>;

    /// Matches of one tournament, newest first
    async fn list_matches_by_tournament(&self, tournament_id: TournamentId)
    -> DbResult<Vec<Match>>;

    /// Overwrite a match; `false` if no row has that id
    async fn update_match(&self, m: &Match) -> DbResult<bool>;

    /// Delete a match (no-op if absent)
    async fn delete_match(&self, id: MatchId) -> DbResult<()>;
}

fn team_from_row(r: &PgRow) -> Team {
    Team {
        id: r.get("id"),
        name: r.get("name"),
        region: r.get("region"),
    }
}

fn tournament_from_row(r: &PgRow) -> Tournament {
    Tournament {
        id: r.get("id"),
        name: r.get("name"),
        start_date: r.get::<NaiveDate, _>("start_date"),
        winner_id: r.get("winner_id"),
    }
}

fn match_from_row(r: &PgRow) -> Match {
    Match {
        id: r.get("id"),
        team_a_id: r.get("team_a_id"),
        team_b_id: r.get("team_b_id"),
        tournament_id: r.get("tournament_id"),
        winner_id: r.get("winner_id"),
        created_at: r.get::<DateTime<Utc>, _>("created_at"),
    }
}

/// PostgreSQL implementation of `TeamRepository`
#[derive(Clone)]
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn create_team(&self, team: &NewTeam) -> DbResult<Team> {
        let row = with_default_timeout(
            sqlx::query("INSERT INTO teams (name, region) VALUES ($1, $2) RETURNING id, name, region")
                .bind(&team.name)
                .bind(&team.region)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(team_from_row(&row))
    }

    async fn find_team(&self, id: TeamId) -> DbResult<Option<Team>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, name, region FROM teams WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(team_from_row))
    }

    async fn list_teams(&self) -> DbResult<Vec<Team>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT id, name, region FROM teams ORDER BY id").fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn update_team(&self, team: &Team) -> DbResult<bool> {
        let result = with_default_timeout(
            sqlx::query("UPDATE teams SET name = $2, region = $3 WHERE id = $1")
                .bind(team.id)
                .bind(&team.name)
                .bind(&team.region)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_team(&self, id: TeamId) -> DbResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM teams WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

/// PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn create_tournament(&self, tournament: &NewTournament) -> DbResult<Tournament> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO tournaments (name, start_date)
                VALUES ($1, $2)
                RETURNING id, name, start_date, winner_id
                "#,
            )
            .bind(&tournament.name)
            .bind(tournament.start_date)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(tournament_from_row(&row))
    }

    async fn find_tournament(&self, id: TournamentId) -> DbResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, name, start_date, winner_id FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(tournament_from_row))
    }

    async fn list_tournaments(&self) -> DbResult<Vec<Tournament>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT id, name, start_date, winner_id FROM tournaments ORDER BY id")
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(tournament_from_row).collect())
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        tournament: &NewTournament,
    ) -> DbResult<bool> {
        let result = with_default_timeout(
            sqlx::query("UPDATE tournaments SET name = $2, start_date = $3 WHERE id = $1")
                .bind(id)
                .bind(&tournament.name)
                .bind(tournament.start_date)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: Option<TeamId>,
    ) -> DbResult<bool> {
        let result = with_default_timeout(
            sqlx::query("UPDATE tournaments SET winner_id = $2 WHERE id = $1")
                .bind(id)
                .bind(winner_id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tournament(&self, id: TournamentId) -> DbResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM tournaments WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

/// PostgreSQL implementation of `MatchRepository`
#[derive(Clone)]
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "id, team_a_id, team_b_id, tournament_id, winner_id, created_at";

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn create_match(&self, new_match: &NewMatch) -> DbResult<Match> {
        let sql = format!(
            "INSERT INTO matches (team_a_id, team_b_id, tournament_id, winner_id) \
             VALUES ($1, $2, $3, $4) RETURNING {MATCH_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(new_match.team_a_id)
                .bind(new_match.team_b_id)
                .bind(new_match.tournament_id)
                .bind(new_match.winner_id)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(match_from_row(&row))
    }

    async fn find_match(&self, id: MatchId) -> DbResult<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = with_default_timeout(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await?;

        Ok(row.as_ref().map(match_from_row))
    }

    async fn list_matches(&self) -> DbResult<Vec<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches ORDER BY id");
        let rows = with_default_timeout(sqlx::query(&sql).fetch_all(&self.pool)).await?;

        Ok(rows.iter().map(match_from_row).collect())
    }

    async fn list_matches_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> DbResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(match_from_row).collect())
    }

    async fn update_match(&self, m: &Match) -> DbResult<bool> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE matches
                SET team_a_id = $2, team_b_id = $3, tournament_id = $4, winner_id = $5
                WHERE id = $1
                "#,
            )
            .bind(m.id)
            .bind(m.team_a_id)
            .bind(m.team_b_id)
            .bind(m.tournament_id)
            .bind(m.winner_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_match(&self, id: MatchId) -> DbResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM matches WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
