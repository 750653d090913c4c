//! Entity models for teams, tournaments and matches.
//!
//! Entities reference each other through plain ids. Related rows are loaded
//! explicitly by the services through the repositories.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Team ID type
pub type TeamId = i32;

/// Tournament ID type
pub type TournamentId = i32;

/// Match ID type
pub type MatchId = i32;

/// Maximum length (in characters) of team and tournament names
pub const MAX_NAME_LEN: usize = 100;

/// A registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Store-assigned identifier
    pub id: TeamId,
    /// Unique team name
    pub name: String,
    /// Region the team plays in
    pub region: String,
}

/// Team data before it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    pub region: String,
}

/// A tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Store-assigned identifier
    pub id: TournamentId,
    /// Unique tournament name
    pub name: String,
    /// First day of the tournament
    pub start_date: NaiveDate,
    /// Declared winner, if one has been resolved
    pub winner_id: Option<TeamId>,
}

/// Tournament data before it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTournament {
    pub name: String,
    pub start_date: NaiveDate,
}

/// A match between two teams inside a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Store-assigned identifier
    pub id: MatchId,
    /// First side
    pub team_a_id: TeamId,
    /// Second side
    pub team_b_id: TeamId,
    /// Tournament the match belongs to
    pub tournament_id: TournamentId,
    /// Winning side, always one of `team_a_id` / `team_b_id`
    pub winner_id: TeamId,
    /// Creation timestamp assigned by the store
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Whether the given team plays in this match
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team_a_id == team_id || self.team_b_id == team_id
    }
}

/// Match data before it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub tournament_id: TournamentId,
    pub winner_id: TeamId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_involves_both_sides() {
        let m = Match {
            id: 1,
            team_a_id: 10,
            team_b_id: 20,
            tournament_id: 3,
            winner_id: 10,
            created_at: Utc::now(),
        };

        assert!(m.involves(10));
        assert!(m.involves(20));
        assert!(!m.involves(30));
    }
}
