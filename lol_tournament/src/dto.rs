//! Request and response payloads.
//!
//! Field names are camelCase on the wire. Requests carry `validate` methods
//! that the services run before touching the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    MAX_NAME_LEN, Match, MatchId, Team, TeamId, Tournament, TournamentId,
};

fn validate_name(label: &str, name: &str) -> ServiceResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Invalid(format!("{label} name is required.")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::Invalid(format!(
            "{label} name must be at most {MAX_NAME_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_region(region: &str) -> ServiceResult<()> {
    if region.trim().is_empty() {
        return Err(ServiceError::Invalid("Region is required.".to_string()));
    }
    Ok(())
}

fn check_path_id(path_id: i32, body_id: i32) -> ServiceResult<()> {
    if path_id != body_id {
        return Err(ServiceError::Invalid(
            "ID in URL and body must match.".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Teams
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    pub region: String,
}

impl CreateTeamRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_name("Team", &self.name)?;
        validate_region(&self.region)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub id: TeamId,
    pub name: String,
    pub region: String,
}

impl UpdateTeamRequest {
    /// Validate against the id taken from the request path
    pub fn validate(&self, path_id: TeamId) -> ServiceResult<()> {
        check_path_id(path_id, self.id)?;
        validate_name("Team", &self.name)?;
        validate_region(&self.region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: TeamId,
    pub name: String,
    pub region: String,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            region: team.region,
        }
    }
}

// ============================================================================
// Tournaments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    #[serde(alias = "startdate", alias = "start_date")]
    pub start_date: NaiveDate,
}

impl CreateTournamentRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_name("Tournament", &self.name)
    }

    /// Reject start dates before `today`
    pub fn validate_start_date(&self, today: NaiveDate) -> ServiceResult<()> {
        if self.start_date < today {
            return Err(ServiceError::Invalid(
                "The start date cannot be in the past.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTournamentRequest {
    pub id: TournamentId,
    pub name: String,
    #[serde(alias = "startdate", alias = "start_date")]
    pub start_date: NaiveDate,
}

impl UpdateTournamentRequest {
    pub fn validate(&self, path_id: TournamentId) -> ServiceResult<()> {
        check_path_id(path_id, self.id)?;
        validate_name("Tournament", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResponse {
    pub id: TournamentId,
    pub name: String,
    pub start_date: NaiveDate,
    pub winner_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<TeamResponse>,
}

impl TournamentResponse {
    /// Build a response from a tournament and its (already loaded) winner
    pub fn new(tournament: Tournament, winner: Option<Team>) -> Self {
        Self {
            id: tournament.id,
            name: tournament.name,
            start_date: tournament.start_date,
            winner_id: tournament.winner_id,
            winner: winner.map(TeamResponse::from),
        }
    }
}

// ============================================================================
// Matches
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub tournament_id: TournamentId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub id: MatchId,
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub tournament_id: TournamentId,
    /// Must be one of the two sides when given
    #[serde(default)]
    pub winner_id: Option<TeamId>,
}

impl UpdateMatchRequest {
    pub fn validate(&self, path_id: MatchId) -> ServiceResult<()> {
        check_path_id(path_id, self.id)?;
        if let Some(winner_id) = self.winner_id {
            if winner_id != self.team_a_id && winner_id != self.team_b_id {
                return Err(ServiceError::Invalid(
                    "Winner must be one of the match teams.".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: MatchId,
    pub team_a: TeamResponse,
    pub team_b: TeamResponse,
    pub tournament: TournamentResponse,
    pub winner: TeamResponse,
}

impl MatchResponse {
    pub fn new(
        m: &Match,
        team_a: Team,
        team_b: Team,
        tournament: TournamentResponse,
        winner: Team,
    ) -> Self {
        Self {
            id: m.id,
            team_a: team_a.into(),
            team_b: team_b.into(),
            tournament,
            winner: winner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_name_rules() {
        let ok = CreateTeamRequest {
            name: "Alpha".to_string(),
            region: "NA".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = CreateTeamRequest {
            name: "   ".to_string(),
            region: "NA".to_string(),
        };
        assert!(matches!(blank.validate(), Err(ServiceError::Invalid(_))));

        let long = CreateTeamRequest {
            name: "x".repeat(MAX_NAME_LEN + 1),
            region: "NA".to_string(),
        };
        assert!(matches!(long.validate(), Err(ServiceError::Invalid(_))));

        let exact = CreateTeamRequest {
            name: "x".repeat(MAX_NAME_LEN),
            region: "NA".to_string(),
        };
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_region_required() {
        let req = CreateTeamRequest {
            name: "Alpha".to_string(),
            region: String::new(),
        };
        assert!(matches!(req.validate(), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn test_update_id_mismatch() {
        let req = UpdateTeamRequest {
            id: 2,
            name: "Alpha".to_string(),
            region: "NA".to_string(),
        };
        assert!(req.validate(2).is_ok());
        let err = req.validate(3).unwrap_err();
        assert_eq!(err.to_string(), "ID in URL and body must match.");
    }

    #[test]
    fn test_start_date_in_past_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let req = CreateTournamentRequest {
            name: "Cup".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
        };
        assert!(req.validate_start_date(today).is_err());

        let req = CreateTournamentRequest {
            name: "Cup".to_string(),
            start_date: today,
        };
        assert!(req.validate_start_date(today).is_ok());
    }

    #[test]
    fn test_match_winner_must_be_a_side() {
        let req = UpdateMatchRequest {
            id: 1,
            team_a_id: 1,
            team_b_id: 2,
            tournament_id: 1,
            winner_id: Some(3),
        };
        assert!(matches!(req.validate(1), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let req: CreateMatchRequest =
            serde_json::from_str(r#"{"teamAId":1,"teamBId":2,"tournamentId":3}"#).unwrap();
        assert_eq!((req.team_a_id, req.team_b_id, req.tournament_id), (1, 2, 3));

        let req: CreateTournamentRequest =
            serde_json::from_str(r#"{"name":"Cup","startdate":"2030-05-01"}"#).unwrap();
        assert_eq!(req.start_date, NaiveDate::from_ymd_opt(2030, 5, 1).unwrap());

        let response = TournamentResponse::new(
            Tournament {
                id: 1,
                name: "Cup".to_string(),
                start_date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
                winner_id: None,
            },
            None,
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["startDate"], "2030-05-01");
        assert!(json["winnerId"].is_null());
        assert!(json.get("winner").is_none());
    }
}
