//! Team service.

use std::sync::Arc;

use super::{map_constraint, require_team};
use crate::db::TeamRepository;
use crate::dto::{CreateTeamRequest, TeamResponse, UpdateTeamRequest};
use crate::error::{EntityKind, ServiceError, ServiceResult};
use crate::models::{NewTeam, Team, TeamId};

const DUPLICATE_NAME: &str = "A team with the same name already exists.";
const STILL_REFERENCED: &str = "The team is still referenced by matches.";

/// Team service
#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>) -> Self {
        Self { teams }
    }

    /// Register a new team
    pub async fn create(&self, request: CreateTeamRequest) -> ServiceResult<TeamResponse> {
        request.validate()?;

        let team = self
            .teams
            .create_team(&NewTeam {
                name: request.name.trim().to_string(),
                region: request.region.trim().to_string(),
            })
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        log::info!("Created team {} ({})", team.id, team.name);
        Ok(team.into())
    }

    /// Get a team by ID
    pub async fn get(&self, id: TeamId) -> ServiceResult<TeamResponse> {
        Ok(require_team(self.teams.as_ref(), id).await?.into())
    }

    /// List all teams
    pub async fn list(&self) -> ServiceResult<Vec<TeamResponse>> {
        let teams = self.teams.list_teams().await?;
        Ok(teams.into_iter().map(TeamResponse::from).collect())
    }

    /// Replace name and region of an existing team
    pub async fn update(&self, id: TeamId, request: UpdateTeamRequest) -> ServiceResult<()> {
        request.validate(id)?;

        let team = Team {
            id,
            name: request.name.trim().to_string(),
            region: request.region.trim().to_string(),
        };
        let updated = self
            .teams
            .update_team(&team)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        if !updated {
            return Err(ServiceError::not_found(EntityKind::Team, id));
        }
        Ok(())
    }

    /// Delete a team. Fails with `Conflict` while matches reference it.
    pub async fn delete(&self, id: TeamId) -> ServiceResult<()> {
        require_team(self.teams.as_ref(), id).await?;

        self.teams
            .delete_team(id)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_NAME, STILL_REFERENCED))?;

        log::info!("Deleted team {}", id);
        Ok(())
    }
}
