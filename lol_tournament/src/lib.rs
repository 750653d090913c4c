//! # LoL Tournament
//!
//! Core library for managing esports tournaments, teams and matches.
//!
//! The library is organised as a thin stack of layers:
//!
//! - [`models`]: plain entity structs with explicit foreign-key ids
//! - [`db`]: PostgreSQL pool, repositories, and an in-memory store with the same constraints
//! - [`winner`]: match and tournament winner resolution
//! - [`service`]: services that validate input, call the repositories and map to DTOs
//! - [`dto`]: request/response payloads shared with the HTTP layer
//!
//! ## Example
//!
//! ```
//! use lol_tournament::db::MemoryStore;
//! use lol_tournament::dto::CreateTeamRequest;
//! use lol_tournament::service::TeamService;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let teams = TeamService::new(store);
//!
//! let team = teams
//!     .create(CreateTeamRequest {
//!         name: "Alpha".to_string(),
//!         region: "NA".to_string(),
//!     })
//!     .await?;
//! assert_eq!(team.name, "Alpha");
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod dto;
pub mod error;
pub mod models;
pub mod service;
pub mod winner;

pub use error::{DbError, DbResult, EntityKind, ServiceError, ServiceResult};
pub use models::{Match, MatchId, Team, TeamId, Tournament, TournamentId};
