//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`teams`]: team CRUD
//! - [`tournaments`]: tournament CRUD, winner query, tournament matches
//! - [`matches`]: match CRUD with coin-flip winners
//! - [`error`]: mapping of service errors to status codes and JSON bodies
//! - [`middleware`]: per-route request metrics
//! - [`request_id`]: `x-request-id` propagation
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                          - Health check
//! POST   /api/team                        - Create team
//! GET    /api/team                        - List teams
//! GET    /api/team/{id}                   - Get team
//! PUT    /api/team/{id}                   - Update team
//! DELETE /api/team/{id}                   - Delete team
//! POST   /api/tournament                  - Create tournament
//! GET    /api/tournament                  - List tournaments
//! GET    /api/tournament/{id}             - Get tournament
//! PUT    /api/tournament/{id}             - Update tournament
//! DELETE /api/tournament/{id}             - Delete tournament
//! GET    /api/tournament/{id}/winner      - Tournament winner id
//! GET    /api/tournament/{id}/matches     - Tournament matches, newest first
//! POST   /api/match                       - Create match
//! GET    /api/match                       - List matches
//! GET    /api/match/{id}                  - Get match
//! PUT    /api/match/{id}                  - Update match
//! DELETE /api/match/{id}                  - Delete match
//! ```
//!
//! Anything else falls through to the static front end when one is configured.
//!
//! # CORS
//!
//! CORS is configured permissively so the front end can be served from
//! another origin during development.

pub mod error;
pub mod matches;
pub mod middleware;
pub mod request_id;
pub mod teams;
pub mod tournaments;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use lol_tournament::{
    db::{Database, MemoryStore, PgMatchRepository, PgTeamRepository, PgTournamentRepository},
    service::{MatchService, TeamService, TournamentService},
    winner::CoinFlip,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub team_service: TeamService,
    pub tournament_service: TournamentService,
    pub match_service: MatchService,
    /// Present when backed by PostgreSQL; used by the health check
    pub database: Option<Database>,
}

impl AppState {
    /// State backed by PostgreSQL repositories
    pub fn postgres(database: Database, coin: Arc<dyn CoinFlip>) -> Self {
        let pool = database.pool().clone();
        let teams = Arc::new(PgTeamRepository::new(pool.clone()));
        let tournaments = Arc::new(PgTournamentRepository::new(pool.clone()));
        let matches = Arc::new(PgMatchRepository::new(pool));

        Self {
            team_service: TeamService::new(teams.clone()),
            tournament_service: TournamentService::new(
                tournaments.clone(),
                matches.clone(),
                teams.clone(),
            ),
            match_service: MatchService::new(matches, teams, tournaments, coin),
            database: Some(database),
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(coin: Arc<dyn CoinFlip>) -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            team_service: TeamService::new(store.clone()),
            tournament_service: TournamentService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            ),
            match_service: MatchService::new(store.clone(), store.clone(), store, coin),
            database: None,
        }
    }
}

/// Create the complete router with all endpoints and middleware.
///
/// `static_dir`, when given, is served for every path no API route matches.
///
/// # Example
///
/// ```rust,no_run
/// # use lt_server::api::{create_router, AppState};
/// # use lol_tournament::winner::RandomCoin;
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::in_memory(Arc::new(RandomCoin));
/// let app = create_router(state, None);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_api_router())
        .route_layer(axum::middleware::from_fn(middleware::track_metrics));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/team", get(teams::list_teams).post(teams::create_team))
        .route(
            "/team/{id}",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        )
        .route(
            "/tournament",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route(
            "/tournament/{id}",
            get(tournaments::get_tournament)
                .put(tournaments::update_tournament)
                .delete(tournaments::delete_tournament),
        )
        .route(
            "/tournament/{id}/winner",
            get(tournaments::get_tournament_winner),
        )
        .route(
            "/tournament/{id}/matches",
            get(tournaments::list_tournament_matches),
        )
        .route("/match", get(matches::list_matches).post(matches::create_match))
        .route(
            "/match/{id}",
            get(matches::get_match)
                .put(matches::update_match)
                .delete(matches::delete_match),
        )
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store is reachable, `503 Service Unavailable`
/// otherwise. The in-memory store is always healthy.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","storage":"postgres","database":true,...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(database) => ("postgres", database.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
