//! HTTP route definitions

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{header, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::economy::Resource;
use crate::game::world::{Bounds, RegionId, World};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/map", get(map_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    economy_ticks: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_players: state.sessions.len(),
        economy_ticks: state.sessions.ticks(),
    })
}

// ============================================================================
// Map endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct MapResponse {
    regions: Vec<RegionSummary>,
    prices: BTreeMap<Resource, i64>,
}

#[derive(Debug, Serialize)]
struct RegionSummary {
    id: RegionId,
    name: String,
    bounds: Bounds,
    borders: Vec<RegionId>,
    owner: Option<Uuid>,
    troops: u32,
    resource: Resource,
    upgrades: Vec<String>,
}

async fn map_handler(State(state): State<AppState>) -> Json<MapResponse> {
    Json(map_summary(&state.world))
}

fn map_summary(world: &World) -> MapResponse {
    let regions = world
        .regions
        .read()
        .regions()
        .iter()
        .map(|r| RegionSummary {
            id: r.id,
            name: r.name.clone(),
            bounds: r.bounds,
            borders: r.borders.iter().copied().collect(),
            owner: r.owner,
            troops: r.troops,
            resource: r.resource,
            upgrades: r.upgrades.iter().map(|u| u.name.clone()).collect(),
        })
        .collect();

    let prices = world.market.lock().prices().clone();

    MapResponse { regions, prices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::{RegionMap, RenderProjection};

    #[test]
    fn map_summary_lists_regions_in_order() {
        let world = World::new(RegionMap::grid(2, 2, 50), RenderProjection::default());

        let summary = map_summary(&world);

        let names: Vec<_> = summary.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(summary.regions[3].borders, vec![RegionId(1), RegionId(2)]);
        assert!(!summary.prices.contains_key(&Resource::Gold));
    }
}
