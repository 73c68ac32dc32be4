//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{RegionMap, RenderProjection, SessionRegistry, UpgradeCatalog, World};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<World>,
    pub catalog: Arc<UpgradeCatalog>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Build the world map
        let map = RegionMap::grid(config.map_columns, config.map_rows, config.region_size);
        let world = Arc::new(World::new(map, RenderProjection::new(config.render_scale)));

        // Upgrade definitions are read-only for the server's lifetime
        let catalog = Arc::new(UpgradeCatalog::default());

        let sessions = Arc::new(SessionRegistry::new(world.clone()));

        Self {
            config,
            world,
            catalog,
            sessions,
        }
    }
}
