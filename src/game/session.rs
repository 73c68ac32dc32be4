//! Player sessions and the economy tick loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use super::click::ClickBuffer;
use super::economy::{self, ResourcePool};
use super::research::ResearchState;
use super::world::{Region, World};

const SCORE_PER_REGION: u64 = 100;
const SCORE_PER_UPGRADE: u64 = 10;
const SCORE_PER_RESEARCH_LEVEL: u64 = 25;

/// Per-player state for one connection.
///
/// Lock order: `world.regions`, then `research`, then `resources`, then
/// `world.market`. Never hold any of them across an await.
pub struct PlayerSession {
    pub player_id: Uuid,
    pub display_name: String,
    pub clicks: ClickBuffer,
    pub resources: Mutex<ResourcePool>,
    pub research: Mutex<ResearchState>,
    pub world: Arc<World>,
}

impl PlayerSession {
    pub fn new(player_id: Uuid, display_name: String, world: Arc<World>) -> Self {
        Self {
            player_id,
            display_name,
            clicks: ClickBuffer::new(),
            resources: Mutex::new(ResourcePool::new()),
            research: Mutex::new(ResearchState::new()),
            world,
        }
    }

    /// Credit one tick of income from owned regions, minus upkeep
    pub fn collect_income(&self) {
        let map = self.world.regions.write();
        let owned: Vec<_> = map.owned_by(self.player_id).collect();
        let troops = owned.iter().map(|r| r.troops).sum();
        let upkeep = economy::upkeep_cost(owned.len(), troops);
        let income = economy::income(owned);

        self.resources.lock().apply_income(&income, upkeep);
    }
}

/// Score for a set of owned regions and the research behind them
pub fn score_of(owned: &[&Region], research: &ResearchState) -> u64 {
    let upgrades: u64 = owned.iter().map(|r| r.upgrades.len() as u64).sum();

    owned.len() as u64 * SCORE_PER_REGION
        + upgrades * SCORE_PER_UPGRADE
        + research.total_levels() as u64 * SCORE_PER_RESEARCH_LEVEL
}

/// Registry of connected players
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<PlayerSession>>,
    world: Arc<World>,
    ticks: AtomicU64,
}

impl SessionRegistry {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            sessions: DashMap::new(),
            world,
            ticks: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Create a session and hand it the first free region, if any
    pub fn join(&self, display_name: String) -> (Arc<PlayerSession>, Option<String>) {
        let player_id = Uuid::new_v4();
        let session = Arc::new(PlayerSession::new(
            player_id,
            display_name,
            self.world.clone(),
        ));

        let home = {
            let mut map = self.world.regions.write();
            map.claim_home(player_id)
                .and_then(|id| map.get(id))
                .map(|r| r.name.clone())
        };

        self.sessions.insert(player_id, session.clone());

        info!(
            player_id = %player_id,
            home_region = ?home,
            player_count = self.sessions.len(),
            "Player joined"
        );

        (session, home)
    }

    /// Drop a session and release its regions
    pub fn leave(&self, player_id: Uuid) {
        if self.sessions.remove(&player_id).is_some() {
            let released = self.world.regions.write().release(player_id);
            info!(player_id = %player_id, released, "Player left");
        }
    }

    #[cfg(test)]
    pub fn get(&self, player_id: &Uuid) -> Option<Arc<PlayerSession>> {
        self.sessions.get(player_id).map(|s| s.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// One economy tick for every connected player
    pub fn tick(&self) {
        let sessions: Vec<Arc<PlayerSession>> =
            self.sessions.iter().map(|s| s.value().clone()).collect();

        for session in &sessions {
            session.collect_income();
        }

        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tick, players = sessions.len(), "Economy tick");
    }

    /// Run the economy tick loop
    pub async fn run(&self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::economy::Resource;
    use crate::game::world::{RegionId, RegionMap, RenderProjection};

    fn registry(columns: u32) -> SessionRegistry {
        let world = World::new(RegionMap::grid(columns, 1, 100), RenderProjection::default());
        SessionRegistry::new(Arc::new(world))
    }

    #[test]
    fn join_claims_home_region_and_leave_releases_it() {
        let registry = registry(2);

        let (alice, home) = registry.join("alice".to_string());
        assert_eq!(home.as_deref(), Some("A1"));
        let (_bob, home) = registry.join("bob".to_string());
        assert_eq!(home.as_deref(), Some("B1"));
        let (_carol, home) = registry.join("carol".to_string());
        assert_eq!(home, None);
        assert_eq!(registry.len(), 3);

        registry.leave(alice.player_id);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&alice.player_id).is_none());
        assert_eq!(
            registry.world().regions.read().get(RegionId(0)).unwrap().owner,
            None
        );
    }

    #[test]
    fn tick_credits_income_and_charges_upkeep() {
        let registry = registry(1);
        let (session, _) = registry.join("alice".to_string());
        let food = session.resources.lock().amount(Resource::Food);
        let gold = session.resources.lock().amount(Resource::Gold);

        registry.tick();

        let pool = session.resources.lock();
        assert_eq!(pool.amount(Resource::Food), food + economy::BASE_REGION_YIELD);
        assert_eq!(pool.amount(Resource::Gold), gold - economy::UPKEEP_PER_REGION);
        assert_eq!(registry.ticks(), 1);
    }

    #[test]
    fn score_counts_regions_upgrades_and_research() {
        let mut map = RegionMap::grid(2, 1, 100);
        let farm = crate::game::catalog::UpgradeCatalog::default()
            .by_name("farm")
            .cloned()
            .unwrap();
        map.get_mut(RegionId(0)).unwrap().add_upgrade(&farm);
        let owned: Vec<_> = map.regions().iter().collect();
        let mut research = ResearchState::new();

        assert_eq!(score_of(&owned[..1], &research), SCORE_PER_REGION + SCORE_PER_UPGRADE);

        research.upgrade(crate::game::research::ResearchKind::Forestry);
        assert_eq!(
            score_of(&owned, &research),
            2 * SCORE_PER_REGION + SCORE_PER_UPGRADE + SCORE_PER_RESEARCH_LEVEL
        );
    }
}
