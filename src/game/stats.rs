//! Stats snapshot building

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::debug;

use crate::ws::protocol::{PlayerStats, RallyLine, ServerMsg};

use super::economy;
use super::session::{score_of, PlayerSession};

/// Builds read-only stats snapshots for one player
pub struct StatsReporter {
    session: Arc<PlayerSession>,
}

impl StatsReporter {
    pub fn new(session: Arc<PlayerSession>) -> Self {
        Self { session }
    }

    /// Assemble a snapshot. Takes only read locks and copies.
    pub fn build(&self) -> PlayerStats {
        let session = &self.session;
        let world = &session.world;

        let (region_count, troops, income, rally_lines, research, score) = {
            let map = world.regions.read();
            let research = session.research.lock().clone();
            let owned: Vec<_> = map.owned_by(session.player_id).collect();
            let troops: u32 = owned.iter().map(|r| r.troops).sum();

            let mut rally_lines = BTreeSet::new();
            for region in &owned {
                for rally in region.active_rallies() {
                    let (Some(origin), Some(destination)) =
                        (map.get(rally.origin), map.get(rally.destination))
                    else {
                        continue;
                    };
                    let (x1, y1) = world.projection.project(origin.bounds.center());
                    let (x2, y2) = world.projection.project(destination.bounds.center());
                    rally_lines.insert(RallyLine { x1, y1, x2, y2 });
                }
            }

            let score = score_of(&owned, &research);
            (
                owned.len(),
                troops,
                economy::income(owned),
                rally_lines,
                research,
                score,
            )
        };

        let (resources, fail_messages) = {
            let pool = session.resources.lock();
            (pool.stock(), pool.fail_messages())
        };
        let (pending_click_a, pending_click_b) = session.clicks.pending();

        PlayerStats {
            resources,
            income,
            upkeep: economy::upkeep_cost(region_count, troops),
            elapsed_time: world.clock.elapsed_secs(),
            score,
            rally_lines,
            pending_click_a,
            pending_click_b,
            fail_messages,
            research,
        }
    }

    /// Send a snapshot every `period` until the outbound channel closes
    pub async fn run(self, period: Duration, tx: mpsc::Sender<ServerMsg>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let stats = self.build();
            if tx.send(ServerMsg::Stats(stats)).await.is_err() {
                debug!(player_id = %self.session.player_id, "Stats channel closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::click::ClickPoint;
    use crate::game::economy::Resource;
    use crate::game::world::{Bounds, RegionId, RegionMap, RenderProjection, World};
    use uuid::Uuid;

    fn session() -> (Arc<PlayerSession>, RegionId, RegionId) {
        let mut map = RegionMap::new();
        let r1 = map.push("R1", Bounds::new(0, 0, 10, 10), Resource::Food);
        let r2 = map.push("R2", Bounds::new(40, 40, 20, 20), Resource::Wood);
        map.connect(r1, r2);

        let player_id = Uuid::new_v4();
        map.get_mut(r1).unwrap().owner = Some(player_id);

        let world = Arc::new(World::new(map, RenderProjection::new(2.0)));
        let session = Arc::new(PlayerSession::new(player_id, "tester".to_string(), world));
        (session, r1, r2)
    }

    #[test]
    fn snapshot_projects_active_rallies_only() {
        let (session, r1, r2) = session();
        let reporter = StatsReporter::new(session.clone());
        assert!(reporter.build().rally_lines.is_empty());

        session.world.regions.write().set_rally(r1, r2);
        let stats = reporter.build();
        assert_eq!(
            stats.rally_lines.into_iter().collect::<Vec<_>>(),
            vec![RallyLine {
                x1: 10,
                y1: 10,
                x2: 100,
                y2: 100
            }]
        );

        session.world.regions.write().clear_rallies(r1);
        assert!(reporter.build().rally_lines.is_empty());
    }

    #[test]
    fn score_and_upkeep_come_from_the_same_view() {
        let (session, r1, _) = session();
        let catalog = crate::game::catalog::UpgradeCatalog::default();
        let barracks = catalog.by_name("barracks").unwrap();
        session.world.regions.write().get_mut(r1).unwrap().add_upgrade(barracks);

        let stats = StatsReporter::new(session.clone()).build();

        assert_eq!(stats.score, 110);
        assert_eq!(
            stats.upkeep,
            economy::upkeep_cost(1, barracks.troops)
        );
    }

    #[test]
    fn snapshot_copies_pending_clicks_and_does_not_consume_them() {
        let (session, _, _) = session();
        session.clicks.set_first(ClickPoint::new(7, 3));
        let reporter = StatsReporter::new(session.clone());

        let stats = reporter.build();

        assert_eq!(stats.pending_click_a, Some(ClickPoint::new(7, 3)));
        assert_eq!(stats.pending_click_b, None);
        assert_eq!(session.clicks.first(), Some(ClickPoint::new(7, 3)));
    }

    #[test]
    fn snapshot_reports_economy() {
        let (session, _, _) = session();
        session.resources.lock().buy_research(1_000);
        let stats = StatsReporter::new(session.clone()).build();

        assert_eq!(stats.resources[&Resource::Gold], 100);
        assert_eq!(stats.income.get(&Resource::Food), Some(&economy::BASE_REGION_YIELD));
        assert_eq!(stats.upkeep, economy::UPKEEP_PER_REGION);
        assert_eq!(stats.score, 100);
        assert_eq!(stats.fail_messages, vec!["Not enough gold for research"]);
    }

    #[tokio::test]
    async fn run_stops_when_receiver_is_dropped() {
        let (session, _, _) = session();
        let (tx, mut rx) = mpsc::channel(1);
        let task = tokio::spawn(StatsReporter::new(session).run(Duration::from_millis(1), tx));

        match rx.recv().await {
            Some(ServerMsg::Stats(stats)) => assert_eq!(stats.score, 100),
            other => panic!("expected stats, got {:?}", other),
        }
        drop(rx);

        tokio_test::assert_ok!(task.await);
    }
}
