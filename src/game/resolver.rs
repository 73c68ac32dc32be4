//! Move resolution: turns a pair of right-clicks into a rally order

use tracing::debug;
use uuid::Uuid;

use super::click::ClickBuffer;
use super::world::{RegionId, World};

/// Outcome of one resolver invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No click pending
    Idle,
    /// One click pending, waiting for the second
    Waiting,
    /// Both clicks in the same owned region: its rallies were turned off
    Cancelled { region: RegionId, cleared: usize },
    /// Rally turned on between two bordering regions
    Established { from: RegionId, to: RegionId },
    /// A full pair that maps to no order. Clicks outside every region,
    /// non-bordering regions and regions the player does not own land here.
    Ignored,
}

/// Resolves buffered clicks for one player
#[derive(Debug, Clone, Copy)]
pub struct MoveResolver {
    player_id: Uuid,
}

impl MoveResolver {
    pub fn new(player_id: Uuid) -> Self {
        Self { player_id }
    }

    /// Run one resolution cycle. A full buffer is always cleared afterwards.
    pub fn resolve(&self, clicks: &ClickBuffer, world: &World) -> Resolution {
        let (a, b) = match clicks.pending() {
            (None, _) => return Resolution::Idle,
            (Some(_), None) => return Resolution::Waiting,
            (Some(a), Some(b)) => (a, b),
        };

        let resolution = {
            let mut regions = world.regions.write();
            let start = regions.region_of(a);
            let end = regions.region_of(b);

            match (start, end) {
                (Some(start), _)
                    if !regions
                        .get(start)
                        .is_some_and(|r| r.is_owned_by(self.player_id)) =>
                {
                    Resolution::Ignored
                }
                (Some(start), Some(end)) if start == end => {
                    let cleared = regions.clear_rallies(start);
                    Resolution::Cancelled {
                        region: start,
                        cleared,
                    }
                }
                (Some(start), Some(end))
                    if regions
                        .get(start)
                        .is_some_and(|r| r.borders.contains(&end)) =>
                {
                    regions.set_rally(start, end);
                    Resolution::Established {
                        from: start,
                        to: end,
                    }
                }
                // TODO: clicks outside every region are dropped until product
                // decides whether they should cancel or target the nearest region
                _ => Resolution::Ignored,
            }
        };

        clicks.clear();

        debug!(player_id = %self.player_id, ?a, ?b, ?resolution, "Resolved move command");
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::click::ClickPoint;
    use crate::game::economy::Resource;
    use crate::game::world::{Bounds, RegionMap, RenderProjection};

    struct Fixture {
        world: World,
        player: Uuid,
        r1: RegionId,
        r2: RegionId,
        r3: RegionId,
    }

    /// R1 [0,10]x[0,10] borders R2 [40,60]x[40,60]; R3 [100,120]x[0,20] borders nothing
    fn fixture() -> Fixture {
        let mut map = RegionMap::new();
        let r1 = map.push("R1", Bounds::new(0, 0, 10, 10), Resource::Food);
        let r2 = map.push("R2", Bounds::new(40, 40, 20, 20), Resource::Wood);
        let r3 = map.push("R3", Bounds::new(100, 0, 20, 20), Resource::Stone);
        map.connect(r1, r2);

        let player = Uuid::new_v4();
        map.get_mut(r1).unwrap().owner = Some(player);

        Fixture {
            world: World::new(map, RenderProjection::default()),
            player,
            r1,
            r2,
            r3,
        }
    }

    fn active_rallies(world: &World, region: RegionId) -> Vec<RegionId> {
        world
            .regions
            .read()
            .get(region)
            .unwrap()
            .active_rallies()
            .map(|r| r.destination)
            .collect()
    }

    #[test]
    fn empty_buffer_is_idle_every_time() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        let resolver = MoveResolver::new(f.player);

        assert_eq!(resolver.resolve(&clicks, &f.world), Resolution::Idle);
        assert_eq!(resolver.resolve(&clicks, &f.world), Resolution::Idle);
        assert!(active_rallies(&f.world, f.r1).is_empty());
    }

    #[test]
    fn single_click_waits_and_is_kept() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(5, 5));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(resolution, Resolution::Waiting);
        assert_eq!(clicks.first(), Some(ClickPoint::new(5, 5)));
    }

    #[test]
    fn clicks_in_bordering_regions_establish_rally() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(5, 5));
        clicks.set_first(ClickPoint::new(50, 50));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(
            resolution,
            Resolution::Established {
                from: f.r1,
                to: f.r2
            }
        );
        assert_eq!(active_rallies(&f.world, f.r1), vec![f.r2]);
        assert_eq!(clicks.pending(), (None, None));
    }

    #[test]
    fn clicks_in_same_region_cancel_rallies() {
        let f = fixture();
        f.world.regions.write().set_rally(f.r1, f.r2);
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(2, 2));
        clicks.set_first(ClickPoint::new(8, 8));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(
            resolution,
            Resolution::Cancelled {
                region: f.r1,
                cleared: 1
            }
        );
        assert!(active_rallies(&f.world, f.r1).is_empty());
        assert_eq!(clicks.pending(), (None, None));
    }

    #[test]
    fn non_bordering_regions_are_ignored() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(5, 5));
        clicks.set_first(ClickPoint::new(110, 10));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(resolution, Resolution::Ignored);
        assert!(active_rallies(&f.world, f.r1).is_empty());
        assert!(active_rallies(&f.world, f.r3).is_empty());
        assert_eq!(clicks.pending(), (None, None));
    }

    #[test]
    fn click_outside_every_region_is_dropped() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(5, 5));
        clicks.set_first(ClickPoint::new(-500, 900));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(clicks.pending(), (None, None));
    }

    #[test]
    fn rally_from_unowned_region_is_ignored() {
        let f = fixture();
        let clicks = ClickBuffer::new();
        clicks.set_first(ClickPoint::new(50, 50));
        clicks.set_first(ClickPoint::new(5, 5));

        let resolution = MoveResolver::new(f.player).resolve(&clicks, &f.world);

        assert_eq!(resolution, Resolution::Ignored);
        assert!(active_rallies(&f.world, f.r2).is_empty());
    }
}
