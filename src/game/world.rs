//! Region map, rally connections and the shared world

use std::collections::BTreeSet;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::time::GameClock;

use super::catalog::UpgradeDefinition;
use super::click::ClickPoint;
use super::economy::{Resource, ResourceMarket};

/// Index of a region in map order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Axis-aligned bounding rectangle, edges inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: ClickPoint) -> bool {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        x >= i64::from(self.x)
            && x <= i64::from(self.x) + i64::from(self.width)
            && y >= i64::from(self.y)
            && y <= i64::from(self.y) + i64::from(self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Directed movement intent between two adjacent regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RallyConnection {
    pub origin: RegionId,
    pub destination: RegionId,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub bounds: Bounds,
    pub borders: BTreeSet<RegionId>,
    pub rallies: Vec<RallyConnection>,
    pub owner: Option<Uuid>,
    pub troops: u32,
    /// Primary resource produced here
    pub resource: Resource,
    pub upgrades: Vec<UpgradeDefinition>,
}

impl Region {
    pub fn is_owned_by(&self, player_id: Uuid) -> bool {
        self.owner == Some(player_id)
    }

    pub fn add_upgrade(&mut self, upgrade: &UpgradeDefinition) {
        self.troops += upgrade.troops;
        self.upgrades.push(upgrade.clone());
    }

    pub fn active_rallies(&self) -> impl Iterator<Item = &RallyConnection> {
        self.rallies.iter().filter(|r| r.active)
    }
}

/// All regions in their defined order
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: Vec<Region>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangular grid of `columns` x `rows` cells named "A1", "B1", ...
    /// Orthogonal neighbours border each other.
    pub fn grid(columns: u32, rows: u32, size: i32) -> Self {
        let mut map = Self::new();

        for row in 0..rows {
            for col in 0..columns {
                let label = (b'A' + (col % 26) as u8) as char;
                let name = format!("{}{}", label, row + 1);
                let resource =
                    Resource::TRADABLE[((row * columns + col) as usize) % Resource::TRADABLE.len()];
                let bounds = Bounds::new(col as i32 * size, row as i32 * size, size, size);
                map.push(name, bounds, resource);
            }
        }

        for row in 0..rows {
            for col in 0..columns {
                let id = RegionId(row * columns + col);
                if col + 1 < columns {
                    map.connect(id, RegionId(id.0 + 1));
                }
                if row + 1 < rows {
                    map.connect(id, RegionId(id.0 + columns));
                }
            }
        }

        map
    }

    /// Append a region at the end of the map order
    pub fn push(&mut self, name: impl Into<String>, bounds: Bounds, resource: Resource) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            name: name.into(),
            bounds,
            borders: BTreeSet::new(),
            rallies: Vec::new(),
            owner: None,
            troops: 0,
            resource,
            upgrades: Vec::new(),
        });
        id
    }

    /// Make two regions border each other
    pub fn connect(&mut self, a: RegionId, b: RegionId) {
        if a == b || self.get(a).is_none() || self.get(b).is_none() {
            return;
        }
        if let Some(region) = self.get_mut(a) {
            region.borders.insert(b);
        }
        if let Some(region) = self.get_mut(b) {
            region.borders.insert(a);
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id.0 as usize)
    }

    /// First region in map order whose bounds contain `p`
    pub fn region_of(&self, p: ClickPoint) -> Option<RegionId> {
        self.regions
            .iter()
            .find(|r| r.bounds.contains(p))
            .map(|r| r.id)
    }

    pub fn owned_by(&self, player_id: Uuid) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.is_owned_by(player_id))
    }

    /// First owned region with the given name
    pub fn find_owned(&self, player_id: Uuid, name: &str) -> Option<RegionId> {
        self.owned_by(player_id)
            .find(|r| r.name == name)
            .map(|r| r.id)
    }

    /// Turn on the rally `start -> end`, adding it if missing.
    /// Returns false if either region is unknown.
    pub fn set_rally(&mut self, start: RegionId, end: RegionId) -> bool {
        if self.get(end).is_none() {
            return false;
        }
        let Some(region) = self.get_mut(start) else {
            return false;
        };

        match region.rallies.iter().position(|r| r.destination == end) {
            Some(idx) => region.rallies[idx].active = true,
            None => region.rallies.push(RallyConnection {
                origin: start,
                destination: end,
                active: true,
            }),
        }
        true
    }

    /// Turn off every outgoing rally of `region`. Returns how many were on.
    pub fn clear_rallies(&mut self, region: RegionId) -> usize {
        let Some(region) = self.get_mut(region) else {
            return 0;
        };

        let mut cleared = 0;
        for rally in region.rallies.iter_mut().filter(|r| r.active) {
            rally.active = false;
            cleared += 1;
        }
        cleared
    }

    /// Give the first unowned region in map order to `player_id`
    pub fn claim_home(&mut self, player_id: Uuid) -> Option<RegionId> {
        let region = self.regions.iter_mut().find(|r| r.owner.is_none())?;
        region.owner = Some(player_id);
        Some(region.id)
    }

    /// Drop ownership of everything `player_id` holds, rallies included
    pub fn release(&mut self, player_id: Uuid) -> usize {
        let mut released = 0;
        for region in self.regions.iter_mut().filter(|r| r.is_owned_by(player_id)) {
            region.owner = None;
            region.rallies.clear();
            released += 1;
        }
        released
    }
}

/// Maps world coordinates into the client's render space
#[derive(Debug, Clone, Copy)]
pub struct RenderProjection {
    pub scale: f64,
}

impl RenderProjection {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn project(&self, (x, y): (f64, f64)) -> (i16, i16) {
        let clamp = |v: f64| (v * self.scale).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        (clamp(x), clamp(y))
    }
}

impl Default for RenderProjection {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// State shared by every player session
pub struct World {
    /// Coarse lock over every region; all mutations take the write side
    pub regions: RwLock<RegionMap>,
    pub market: Mutex<ResourceMarket>,
    pub clock: GameClock,
    pub projection: RenderProjection,
}

impl World {
    pub fn new(map: RegionMap, projection: RenderProjection) -> Self {
        Self {
            regions: RwLock::new(map),
            market: Mutex::new(ResourceMarket::new()),
            clock: GameClock::new(),
            projection,
        }
    }
}
