//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::click::ClickPoint;
use crate::game::economy::Resource;
use crate::game::research::{ResearchKind, ResearchState};

/// Mouse button of a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    /// Cancels the pending selection
    Left,
    /// Selects a move origin, then destination
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketAction {
    Buy,
    Sell,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Trade one unit of a resource for gold
    Market {
        action: MarketAction,
        resource: Resource,
    },

    /// Build an upgrade in an owned region, by name
    RegionUpgrade {
        region: String,
        upgrade: String,
    },

    /// Advance a research track
    Research {
        upgrade: ResearchKind,
    },

    /// Map click in world coordinates
    Click {
        kind: ClickKind,
        x: i32,
        y: i32,
    },

    /// Hotkey that builds an upgrade at the first pending click
    KeyUpgrade {
        code: u32,
    },

    /// Any message type this server does not know
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player_id: Uuid,
        server_time: u64,
        /// Region handed to the player on join, if one was free
        home_region: Option<String>,
    },

    /// Periodic player stats
    Stats(PlayerStats),
}

/// Rally line segment in render coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RallyLine {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

/// Snapshot of how a player is doing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Whole units per resource
    pub resources: BTreeMap<Resource, i64>,
    /// Income per economy tick
    pub income: BTreeMap<Resource, f64>,
    /// Gold upkeep per economy tick
    pub upkeep: f64,
    /// Seconds since the world started
    pub elapsed_time: u64,
    pub score: u64,
    pub rally_lines: BTreeSet<RallyLine>,
    pub pending_click_a: Option<ClickPoint>,
    pub pending_click_b: Option<ClickPoint>,
    /// Oldest first
    pub fail_messages: Vec<String>,
    pub research: ResearchState,
}
