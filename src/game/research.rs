//! Research progression

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Research tracks a player can advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchKind {
    Agriculture,
    Forestry,
    Masonry,
    Metallurgy,
}

impl ResearchKind {
    /// Gold cost of the first level
    fn base_cost(&self) -> i64 {
        match self {
            ResearchKind::Agriculture => 30,
            ResearchKind::Forestry => 30,
            ResearchKind::Masonry => 40,
            ResearchKind::Metallurgy => 60,
        }
    }
}

/// Research levels per track, sent as-is in stats snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    levels: BTreeMap<ResearchKind, u32>,
}

impl ResearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, kind: ResearchKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// Gold cost of the next level
    pub fn cost(&self, kind: ResearchKind) -> i64 {
        kind.base_cost() * (self.level(kind) as i64 + 1)
    }

    pub fn upgrade(&mut self, kind: ResearchKind) {
        *self.levels.entry(kind).or_insert(0) += 1;
    }

    pub fn total_levels(&self) -> u32 {
        self.levels.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_grows_with_level() {
        let mut research = ResearchState::new();
        assert_eq!(research.cost(ResearchKind::Masonry), 40);

        research.upgrade(ResearchKind::Masonry);
        research.upgrade(ResearchKind::Masonry);

        assert_eq!(research.level(ResearchKind::Masonry), 2);
        assert_eq!(research.cost(ResearchKind::Masonry), 120);
        assert_eq!(research.total_levels(), 2);
    }
}
