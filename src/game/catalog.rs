//! Upgrade catalog, injected into each dispatcher at construction

use serde::Serialize;

use super::economy::{Cost, Resource};

/// A buildable region upgrade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeDefinition {
    pub name: String,
    /// Key code that builds this upgrade at the first-click region
    pub key_code: Option<u32>,
    pub cost: Cost,
    /// Extra yield of the region's primary resource per economy tick
    pub yield_bonus: f64,
    /// Troops stationed in the region when built
    pub troops: u32,
}

/// Read-only registry of upgrade definitions
#[derive(Debug, Clone)]
pub struct UpgradeCatalog {
    upgrades: Vec<UpgradeDefinition>,
}

impl UpgradeCatalog {
    pub fn new(upgrades: Vec<UpgradeDefinition>) -> Self {
        Self { upgrades }
    }

    pub fn by_name(&self, name: &str) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| u.name == name)
    }

    pub fn by_key(&self, code: u32) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| u.key_code == Some(code))
    }
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        let upgrade = |name: &str, key: char, cost: &[(Resource, i64)], yield_bonus, troops| {
            UpgradeDefinition {
                name: name.to_string(),
                key_code: Some(key as u32),
                cost: cost.iter().copied().collect(),
                yield_bonus,
                troops,
            }
        };

        Self::new(vec![
            upgrade("farm", 'F', &[(Resource::Wood, 10), (Resource::Gold, 20)], 1.0, 0),
            upgrade("lumber_mill", 'L', &[(Resource::Stone, 10), (Resource::Gold, 20)], 1.0, 0),
            upgrade("quarry", 'Q', &[(Resource::Wood, 15), (Resource::Gold, 25)], 1.0, 0),
            upgrade("mine", 'M', &[(Resource::Wood, 15), (Resource::Stone, 15), (Resource::Gold, 40)], 1.5, 0),
            upgrade("barracks", 'B', &[(Resource::Stone, 20), (Resource::Iron, 10), (Resource::Gold, 50)], 0.0, 10),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resolves_names_and_keys() {
        let catalog = UpgradeCatalog::default();

        assert_eq!(catalog.by_name("farm").and_then(|u| u.key_code), Some(70));
        assert_eq!(catalog.by_key(66).map(|u| u.name.as_str()), Some("barracks"));
        assert!(catalog.by_name("castle").is_none());
        assert!(catalog.by_key(0).is_none());
    }
}
