//! Resource pool and shared market

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::world::Region;

/// Resources a player can stockpile. Gold doubles as currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Wood,
    Stone,
    Iron,
    Gold,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Food,
        Resource::Wood,
        Resource::Stone,
        Resource::Iron,
        Resource::Gold,
    ];

    /// Resources that can be traded on the market for gold
    pub const TRADABLE: [Resource; 4] = [
        Resource::Food,
        Resource::Wood,
        Resource::Stone,
        Resource::Iron,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Stone => "stone",
            Resource::Iron => "iron",
            Resource::Gold => "gold",
        }
    }
}

/// Cost of an upgrade, in whole units per resource
pub type Cost = BTreeMap<Resource, i64>;

/// Gold per owned region per economy tick
pub const UPKEEP_PER_REGION: f64 = 0.5;
/// Gold per stationed troop per economy tick
pub const UPKEEP_PER_TROOP: f64 = 0.05;
/// Base yield of a region's primary resource per economy tick
pub const BASE_REGION_YIELD: f64 = 1.0;

const MAX_FAIL_MESSAGES: usize = 8;
const STARTING_GOLD: f64 = 100.0;
const STARTING_STOCK: f64 = 20.0;

/// A player's stockpile plus the failure messages surfaced in stats
#[derive(Debug, Clone)]
pub struct ResourcePool {
    stock: BTreeMap<Resource, f64>,
    fail_messages: VecDeque<String>,
}

impl ResourcePool {
    pub fn new() -> Self {
        let stock = Resource::ALL
            .iter()
            .map(|r| {
                let amount = if *r == Resource::Gold {
                    STARTING_GOLD
                } else {
                    STARTING_STOCK
                };
                (*r, amount)
            })
            .collect();

        Self {
            stock,
            fail_messages: VecDeque::new(),
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            stock: Resource::ALL.iter().map(|r| (*r, 0.0)).collect(),
            fail_messages: VecDeque::new(),
        }
    }

    pub fn amount(&self, resource: Resource) -> f64 {
        self.stock.get(&resource).copied().unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn set_amount(&mut self, resource: Resource, amount: f64) {
        self.stock.insert(resource, amount);
    }

    /// Sell one unit for `price` gold. Returns false if nothing to sell.
    pub fn sell(&mut self, resource: Resource, price: i64) -> bool {
        if resource == Resource::Gold {
            return false;
        }
        if self.amount(resource) < 1.0 {
            self.push_fail(format!("No {} left to sell", resource.as_str()));
            return false;
        }
        *self.stock.entry(resource).or_insert(0.0) -= 1.0;
        *self.stock.entry(Resource::Gold).or_insert(0.0) += price as f64;
        true
    }

    /// Buy one unit for `price` gold. Returns false if the gold is not there.
    pub fn buy(&mut self, resource: Resource, price: i64) -> bool {
        if resource == Resource::Gold {
            return false;
        }
        if self.amount(Resource::Gold) < price as f64 {
            self.push_fail(format!("Not enough gold to buy {}", resource.as_str()));
            return false;
        }
        *self.stock.entry(Resource::Gold).or_insert(0.0) -= price as f64;
        *self.stock.entry(resource).or_insert(0.0) += 1.0;
        true
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        cost.iter()
            .all(|(resource, amount)| self.amount(*resource) >= *amount as f64)
    }

    /// Debit an upgrade cost. No partial debit on failure.
    pub fn buy_upgrade(&mut self, name: &str, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            self.push_fail(format!("Not enough resources to build {}", name));
            return false;
        }
        for (resource, amount) in cost {
            *self.stock.entry(*resource).or_insert(0.0) -= *amount as f64;
        }
        true
    }

    /// Debit a research cost in gold
    pub fn buy_research(&mut self, cost: i64) -> bool {
        if self.amount(Resource::Gold) < cost as f64 {
            self.push_fail("Not enough gold for research".to_string());
            return false;
        }
        *self.stock.entry(Resource::Gold).or_insert(0.0) -= cost as f64;
        true
    }

    /// Credit one economy tick of income and charge upkeep in gold.
    /// Gold may go negative; debt blocks purchases until repaid.
    pub fn apply_income(&mut self, income: &BTreeMap<Resource, f64>, upkeep: f64) {
        for (resource, amount) in income {
            *self.stock.entry(*resource).or_insert(0.0) += amount;
        }
        *self.stock.entry(Resource::Gold).or_insert(0.0) -= upkeep;
    }

    /// Whole-unit view of the stockpile
    pub fn stock(&self) -> BTreeMap<Resource, i64> {
        self.stock
            .iter()
            .map(|(r, amount)| (*r, amount.floor() as i64))
            .collect()
    }

    pub fn fail_messages(&self) -> Vec<String> {
        self.fail_messages.iter().cloned().collect()
    }

    fn push_fail(&mut self, message: String) {
        if self.fail_messages.len() >= MAX_FAIL_MESSAGES {
            self.fail_messages.pop_front();
        }
        self.fail_messages.push_back(message);
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Income per economy tick from a set of owned regions
pub fn income<'a>(regions: impl IntoIterator<Item = &'a Region>) -> BTreeMap<Resource, f64> {
    let mut income: BTreeMap<Resource, f64> = BTreeMap::new();
    for region in regions {
        let bonus: f64 = region.upgrades.iter().map(|u| u.yield_bonus).sum();
        *income.entry(region.resource).or_insert(0.0) += BASE_REGION_YIELD + bonus;
    }
    income
}

/// Gold upkeep per economy tick
pub fn upkeep_cost(region_count: usize, troops: u32) -> f64 {
    region_count as f64 * UPKEEP_PER_REGION + troops as f64 * UPKEEP_PER_TROOP
}

/// Shared market; prices move with every trade
#[derive(Debug, Clone)]
pub struct ResourceMarket {
    prices: BTreeMap<Resource, i64>,
}

impl ResourceMarket {
    pub fn new() -> Self {
        let prices = BTreeMap::from([
            (Resource::Food, 4),
            (Resource::Wood, 5),
            (Resource::Stone, 6),
            (Resource::Iron, 10),
        ]);
        Self { prices }
    }

    /// Current price, or None for resources that are not traded
    pub fn price(&self, resource: Resource) -> Option<i64> {
        self.prices.get(&resource).copied()
    }

    /// Record a player purchase
    pub fn buy(&mut self, resource: Resource) {
        if let Some(price) = self.prices.get_mut(&resource) {
            *price += 1;
        }
    }

    /// Record a player sale
    pub fn sell(&mut self, resource: Resource) {
        if let Some(price) = self.prices.get_mut(&resource) {
            *price = (*price - 1).max(1);
        }
    }

    pub fn prices(&self) -> &BTreeMap<Resource, i64> {
        &self.prices
    }
}

impl Default for ResourceMarket {
    fn default() -> Self {
        Self::new()
    }
}
