//! Inbound command dispatch and the per-player listener loop

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::ws::protocol::{ClickKind, ClientMsg, MarketAction};

use super::catalog::{UpgradeCatalog, UpgradeDefinition};
use super::click::ClickPoint;
use super::economy::Resource;
use super::research::ResearchKind;
use super::resolver::{MoveResolver, Resolution};
use super::session::PlayerSession;
use super::world::{RegionId, RegionMap};

/// Result of an attempted upgrade build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(RegionId),
    /// No owned region matched the name or click
    NoRegion,
    UnknownUpgrade,
    Unaffordable,
}

/// Routes one player's commands to their handlers
pub struct CommandDispatcher {
    session: Arc<PlayerSession>,
    catalog: Arc<UpgradeCatalog>,
    resolver: MoveResolver,
}

impl CommandDispatcher {
    pub fn new(session: Arc<PlayerSession>, catalog: Arc<UpgradeCatalog>) -> Self {
        let resolver = MoveResolver::new(session.player_id);
        Self {
            session,
            catalog,
            resolver,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Arc<PlayerSession> {
        &self.session
    }

    /// Handle one message, then run a move resolution cycle.
    ///
    /// Resolution runs after every message, not only clicks.
    pub fn dispatch(&self, msg: ClientMsg) -> Resolution {
        trace!(player_id = %self.session.player_id, ?msg, "Dispatching command");

        match msg {
            ClientMsg::Click { kind, x, y } => self.handle_click(kind, ClickPoint::new(x, y)),
            ClientMsg::Market { action, resource } => {
                self.handle_market(action, resource);
            }
            ClientMsg::RegionUpgrade { region, upgrade } => {
                self.handle_region_upgrade(&region, &upgrade);
            }
            ClientMsg::Research { upgrade } => {
                self.handle_research(upgrade);
            }
            ClientMsg::KeyUpgrade { code } => {
                self.handle_key_upgrade(code);
            }
            ClientMsg::Unknown => {
                debug!(player_id = %self.session.player_id, "Ignoring unknown command");
            }
        }

        self.resolver.resolve(&self.session.clicks, &self.session.world)
    }

    /// Drain commands in arrival order until the sender goes away
    pub async fn run(self, mut rx: mpsc::Receiver<ClientMsg>) {
        while let Some(msg) = rx.recv().await {
            self.dispatch(msg);
        }
        debug!(player_id = %self.session.player_id, "Command listener stopped");
    }

    fn handle_click(&self, kind: ClickKind, p: ClickPoint) {
        match kind {
            ClickKind::Right => self.session.clicks.set_first(p),
            ClickKind::Left => self.session.clicks.clear(),
        }
    }

    /// Trade one unit at the current market price. Returns true if it happened.
    fn handle_market(&self, action: MarketAction, resource: Resource) -> bool {
        let mut pool = self.session.resources.lock();
        let mut market = self.session.world.market.lock();

        let Some(price) = market.price(resource) else {
            return false;
        };

        let traded = match action {
            MarketAction::Sell => {
                let sold = pool.sell(resource, price);
                if sold {
                    market.sell(resource);
                }
                sold
            }
            MarketAction::Buy => {
                let bought = pool.buy(resource, price);
                if bought {
                    market.buy(resource);
                }
                bought
            }
        };

        debug!(
            player_id = %self.session.player_id,
            ?action,
            resource = resource.as_str(),
            price,
            traded,
            "Market order"
        );
        traded
    }

    fn handle_region_upgrade(&self, region_name: &str, upgrade_name: &str) -> BuildOutcome {
        let mut map = self.session.world.regions.write();

        let Some(region) = map.find_owned(self.session.player_id, region_name) else {
            return BuildOutcome::NoRegion;
        };
        let Some(upgrade) = self.catalog.by_name(upgrade_name) else {
            return BuildOutcome::UnknownUpgrade;
        };

        self.build_upgrade(&mut map, region, upgrade)
    }

    /// Build the upgrade bound to `code` at the region under the first click
    fn handle_key_upgrade(&self, code: u32) -> BuildOutcome {
        let Some(upgrade) = self.catalog.by_key(code) else {
            return BuildOutcome::UnknownUpgrade;
        };
        let Some(click) = self.session.clicks.first() else {
            return BuildOutcome::NoRegion;
        };

        let mut map = self.session.world.regions.write();
        let region = map
            .region_of(click)
            .filter(|id| {
                map.get(*id)
                    .is_some_and(|r| r.is_owned_by(self.session.player_id))
            });

        match region {
            Some(region) => self.build_upgrade(&mut map, region, upgrade),
            None => BuildOutcome::NoRegion,
        }
    }

    fn handle_research(&self, kind: ResearchKind) -> bool {
        let mut research = self.session.research.lock();
        let cost = research.cost(kind);

        let researched = self.session.resources.lock().buy_research(cost);
        if researched {
            research.upgrade(kind);
        }

        debug!(
            player_id = %self.session.player_id,
            ?kind,
            cost,
            researched,
            "Research order"
        );
        researched
    }

    /// Debit the cost and attach the upgrade, or do nothing.
    /// The caller holds the region write lock for the whole check and commit.
    fn build_upgrade(
        &self,
        map: &mut RegionMap,
        region: RegionId,
        upgrade: &UpgradeDefinition,
    ) -> BuildOutcome {
        let Some(target) = map.get_mut(region) else {
            return BuildOutcome::NoRegion;
        };

        if !self
            .session
            .resources
            .lock()
            .buy_upgrade(&upgrade.name, &upgrade.cost)
        {
            return BuildOutcome::Unaffordable;
        }

        target.add_upgrade(upgrade);
        debug!(
            player_id = %self.session.player_id,
            region = %target.name,
            upgrade = %upgrade.name,
            "Upgrade built"
        );
        BuildOutcome::Built(region)
    }
}
