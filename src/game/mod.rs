//! Game state and per-player command handling

pub mod catalog;
pub mod click;
pub mod dispatcher;
pub mod economy;
pub mod research;
pub mod resolver;
pub mod session;
pub mod stats;
pub mod world;

pub use catalog::UpgradeCatalog;
pub use dispatcher::CommandDispatcher;
pub use session::{PlayerSession, SessionRegistry};
pub use stats::StatsReporter;
pub use world::{RegionMap, RenderProjection, World};
