// Aggregator module: item lookups across upstream sources and health probes.

pub mod health;
pub mod sources;

pub use health::{HealthReport, HealthService};
pub use sources::ItemService;
