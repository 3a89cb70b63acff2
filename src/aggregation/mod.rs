//! Progressive aggregation of a project's pipeline catalog.

mod declaration;
mod enrichment;
mod orchestrator;
mod resolver;
mod trigger;

pub use declaration::{parse_declaration, ENVIRONMENTS};
pub use enrichment::Enricher;
pub use orchestrator::{AggregationOptions, Aggregator, DEFAULT_BATCH_SIZE};
pub use resolver::{resolve_group, KnownGroups};
pub use trigger::classify_trigger;
