//! Pipeline module - loading, classification, mapping and migration

pub mod auto_map;
pub mod classify;
pub mod executor;
pub mod loader;
pub mod normalize;
pub mod session;
pub mod team;

pub use auto_map::{propose, propose_for};
pub use classify::{classify, classify_teams, classify_with_links, MigrationLevel};
pub use executor::{migrate_teams, MigrationReport, TeamOutcome, TeamResult};
pub use loader::*;
pub use normalize::{normalize, normalize_type};
pub use session::{LinkField, MappingError, MappingSession, TargetOption, MAX_TITLE_LEN};
pub use team::{DynamicMetadata, FieldValue, MetadataField, ValoTeam};
