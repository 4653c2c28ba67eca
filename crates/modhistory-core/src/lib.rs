//! Core types for modhistory.
//!
//! This crate provides the data model shared by the collector and the
//! snapshot store: the hierarchy of directories and file metadata records,
//! the timestamp normalizer, exclusion rules and configuration.

mod config;
mod error;
mod exclude;
mod node;
mod snapshot;
mod timestamp;

pub use config::{CONFIG_FILE_NAME, CollectConfig, CollectConfigBuilder, ConfigFile};
pub use error::{CollectError, CollectWarning, ConfigError, WarningKind};
pub use exclude::{ExclusionRules, canonical_extension, extension_of};
pub use node::{Children, HierarchyNode, MetadataRecord};
pub use snapshot::{CollectStats, Snapshot};
pub use timestamp::{TimestampFormatter, WeekdayNames};
