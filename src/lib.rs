#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line front end.
pub mod cli;
/// Run configuration types.
pub mod config;
/// Centralized constants used across splitting, ingestion, and output.
pub mod constants;
/// Segment and metadata record types.
pub mod data;
/// Class -> parent -> segment grouping index.
pub mod grouping;
mod hash;
/// Dataset directory scanning and parent-id rules.
pub mod ingestion;
/// Realized split statistics.
pub mod metrics;
/// Tabular and structured serializers.
pub mod output;
/// Stratified, leakage-free partitioning.
pub mod partitioner;
/// End-to-end metadata generation.
pub mod pipeline;
/// Split labels, ratios, and truncating split arithmetic.
pub mod splits;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{EmptyClassPolicy, MetadataConfig};
pub use data::{MetadataRecord, Segment};
pub use errors::SplitError;
pub use grouping::{GroupingIndex, GroupingIndexBuilder, ParentGroups};
pub use ingestion::{DatasetScan, DatasetScanner, ParentIdRule};
pub use metrics::{ClassSplitStats, SplitSummary, split_summary};
pub use output::{
    MetadataWriter, RecordSerializer, StructuredLayout, StructuredSerializer, TabularLayout,
    TabularSerializer,
};
pub use partitioner::{ClassSplit, PartitionAssignment, PartitionedDataset, StratifiedPartitioner};
pub use pipeline::{RunReport, generate_metadata, partition_segments};
pub use splits::{SplitCounts, SplitLabel, SplitRatios, split_counts_for_total};
pub use types::{ClassLabel, FieldName, ParentId, SegmentPath};
