use std::path::PathBuf;

use crate::constants::ingestion::{
    DEFAULT_AUDIO_EXTENSION, DEFAULT_DATASET_ROOT, DEFAULT_FOLLOW_LINKS,
};
use crate::constants::output::DEFAULT_OUTPUT_DIR;
use crate::constants::splits::DEFAULT_SEED;
use crate::ingestion::ParentIdRule;
use crate::output::{StructuredLayout, TabularLayout};
use crate::splits::SplitRatios;

/// What to do with class directories that contain no segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyClassPolicy {
    /// Fail the run with `EmptyDataset`.
    #[default]
    Abort,
    /// Drop the class with a warning and continue.
    Skip,
}

/// Top-level configuration for a metadata generation run.
#[derive(Clone, Debug)]
pub struct MetadataConfig {
    /// Directory holding one sub-directory per class.
    pub dataset_root: PathBuf,
    /// Directory the metadata files are written to (created if missing).
    pub output_dir: PathBuf,
    /// Split ratios used when assigning parent recordings.
    pub split: SplitRatios,
    /// Seed that controls every per-class permutation.
    pub seed: u64,
    /// How parent ids are derived from segment file names.
    pub parent_id_rule: ParentIdRule,
    /// Audio file extension to collect.
    pub audio_extension: String,
    /// Follow symlinked class directories and segment files while scanning.
    pub follow_links: bool,
    /// Handling of classes without segments.
    pub empty_classes: EmptyClassPolicy,
    /// Tabular column names.
    pub tabular: TabularLayout,
    /// Structured key names and envelope.
    pub structured: StructuredLayout,
    /// Optional suffix appended to every output file stem.
    pub file_suffix: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from(DEFAULT_DATASET_ROOT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            split: SplitRatios::default(),
            seed: DEFAULT_SEED,
            parent_id_rule: ParentIdRule::default(),
            audio_extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            follow_links: DEFAULT_FOLLOW_LINKS,
            empty_classes: EmptyClassPolicy::default(),
            tabular: TabularLayout::default(),
            structured: StructuredLayout::default(),
            file_suffix: None,
        }
    }
}
