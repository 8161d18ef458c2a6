use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{EmptyClassPolicy, MetadataConfig};
use crate::data::Segment;
use crate::errors::SplitError;
use crate::grouping::GroupingIndex;
use crate::ingestion::DatasetScanner;
use crate::metrics::{SplitSummary, split_summary};
use crate::output::{MetadataWriter, StructuredSerializer, TabularSerializer};
use crate::partitioner::{PartitionedDataset, StratifiedPartitioner};
use crate::splits::SplitRatios;
use crate::types::ClassLabel;

/// Outcome of a completed metadata run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Seed the run was partitioned with.
    pub seed: u64,
    /// Ratios the run was partitioned with.
    pub split: SplitRatios,
    /// Realized split statistics.
    pub summary: SplitSummary,
    /// Empty classes dropped under `EmptyClassPolicy::Skip`.
    pub skipped_classes: Vec<ClassLabel>,
    /// Files written, in split then format order.
    pub written: Vec<PathBuf>,
}

/// Group `segments` and partition them: the engine without any I/O.
pub fn partition_segments<I>(
    segments: I,
    ratios: SplitRatios,
    seed: u64,
) -> Result<PartitionedDataset, SplitError>
where
    I: IntoIterator<Item = Segment>,
{
    let partitioner = StratifiedPartitioner::new(ratios, seed)?;
    let index = GroupingIndex::from_segments(segments)?;
    partitioner.partition(&index)
}

/// Apply `policy` to declared-but-empty classes.
pub fn apply_empty_class_policy(
    index: GroupingIndex,
    policy: EmptyClassPolicy,
) -> Result<(GroupingIndex, Vec<ClassLabel>), SplitError> {
    match policy {
        EmptyClassPolicy::Abort => Ok((index, Vec::new())),
        EmptyClassPolicy::Skip => {
            let (index, skipped) = index.without_empty_classes();
            for class_label in &skipped {
                warn!(class = %class_label, "skipping class without segments");
            }
            if index.is_empty() {
                return Err(SplitError::EmptyDataset(
                    "no class contains any segments".to_string(),
                ));
            }
            Ok((index, skipped))
        }
    }
}

fn build_writer(config: &MetadataConfig) -> Result<MetadataWriter, SplitError> {
    let tabular = TabularSerializer::new(config.tabular.clone().validated()?);
    let structured = StructuredSerializer::new(config.structured.clone().validated()?);
    let writer = MetadataWriter::new(&config.output_dir, tabular, structured);
    Ok(match &config.file_suffix {
        Some(suffix) => writer.with_file_suffix(suffix),
        None => writer,
    })
}

/// Scan, group, partition, and write metadata for `config`.
///
/// Ratios and output layouts are validated before the dataset is scanned,
/// and nothing is written unless every class partitioned successfully.
pub fn generate_metadata(config: &MetadataConfig) -> Result<RunReport, SplitError> {
    let partitioner = StratifiedPartitioner::new(config.split, config.seed)?;
    let writer = build_writer(config)?;

    let scan = DatasetScanner::new(&config.dataset_root)
        .with_parent_id_rule(config.parent_id_rule)
        .with_extension(&config.audio_extension)
        .with_follow_links(config.follow_links)
        .scan()?;
    let index = scan.into_index()?;
    let (index, skipped_classes) = apply_empty_class_policy(index, config.empty_classes)?;

    let dataset = partitioner.partition(&index)?;
    let summary = split_summary(&dataset);
    let written = writer.write(&dataset)?;

    info!(
        seed = config.seed,
        classes = summary.classes.len(),
        train = summary.segments.train,
        validation = summary.segments.validation,
        test = summary.segments.test,
        "generated metadata"
    );
    Ok(RunReport {
        seed: config.seed,
        split: config.split,
        summary,
        skipped_classes,
        written,
    })
}
