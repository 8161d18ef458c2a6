use serde::Serialize;
use std::collections::BTreeMap;

use crate::partitioner::PartitionedDataset;
use crate::splits::{SplitCounts, SplitLabel, SplitRatios};
use crate::types::ClassLabel;

/// Realized split sizes for one class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassSplitStats {
    /// Class these counts describe.
    pub class_label: ClassLabel,
    /// Parent-group counts per split.
    pub parents: SplitCounts,
    /// Segment counts per split.
    pub segments: SplitCounts,
}

impl ClassSplitStats {
    /// Realized parent-group share of `label` in this class.
    pub fn realized_ratio(&self, label: SplitLabel) -> f64 {
        self.parents.ratio(label)
    }

    /// Absolute gap between realized and requested parent-group ratio.
    ///
    /// Train and validation stay within `1 / N`; test absorbs the truncation
    /// remainder, so its gap is bounded by `2 / N`.
    pub fn ratio_gap(&self, label: SplitLabel, requested: SplitRatios) -> f64 {
        let target = match label {
            SplitLabel::Train => requested.train,
            SplitLabel::Validation => requested.validation,
            SplitLabel::Test => requested.test,
        };
        (self.realized_ratio(label) - target).abs()
    }
}

/// Aggregate split statistics for one partitioning run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitSummary {
    /// Per-class statistics in lexicographic class order.
    pub classes: Vec<ClassSplitStats>,
    /// Parent-group totals across classes.
    pub parents: SplitCounts,
    /// Segment totals across classes.
    pub segments: SplitCounts,
}

/// Compute per-class and total split statistics from a partitioned dataset.
pub fn split_summary(dataset: &PartitionedDataset) -> SplitSummary {
    let mut segment_counts: BTreeMap<&str, SplitCounts> = BTreeMap::new();
    for (label, records) in dataset.splits() {
        for record in records {
            segment_counts
                .entry(record.class_label.as_str())
                .or_default()
                .add(label, 1);
        }
    }

    let mut parents = SplitCounts::default();
    let mut segments = SplitCounts::default();
    let classes = dataset
        .assignment()
        .class_splits()
        .map(|split| {
            let class_parents = split.counts();
            let class_segments = segment_counts
                .get(split.class_label.as_str())
                .copied()
                .unwrap_or_default();
            parents.merge(&class_parents);
            segments.merge(&class_segments);
            ClassSplitStats {
                class_label: split.class_label.clone(),
                parents: class_parents,
                segments: class_segments,
            }
        })
        .collect();

    SplitSummary {
        classes,
        parents,
        segments,
    }
}
