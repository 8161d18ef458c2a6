use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::constants::output::{TEST_FILE_STEM, TRAIN_FILE_STEM, VALIDATION_FILE_STEM};
use crate::constants::splits::{
    DEFAULT_TEST_RATIO, DEFAULT_TRAIN_RATIO, DEFAULT_VALIDATION_RATIO, RATIO_SUM_TOLERANCE,
    TEST_REMAINDER_WARN_EPSILON,
};
use crate::errors::SplitError;

/// Logical dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Validation split.
    Validation,
    /// Test split.
    Test,
}

impl SplitLabel {
    /// Lowercase name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "validation",
            SplitLabel::Test => "test",
        }
    }

    /// File stem used for this partition's output files (`train`, `val`, `test`).
    pub fn file_stem(self) -> &'static str {
        match self {
            SplitLabel::Train => TRAIN_FILE_STEM,
            SplitLabel::Validation => VALIDATION_FILE_STEM,
            SplitLabel::Test => TEST_FILE_STEM,
        }
    }
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio configuration for train/validation/test assignment.
///
/// Only `train` and `validation` drive the arithmetic; test receives whatever
/// is left after truncation, so `test` is a nominal value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitRatios {
    /// Fraction assigned to train.
    pub train: f64,
    /// Fraction assigned to validation.
    pub validation: f64,
    /// Nominal fraction assigned to test.
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: DEFAULT_TRAIN_RATIO,
            validation: DEFAULT_VALIDATION_RATIO,
            test: DEFAULT_TEST_RATIO,
        }
    }
}

impl SplitRatios {
    /// Build ratios from a `(train, validation, test)` triple.
    pub fn new(train: f64, validation: f64, test: f64) -> Self {
        Self {
            train,
            validation,
            test,
        }
    }

    /// Validate that every ratio is finite and non-negative and that
    /// `train + validation` does not exceed `1.0`.
    pub fn validated(self) -> Result<Self, SplitError> {
        for (name, value) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !value.is_finite() {
                return Err(SplitError::Configuration(format!(
                    "{name} ratio must be finite, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(SplitError::Configuration(format!(
                    "split ratios must be non-negative, got {name}={value}"
                )));
            }
        }
        let assigned = self.train + self.validation;
        if assigned > 1.0 + RATIO_SUM_TOLERANCE {
            return Err(SplitError::Configuration(format!(
                "train + validation must not exceed 1.0, got {:.6} (train={}, validation={})",
                assigned, self.train, self.validation
            )));
        }
        let remainder = (1.0 - assigned).max(0.0);
        if (self.test - remainder).abs() > TEST_REMAINDER_WARN_EPSILON {
            warn!(
                test = self.test,
                remainder, "test ratio differs from the remainder; test receives the remainder"
            );
        }
        Ok(self)
    }
}

/// Per-split counts (parent groups or segments).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    /// Count in train.
    pub train: usize,
    /// Count in validation.
    pub validation: usize,
    /// Count in test.
    pub test: usize,
}

impl SplitCounts {
    /// Count for one split.
    pub fn get(&self, label: SplitLabel) -> usize {
        match label {
            SplitLabel::Train => self.train,
            SplitLabel::Validation => self.validation,
            SplitLabel::Test => self.test,
        }
    }

    /// Sum over all three splits.
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }

    /// Share of `label` in the total, or `0.0` when empty.
    pub fn ratio(&self, label: SplitLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(label) as f64 / total as f64
    }

    pub(crate) fn add(&mut self, label: SplitLabel, amount: usize) {
        match label {
            SplitLabel::Train => self.train += amount,
            SplitLabel::Validation => self.validation += amount,
            SplitLabel::Test => self.test += amount,
        }
    }

    pub(crate) fn merge(&mut self, other: &SplitCounts) {
        self.train += other.train;
        self.validation += other.validation;
        self.test += other.test;
    }
}

/// Truncating proportional split of `total` items.
///
/// `train = floor(total * r_train)`, `validation = floor(total * r_validation)`,
/// and test takes the remainder so the three always sum to `total`.
pub fn split_counts_for_total(total: usize, split: SplitRatios) -> SplitCounts {
    let train = (((total as f64) * split.train).floor() as usize).min(total);
    let validation = (((total as f64) * split.validation).floor() as usize).min(total - train);
    SplitCounts {
        train,
        validation,
        test: total - train - validation,
    }
}
