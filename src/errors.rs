use std::io;

use thiserror::Error;

use crate::types::ClassLabel;

/// Error type for segment validation, split configuration, and output failures.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Malformed or conflicting segment input.
    #[error("invalid segment for class '{class_label}': {details}")]
    Validation {
        /// Class of the offending segment.
        class_label: ClassLabel,
        /// Which field or rule was violated.
        details: String,
    },
    /// Invalid ratios, layouts, or dataset root.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A class, or the whole dataset, has no parent groups.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),
    /// Filesystem failure while scanning or writing.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// CSV encoding failure.
    #[error("tabular output failure: {0}")]
    Csv(#[from] csv::Error),
    /// JSON encoding failure.
    #[error("structured output failure: {0}")]
    Json(#[from] serde_json::Error),
}

impl SplitError {
    pub(crate) fn validation(
        class_label: impl Into<ClassLabel>,
        details: impl Into<String>,
    ) -> Self {
        Self::Validation {
            class_label: class_label.into(),
            details: details.into(),
        }
    }
}
