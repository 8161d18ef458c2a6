//! Serialization of partitioned records into tabular and structured files.
//!
//! Both formats are projections of the same `PartitionedDataset` record
//! slices. Every payload is rendered in memory before the first file is
//! written, and every file is staged next to its target before any target is
//! replaced, so a failed run never mixes new and previous outputs.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::output::{
    DEFAULT_JSON_ENVELOPE, DEFAULT_LABEL_COLUMN, DEFAULT_LABEL_KEY, DEFAULT_PARENT_COLUMN,
    DEFAULT_PATH_COLUMN, DEFAULT_PATH_KEY, STAGING_SUFFIX, STRUCTURED_EXTENSION,
    TABULAR_EXTENSION,
};
use crate::data::MetadataRecord;
use crate::errors::SplitError;
use crate::partitioner::PartitionedDataset;
use crate::splits::SplitLabel;
use crate::types::FieldName;

/// A serialization of one split's record stream.
pub trait RecordSerializer {
    /// File extension without the leading dot.
    fn extension(&self) -> &str;
    /// Render `records` in order into a complete file payload.
    fn render(&self, records: &[MetadataRecord]) -> Result<Vec<u8>, SplitError>;
}

/// Column names for the tabular form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabularLayout {
    /// Header of the segment path column.
    pub path_column: FieldName,
    /// Header of the class label column.
    pub label_column: FieldName,
    /// Header of the parent recording column.
    pub parent_column: FieldName,
}

impl Default for TabularLayout {
    fn default() -> Self {
        Self {
            path_column: DEFAULT_PATH_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            parent_column: DEFAULT_PARENT_COLUMN.to_string(),
        }
    }
}

impl TabularLayout {
    /// Reject empty or repeated column names.
    pub fn validated(self) -> Result<Self, SplitError> {
        ensure_distinct_names(
            "tabular column",
            [&self.path_column, &self.label_column, &self.parent_column],
        )?;
        Ok(self)
    }
}

/// Key names and envelope for the structured form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredLayout {
    /// Key holding the segment path.
    pub path_key: FieldName,
    /// Key holding the class label.
    pub label_key: FieldName,
    /// Optional key holding the parent id.
    pub parent_key: Option<FieldName>,
    /// Named field wrapping the record array; `None` writes a bare array.
    pub envelope: Option<FieldName>,
}

impl Default for StructuredLayout {
    fn default() -> Self {
        Self {
            path_key: DEFAULT_PATH_KEY.to_string(),
            label_key: DEFAULT_LABEL_KEY.to_string(),
            parent_key: None,
            envelope: Some(DEFAULT_JSON_ENVELOPE.to_string()),
        }
    }
}

impl StructuredLayout {
    /// Reject empty or repeated keys and an empty envelope name.
    pub fn validated(self) -> Result<Self, SplitError> {
        let mut keys = vec![&self.path_key, &self.label_key];
        if let Some(parent_key) = &self.parent_key {
            keys.push(parent_key);
        }
        ensure_distinct_names("structured key", keys)?;
        if let Some(envelope) = &self.envelope {
            ensure_distinct_names("structured envelope", [envelope])?;
        }
        Ok(self)
    }
}

fn ensure_distinct_names<'a, I>(kind: &str, names: I) -> Result<(), SplitError>
where
    I: IntoIterator<Item = &'a FieldName>,
{
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(SplitError::Configuration(format!("{kind} name is empty")));
        }
        if !seen.insert(name.as_str()) {
            return Err(SplitError::Configuration(format!(
                "{kind} name '{name}' is used twice"
            )));
        }
    }
    Ok(())
}

/// CSV serializer: header row then one `path,label,parent` row per record.
#[derive(Clone, Debug, Default)]
pub struct TabularSerializer {
    layout: TabularLayout,
}

impl TabularSerializer {
    /// Serializer using `layout` for the header row.
    pub fn new(layout: TabularLayout) -> Self {
        Self { layout }
    }
}

impl RecordSerializer for TabularSerializer {
    fn extension(&self) -> &str {
        TABULAR_EXTENSION
    }

    fn render(&self, records: &[MetadataRecord]) -> Result<Vec<u8>, SplitError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            self.layout.path_column.as_str(),
            self.layout.label_column.as_str(),
            self.layout.parent_column.as_str(),
        ])?;
        for record in records {
            writer.write_record([
                record.path.as_str(),
                record.class_label.as_str(),
                record.parent_id.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|err| SplitError::Io(err.into_error()))
    }
}

/// JSON serializer: an array of keyed objects, optionally wrapped in a named field.
#[derive(Clone, Debug, Default)]
pub struct StructuredSerializer {
    layout: StructuredLayout,
}

impl StructuredSerializer {
    /// Serializer using `layout` for keys and envelope.
    pub fn new(layout: StructuredLayout) -> Self {
        Self { layout }
    }

    fn entry(&self, record: &MetadataRecord) -> Value {
        let mut object = Map::new();
        object.insert(
            self.layout.path_key.clone(),
            Value::String(record.path.clone()),
        );
        object.insert(
            self.layout.label_key.clone(),
            Value::String(record.class_label.clone()),
        );
        if let Some(parent_key) = &self.layout.parent_key {
            object.insert(parent_key.clone(), Value::String(record.parent_id.clone()));
        }
        Value::Object(object)
    }
}

impl RecordSerializer for StructuredSerializer {
    fn extension(&self) -> &str {
        STRUCTURED_EXTENSION
    }

    fn render(&self, records: &[MetadataRecord]) -> Result<Vec<u8>, SplitError> {
        let entries = Value::Array(records.iter().map(|record| self.entry(record)).collect());
        let payload = match &self.layout.envelope {
            Some(envelope) => {
                let mut wrapper = Map::new();
                wrapper.insert(envelope.clone(), entries);
                Value::Object(wrapper)
            }
            None => entries,
        };
        Ok(serde_json::to_vec_pretty(&payload)?)
    }
}

/// Writes one tabular and one structured file per split.
pub struct MetadataWriter {
    output_dir: PathBuf,
    tabular: TabularSerializer,
    structured: StructuredSerializer,
    file_suffix: String,
}

impl MetadataWriter {
    /// Create a writer targeting `output_dir`.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        tabular: TabularSerializer,
        structured: StructuredSerializer,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            tabular,
            structured,
            file_suffix: String::new(),
        }
    }

    /// Suffix appended to every file stem (`train_30s.csv` for `_30s`).
    pub fn with_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn serializers(&self) -> [&dyn RecordSerializer; 2] {
        [&self.tabular, &self.structured]
    }

    /// Path of the file `serializer` produces for `label`.
    pub fn file_path(&self, label: SplitLabel, serializer: &dyn RecordSerializer) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.{}",
            label.file_stem(),
            self.file_suffix,
            serializer.extension()
        ))
    }

    /// Render every output file in memory, in split then format order.
    pub fn render_all(
        &self,
        dataset: &PartitionedDataset,
    ) -> Result<Vec<(PathBuf, Vec<u8>)>, SplitError> {
        let mut rendered = Vec::new();
        for (label, records) in dataset.splits() {
            for serializer in self.serializers() {
                rendered.push((
                    self.file_path(label, serializer),
                    serializer.render(records)?,
                ));
            }
        }
        Ok(rendered)
    }

    /// Render everything, stage each file next to its target, then move the
    /// staged files into place once all of them were written.
    pub fn write(&self, dataset: &PartitionedDataset) -> Result<Vec<PathBuf>, SplitError> {
        let rendered = self.render_all(dataset)?;
        fs::create_dir_all(&self.output_dir)?;

        let mut staged = Vec::with_capacity(rendered.len());
        for (path, payload) in rendered {
            let staging = staging_path(&path);
            if let Err(err) = fs::write(&staging, payload) {
                discard_staged(&staged);
                return Err(err.into());
            }
            staged.push((staging, path));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (staging, path) in &staged {
            if let Err(err) = fs::rename(staging, path) {
                discard_staged(&staged[written.len()..]);
                return Err(err.into());
            }
            written.push(path.clone());
        }
        info!(
            output_dir = %self.output_dir.display(),
            files = written.len(),
            "wrote metadata files"
        );
        Ok(written)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(STAGING_SUFFIX);
    PathBuf::from(staging)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(err) = fs::remove_file(staging) {
            warn!(
                path = %staging.display(),
                error = %err,
                "could not remove staged file"
            );
        }
    }
}
