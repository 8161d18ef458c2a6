use std::ffi::OsStr;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::ingestion::{
    DEFAULT_AUDIO_EXTENSION, DEFAULT_FOLLOW_LINKS, DOTTED_PREFIX_COMPONENTS,
    DOTTED_PREFIX_SEPARATOR, SEGMENT_SUFFIX_SEPARATOR,
};
use crate::data::Segment;
use crate::errors::SplitError;
use crate::grouping::{GroupingIndex, GroupingIndexBuilder};
use crate::types::{ClassLabel, ParentId, SegmentPath};

/// Rule mapping a segment file name to the id of its parent recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParentIdRule {
    /// Stem up to the first `_`: `blues.00024_1.wav` -> `blues.00024`.
    #[default]
    SegmentSuffix,
    /// First two `.`-separated components of the stem: `blues.00024.wav` -> `blues.00024`.
    DottedPrefix,
}

impl ParentIdRule {
    /// Derive the parent id for `file_name`, or `None` when the name does not fit the rule.
    pub fn parent_id(self, file_name: &str) -> Option<ParentId> {
        let stem = Path::new(file_name).file_stem()?.to_str()?;
        let parent = match self {
            ParentIdRule::SegmentSuffix => stem
                .split(SEGMENT_SUFFIX_SEPARATOR)
                .next()
                .unwrap_or_default()
                .to_string(),
            ParentIdRule::DottedPrefix => {
                let parts: Vec<&str> = stem
                    .splitn(DOTTED_PREFIX_COMPONENTS + 1, DOTTED_PREFIX_SEPARATOR)
                    .take(DOTTED_PREFIX_COMPONENTS)
                    .collect();
                if parts.len() < DOTTED_PREFIX_COMPONENTS || parts.iter().any(|p| p.is_empty()) {
                    return None;
                }
                parts.join(&DOTTED_PREFIX_SEPARATOR.to_string())
            }
        };
        if parent.is_empty() {
            return None;
        }
        Some(parent)
    }
}

/// Classes and segments discovered under a dataset root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetScan {
    /// Every class directory, including ones without matching files.
    pub classes: Vec<ClassLabel>,
    /// Every matching segment file.
    pub segments: Vec<Segment>,
}

impl DatasetScan {
    /// Feed the scan into a validated [`GroupingIndex`].
    pub fn into_index(self) -> Result<GroupingIndex, SplitError> {
        let mut builder = GroupingIndexBuilder::new();
        for class_label in self.classes {
            builder.declare_class(class_label)?;
        }
        for segment in self.segments {
            builder.insert(segment)?;
        }
        Ok(builder.build())
    }
}

/// Scanner for `<root>/<class>/<segment>.<ext>` dataset layouts.
pub struct DatasetScanner {
    root: PathBuf,
    parent_id_rule: ParentIdRule,
    extension: String,
    follow_links: bool,
}

impl DatasetScanner {
    /// Create a scanner rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parent_id_rule: ParentIdRule::default(),
            extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            follow_links: DEFAULT_FOLLOW_LINKS,
        }
    }

    /// Rule used to derive parent ids from file names.
    pub fn with_parent_id_rule(mut self, rule: ParentIdRule) -> Self {
        self.parent_id_rule = rule;
        self
    }

    /// Audio extension to collect (leading `.` optional, case-insensitive).
    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extension = extension.as_ref().trim_start_matches('.').to_string();
        self
    }

    /// Configure symlink traversal (on by default). With traversal off,
    /// symlinked class directories and segment files are skipped with a warning.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Walk the root, one class per immediate sub-directory, in name order.
    pub fn scan(&self) -> Result<DatasetScan, SplitError> {
        if !self.root.is_dir() {
            return Err(SplitError::Configuration(format!(
                "dataset root '{}' is not a directory",
                self.root.display()
            )));
        }

        let mut scan = DatasetScan::default();
        for entry in self.walk_children(&self.root) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.path_is_symlink() && !self.follow_links {
                warn_skipped_symlink(entry.path());
                continue;
            }
            if !entry.file_type().is_dir() {
                continue;
            }
            let class_label = entry.file_name().to_str().ok_or_else(|| {
                SplitError::validation(
                    entry.file_name().to_string_lossy(),
                    "class directory name is not valid UTF-8",
                )
            })?;
            let before = scan.segments.len();
            self.scan_class(class_label, entry.path(), &mut scan.segments)?;
            debug!(
                class = class_label,
                segments = scan.segments.len() - before,
                "scanned class directory"
            );
            scan.classes.push(class_label.to_string());
        }

        info!(
            root = %self.root.display(),
            classes = scan.classes.len(),
            segments = scan.segments.len(),
            "scanned dataset root"
        );
        Ok(scan)
    }

    fn scan_class(
        &self,
        class_label: &str,
        dir: &Path,
        segments: &mut Vec<Segment>,
    ) -> Result<(), SplitError> {
        for entry in self.walk_children(dir) {
            let entry = entry.map_err(io::Error::from)?;
            if !self.has_audio_extension(entry.path()) {
                continue;
            }
            if entry.path_is_symlink() && !self.follow_links {
                warn_skipped_symlink(entry.path());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_str().ok_or_else(|| {
                SplitError::validation(
                    class_label,
                    format!(
                        "segment file name '{}' is not valid UTF-8",
                        entry.file_name().to_string_lossy()
                    ),
                )
            })?;
            let parent_id = self.parent_id_rule.parent_id(file_name).ok_or_else(|| {
                SplitError::validation(
                    class_label,
                    format!(
                        "cannot derive parent_id from '{file_name}' with rule {:?}",
                        self.parent_id_rule
                    ),
                )
            })?;
            segments.push(Segment::new(
                segment_path_string(entry.path()),
                class_label,
                parent_id,
            ));
        }
        Ok(())
    }

    fn walk_children(&self, dir: &Path) -> walkdir::IntoIter {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
    }

    fn has_audio_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

fn warn_skipped_symlink(path: &Path) {
    warn!(
        path = %path.display(),
        "skipping symlink; enable link following to include it"
    );
}

/// Render `path` with forward slashes regardless of platform.
pub fn segment_path_string(path: &Path) -> SegmentPath {
    path.to_string_lossy().replace(MAIN_SEPARATOR, "/")
}
