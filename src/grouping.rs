//! Grouping index: class label -> parent id -> segment paths.
//!
//! The index is the only place segments are aggregated. It is built once per
//! run, validated while it is built, and read-only afterwards. Parent groups
//! and classes are kept in `BTreeMap`s and segment paths are sorted on
//! `build`, so every read of the index is independent of discovery order.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::data::Segment;
use crate::errors::SplitError;
use crate::types::{ClassLabel, ParentId, SegmentPath};

/// Parent groups of one class, keyed by parent id.
pub type ParentGroups = BTreeMap<ParentId, Vec<SegmentPath>>;

/// Immutable two-level mapping of segments to their parent recordings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupingIndex {
    classes: BTreeMap<ClassLabel, ParentGroups>,
}

/// Incremental, validating builder for [`GroupingIndex`].
#[derive(Debug, Default)]
pub struct GroupingIndexBuilder {
    classes: BTreeMap<ClassLabel, ParentGroups>,
    parent_owner: HashMap<ParentId, ClassLabel>,
    seen_paths: HashSet<SegmentPath>,
}

impl GroupingIndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class even if no segment for it is ever inserted.
    ///
    /// Declared-but-empty classes are what the partitioner reports as
    /// `EmptyDataset` instead of silently dropping them.
    pub fn declare_class(&mut self, class_label: impl Into<ClassLabel>) -> Result<(), SplitError> {
        let class_label = class_label.into();
        if class_label.trim().is_empty() {
            return Err(SplitError::validation(class_label, "class_label is empty"));
        }
        self.classes.entry(class_label).or_default();
        Ok(())
    }

    /// Validate `segment` and add it to its class and parent group.
    pub fn insert(&mut self, segment: Segment) -> Result<(), SplitError> {
        let Segment {
            path,
            class_label,
            parent_id,
        } = segment;

        if class_label.trim().is_empty() {
            return Err(SplitError::validation(
                class_label,
                format!("class_label is empty (path '{path}')"),
            ));
        }
        if path.trim().is_empty() {
            return Err(SplitError::validation(
                class_label,
                format!("path is empty (parent_id '{parent_id}')"),
            ));
        }
        if parent_id.trim().is_empty() {
            return Err(SplitError::validation(
                class_label,
                format!("parent_id is empty (path '{path}')"),
            ));
        }

        if let Some(owner) = self
            .parent_owner
            .get(&parent_id)
            .filter(|owner| **owner != class_label)
        {
            return Err(SplitError::validation(
                class_label,
                format!(
                    "parent_id '{parent_id}' is already grouped under class '{owner}'"
                ),
            ));
        }
        if self.seen_paths.contains(&path) {
            return Err(SplitError::validation(
                class_label,
                format!("duplicate segment path '{path}'"),
            ));
        }

        self.parent_owner
            .entry(parent_id.clone())
            .or_insert_with(|| class_label.clone());
        self.seen_paths.insert(path.clone());
        self.classes
            .entry(class_label)
            .or_default()
            .entry(parent_id)
            .or_default()
            .push(path);
        Ok(())
    }

    /// Finish the index, sorting each parent group's segment paths.
    pub fn build(self) -> GroupingIndex {
        let mut classes = self.classes;
        for groups in classes.values_mut() {
            for paths in groups.values_mut() {
                paths.sort();
            }
        }
        GroupingIndex { classes }
    }
}

impl GroupingIndex {
    /// Start an incremental build.
    pub fn builder() -> GroupingIndexBuilder {
        GroupingIndexBuilder::new()
    }

    /// Build an index from a sequence of segments, failing on the first invalid one.
    pub fn from_segments<I>(segments: I) -> Result<Self, SplitError>
    where
        I: IntoIterator<Item = Segment>,
    {
        let mut builder = GroupingIndexBuilder::new();
        for segment in segments {
            builder.insert(segment)?;
        }
        Ok(builder.build())
    }

    /// Class labels in lexicographic order.
    pub fn class_labels(&self) -> impl Iterator<Item = &ClassLabel> {
        self.classes.keys()
    }

    /// `(class, parent groups)` pairs in lexicographic class order.
    pub fn classes(&self) -> impl Iterator<Item = (&ClassLabel, &ParentGroups)> {
        self.classes.iter()
    }

    /// Parent groups for one class.
    pub fn parent_groups(&self, class_label: &str) -> Option<&ParentGroups> {
        self.classes.get(class_label)
    }

    /// Sorted segment paths of one parent group.
    pub fn segments_for(&self, class_label: &str, parent_id: &str) -> Option<&[SegmentPath]> {
        self.classes
            .get(class_label)?
            .get(parent_id)
            .map(Vec::as_slice)
    }

    /// Number of classes, including declared classes without segments.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of parent groups across all classes.
    pub fn parent_count(&self) -> usize {
        self.classes.values().map(BTreeMap::len).sum()
    }

    /// Number of segments across all classes.
    pub fn segment_count(&self) -> usize {
        self.classes
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// True when no class has been declared or populated.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes that were declared but hold no parent groups.
    pub fn empty_classes(&self) -> Vec<ClassLabel> {
        self.classes
            .iter()
            .filter(|(_, groups)| groups.is_empty())
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Drop classes without parent groups, returning the dropped labels.
    pub fn without_empty_classes(self) -> (Self, Vec<ClassLabel>) {
        let (kept, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .classes
            .into_iter()
            .partition(|(_, groups)| !groups.is_empty());
        (Self { classes: kept }, dropped.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(path: &str, class_label: &str, parent_id: &str) -> Segment {
        Segment::new(path, class_label, parent_id)
    }

    #[test]
    fn groups_by_class_then_parent_with_sorted_paths() {
        let index = GroupingIndex::from_segments([
            seg("g/blues/blues.00001_2.wav", "blues", "blues.00001"),
            seg("g/jazz/jazz.00007_0.wav", "jazz", "jazz.00007"),
            seg("g/blues/blues.00001_0.wav", "blues", "blues.00001"),
            seg("g/blues/blues.00000_1.wav", "blues", "blues.00000"),
            seg("g/blues/blues.00001_1.wav", "blues", "blues.00001"),
        ])
        .unwrap();

        assert_eq!(
            index.class_labels().cloned().collect::<Vec<_>>(),
            vec!["blues", "jazz"]
        );
        assert_eq!(
            index.segments_for("blues", "blues.00001").unwrap(),
            &[
                "g/blues/blues.00001_0.wav".to_string(),
                "g/blues/blues.00001_1.wav".to_string(),
                "g/blues/blues.00001_2.wav".to_string(),
            ]
        );
        assert_eq!(index.class_count(), 2);
        assert_eq!(index.parent_count(), 3);
        assert_eq!(index.segment_count(), 5);
    }

    #[test]
    fn discovery_order_does_not_change_the_index() {
        let segments = vec![
            seg("a/2.wav", "a", "p1"),
            seg("a/1.wav", "a", "p1"),
            seg("b/3.wav", "b", "p2"),
        ];
        let mut reversed = segments.clone();
        reversed.reverse();
        assert_eq!(
            GroupingIndex::from_segments(segments).unwrap(),
            GroupingIndex::from_segments(reversed).unwrap()
        );
    }

    #[test]
    fn rejects_empty_fields() {
        let err = GroupingIndex::from_segments([seg("", "blues", "blues.1")]).unwrap_err();
        assert!(matches!(
            err,
            SplitError::Validation { ref class_label, ref details }
                if class_label == "blues" && details.contains("path is empty")
        ));

        let err = GroupingIndex::from_segments([seg("x.wav", "blues", " ")]).unwrap_err();
        assert!(matches!(
            err,
            SplitError::Validation { ref details, .. } if details.contains("parent_id is empty")
        ));

        let err = GroupingIndex::from_segments([seg("x.wav", "", "p")]).unwrap_err();
        assert!(matches!(
            err,
            SplitError::Validation { ref details, .. } if details.contains("class_label is empty")
        ));
    }

    #[test]
    fn rejects_parent_spanning_two_classes() {
        let err = GroupingIndex::from_segments([
            seg("blues/x_0.wav", "blues", "x"),
            seg("jazz/x_1.wav", "jazz", "x"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SplitError::Validation { ref class_label, ref details }
                if class_label == "jazz" && details.contains("class 'blues'")
        ));
    }

    #[test]
    fn rejects_duplicate_paths() {
        let err = GroupingIndex::from_segments([
            seg("blues/x_0.wav", "blues", "x"),
            seg("blues/x_0.wav", "blues", "x"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SplitError::Validation { ref details, .. } if details.contains("duplicate")
        ));
    }

    #[test]
    fn rejected_insert_leaves_builder_untouched() {
        let mut builder = GroupingIndex::builder();
        builder.insert(seg("p.wav", "blues", "x")).unwrap();
        assert!(builder.insert(seg("p.wav", "jazz", "y")).is_err());

        builder.insert(seg("q.wav", "blues", "y")).unwrap();
        let index = builder.build();
        assert!(index.parent_groups("jazz").is_none());
        assert_eq!(
            index.segments_for("blues", "y").unwrap(),
            &["q.wav".to_string()]
        );
    }

    #[test]
    fn declared_classes_survive_without_segments() {
        let mut builder = GroupingIndex::builder();
        builder.declare_class("classical").unwrap();
        builder.declare_class("rock").unwrap();
        builder.insert(seg("rock/r_0.wav", "rock", "r")).unwrap();
        let index = builder.build();

        assert_eq!(index.class_count(), 2);
        assert_eq!(index.empty_classes(), vec!["classical".to_string()]);

        let (trimmed, dropped) = index.without_empty_classes();
        assert_eq!(dropped, vec!["classical".to_string()]);
        assert_eq!(
            trimmed.class_labels().cloned().collect::<Vec<_>>(),
            vec!["rock"]
        );
    }

    #[test]
    fn declare_class_rejects_blank_label() {
        let mut builder = GroupingIndex::builder();
        assert!(matches!(
            builder.declare_class("  "),
            Err(SplitError::Validation { .. })
        ));
    }
}
