use crate::splits::SplitLabel;
use crate::types::{ClassLabel, ParentId, SegmentPath};

/// One derived audio sample as handed over by the ingestion layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Forward-slash path to the segment file; unique within a dataset.
    pub path: SegmentPath,
    /// Class the segment is labeled with.
    pub class_label: ClassLabel,
    /// Recording the segment was cut from.
    pub parent_id: ParentId,
}

impl Segment {
    /// Build a segment from its three identifying fields.
    pub fn new(
        path: impl Into<SegmentPath>,
        class_label: impl Into<ClassLabel>,
        parent_id: impl Into<ParentId>,
    ) -> Self {
        Self {
            path: path.into(),
            class_label: class_label.into(),
            parent_id: parent_id.into(),
        }
    }
}

/// Flattened output row: one segment tagged with the partition of its parent.
///
/// Both serializers project the same `MetadataRecord` slice, so the tabular and
/// structured files can never disagree on membership or order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataRecord {
    /// Segment file path.
    pub path: SegmentPath,
    /// Class label of the segment.
    pub class_label: ClassLabel,
    /// Parent recording id.
    pub parent_id: ParentId,
    /// Partition the parent recording was assigned to.
    pub split: SplitLabel,
}
