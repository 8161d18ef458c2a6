use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::constants::splits::ALL_SPLITS;
use crate::data::MetadataRecord;
use crate::errors::SplitError;
use crate::grouping::{GroupingIndex, ParentGroups};
use crate::hash::stable_hash_str;
use crate::splits::{SplitCounts, SplitLabel, SplitRatios, split_counts_for_total};
use crate::types::{ClassLabel, ParentId};

#[derive(Debug, Clone)]
/// Small deterministic RNG (SplitMix64) used for reproducible permutations.
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// Parent ids of one class, split into three contiguous runs of its permutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSplit {
    /// Class these runs belong to.
    pub class_label: ClassLabel,
    /// Leading run of the permutation.
    pub train: Vec<ParentId>,
    /// Middle run of the permutation.
    pub validation: Vec<ParentId>,
    /// Trailing run; absorbs the truncation remainder.
    pub test: Vec<ParentId>,
}

impl ClassSplit {
    /// Parent ids assigned to `label`, in permuted order.
    pub fn parents(&self, label: SplitLabel) -> &[ParentId] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// Parent-group counts per split.
    pub fn counts(&self) -> SplitCounts {
        SplitCounts {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }
}

/// Process-wide parent id -> split mapping, built from independent per-class splits.
#[derive(Clone, Debug, Default)]
pub struct PartitionAssignment {
    classes: BTreeMap<ClassLabel, ClassSplit>,
    labels: HashMap<ParentId, SplitLabel>,
}

impl PartitionAssignment {
    /// Split label of `parent_id`, if it was assigned.
    pub fn label_for(&self, parent_id: &str) -> Option<SplitLabel> {
        self.labels.get(parent_id).copied()
    }

    /// Per-class runs for `class_label`.
    pub fn class_split(&self, class_label: &str) -> Option<&ClassSplit> {
        self.classes.get(class_label)
    }

    /// All per-class runs in lexicographic class order.
    pub fn class_splits(&self) -> impl Iterator<Item = &ClassSplit> {
        self.classes.values()
    }

    /// Number of assigned parent ids.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no parent id was assigned.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn insert(&mut self, split: ClassSplit) {
        for label in ALL_SPLITS {
            for parent_id in split.parents(label) {
                self.labels.insert(parent_id.clone(), label);
            }
        }
        self.classes.insert(split.class_label.clone(), split);
    }
}

/// Canonical flattened output of one partitioning run.
///
/// Holds one record stream per split; every serializer projects these
/// slices directly rather than recomputing membership.
#[derive(Clone, Debug)]
pub struct PartitionedDataset {
    assignment: PartitionAssignment,
    train: Vec<MetadataRecord>,
    validation: Vec<MetadataRecord>,
    test: Vec<MetadataRecord>,
}

impl PartitionedDataset {
    /// Records of one split in canonical order.
    pub fn records(&self, label: SplitLabel) -> &[MetadataRecord] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// `(split, records)` pairs in train/validation/test order.
    pub fn splits(&self) -> impl Iterator<Item = (SplitLabel, &[MetadataRecord])> {
        ALL_SPLITS
            .into_iter()
            .map(move |label| (label, self.records(label)))
    }

    /// The parent-level assignment the records were flattened from.
    pub fn assignment(&self) -> &PartitionAssignment {
        &self.assignment
    }

    /// Segment counts per split.
    pub fn segment_counts(&self) -> SplitCounts {
        SplitCounts {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }
}

/// Per-class, leakage-free train/validation/test partitioner.
///
/// Every class is handled on its own: its parent ids are permuted with a
/// sub-seed derived from the global seed and the class label, sliced into
/// `floor(N * r_train)`, `floor(N * r_validation)`, and the remainder, and
/// every segment follows its parent. The result is a pure function of the
/// index, the ratios, and the seed.
#[derive(Clone, Copy, Debug)]
pub struct StratifiedPartitioner {
    ratios: SplitRatios,
    seed: u64,
}

impl StratifiedPartitioner {
    /// Validate `ratios` and create a partitioner.
    pub fn new(ratios: SplitRatios, seed: u64) -> Result<Self, SplitError> {
        let ratios = ratios.validated()?;
        Ok(Self { ratios, seed })
    }

    /// Configured ratios.
    pub fn ratios(&self) -> SplitRatios {
        self.ratios
    }

    /// Global seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle seed used for `class_label`.
    pub fn class_seed(&self, class_label: &str) -> u64 {
        stable_hash_str(self.seed, class_label)
    }

    /// Seeded permutation of `parents` for `class_label`.
    pub fn permute(&self, class_label: &str, parents: &[ParentId]) -> Vec<ParentId> {
        let mut permuted = parents.to_vec();
        let mut rng = DeterministicRng::new(self.class_seed(class_label));
        permuted.shuffle(&mut rng);
        permuted
    }

    /// Split one class's parent groups into three contiguous runs.
    pub fn split_class(
        &self,
        class_label: &str,
        groups: &ParentGroups,
    ) -> Result<ClassSplit, SplitError> {
        if groups.is_empty() {
            return Err(SplitError::EmptyDataset(format!(
                "class '{class_label}' has no parent groups"
            )));
        }
        let ordered: Vec<ParentId> = groups.keys().cloned().collect();
        let mut train = self.permute(class_label, &ordered);
        let counts = split_counts_for_total(train.len(), self.ratios);
        let test = train.split_off(counts.train + counts.validation);
        let validation = train.split_off(counts.train);
        debug!(
            class = class_label,
            parents = ordered.len(),
            train = train.len(),
            validation = validation.len(),
            test = test.len(),
            "split class parent groups"
        );
        Ok(ClassSplit {
            class_label: class_label.to_string(),
            train,
            validation,
            test,
        })
    }

    /// Assign every parent group of every class to a split.
    ///
    /// Fails without a partial result if the index has no classes or any
    /// class has no parent groups.
    pub fn assign(&self, index: &GroupingIndex) -> Result<PartitionAssignment, SplitError> {
        if index.is_empty() {
            return Err(SplitError::EmptyDataset(
                "no classes were found in the dataset".to_string(),
            ));
        }
        let mut assignment = PartitionAssignment::default();
        for (class_label, groups) in index.classes() {
            assignment.insert(self.split_class(class_label, groups)?);
        }
        Ok(assignment)
    }

    /// Assign parents and flatten the result into per-split record streams.
    ///
    /// Order within a split: classes lexicographically, then the class's
    /// parents in permuted order, then each parent's segments sorted by path.
    pub fn partition(&self, index: &GroupingIndex) -> Result<PartitionedDataset, SplitError> {
        let assignment = self.assign(index)?;
        let mut flattened: [Vec<MetadataRecord>; 3] = Default::default();
        for (slot, label) in flattened.iter_mut().zip(ALL_SPLITS) {
            for split in assignment.class_splits() {
                for parent_id in split.parents(label) {
                    let paths = index
                        .segments_for(&split.class_label, parent_id)
                        .unwrap_or_default();
                    slot.extend(paths.iter().map(|path| MetadataRecord {
                        path: path.clone(),
                        class_label: split.class_label.clone(),
                        parent_id: parent_id.clone(),
                        split: label,
                    }));
                }
            }
        }
        let [train, validation, test] = flattened;
        Ok(PartitionedDataset {
            assignment,
            train,
            validation,
            test,
        })
    }
}
