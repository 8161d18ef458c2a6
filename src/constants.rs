use crate::splits::SplitLabel;

/// Constants used by split ratio handling and seeded shuffling.
pub mod splits {
    use super::SplitLabel;

    /// Default process-wide shuffle seed.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default fraction of parent recordings assigned to train.
    pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;
    /// Default fraction of parent recordings assigned to validation.
    pub const DEFAULT_VALIDATION_RATIO: f64 = 0.1;
    /// Default nominal fraction for test (test always absorbs the remainder).
    pub const DEFAULT_TEST_RATIO: f64 = 0.1;
    /// Slack allowed when checking `train + validation <= 1.0`.
    pub const RATIO_SUM_TOLERANCE: f64 = 1e-9;
    /// Difference between the nominal test ratio and the remainder that triggers a warning.
    pub const TEST_REMAINDER_WARN_EPSILON: f64 = 1e-6;
    /// Canonical split iteration order for assignment, flattening, and output.
    pub const ALL_SPLITS: [SplitLabel; 3] =
        [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
}

/// Constants used by the dataset directory scanner.
pub mod ingestion {
    /// Default dataset root holding one sub-directory per class.
    pub const DEFAULT_DATASET_ROOT: &str = "./data/gtzan_10s";
    /// Default audio file extension (matched case-insensitively).
    pub const DEFAULT_AUDIO_EXTENSION: &str = "wav";
    /// Symlinked class directories and segment files are traversed by default.
    pub const DEFAULT_FOLLOW_LINKS: bool = true;
    /// Separator between the parent id and the segment index (`blues.00024_1`).
    pub const SEGMENT_SUFFIX_SEPARATOR: char = '_';
    /// Separator between the class prefix and the track number (`blues.00024`).
    pub const DOTTED_PREFIX_SEPARATOR: char = '.';
    /// Number of leading dotted components kept by the dotted-prefix rule.
    pub const DOTTED_PREFIX_COMPONENTS: usize = 2;
}

/// Constants used by the tabular and structured serializers.
pub mod output {
    /// Default output directory for generated metadata files.
    pub const DEFAULT_OUTPUT_DIR: &str = "metadata";
    /// Default tabular header for the segment path column.
    pub const DEFAULT_PATH_COLUMN: &str = "filepath";
    /// Default tabular header for the class label column.
    pub const DEFAULT_LABEL_COLUMN: &str = "label";
    /// Default tabular header for the parent recording column.
    pub const DEFAULT_PARENT_COLUMN: &str = "song_id";
    /// Default structured key for the segment path.
    pub const DEFAULT_PATH_KEY: &str = "wav";
    /// Default structured key for the class label.
    pub const DEFAULT_LABEL_KEY: &str = "labels";
    /// Default named field wrapping the structured record array.
    pub const DEFAULT_JSON_ENVELOPE: &str = "data";
    /// Extension of tabular output files.
    pub const TABULAR_EXTENSION: &str = "csv";
    /// Extension of structured output files.
    pub const STRUCTURED_EXTENSION: &str = "json";
    /// File stem used for the train partition.
    pub const TRAIN_FILE_STEM: &str = "train";
    /// File stem used for the validation partition.
    pub const VALIDATION_FILE_STEM: &str = "val";
    /// File stem used for the test partition.
    pub const TEST_FILE_STEM: &str = "test";
    /// Suffix of the sibling file each output is staged in before the final rename.
    pub const STAGING_SUFFIX: &str = ".tmp";
}

/// Constants used by stable hashing.
pub mod hash {
    /// FNV-1a 64-bit offset basis.
    pub const FNV1A64_OFFSET: u64 = 0xcbf29ce484222325;
    /// FNV-1a 64-bit prime.
    pub const FNV1A64_PRIME: u64 = 0x100000001b3;
}
