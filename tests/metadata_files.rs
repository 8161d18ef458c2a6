use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use segment_splits::{
    EmptyClassPolicy, MetadataConfig, ParentIdRule, SplitError, SplitRatios, generate_metadata,
};
use serde_json::Value;
use tempfile::tempdir;

const SPLIT_STEMS: [&str; 3] = ["train", "val", "test"];

fn write_dataset(root: &Path, classes: &[(&str, usize, usize)]) {
    for (class_label, parents, per_parent) in classes {
        let dir = root.join(class_label);
        fs::create_dir_all(&dir).unwrap();
        for parent in 0..*parents {
            for seg in 0..*per_parent {
                let name = format!("{class_label}.{parent:05}_{seg}.wav");
                fs::write(dir.join(name), b"RIFF").unwrap();
            }
        }
    }
}

fn config_for(root: &Path, output: &Path) -> MetadataConfig {
    MetadataConfig {
        dataset_root: root.to_path_buf(),
        output_dir: output.to_path_buf(),
        ..MetadataConfig::default()
    }
}

type Triple = (String, String, String);

fn csv_triples(path: &Path, split: &str) -> Vec<Triple> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["filepath", "label", "song_id"]
    );
    reader
        .records()
        .map(|row| {
            let row = row.unwrap();
            (row[0].to_string(), row[1].to_string(), split.to_string())
        })
        .collect()
}

fn json_triples(path: &Path, split: &str) -> Vec<Triple> {
    let value: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    value["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| {
            (
                entry["wav"].as_str().unwrap().to_string(),
                entry["labels"].as_str().unwrap().to_string(),
                split.to_string(),
            )
        })
        .collect()
}

#[test]
fn writes_six_consistent_files() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(
        data.path(),
        &[("blues", 20, 3), ("hiphop", 10, 3), ("reggae", 3, 2)],
    );

    let report = generate_metadata(&config_for(data.path(), out.path())).unwrap();
    assert_eq!(report.written.len(), 6);
    assert!(report.skipped_classes.is_empty());
    assert_eq!(report.summary.segments.total(), 20 * 3 + 10 * 3 + 3 * 2);

    for stem in SPLIT_STEMS {
        let csv_rows = csv_triples(&out.path().join(format!("{stem}.csv")), stem);
        let json_rows = json_triples(&out.path().join(format!("{stem}.json")), stem);
        // Same records in the same order.
        assert_eq!(csv_rows, json_rows);
    }
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 6);
}

#[test]
fn run_report_serializes_for_json_output() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(data.path(), &[("blues", 10, 2)]);
    let mut config = config_for(data.path(), out.path());
    config.seed = 9;

    let report = generate_metadata(&config).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["seed"], 9);
    assert_eq!(value["split"]["train"], 0.8);
    assert_eq!(value["summary"]["parents"]["train"], 8);
    assert_eq!(value["summary"]["segments"]["test"], 2);
    assert_eq!(value["written"].as_array().unwrap().len(), 6);
}

#[test]
fn cross_format_triples_match_and_no_recording_leaks() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(data.path(), &[("jazz", 31, 4), ("pop", 9, 1)]);
    let mut config = config_for(data.path(), out.path());
    config.structured.parent_key = Some("song_id".into());
    generate_metadata(&config).unwrap();

    let mut from_csv = BTreeSet::new();
    let mut from_json = BTreeSet::new();
    let mut recordings_per_split: Vec<BTreeSet<String>> = Vec::new();
    for stem in SPLIT_STEMS {
        let csv_path = out.path().join(format!("{stem}.csv"));
        let mut reader = csv::Reader::from_path(csv_path).unwrap();
        let mut recordings = BTreeSet::new();
        for row in reader.records() {
            let row = row.unwrap();
            from_csv.insert((row[0].to_string(), row[1].to_string(), stem));
            recordings.insert(row[2].to_string());
        }
        recordings_per_split.push(recordings);

        let bytes = fs::read(out.path().join(format!("{stem}.json"))).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        for entry in value["data"].as_array().unwrap() {
            from_json.insert((
                entry["wav"].as_str().unwrap().to_string(),
                entry["labels"].as_str().unwrap().to_string(),
                stem,
            ));
            let song_id = entry["song_id"].as_str().unwrap();
            assert!(recordings_per_split.last().unwrap().contains(song_id));
        }
    }
    assert_eq!(from_csv, from_json);
    assert_eq!(from_csv.len(), 31 * 4 + 9);
    for (i, left) in recordings_per_split.iter().enumerate() {
        for right in &recordings_per_split[i + 1..] {
            assert!(left.is_disjoint(right));
        }
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let data = tempdir().unwrap();
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_dataset(data.path(), &[("metal", 25, 3), ("rock", 12, 2)]);

    let a = generate_metadata(&config_for(data.path(), first.path())).unwrap();
    let b = generate_metadata(&config_for(data.path(), second.path())).unwrap();
    assert_eq!(a.summary, b.summary);
    for (left, right) in a.written.iter().zip(&b.written) {
        assert_eq!(left.file_name(), right.file_name());
        assert_eq!(fs::read(left).unwrap(), fs::read(right).unwrap());
    }
}

#[test]
fn empty_class_aborts_before_writing_anything() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(data.path(), &[("blues", 5, 2)]);
    fs::create_dir_all(data.path().join("classical")).unwrap();
    let output_dir = out.path().join("metadata");

    let err = generate_metadata(&config_for(data.path(), &output_dir)).unwrap_err();
    assert!(matches!(
        err,
        SplitError::EmptyDataset(ref msg) if msg.contains("classical")
    ));
    assert!(!output_dir.exists());
}

#[test]
fn invalid_ratios_abort_before_scanning() {
    let out = tempdir().unwrap();
    let mut config = config_for(&out.path().join("missing"), &out.path().join("metadata"));
    config.split = SplitRatios::new(0.9, 0.2, 0.0);
    let err = generate_metadata(&config).unwrap_err();
    assert!(matches!(
        err,
        SplitError::Configuration(ref msg) if msg.contains("1.0")
    ));
    assert!(!out.path().join("metadata").exists());
}

#[test]
fn skip_policy_drops_empty_classes() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(data.path(), &[("blues", 5, 2)]);
    fs::create_dir_all(data.path().join("classical")).unwrap();

    let mut config = config_for(data.path(), out.path());
    config.empty_classes = EmptyClassPolicy::Skip;
    let report = generate_metadata(&config).unwrap();
    assert_eq!(report.skipped_classes, vec!["classical".to_string()]);
    assert_eq!(report.summary.classes.len(), 1);
}

#[test]
fn skip_policy_still_fails_when_nothing_remains() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::create_dir_all(data.path().join("classical")).unwrap();
    let mut config = config_for(data.path(), out.path());
    config.empty_classes = EmptyClassPolicy::Skip;
    let err = generate_metadata(&config).unwrap_err();
    assert!(matches!(err, SplitError::EmptyDataset(_)));
}

#[test]
fn dotted_prefix_rule_with_suffix_and_bare_json() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let dir = data.path().join("disco");
    fs::create_dir_all(&dir).unwrap();
    for track in 0..10 {
        fs::write(dir.join(format!("disco.{track:05}.wav")), b"RIFF").unwrap();
    }

    let mut config = config_for(data.path(), out.path());
    config.parent_id_rule = ParentIdRule::DottedPrefix;
    config.file_suffix = Some("_30s".into());
    config.structured.envelope = None;
    let report = generate_metadata(&config).unwrap();
    assert_eq!(report.summary.parents.total(), 10);

    let names: BTreeSet<String> = report
        .written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains("train_30s.csv"));
    assert!(names.contains("val_30s.json"));

    let bytes = fs::read(out.path().join("train_30s.json")).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 8);
}

#[test]
fn csv_paths_use_forward_slashes_under_root() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_dataset(data.path(), &[("country", 4, 1)]);
    generate_metadata(&config_for(data.path(), out.path())).unwrap();
    let rows = csv_triples(&out.path().join("test.csv"), "test");
    assert!(!rows.is_empty());
    for (path, label, _) in rows {
        assert_eq!(label, "country");
        assert!(!path.contains('\\'));
        assert!(path.contains("/country/country."));
    }
}
