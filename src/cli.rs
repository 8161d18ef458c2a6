use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum, error::ErrorKind};

use crate::config::{EmptyClassPolicy, MetadataConfig};
use crate::constants::ingestion::{DEFAULT_AUDIO_EXTENSION, DEFAULT_DATASET_ROOT};
use crate::constants::output::{DEFAULT_JSON_ENVELOPE, DEFAULT_OUTPUT_DIR};
use crate::constants::splits::{ALL_SPLITS, DEFAULT_SEED};
use crate::ingestion::ParentIdRule;
use crate::pipeline::{RunReport, generate_metadata};
use crate::splits::SplitRatios;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ParentIdRuleArg {
    SegmentSuffix,
    DottedPrefix,
}

impl From<ParentIdRuleArg> for ParentIdRule {
    fn from(value: ParentIdRuleArg) -> Self {
        match value {
            ParentIdRuleArg::SegmentSuffix => ParentIdRule::SegmentSuffix,
            ParentIdRuleArg::DottedPrefix => ParentIdRule::DottedPrefix,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "segment-splits",
    disable_help_subcommand = true,
    about = "Generate leak-free train/val/test metadata for segmented audio",
    long_about = "Group audio segments by parent recording, split parents per class with a seeded shuffle, and write CSV and JSON metadata for each partition.",
    after_help = "The dataset root must contain one sub-directory per class. Set RUST_LOG=debug for per-class split sizes."
)]
struct GenerateMetadataCli {
    #[arg(
        long = "dataset-root",
        value_name = "DIR",
        default_value = DEFAULT_DATASET_ROOT,
        help = "Directory holding one sub-directory of audio segments per class"
    )]
    dataset_root: PathBuf,
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory the metadata files are written to"
    )]
    output_dir: PathBuf,
    #[arg(
        long = "split-ratios",
        value_name = "TRAIN,VALIDATION,TEST",
        value_parser = parse_split_ratios_arg,
        default_value = "0.8,0.1,0.1",
        help = "Comma-separated non-negative ratios; train + validation must not exceed 1.0"
    )]
    split: SplitRatios,
    #[arg(
        long,
        default_value_t = DEFAULT_SEED,
        help = "Deterministic seed used for per-class shuffles"
    )]
    seed: u64,
    #[arg(
        long = "parent-id-rule",
        value_enum,
        default_value = "segment-suffix",
        help = "How a segment file name maps to its parent recording"
    )]
    parent_id_rule: ParentIdRuleArg,
    #[arg(
        long = "extension",
        value_name = "EXT",
        default_value = DEFAULT_AUDIO_EXTENSION,
        help = "Audio file extension to collect (case-insensitive)"
    )]
    extension: String,
    #[arg(
        long = "json-envelope",
        value_name = "NAME",
        default_value = DEFAULT_JSON_ENVELOPE,
        help = "Named field wrapping the JSON record array"
    )]
    json_envelope: String,
    #[arg(
        long = "no-json-envelope",
        action = ArgAction::SetTrue,
        conflicts_with = "json_envelope",
        help = "Write each JSON file as a bare array"
    )]
    no_json_envelope: bool,
    #[arg(
        long = "json-parent-key",
        value_name = "KEY",
        help = "Also write the parent recording id under this JSON key"
    )]
    json_parent_key: Option<String>,
    #[arg(
        long = "file-suffix",
        value_name = "SUFFIX",
        help = "Suffix appended to every output file stem, e.g. _30s"
    )]
    file_suffix: Option<String>,
    #[arg(
        long = "skip-empty-classes",
        help = "Drop class directories without segments instead of failing"
    )]
    skip_empty_classes: bool,
    #[arg(
        long = "no-follow-links",
        help = "Skip symlinked class directories and segment files instead of following them"
    )]
    no_follow_links: bool,
    #[arg(
        long = "report-json",
        help = "Print the run report as JSON instead of the text summary"
    )]
    report_json: bool,
}

impl GenerateMetadataCli {
    fn into_config(self) -> MetadataConfig {
        let mut config = MetadataConfig {
            dataset_root: self.dataset_root,
            output_dir: self.output_dir,
            split: self.split,
            seed: self.seed,
            parent_id_rule: self.parent_id_rule.into(),
            audio_extension: self.extension,
            follow_links: !self.no_follow_links,
            file_suffix: self.file_suffix,
            ..MetadataConfig::default()
        };
        if self.skip_empty_classes {
            config.empty_classes = EmptyClassPolicy::Skip;
        }
        config.structured.envelope = if self.no_json_envelope {
            None
        } else {
            Some(self.json_envelope)
        };
        config.structured.parent_key = self.json_parent_key;
        config
    }
}

/// Parse `args` (without the program name), run the pipeline, and print a summary.
pub fn run_generate_metadata<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<GenerateMetadataCli, _>(
        std::iter::once("segment-splits".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let report_json = cli.report_json;
    let config = cli.into_config();
    if report_json {
        let report = generate_metadata(&config)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("Scanning {}", config.dataset_root.display());
    let report = generate_metadata(&config)?;
    print_report(&report);
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_split_ratios_arg(raw: &str) -> Result<SplitRatios, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err(
            "--split-ratios expects exactly 3 comma-separated values".to_string(),
        );
    }
    let train = parts[0].trim().parse::<f64>().map_err(|_| {
        format!(
            "invalid train ratio '{}': must be a float",
            parts[0].trim()
        )
    })?;
    let validation = parts[1].trim().parse::<f64>().map_err(|_| {
        format!(
            "invalid validation ratio '{}': must be a float",
            parts[1].trim()
        )
    })?;
    let test = parts[2].trim().parse::<f64>().map_err(|_| {
        format!(
            "invalid test ratio '{}': must be a float",
            parts[2].trim()
        )
    })?;
    SplitRatios::new(train, validation, test)
        .validated()
        .map_err(|err| err.to_string())
}

fn print_report(report: &RunReport) {
    println!("=== split summary (seed {}) ===", report.seed);
    for stats in &report.summary.classes {
        println!(
            "{:<12} parents {:>4}/{:>4}/{:>4}  segments {:>5}/{:>5}/{:>5}",
            stats.class_label,
            stats.parents.train,
            stats.parents.validation,
            stats.parents.test,
            stats.segments.train,
            stats.segments.validation,
            stats.segments.test,
        );
    }
    for class_label in &report.skipped_classes {
        println!("skipped empty class: {class_label}");
    }
    for label in ALL_SPLITS {
        println!(
            "{:<10}: {} segments from {} recordings",
            label.as_str(),
            report.summary.segments.get(label),
            report.summary.parents.get(label)
        );
    }
    for path in &report.written {
        println!("wrote {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GenerateMetadataCli {
        GenerateMetadataCli::try_parse_from(
            std::iter::once("segment-splits").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn split_ratio_parser_accepts_defaults_and_rejects_overflow() {
        assert_eq!(
            parse_split_ratios_arg("0.8, 0.1, 0.1").unwrap(),
            SplitRatios::new(0.8, 0.1, 0.1)
        );
        assert!(
            parse_split_ratios_arg("0.9,0.2,0.0")
                .unwrap_err()
                .contains("must not exceed 1.0")
        );
        assert!(parse_split_ratios_arg("0.8,0.2").is_err());
        let err = parse_split_ratios_arg("a,0.1,0.1").unwrap_err();
        assert!(err.contains("train"));
    }

    #[test]
    fn defaults_map_to_default_config() {
        let config = parse(&[]).into_config();
        let defaults = MetadataConfig::default();
        assert_eq!(config.dataset_root, defaults.dataset_root);
        assert_eq!(config.output_dir, defaults.output_dir);
        assert_eq!(config.split, defaults.split);
        assert_eq!(config.seed, defaults.seed);
        assert_eq!(config.parent_id_rule, defaults.parent_id_rule);
        assert_eq!(config.structured, defaults.structured);
        assert_eq!(config.empty_classes, EmptyClassPolicy::Abort);
        assert!(config.follow_links);
    }

    #[test]
    fn flags_override_layout_and_policy() {
        let cli = parse(&[
            "--no-json-envelope",
            "--json-parent-key",
            "song_id",
            "--parent-id-rule",
            "dotted-prefix",
            "--skip-empty-classes",
            "--file-suffix",
            "_30s",
            "--seed",
            "7",
            "--no-follow-links",
            "--report-json",
        ]);
        assert!(cli.report_json);
        let config = cli.into_config();
        assert_eq!(config.structured.envelope, None);
        assert_eq!(config.structured.parent_key.as_deref(), Some("song_id"));
        assert_eq!(config.parent_id_rule, ParentIdRule::DottedPrefix);
        assert_eq!(config.empty_classes, EmptyClassPolicy::Skip);
        assert_eq!(config.file_suffix.as_deref(), Some("_30s"));
        assert_eq!(config.seed, 7);
        assert!(!config.follow_links);
    }

    #[test]
    fn envelope_flags_conflict() {
        let err = GenerateMetadataCli::try_parse_from([
            "segment-splits",
            "--json-envelope",
            "items",
            "--no-json-envelope",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }
}
