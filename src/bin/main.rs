use anyhow::{bail, Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use dicom_core::Tag;
use dicom_scrub::batch::{self, BatchSummary};
use dicom_scrub::catalog::{self, TagCategory};
use dicom_scrub::config::{Config, ConfigBuilder, UidRoot};
use dicom_scrub::pipeline::process_file;
use dicom_scrub::Anonymizer;
use env_logger::Builder;
use log::{warn, Level, LevelFilter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone)]
struct TagValueParser;

impl TypedValueParser for TagValueParser {
    type Value = Tag;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let s = value.to_str().ok_or_else(|| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidUtf8,
                "invalid exclude tag(s)",
            )
        })?;

        Tag::from_str(s).map_err(|_e| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                format!("{s} is not a valid tag"),
            )
        })
    }
}

/// De-identify DICOM files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file or directory
    #[arg(short, long, value_name = "INPUT_PATH", required_unless_present = "list_tags")]
    input: Option<PathBuf>,

    /// Output file or directory (default: 'anonymized' next to or inside the input)
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: Option<PathBuf>,

    /// JSON configuration file with 'uid_root' and 'selection'
    #[arg(long, value_name = "CONFIG_FILE", env = "DCMSCRUB_CONFIG")]
    config: Option<PathBuf>,

    /// UID root (default: '9999')
    #[arg(short, long)]
    uid_root: Option<String>,

    /// Only anonymize tags of these categories: patient, physician, study, equipment, uids
    #[arg(long, value_name = "CATEGORY", value_delimiter = ',')]
    category: Vec<TagCategory>,

    /// Tags to exclude from anonymization, e.g. "00100020,00080050"
    #[arg(long, value_name = "TAGS", value_delimiter = ',', value_parser = TagValueParser)]
    exclude: Vec<Tag>,

    /// Recursively look for files in input directory (by default only its direct children)
    #[arg(short, long)]
    recursive: bool,

    /// List the tags that can be anonymized and exit
    #[arg(long)]
    list_tags: bool,

    /// Show more verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let log_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();
}

fn print_catalog() {
    for category in TagCategory::ALL {
        println!("{} [{}]", category, category.keyword());
        for tag in catalog::tags_in(category) {
            println!("  {}", catalog::describe(tag));
        }
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    let mut config_builder = ConfigBuilder::from_config(base);

    if let Some(uid_root) = &args.uid_root {
        match uid_root.parse::<UidRoot>() {
            Ok(uid_root) => config_builder = config_builder.uid_root(uid_root),
            Err(e) => bail!(e),
        }
    }

    if !args.category.is_empty() {
        config_builder = config_builder.categories(args.category.iter().copied());
    }

    for tag in &args.exclude {
        config_builder = config_builder.deselect(*tag);
    }

    Ok(config_builder.build())
}

fn default_output_file(input_path: &Path) -> PathBuf {
    let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = input_path.file_name().unwrap_or_default();
    batch::default_output_root(parent).join(file_name)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    if args.list_tags {
        print_catalog();
        return Ok(());
    }

    let Some(input_path) = args.input.clone() else {
        bail!("an input file or directory is required");
    };

    let config = build_config(&args)?;
    if config.get_selection().is_empty() {
        warn!("no tags selected, only private tags will be removed");
    }
    let anonymizer = Anonymizer::from_config(config);

    // Input is a file
    if input_path.is_file() {
        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_file(&input_path));
        let anonymized = process_file(&anonymizer, &input_path, &output_path)
            .with_context(|| format!("failed to anonymize {}", input_path.display()))?;
        if !anonymized {
            bail!("{} is not a DICOM file", input_path.display());
        }
        println!("Anonymized file saved to: {}", output_path.display());
        return Ok(());
    }

    // Input is a directory
    if input_path.is_dir() {
        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| batch::default_output_root(&input_path));

        let summary: BatchSummary =
            batch::anonymize_dir(&anonymizer, &input_path, &output_path, args.recursive)
                .with_context(|| format!("failed to create {}", output_path.display()))?;

        println!(
            "{} of {} files anonymized ({} skipped, {} malformed, {} failed), saved to: {}",
            summary.anonymized,
            summary.attempted,
            summary.skipped,
            summary.malformed,
            summary.failed,
            output_path.display()
        );
        return Ok(());
    }

    bail!("Input should either be a file or a directory");
}
