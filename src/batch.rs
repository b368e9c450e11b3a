//! Anonymization of a whole directory tree.

use crate::pipeline::{anonymize_file, FileOutcome};
use crate::{Anonymizer, Result};
use log::error;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the output directory created inside the input directory when no
/// output directory is given.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "anonymized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files found in the input tree.
    pub attempted: usize,
    /// Files anonymized and written to the output tree.
    pub anonymized: usize,
    /// Files skipped because they are not DICOM.
    pub skipped: usize,
    /// Files skipped because they are DICOM but could not be decoded.
    pub malformed: usize,
    /// Files that could not be read or written.
    pub failed: usize,
}

pub fn default_output_root(input_root: &Path) -> PathBuf {
    input_root.join(DEFAULT_OUTPUT_DIR_NAME)
}

/// Lists the files below `input_root`, leaving out everything inside `output_root`
/// so earlier output never gets anonymized again.
pub fn collect_input_files(input_root: &Path, output_root: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walk_dir = WalkDir::new(input_root).sort_by_file_name();
    if !recursive {
        walk_dir = walk_dir.max_depth(1);
    }

    walk_dir
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(output_root))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Mirrors the location of `file` relative to `input_root` below `output_root`.
pub fn output_path_for(input_root: &Path, output_root: &Path, file: &Path) -> Option<PathBuf> {
    file.strip_prefix(input_root)
        .ok()
        .map(|relative| output_root.join(relative))
}

/// Anonymizes every file below `input_root` into `output_root`, in parallel.
///
/// Per-file problems are logged and counted but never stop the batch. Only a
/// failure to create `output_root` itself is returned as an error.
pub fn anonymize_dir(
    anonymizer: &Anonymizer,
    input_root: &Path,
    output_root: &Path,
    recursive: bool,
) -> Result<BatchSummary> {
    fs::create_dir_all(output_root)?;

    let input_root = input_root.canonicalize()?;
    let output_root = output_root.canonicalize()?;

    let files = collect_input_files(&input_root, &output_root, recursive);

    let outcomes: Vec<Option<FileOutcome>> = files
        .par_iter()
        .map(|file| {
            let Some(output_file) = output_path_for(&input_root, &output_root, file) else {
                error!("{} is not inside {}", file.display(), input_root.display());
                return None;
            };

            anonymize_file(anonymizer, file, &output_file)
                .map_err(|err| error!("failed to anonymize {}: {}", file.display(), err))
                .ok()
        })
        .collect();

    let mut summary = BatchSummary {
        attempted: files.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Some(FileOutcome::Anonymized) => summary.anonymized += 1,
            Some(FileOutcome::NotDicom) => summary.skipped += 1,
            Some(FileOutcome::Malformed) => summary.malformed += 1,
            None => summary.failed += 1,
        }
    }

    Ok(summary)
}
