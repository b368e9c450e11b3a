//! Anonymization of a single file on disk.

use crate::{AnonymizationError, Anonymizer, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// What happened to a single input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was anonymized and written.
    Anonymized,
    /// The file is not DICOM and was skipped.
    NotDicom,
    /// The file looks like DICOM but could not be decoded, and was skipped.
    Malformed,
}

/// Anonymizes the DICOM file at `input` and writes the result to `output`.
///
/// Files that are not DICOM, or that are DICOM but cannot be decoded, are skipped
/// with a warning and nothing is written for them. I/O failures on either side are
/// returned as [`AnonymizationError::Io`].
///
/// The output is fully encoded in memory before the destination is touched, so a
/// failed run never leaves a partially written file behind. Missing parent
/// directories of `output` are created.
pub fn anonymize_file(anonymizer: &Anonymizer, input: &Path, output: &Path) -> Result<FileOutcome> {
    let bytes = fs::read(input)?;

    let result = match anonymizer.anonymize(bytes.as_slice()) {
        Ok(result) => result,
        Err(AnonymizationError::NotDicom(reason)) => {
            warn!("skipping non-DICOM file {}: {}", input.display(), reason);
            return Ok(FileOutcome::NotDicom);
        }
        Err(AnonymizationError::Malformed(reason)) => {
            warn!("skipping malformed DICOM file {}: {}", input.display(), reason);
            return Ok(FileOutcome::Malformed);
        }
        Err(err) => return Err(err),
    };

    let mut encoded = Vec::new();
    result.write(&mut encoded)?;

    if let Some(parent_dir) = output.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    fs::write(output, encoded)?;

    info!("anonymized '{}' -> '{}'", input.display(), output.display());
    Ok(FileOutcome::Anonymized)
}

/// Same as [`anonymize_file`], returning `Ok(true)` when the file was anonymized
/// and `Ok(false)` when it was skipped.
pub fn process_file(anonymizer: &Anonymizer, input: &Path, output: &Path) -> Result<bool> {
    Ok(anonymize_file(anonymizer, input, output)? == FileOutcome::Anonymized)
}
