//! De-identification of DICOM files.
//!
//! A configurable selection of identifying tags gets its values rewritten based on
//! the value representation (VR) of each element, private tags are removed, and the
//! Media Storage SOP Instance UID in the file meta group is kept equal to the
//! SOP Instance UID of the data set.
//!
//! Only top-level data elements are processed. Elements nested inside sequences are
//! left untouched, and pixel data is never inspected for burned-in annotations.
//!
//! # Example
//!
//! ```no_run
//! use dicom_scrub::config::ConfigBuilder;
//! use dicom_scrub::processor::DefaultProcessor;
//! use dicom_scrub::Anonymizer;
//! use std::fs::File;
//!
//! let config = ConfigBuilder::new().build();
//! let anonymizer = Anonymizer::new(DefaultProcessor::new(config));
//!
//! let input = File::open("input.dcm").unwrap();
//! let result = anonymizer.anonymize(input).unwrap();
//!
//! let output = File::create("output.dcm").unwrap();
//! result.write(output).unwrap();
//! ```

pub mod batch;
pub mod catalog;
pub mod config;
pub mod hashing;
pub mod pipeline;
pub mod policy;
pub mod processor;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod uid;

pub use dicom_core::Tag;
pub use dicom_dictionary_std::tags;

use crate::config::Config;
use crate::processor::{DefaultProcessor, Processor};
use dicom_core::header::Header;
use dicom_object::file::ReadPreamble;
use dicom_object::mem::InMemElement;
use dicom_object::{DefaultDicomObject, OpenFileOptions, ReadError};
use log::{debug, warn};
use std::borrow::Cow;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnonymizationError {
    /// The input is not a DICOM file at all.
    #[error("Not a DICOM file: {}", .0.to_lowercase())]
    NotDicom(String),

    /// The input has a DICOM file header, but its content could not be decoded.
    #[error("Malformed DICOM file: {}", .0.to_lowercase())]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    ProcessingError(String),

    #[error("Write error: {}", .0.to_lowercase())]
    WriteError(String),
}

impl From<processor::Error> for AnonymizationError {
    fn from(err: processor::Error) -> Self {
        AnonymizationError::ProcessingError(format!("{err}"))
    }
}

pub type Result<T, E = AnonymizationError> = std::result::Result<T, E>;

/// Tags with odd group numbers are private tags.
pub fn is_private_tag(tag: &Tag) -> bool {
    tag.group() % 2 != 0
}

/// Counts of what happened to a single object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymizationSummary {
    /// Selected elements whose value was replaced.
    pub rewritten: usize,
    /// Selected elements that were removed because their VR cannot hold an empty value.
    pub deleted: usize,
    /// Private elements that were removed.
    pub private_removed: usize,
    /// Whether the Media Storage SOP Instance UID was set to the SOP Instance UID.
    pub meta_uid_synchronized: bool,
}

#[derive(Debug, Clone)]
pub struct AnonymizationResult {
    pub anonymized: DefaultDicomObject,
    pub summary: AnonymizationSummary,
}

impl AnonymizationResult {
    /// Encodes the anonymized object as a DICOM file, keeping its transfer syntax.
    pub fn write<W: Write>(&self, to: W) -> Result<()> {
        self.anonymized
            .write_all(to)
            .map_err(|err| AnonymizationError::WriteError(format!("{err}")))
    }
}

enum Change {
    Put(InMemElement),
    Remove(Tag),
}

/// Runs a [`Processor`] over every top-level element of a DICOM object.
pub struct Anonymizer {
    processor: Box<dyn Processor + Send + Sync>,
}

impl Anonymizer {
    pub fn new<T>(processor: T) -> Self
    where
        T: Processor + Send + Sync + 'static,
    {
        Self {
            processor: Box::new(processor),
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::new(DefaultProcessor::new(config))
    }

    /// Decodes a DICOM file from `src` and anonymizes it.
    ///
    /// The 128 byte preamble is optional. Input without the `DICM` magic or with an
    /// unreadable file meta group results in [`AnonymizationError::NotDicom`]. Input
    /// that fails to decode after a valid file meta group results in
    /// [`AnonymizationError::Malformed`].
    pub fn anonymize(&self, mut src: impl Read) -> Result<AnonymizationResult> {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes)?;

        let obj = OpenFileOptions::new()
            .read_preamble(ReadPreamble::Auto)
            .from_reader(bytes.as_slice())
            .map_err(|err| classify_read_error(&bytes, err))?;

        self.anonymize_object(obj)
    }

    /// Anonymizes an already decoded DICOM object.
    ///
    /// 1. every top-level element is passed to the processor, which may keep,
    ///    rewrite or remove it
    /// 2. all private elements are removed, whether selected or not
    /// 3. the Media Storage SOP Instance UID of the file meta group is set to the
    ///    (possibly regenerated) SOP Instance UID of the data set
    pub fn anonymize_object(&self, mut obj: DefaultDicomObject) -> Result<AnonymizationResult> {
        let mut summary = AnonymizationSummary::default();

        let mut changes = Vec::new();
        for elem in obj.iter() {
            match self.processor.process_element(elem)? {
                Some(Cow::Borrowed(_)) => {}
                Some(Cow::Owned(new_elem)) => changes.push(Change::Put(new_elem)),
                None => changes.push(Change::Remove(elem.tag())),
            }
        }

        for change in changes {
            match change {
                Change::Put(new_elem) => {
                    obj.put(new_elem);
                    summary.rewritten += 1;
                }
                Change::Remove(tag) => {
                    if obj.remove_element(tag) {
                        summary.deleted += 1;
                    }
                }
            }
        }

        summary.private_removed = remove_private_tags(&mut obj);
        summary.meta_uid_synchronized = sync_media_storage_sop_instance_uid(&mut obj);

        debug!("{:?}", summary);

        Ok(AnonymizationResult {
            anonymized: obj,
            summary,
        })
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new(DefaultProcessor::default())
    }
}

const DICOM_MAGIC: &[u8] = b"DICM";
const PREAMBLE_LENGTH: usize = 128;

fn has_dicom_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(DICOM_MAGIC)
        || bytes.get(PREAMBLE_LENGTH..PREAMBLE_LENGTH + DICOM_MAGIC.len()) == Some(DICOM_MAGIC)
}

fn classify_read_error(bytes: &[u8], err: ReadError) -> AnonymizationError {
    match err {
        _ if !has_dicom_magic(bytes) => AnonymizationError::NotDicom(format!("{err}")),
        ReadError::ParseMetaDataSet { .. } => AnonymizationError::NotDicom(format!("{err}")),
        _ => AnonymizationError::Malformed(format!("{err}")),
    }
}

fn remove_private_tags(obj: &mut DefaultDicomObject) -> usize {
    let private_tags: Vec<Tag> = obj
        .iter()
        .map(|elem| elem.tag())
        .filter(is_private_tag)
        .collect();

    private_tags
        .into_iter()
        .filter(|tag| obj.remove_element(*tag))
        .count()
}

fn sync_media_storage_sop_instance_uid(obj: &mut DefaultDicomObject) -> bool {
    if obj
        .meta()
        .media_storage_sop_instance_uid
        .trim_end_matches('\0')
        .is_empty()
    {
        return false;
    }

    let sop_instance_uid = match obj.element(tags::SOP_INSTANCE_UID) {
        Ok(elem) => match elem.to_str() {
            Ok(uid) => uid.trim_end_matches('\0').to_string(),
            Err(err) => {
                warn!("unable to read SOP Instance UID, media storage SOP Instance UID left unchanged: {err}");
                return false;
            }
        },
        Err(_) => {
            warn!("no SOP Instance UID in data set, media storage SOP Instance UID left unchanged");
            return false;
        }
    };

    // UI values are padded to even length with a null byte
    let mut padded = sop_instance_uid;
    if padded.len() % 2 != 0 {
        padded.push('\0');
    }

    obj.update_meta(|meta| meta.media_storage_sop_instance_uid = padded);
    true
}
