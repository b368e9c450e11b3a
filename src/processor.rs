use crate::config::Config;
use crate::policy::{self, Rewrite};
use crate::uid::UidGenerator;
use dicom_core::header::Header;
use dicom_core::value::Value;
use dicom_object::mem::InMemElement;
use dicom_object::AccessError;
use log::warn;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Element error: {}", .0.to_lowercase())]
    ElementError(String),

    #[error("Anonymization error: {}", .0.to_lowercase())]
    AnonymizationError(String),
}

impl From<AccessError> for Error {
    fn from(err: AccessError) -> Self {
        Error::ElementError(format!("{err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait Processor {
    /// Processes a single top-level data element.
    ///
    /// Returns the element unchanged (borrowed), a rewritten element (owned), or
    /// `None` when the element should be removed from the dataset.
    fn process_element<'a>(
        &'a self,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>>;
}

/// A processor that rewrites the selected data elements according to their VR.
///
/// Limitation: only top-level DICOM tags are processed, not tags nested inside sequences.
#[derive(Debug)]
pub struct DefaultProcessor {
    config: Config,
    uid_generator: UidGenerator,
}

impl DefaultProcessor {
    pub fn new(config: Config) -> Self {
        let uid_generator = UidGenerator::new(config.get_uid_root().clone());
        Self {
            config,
            uid_generator,
        }
    }
}

impl Default for DefaultProcessor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Processor for DefaultProcessor {
    fn process_element<'a>(
        &'a self,
        elem: &'a InMemElement,
    ) -> Result<Option<Cow<'a, InMemElement>>> {
        if !self.config.is_selected(&elem.tag()) {
            return Ok(Some(Cow::Borrowed(elem)));
        }

        match policy::rewrite(elem.vr(), &self.uid_generator) {
            Rewrite::Replace(new_value) => {
                let new_elem =
                    InMemElement::new(elem.tag(), elem.vr(), Value::Primitive(new_value));
                Ok(Some(Cow::Owned(new_elem)))
            }
            Rewrite::Delete => {
                warn!(
                    "could not blank tag {} with VR {:?}, removing it",
                    elem.tag(),
                    elem.vr()
                );
                Ok(None)
            }
        }
    }
}
