use crate::catalog::{self, TagCategory};
use dicom_core::Tag;
use garde::Validate;
use regex::Regex;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

static UID_ROOT_REGEX: OnceLock<Regex> = OnceLock::new();

const UID_ROOT_MAX_LENGTH: usize = 32;
pub const UID_ROOT_DEFAULT_VALUE: &str = "9999";

/// The [`UidRoot`] struct represents a DICOM UID root that is used as prefix for
/// generating new UIDs during de-identification.
///
/// The [`UidRoot`] must follow DICOM UID format rules:
/// - Start with a digit 1-9
/// - Consist of numeric components separated by single dots
/// - Have no leading zeros in any component
/// - End with at most one trailing dot
///
/// It also must not have more than 32 characters.
///
/// # Example
///
/// ```
/// use dicom_scrub::config::UidRoot;
///
/// // Create a valid UID root
/// let uid_root = "1.2.840.123".parse::<UidRoot>().unwrap();
/// assert_eq!(uid_root.as_prefix(), "1.2.840.123.");
///
/// // Invalid UID root (not starting with 1-9)
/// let invalid = "0.1.2".parse::<UidRoot>();
/// assert!(invalid.is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct UidRoot(String);

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[error("{0} is not a valid UID root")]
pub struct UidRootError(String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid UID root: {0}")]
    InvalidUidRoot(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UidRootError> for ConfigError {
    fn from(err: UidRootError) -> Self {
        ConfigError::InvalidUidRoot(err.0)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidConfig(format!("{err}"))
    }
}

impl UidRoot {
    pub fn new(uid_root: &str) -> Result<Self, UidRootError> {
        // dot separated components, no empty ones and no leading zeros, optionally
        // followed by a single trailing dot
        let regex = UID_ROOT_REGEX.get_or_init(|| {
            Regex::new(r"^([1-9][0-9]*(\.(0|[1-9][0-9]*))*\.?)?$").unwrap()
        });

        if uid_root.len() > UID_ROOT_MAX_LENGTH || !regex.is_match(uid_root) {
            return Err(UidRootError(format!(
                "UID root must be empty or consist of numeric components without leading zeros, start with 1-9, and be no longer than {UID_ROOT_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(uid_root.into()))
    }

    /// Returns a string representation of the [`UidRoot`] suitable for use as a UID prefix.
    ///
    /// If the [`UidRoot`] is not empty and does not end with a dot, a dot is appended.
    pub fn as_prefix(&self) -> String {
        if !self.0.is_empty() && !self.0.ends_with('.') {
            format!("{}.", self.0)
        } else {
            self.0.clone()
        }
    }
}

impl Default for UidRoot {
    fn default() -> Self {
        Self(UID_ROOT_DEFAULT_VALUE.into())
    }
}

impl FromStr for UidRoot {
    type Err = UidRootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UidRoot::new(s)
    }
}

impl AsRef<str> for UidRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The set of tags chosen for anonymization.
///
/// Serialized as a list of `"(gggg,eeee)"` strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSelection(BTreeSet<Tag>);

impl TagSelection {
    pub fn empty() -> Self {
        TagSelection(BTreeSet::new())
    }

    /// Every tag in the catalog.
    pub fn all() -> Self {
        catalog::all_tags().collect()
    }

    pub fn from_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = TagCategory>,
    {
        categories.into_iter().flat_map(catalog::tags_in).collect()
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.0.remove(tag)
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Tag> for TagSelection {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        TagSelection(iter.into_iter().collect())
    }
}

impl Serialize for TagSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for tag in &self.0 {
            seq.serialize_element(&format!("{}", tag))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for TagSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;

        let mut tags = BTreeSet::new();
        for tag_str in strings {
            if !tag_str.starts_with('(') || !tag_str.ends_with(')') {
                return Err(serde::de::Error::custom(format!(
                    "Tag must be in format '(XXXX,XXXX)', got: {}",
                    tag_str
                )));
            }

            let tag: Tag = tag_str.parse().map_err(|_| {
                serde::de::Error::custom(format!(
                    "Tag must be in format '(XXXX,XXXX)' where X is a hex digit, got: {}",
                    tag_str
                ))
            })?;
            tags.insert(tag);
        }

        Ok(TagSelection(tags))
    }
}

fn validate_uid_root(value: &UidRoot, _ctx: &()) -> garde::Result {
    UidRoot::new(value.as_ref())
        .map(|_| ())
        .map_err(|err| garde::Error::new(err.0))
}

/// Configuration for DICOM de-identification.
///
/// * `uid_root` - The [`UidRoot`] to use as prefix when generating new UIDs
/// * `selection` - The tags whose values get rewritten according to their VR
///
/// Private tags are always removed and are therefore not part of the configuration.
#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    #[garde(custom(validate_uid_root))]
    uid_root: UidRoot,

    #[serde(default = "TagSelection::all")]
    #[garde(skip)]
    selection: TagSelection,
}

impl Config {
    pub fn new(uid_root: UidRoot, selection: TagSelection) -> Self {
        Self {
            uid_root,
            selection,
        }
    }

    /// Parses a JSON configuration, falling back to defaults for missing fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config
            .validate()
            .map_err(|err| ConfigError::InvalidConfig(format!("{err}")))?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn get_uid_root(&self) -> &UidRoot {
        &self.uid_root
    }

    pub fn get_selection(&self) -> &TagSelection {
        &self.selection
    }

    pub fn is_selected(&self, tag: &Tag) -> bool {
        self.selection.contains(tag)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(UidRoot::default(), TagSelection::all())
    }
}

/// Builder for [`Config`].
///
/// Starts out with every catalog tag selected and the default UID root.
///
/// # Example
///
/// ```
/// use dicom_scrub::catalog::TagCategory;
/// use dicom_scrub::config::ConfigBuilder;
/// use dicom_scrub::tags;
///
/// let config = ConfigBuilder::new()
///     .categories([TagCategory::PatientInformation])
///     .deselect(tags::PATIENT_SEX)
///     .build();
///
/// assert!(config.is_selected(&tags::PATIENT_NAME));
/// assert!(!config.is_selected(&tags::PATIENT_SEX));
/// assert!(!config.is_selected(&tags::STUDY_INSTANCE_UID));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self(config)
    }

    pub fn uid_root(mut self, uid_root: UidRoot) -> Self {
        self.0.uid_root = uid_root;
        self
    }

    pub fn selection(mut self, selection: TagSelection) -> Self {
        self.0.selection = selection;
        self
    }

    /// Restricts the selection to the tags of the given categories.
    pub fn categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = TagCategory>,
    {
        let wanted = TagSelection::from_categories(categories);
        self.0.selection = self
            .0
            .selection
            .iter()
            .filter(|tag| wanted.contains(tag))
            .copied()
            .collect();
        self
    }

    pub fn select(mut self, tag: Tag) -> Self {
        self.0.selection.insert(tag);
        self
    }

    pub fn deselect(mut self, tag: Tag) -> Self {
        self.0.selection.remove(&tag);
        self
    }

    pub fn build(self) -> Config {
        self.0
    }
}
