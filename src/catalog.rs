//! Registry of the identifying DICOM tags that can be selected for anonymization.
//!
//! The catalog is static data, grouped by category, loosely following the
//! attributes listed in DICOM PS3.15 Annex E.

use dicom_core::Tag;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Group a catalog entry belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TagCategory {
    PatientInformation,
    PhysicianInformation,
    StudyInformation,
    EquipmentInformation,
    Uids,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{0} is not a known tag category (expected one of: patient, physician, study, equipment, uids)")]
pub struct TagCategoryError(String);

impl TagCategory {
    pub const ALL: [TagCategory; 5] = [
        TagCategory::PatientInformation,
        TagCategory::PhysicianInformation,
        TagCategory::StudyInformation,
        TagCategory::EquipmentInformation,
        TagCategory::Uids,
    ];

    /// Short keyword used on the command line and in configuration files.
    pub fn keyword(&self) -> &'static str {
        match self {
            TagCategory::PatientInformation => "patient",
            TagCategory::PhysicianInformation => "physician",
            TagCategory::StudyInformation => "study",
            TagCategory::EquipmentInformation => "equipment",
            TagCategory::Uids => "uids",
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagCategory::PatientInformation => "Patient Information",
            TagCategory::PhysicianInformation => "Physician Information",
            TagCategory::StudyInformation => "Study Information",
            TagCategory::EquipmentInformation => "Equipment Information",
            TagCategory::Uids => "UIDs",
        };
        f.write_str(name)
    }
}

impl FromStr for TagCategory {
    type Err = TagCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TagCategory::ALL
            .into_iter()
            .find(|category| category.keyword() == wanted)
            .ok_or_else(|| TagCategoryError(s.into()))
    }
}

/// A single identifying tag known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub tag: Tag,
    pub category: TagCategory,
    pub name: &'static str,
}

const fn entry(group: u16, element: u16, category: TagCategory, name: &'static str) -> CatalogEntry {
    CatalogEntry {
        tag: Tag(group, element),
        category,
        name,
    }
}

use TagCategory::*;

pub static CATALOG: &[CatalogEntry] = &[
    entry(0x0010, 0x0010, PatientInformation, "Patient's Name"),
    entry(0x0010, 0x0020, PatientInformation, "Patient ID"),
    entry(0x0010, 0x0021, PatientInformation, "Issuer of Patient ID"),
    entry(0x0010, 0x0030, PatientInformation, "Patient's Birth Date"),
    entry(0x0010, 0x0032, PatientInformation, "Patient's Birth Time"),
    entry(0x0010, 0x0040, PatientInformation, "Patient's Sex"),
    entry(0x0010, 0x1000, PatientInformation, "Other Patient IDs"),
    entry(0x0010, 0x1001, PatientInformation, "Other Patient Names"),
    entry(0x0010, 0x1002, PatientInformation, "Other Patient IDs Sequence"),
    entry(0x0010, 0x1010, PatientInformation, "Patient's Age"),
    entry(0x0010, 0x1020, PatientInformation, "Patient's Size"),
    entry(0x0010, 0x1030, PatientInformation, "Patient's Weight"),
    entry(0x0010, 0x1040, PatientInformation, "Patient's Address"),
    entry(0x0010, 0x2160, PatientInformation, "Ethnic Group"),
    entry(0x0010, 0x2180, PatientInformation, "Occupation"),
    entry(0x0010, 0x21B0, PatientInformation, "Additional Patient History"),
    entry(0x0010, 0x4000, PatientInformation, "Patient Comments"),
    entry(0x0008, 0x0080, PhysicianInformation, "Institution Name"),
    entry(0x0008, 0x0081, PhysicianInformation, "Institution Address"),
    entry(0x0008, 0x0090, PhysicianInformation, "Referring Physician's Name"),
    entry(0x0008, 0x0092, PhysicianInformation, "Referring Physician's Address"),
    entry(0x0008, 0x0094, PhysicianInformation, "Referring Physician's Telephone Numbers"),
    entry(0x0008, 0x1050, PhysicianInformation, "Performing Physician's Name"),
    entry(0x0008, 0x1070, PhysicianInformation, "Operators' Name"),
    entry(0x0008, 0x1030, StudyInformation, "Study Description"),
    entry(0x0008, 0x0050, StudyInformation, "Accession Number"),
    entry(0x0032, 0x1032, StudyInformation, "Requesting Physician"),
    entry(0x0008, 0x1010, EquipmentInformation, "Station Name"),
    entry(0x0020, 0x000D, Uids, "Study Instance UID"),
    entry(0x0020, 0x000E, Uids, "Series Instance UID"),
    entry(0x0008, 0x0018, Uids, "SOP Instance UID"),
    entry(0x0020, 0x0052, Uids, "Frame of Reference UID"),
];

pub fn entries() -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter()
}

pub fn all_tags() -> impl Iterator<Item = Tag> {
    CATALOG.iter().map(|entry| entry.tag)
}

pub fn tags_in(category: TagCategory) -> impl Iterator<Item = Tag> {
    CATALOG
        .iter()
        .filter(move |entry| entry.category == category)
        .map(|entry| entry.tag)
}

pub fn lookup(tag: Tag) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.tag == tag)
}

/// Renders a tag the way it is listed to users, e.g. `(0010,0010) - Patient's Name`.
pub fn describe(tag: Tag) -> String {
    let name = lookup(tag).map_or("Unknown Tag", |entry| entry.name);
    format!("({:04X},{:04X}) - {}", tag.group(), tag.element(), name)
}
