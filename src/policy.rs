//! Value rewrite rules, keyed on the value representation of a data element.

use crate::hashing::Hasher;
use crate::uid::UidGenerator;
use dicom_core::{PrimitiveValue, VR};

/// Replacement for person names and free text.
pub const REDACTED_TEXT: &str = "ANONYMIZED";

/// Replacement for dates, obviously not a real date but still a valid `DA` value.
pub const SENTINEL_DATE: &str = "18000101";

/// Replacement for times (midnight).
pub const SENTINEL_TIME: &str = "000000";

/// Replacement for decimal and integer strings.
pub const ZERO: &str = "0";

/// The rule applied to a selected data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Generate a fresh UID.
    GenerateUid,

    /// Replace the value with [`REDACTED_TEXT`].
    Redact,

    /// Replace the value with [`SENTINEL_DATE`].
    SentinelDate,

    /// Replace the value with [`SENTINEL_TIME`].
    SentinelTime,

    /// Replace the value with [`ZERO`].
    Zero,

    /// Clear the value.
    Empty,

    /// The VR cannot hold an empty value, so the element is deleted instead.
    Delete,
}

/// Outcome of applying a [`Rule`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Replace(PrimitiveValue),
    Delete,
}

impl Rule {
    /// The policy table.
    pub const fn for_vr(vr: VR) -> Rule {
        match vr {
            VR::UI => Rule::GenerateUid,
            VR::PN | VR::SH | VR::LO | VR::ST | VR::LT => Rule::Redact,
            VR::DA => Rule::SentinelDate,
            VR::TM => Rule::SentinelTime,
            VR::DS | VR::IS => Rule::Zero,
            // fixed width binary values
            VR::AT
            | VR::FL
            | VR::FD
            | VR::SL
            | VR::SS
            | VR::SV
            | VR::UL
            | VR::US
            | VR::UV => Rule::Delete,
            VR::AE
            | VR::AS
            | VR::CS
            | VR::DT
            | VR::OB
            | VR::OD
            | VR::OF
            | VR::OL
            | VR::OV
            | VR::OW
            | VR::SQ
            | VR::UC
            | VR::UN
            | VR::UR
            | VR::UT => Rule::Empty,
        }
    }

    pub fn apply<H: Hasher>(&self, uid_generator: &UidGenerator<H>) -> Rewrite {
        match self {
            Rule::GenerateUid => Rewrite::Replace(PrimitiveValue::from(uid_generator.generate())),
            Rule::Redact => Rewrite::Replace(PrimitiveValue::from(REDACTED_TEXT)),
            Rule::SentinelDate => Rewrite::Replace(PrimitiveValue::from(SENTINEL_DATE)),
            Rule::SentinelTime => Rewrite::Replace(PrimitiveValue::from(SENTINEL_TIME)),
            Rule::Zero => Rewrite::Replace(PrimitiveValue::from(ZERO)),
            Rule::Empty => Rewrite::Replace(PrimitiveValue::Empty),
            Rule::Delete => Rewrite::Delete,
        }
    }
}

/// Looks up the rule for `vr` and applies it.
pub fn rewrite<H: Hasher>(vr: VR, uid_generator: &UidGenerator<H>) -> Rewrite {
    Rule::for_vr(vr).apply(uid_generator)
}
