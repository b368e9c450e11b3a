use crate::config::UidRoot;
use crate::hashing::{Blake3Hasher, Hasher};
use chrono::Utc;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use uuid::Uuid;

pub const UID_MAX_LENGTH: usize = 64;

static UID_REGEX: OnceLock<Regex> = OnceLock::new();

/// Checks the DICOM UID syntax: dot separated numeric components without
/// leading zeros, at most 64 characters.
pub fn is_valid_uid(uid: &str) -> bool {
    let regex = UID_REGEX
        .get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").unwrap());
    uid.len() <= UID_MAX_LENGTH && regex.is_match(uid)
}

/// Generates fresh UIDs below a configured [`UidRoot`].
///
/// Each UID is the root followed by the decimal digest of a timestamp, a random
/// UUID and a per-generator counter, so two calls never share their input.
#[derive(Debug)]
pub struct UidGenerator<H = Blake3Hasher>
where
    H: Hasher,
{
    hasher: H,
    uid_root: UidRoot,
    counter: AtomicU64,
}

impl UidGenerator<Blake3Hasher> {
    pub fn new(uid_root: UidRoot) -> Self {
        Self::with_hasher(Blake3Hasher::new(), uid_root)
    }
}

impl<H> UidGenerator<H>
where
    H: Hasher,
{
    pub fn with_hasher(hasher: H, uid_root: UidRoot) -> Self {
        Self {
            hasher,
            uid_root,
            counter: AtomicU64::new(0),
        }
    }

    pub fn generate(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let seed = format!(
            "{}:{}:{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            Uuid::new_v4(),
            count
        );
        let digits = self.hasher.hash(&seed);
        // a UID component must not start with a zero
        let extra = if digits.starts_with('0') { "9" } else { "" };
        let uid = format!("{}{}{}", self.uid_root.as_prefix(), extra, digits);
        uid.chars().take(UID_MAX_LENGTH).collect()
    }
}

impl Default for UidGenerator<Blake3Hasher> {
    fn default() -> Self {
        Self::new(UidRoot::default())
    }
}
