//! Canonical name construction
//!
//! A canonical name is `YYYY-MM-DD-<digest>.<ext>` at day granularity and
//! `YYYY-MM-DD-HHMM-<digest>.<ext>` at minute granularity. The digest segment
//! is the front of the content hash, [`DIGEST_PREFIX_LEN`] characters unless a
//! collision forced a longer one.
//!
//! ```rust
//! use autorename::naming::NameFormatter;
//! use autorename::types::Granularity;
//! use chrono::{FixedOffset, TimeZone};
//!
//! let modified = FixedOffset::east_opt(0).unwrap()
//!     .with_ymd_and_hms(2020, 1, 1, 12, 34, 56).unwrap();
//! let digest = "98ecf8427e0123456789";
//!
//! let day = NameFormatter::new(Granularity::Day);
//! assert_eq!(day.canonical(&modified, digest, ".jpg"), "2020-01-01-98ecf8427e.jpg");
//!
//! let minute = NameFormatter::new(Granularity::Minute);
//! assert_eq!(minute.canonical(&modified, digest, ".jpg"), "2020-01-01-1234-98ecf8427e.jpg");
//! ```

use crate::types::Granularity;
use chrono::{DateTime, FixedOffset};

/// Hex characters of the digest used in a canonical name
pub const DIGEST_PREFIX_LEN: usize = 10;

/// Builds canonical names for one granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameFormatter {
    granularity: Granularity,
}

impl NameFormatter {
    /// Create a formatter
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Granularity this formatter writes
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Date (and time) part of the name, without the trailing separator
    pub fn timestamp_prefix(&self, modified: &DateTime<FixedOffset>) -> String {
        match self.granularity {
            Granularity::Day => modified.format("%Y-%m-%d").to_string(),
            Granularity::Minute => modified.format("%Y-%m-%d-%H%M").to_string(),
        }
    }

    /// Name with a digest segment of `digest_len` characters
    ///
    /// `extension` is lowercase and includes the leading dot. A `digest_len`
    /// beyond the digest's length uses the whole digest.
    pub fn format(
        &self,
        modified: &DateTime<FixedOffset>,
        digest: &str,
        digest_len: usize,
        extension: &str,
    ) -> String {
        let segment = digest.get(..digest_len).unwrap_or(digest);
        format!("{}-{}{}", self.timestamp_prefix(modified), segment, extension)
    }

    /// Name with the standard digest segment length
    pub fn canonical(&self, modified: &DateTime<FixedOffset>, digest: &str, extension: &str) -> String {
        self.format(modified, digest, DIGEST_PREFIX_LEN, extension)
    }

    /// Check whether `name` is a canonical name for these inputs
    ///
    /// A digest segment longer than [`DIGEST_PREFIX_LEN`] also matches as
    /// long as it is a prefix of `digest`, whatever the collision policy.
    /// Names produced by collision extension stay stable that way.
    pub fn is_canonical(
        &self,
        name: &str,
        modified: &DateTime<FixedOffset>,
        digest: &str,
        extension: &str,
    ) -> bool {
        if name == self.canonical(modified, digest, extension) {
            return true;
        }

        let prefix = self.timestamp_prefix(modified);
        let segment = name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(extension));
        match segment {
            Some(segment) => {
                segment.len() >= DIGEST_PREFIX_LEN
                    && segment.bytes().all(|b| b.is_ascii_hexdigit())
                    && digest.starts_with(segment)
            }
            None => false,
        }
    }
}
