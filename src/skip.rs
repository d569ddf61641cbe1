//! Deciding which files keep their names
//!
//! Checks are applied in this order:
//!
//! 1. Marker files (`.DS_Store`, `Thumbs.db`) are flagged for deletion.
//! 2. Extensions outside [`EXTENSIONS`] are skipped.
//! 3. Names that start with a manually written date followed by a description
//!    are skipped (see [`parse_dated_prefix`]).
//! 4. Names equal to their canonical name are skipped. This needs the digest
//!    and is done by the planner through [`NameFormatter::is_canonical`].
//!
//! [`NameFormatter::is_canonical`]: crate::naming::NameFormatter::is_canonical
//!
//! ## Date prefix shapes
//!
//! The heuristic accepts exactly these shapes at the start of a name:
//!
//! ```text
//! YYYY-MM-DD<sep><text>        2020-01-01 My Picture.jpg
//! YYYY-MM-DD-HHMM<sep><text>   2020-01-01-1234 Party.jpg
//! ```
//!
//! `YYYY` is four digits and `MM` a month from 01 to 12. Each character of
//! `DD` and `HHMM` is a digit or a wildcard from [`WILDCARD_CHARS`], so
//! `2020-01-XX` and `2020-01-01-XXXX` are accepted. When all of `DD` is
//! digits it must be a day from 01 to 31, likewise an all-digit `HHMM` must
//! be a valid time. `<sep>` is one of [`DATE_SEPARATORS`] and `<text>` starts
//! with a non-whitespace character.
//!
//! A dash is not a separator, so canonical names never match.

use crate::types::{file_extension, SkipReason};

/// Extensions that get renamed, lowercase with leading dot
pub const EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".gif", ".m4a", ".mov", ".mp4", ".pdf", ".png", ".webp", ".heic", ".pptx",
    ".docx", ".xlsx",
];

/// Extensions written differently in canonical names
pub const EXTENSION_ALIASES: &[(&str, &str)] = &[(".jpeg", ".jpg")];

/// OS-generated files that are deleted instead of renamed
pub const MARKER_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Characters standing in for unknown day or time digits
pub const WILDCARD_CHARS: &[char] = &['X', 'x', '?'];

/// Characters accepted between a date prefix and its description
pub const DATE_SEPARATORS: &[char] = &[' ', '_'];

/// Outcome of the name-only checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCheck {
    /// Delete the file
    Marker,
    /// Leave the file alone
    Skip(SkipReason),
    /// Candidate for renaming; holds the extension to use in the new name
    Candidate(&'static str),
}

/// Which date prefix shape a name starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatedPrefix {
    /// `YYYY-MM-DD`
    Day {
        /// Day field contains wildcards
        wildcard: bool,
    },
    /// `YYYY-MM-DD-HHMM`
    Minute {
        /// Day or time field contains wildcards
        wildcard: bool,
    },
}

/// True for OS marker files
pub fn is_marker_file(file_name: &str) -> bool {
    MARKER_FILES.contains(&file_name)
}

/// Extension a recognized file gets in its canonical name
///
/// Matching is case-insensitive. Returns `None` for extensions outside the
/// allow-list.
pub fn recognized_extension(file_name: &str) -> Option<&'static str> {
    let extension = file_extension(file_name)?;
    let known = EXTENSIONS.iter().copied().find(|e| *e == extension)?;
    Some(
        EXTENSION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == known)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(known),
    )
}

/// Run the checks that need nothing but the file name
pub fn check_name(file_name: &str) -> NameCheck {
    if is_marker_file(file_name) {
        return NameCheck::Marker;
    }
    let Some(extension) = recognized_extension(file_name) else {
        return NameCheck::Skip(SkipReason::UnrecognizedExtension);
    };
    if parse_dated_prefix(file_name).is_some() {
        return NameCheck::Skip(SkipReason::LooksAlreadyDated);
    }
    NameCheck::Candidate(extension)
}

/// Recognize a manually written date prefix followed by a description
pub fn parse_dated_prefix(file_name: &str) -> Option<DatedPrefix> {
    let chars: Vec<char> = file_name.chars().collect();
    let mut cursor = Cursor { chars: &chars, pos: 0 };

    let _year = cursor.digits(4)?;
    cursor.expect('-')?;
    let month = cursor.digits(2)?;
    if !(1..=12).contains(&month) {
        return None;
    }
    cursor.expect('-')?;
    let day = cursor.field(2)?;
    if let Some(day) = day {
        if !(1..=31).contains(&day) {
            return None;
        }
    }

    let after_day = cursor.pos;
    if cursor.description_follows() {
        return Some(DatedPrefix::Day {
            wildcard: day.is_none(),
        });
    }

    cursor.pos = after_day;
    cursor.expect('-')?;
    let time = cursor.field(4)?;
    if let Some(time) = time {
        if time / 100 > 23 || time % 100 > 59 {
            return None;
        }
    }
    if cursor.description_follows() {
        return Some(DatedPrefix::Minute {
            wildcard: day.is_none() || time.is_none(),
        });
    }
    None
}

struct Cursor<'a> {
    chars: &'a [char],
    pos: usize,
}

impl Cursor<'_> {
    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, wanted: char) -> Option<()> {
        (self.next()? == wanted).then_some(())
    }

    /// `n` ASCII digits as a number
    fn digits(&mut self, n: usize) -> Option<u32> {
        let mut value = 0;
        for _ in 0..n {
            value = value * 10 + self.next()?.to_digit(10)?;
        }
        Some(value)
    }

    /// `n` characters that are digits or wildcards; `Some(None)` when any
    /// wildcard was present
    fn field(&mut self, n: usize) -> Option<Option<u32>> {
        let mut value = Some(0);
        for _ in 0..n {
            let c = self.next()?;
            if WILDCARD_CHARS.contains(&c) {
                value = None;
            } else {
                let digit = c.to_digit(10)?;
                value = value.map(|v| v * 10 + digit);
            }
        }
        Some(value)
    }

    fn description_follows(&mut self) -> bool {
        match self.next() {
            Some(sep) if DATE_SEPARATORS.contains(&sep) => {
                self.next().is_some_and(|c| !c.is_whitespace())
            }
            _ => false,
        }
    }
}
