//! Shape label parser.
//!
//! Stored labels are either a bare base shape (`star`) or an overflow
//! variant `<base>-<n>` (`star-3`). Hand-entered data may hold anything else;
//! such labels parse as `Unrecognized` and are still treated as in use.

use super::vocabulary::{ShapeVocabulary, SUFFIX_SEPARATOR};
use once_cell::sync::Lazy;
use regex::Regex;

/// Smallest overflow number handed out.
pub const MIN_SUFFIX: u32 = 2;

static SUFFIXED_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>.+)-(?P<suffix>[0-9]+)$").expect("valid suffixed shape regex")
});

/// Result of parsing one stored label against a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedShape<'a> {
    /// Exactly one of the vocabulary entries.
    Base(&'a str),
    /// `<base>-<suffix>` with `base` in the vocabulary.
    ///
    /// `suffix` is whatever integer was stored, including values below
    /// `MIN_SUFFIX`.
    Suffixed { base: &'a str, suffix: u32 },
    /// Anything else: unknown base, non-numeric or out-of-range suffix.
    Unrecognized,
}

/// Parses `value` into its base / suffix parts.
pub fn parse_shape<'a>(value: &'a str, vocabulary: &ShapeVocabulary) -> ParsedShape<'a> {
    if vocabulary.contains(value) {
        return ParsedShape::Base(value);
    }

    let Some(captures) = SUFFIXED_SHAPE_RE.captures(value) else {
        return ParsedShape::Unrecognized;
    };
    let (Some(base), Some(suffix)) = (captures.name("base"), captures.name("suffix")) else {
        return ParsedShape::Unrecognized;
    };
    if !vocabulary.contains(base.as_str()) {
        return ParsedShape::Unrecognized;
    }
    match suffix.as_str().parse::<u32>() {
        Ok(suffix) => ParsedShape::Suffixed {
            base: base.as_str(),
            suffix,
        },
        Err(_) => ParsedShape::Unrecognized,
    }
}

/// Formats an overflow label.
pub fn format_shape(base: &str, suffix: u32) -> String {
    format!("{base}{SUFFIX_SEPARATOR}{suffix}")
}
