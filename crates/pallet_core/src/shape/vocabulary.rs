//! Ordered base shape vocabulary.
//!
//! # Invariants
//! - Entry order is allocation preference and is part of the public contract.
//! - Entries are non-blank, unique and never contain the suffix separator.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default base shapes in allocation priority order.
pub const PRIORITY_SHAPES: [&str; 10] = [
    "star",
    "triangle_up",
    "triangle_right",
    "triangle_left",
    "triangle_down",
    "circle",
    "square",
    "diamond",
    "pentagon",
    "hexagon",
];

/// Separator between a base shape and its overflow number.
pub const SUFFIX_SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    Empty,
    /// Entry at this index is blank or carries surrounding whitespace.
    BlankEntry(usize),
    DuplicateEntry(String),
    /// Entry contains `SUFFIX_SEPARATOR` and would be ambiguous with an
    /// overflow label.
    ReservedCharacter(String),
}

impl Display for VocabularyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "shape vocabulary cannot be empty"),
            Self::BlankEntry(index) => write!(
                f,
                "shape vocabulary entry {index} is blank or has surrounding whitespace"
            ),
            Self::DuplicateEntry(entry) => {
                write!(f, "shape vocabulary entry `{entry}` appears more than once")
            }
            Self::ReservedCharacter(entry) => write!(
                f,
                "shape vocabulary entry `{entry}` must not contain `{SUFFIX_SEPARATOR}`"
            ),
        }
    }
}

impl Error for VocabularyError {}

/// Immutable, ordered list of base shapes.
///
/// Built once at startup and handed to the allocator; there is no global
/// mutable vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeVocabulary {
    entries: Vec<String>,
}

impl ShapeVocabulary {
    /// Builds a custom vocabulary, preserving the given order.
    pub fn new<I, S>(entries: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            return Err(VocabularyError::Empty);
        }

        for (index, entry) in entries.iter().enumerate() {
            if entry.trim().is_empty() || entry.trim() != entry {
                return Err(VocabularyError::BlankEntry(index));
            }
            if entry.contains(SUFFIX_SEPARATOR) {
                return Err(VocabularyError::ReservedCharacter(entry.clone()));
            }
            if entries[..index].contains(entry) {
                return Err(VocabularyError::DuplicateEntry(entry.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Highest-priority base shape.
    pub fn first(&self) -> &str {
        // Construction rejects empty vocabularies.
        &self.entries[0]
    }

    pub fn contains(&self, shape: &str) -> bool {
        self.entries.iter().any(|entry| entry == shape)
    }

    /// Base shapes in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ShapeVocabulary {
    fn default() -> Self {
        Self {
            entries: PRIORITY_SHAPES.iter().map(|shape| shape.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ShapeVocabulary, VocabularyError, PRIORITY_SHAPES};

    #[test]
    fn default_vocabulary_keeps_priority_order() {
        let vocabulary = ShapeVocabulary::default();
        let entries: Vec<&str> = vocabulary.iter().collect();
        assert_eq!(
            entries,
            vec![
                "star",
                "triangle_up",
                "triangle_right",
                "triangle_left",
                "triangle_down",
                "circle",
                "square",
                "diamond",
                "pentagon",
                "hexagon",
            ]
        );
        assert_eq!(vocabulary.len(), PRIORITY_SHAPES.len());
        assert_eq!(vocabulary.first(), "star");
    }

    #[test]
    fn default_vocabulary_passes_validation() {
        let validated = ShapeVocabulary::new(PRIORITY_SHAPES).unwrap();
        assert_eq!(validated, ShapeVocabulary::default());
    }

    #[test]
    fn new_rejects_invalid_entries() {
        assert_eq!(
            ShapeVocabulary::new(Vec::<String>::new()).unwrap_err(),
            VocabularyError::Empty
        );
        assert_eq!(
            ShapeVocabulary::new(["star", " "]).unwrap_err(),
            VocabularyError::BlankEntry(1)
        );
        assert_eq!(
            ShapeVocabulary::new(["star", "circle", "star"]).unwrap_err(),
            VocabularyError::DuplicateEntry("star".to_string())
        );
        assert_eq!(
            ShapeVocabulary::new(["star", "triangle-up"]).unwrap_err(),
            VocabularyError::ReservedCharacter("triangle-up".to_string())
        );
    }
}
