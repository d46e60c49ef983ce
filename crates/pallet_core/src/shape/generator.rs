//! Next-free shape selection.
//!
//! # Invariants
//! - Pure function of the vocabulary and the in-use set.
//! - Base shapes are always preferred over overflow variants.
//! - Overflow numbering for a base continues after the highest number seen
//!   for that base; gaps below it are not reused.
//! - When no candidate survives, the fixed `<first>-2` fallback is returned
//!   even if it is already in use. Callers must treat
//!   `ShapeCandidate::Fallback` as a uniqueness risk.

use super::label::{format_shape, parse_shape, ParsedShape, MIN_SUFFIX};
use super::vocabulary::ShapeVocabulary;
use std::collections::{HashMap, HashSet};

/// Outcome of one candidate search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeCandidate {
    /// A label not present in the in-use set.
    Free(String),
    /// The fixed `<first>-2` label returned when every candidate collided.
    /// It may itself collide.
    Fallback(String),
}

impl ShapeCandidate {
    pub fn shape(&self) -> &str {
        match self {
            Self::Free(shape) | Self::Fallback(shape) => shape,
        }
    }

    pub fn into_shape(self) -> String {
        match self {
            Self::Free(shape) | Self::Fallback(shape) => shape,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Picks the preferred unused shape relative to `in_use`.
///
/// 1. First base shape, in vocabulary order, not in `in_use`.
/// 2. Otherwise `<base>-<next>` for the first base whose next overflow
///    number is free, where `next` is one past the highest parsed suffix for
///    that base (at least `MIN_SUFFIX`). Unrecognized labels are ignored here.
/// 3. Otherwise `Fallback("<first>-2")`.
pub fn next_shape(vocabulary: &ShapeVocabulary, in_use: &HashSet<String>) -> ShapeCandidate {
    if let Some(base) = vocabulary.iter().find(|base| !in_use.contains(*base)) {
        return ShapeCandidate::Free(base.to_string());
    }

    let next_suffix = next_suffixes(vocabulary, in_use);
    for base in vocabulary.iter() {
        let suffix = next_suffix.get(base).copied().unwrap_or(MIN_SUFFIX);
        let candidate = format_shape(base, suffix);
        if !in_use.contains(&candidate) {
            return ShapeCandidate::Free(candidate);
        }
    }

    ShapeCandidate::Fallback(format_shape(vocabulary.first(), MIN_SUFFIX))
}

fn next_suffixes<'v>(
    vocabulary: &'v ShapeVocabulary,
    in_use: &HashSet<String>,
) -> HashMap<&'v str, u32> {
    let mut next_suffix: HashMap<&str, u32> =
        vocabulary.iter().map(|base| (base, MIN_SUFFIX)).collect();

    for shape in in_use {
        if let ParsedShape::Suffixed { base, suffix } = parse_shape(shape, vocabulary) {
            if let Some(next) = next_suffix.get_mut(base) {
                // Saturates at u32::MAX; that candidate then collides with
                // the label that produced it.
                *next = (*next).max(suffix.saturating_add(1));
            }
        }
    }

    next_suffix
}
