//! Shape vocabulary, label parsing and candidate generation.
//!
//! # Responsibility
//! - Hold the ordered base vocabulary that defines allocation preference.
//! - Parse stored labels into base / suffixed / unrecognized forms.
//! - Pick the next free label for a given in-use set.
//!
//! Everything in this module is pure; reading the in-use set from storage is
//! the allocator's job.

pub mod generator;
pub mod label;
pub mod vocabulary;
