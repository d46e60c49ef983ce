//! Single choke point between storage and the shape generator.
//!
//! The in-use set is always read through the current `ShapeTx`, never
//! assembled by callers, so an allocation sees every shape committed before
//! its unit of work plus every shape assigned earlier inside it.

use super::coordinator::ShapeTx;
use super::AssignResult;
use crate::model::pallet::PalletId;
use crate::shape::generator::{next_shape, ShapeCandidate};
use crate::shape::vocabulary::ShapeVocabulary;
use log::{debug, warn};

/// Allocates shapes from a fixed vocabulary.
#[derive(Debug, Clone, Default)]
pub struct ShapeAllocator {
    vocabulary: ShapeVocabulary,
}

impl ShapeAllocator {
    pub fn new(vocabulary: ShapeVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &ShapeVocabulary {
        &self.vocabulary
    }

    /// Picks the next free shape for the unit of work behind `tx`.
    ///
    /// Does not write anything. A `Fallback` candidate is logged at `warn`
    /// because it may duplicate a shape already in use.
    pub fn allocate(&self, tx: &ShapeTx<'_>) -> AssignResult<ShapeCandidate> {
        let in_use = tx.read_open_shapes()?;
        let candidate = next_shape(&self.vocabulary, &in_use);
        if candidate.is_fallback() {
            warn!(
                "event=shape_fallback module=allocator status=exhausted shape={} in_use={} collides={}",
                candidate.shape(),
                in_use.len(),
                in_use.contains(candidate.shape())
            );
        }
        Ok(candidate)
    }

    /// Allocates a shape and writes it to `pallet_id` in the same unit of
    /// work.
    pub fn assign_next(
        &self,
        tx: &ShapeTx<'_>,
        pallet_id: PalletId,
    ) -> AssignResult<ShapeCandidate> {
        let candidate = self.allocate(tx)?;
        tx.assign(pallet_id, candidate.shape())?;
        debug!(
            "event=shape_assigned module=allocator status=ok pallet_id={} shape={} fallback={}",
            pallet_id,
            candidate.shape(),
            candidate.is_fallback()
        );
        Ok(candidate)
    }
}
