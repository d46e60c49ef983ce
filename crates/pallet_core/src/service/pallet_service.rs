//! Pallet lifecycle use-cases that need a shape.
//!
//! # Invariants
//! - New pallets are inserted and labeled in the same unit of work.
//! - A pallet's shape is set once and never cleared or reassigned here.
//! - Status changes run under the same lock as allocations, so a reopened
//!   pallet cannot race an allocation for its old shape.

use super::allocator::ShapeAllocator;
use super::coordinator::AssignmentCoordinator;
use super::{AssignError, AssignResult};
use crate::model::pallet::{Pallet, PalletId, PalletStatus};
use crate::repo::pallet_repo::{PalletRepository, SqlitePalletRepository};
use rusqlite::Connection;

/// Pallet use-case service.
pub struct PalletService<'conn> {
    repo: SqlitePalletRepository<'conn>,
    coordinator: AssignmentCoordinator<'conn>,
    allocator: ShapeAllocator,
}

impl<'conn> PalletService<'conn> {
    pub fn new(conn: &'conn Connection, allocator: ShapeAllocator) -> Self {
        Self {
            repo: SqlitePalletRepository::new(conn),
            coordinator: AssignmentCoordinator::new(conn),
            allocator,
        }
    }

    /// Creates an open pallet and gives it the next free shape.
    pub fn create_pallet(&self, created_at: i64) -> AssignResult<Pallet> {
        self.coordinator.run_exclusive(|tx| {
            let mut pallet = Pallet::open_at(created_at);
            tx.insert_pallet(&pallet)?;
            let candidate = self.allocator.assign_next(tx, pallet.id)?;
            pallet.shape = Some(candidate.into_shape());
            Ok(pallet)
        })
    }

    /// Ensures one open pallet has a shape and returns it.
    ///
    /// A pallet that already holds a shape keeps it.
    ///
    /// # Errors
    /// - `AssignError::PalletNotAssignable` when the pallet is missing or
    ///   not open.
    pub fn assign_shape(&self, pallet_id: PalletId) -> AssignResult<String> {
        self.coordinator.run_exclusive(|tx| {
            let pallet = tx
                .get_pallet(pallet_id)?
                .filter(Pallet::is_open)
                .ok_or(AssignError::PalletNotAssignable(pallet_id))?;
            if let Some(shape) = pallet.assigned_shape() {
                return Ok(shape.to_string());
            }
            Ok(self.allocator.assign_next(tx, pallet_id)?.into_shape())
        })
    }

    /// Changes a pallet's lifecycle state.
    pub fn set_status(&self, pallet_id: PalletId, status: PalletStatus) -> AssignResult<()> {
        self.coordinator
            .run_exclusive(|tx| tx.set_status(pallet_id, status))
    }

    pub fn get_pallet(&self, pallet_id: PalletId) -> AssignResult<Option<Pallet>> {
        Ok(self.repo.get_pallet(pallet_id)?)
    }

    /// Open pallets, oldest first.
    pub fn list_open_pallets(&self) -> AssignResult<Vec<Pallet>> {
        Ok(self.repo.list_pallets(Some(PalletStatus::Open))?)
    }
}
