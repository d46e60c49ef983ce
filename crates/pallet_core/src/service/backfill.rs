//! Batch assignment of shapes to every unlabeled open pallet.
//!
//! # Invariants
//! - One run is one unit of work: all pallets are labeled, or none are.
//! - Pallets are processed oldest first (`created_at ASC, id ASC`), so the
//!   oldest unlabeled pallet receives the highest-priority free shape.
//! - Each allocation re-reads the in-use set, so it sees the shape assigned
//!   in the previous iteration.
//! - Pallets that already hold a shape are never revisited; re-running after
//!   success or failure is safe.
//! - No retries. A failed run leaves the store as it was.

use super::allocator::ShapeAllocator;
use super::coordinator::{AssignmentCoordinator, ShapeTx};
use super::AssignResult;
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Outcome of one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Pallets that received a shape.
    pub processed: usize,
    /// Of those, how many got the exhaustion fallback shape.
    pub fallbacks: usize,
}

/// One-shot job labeling every open pallet that has no shape.
pub struct BackfillJob<'conn> {
    coordinator: AssignmentCoordinator<'conn>,
    allocator: ShapeAllocator,
}

impl<'conn> BackfillJob<'conn> {
    pub fn new(conn: &'conn Connection, allocator: ShapeAllocator) -> Self {
        Self {
            coordinator: AssignmentCoordinator::new(conn),
            allocator,
        }
    }

    /// Runs the backfill in its own exclusive unit of work.
    ///
    /// # Errors
    /// Any store or write failure; nothing is committed in that case.
    pub fn run(&self) -> AssignResult<BackfillReport> {
        let started_at = Instant::now();
        info!("event=shape_backfill module=backfill status=start");

        match self.coordinator.run_exclusive(|tx| self.run_in(tx)) {
            Ok(report) => {
                info!(
                    "event=shape_backfill module=backfill status=ok processed={} fallbacks={} duration_ms={}",
                    report.processed,
                    report.fallbacks,
                    started_at.elapsed().as_millis()
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    "event=shape_backfill module=backfill status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Labels all unlabeled open pallets inside a caller-owned unit of work.
    pub fn run_in(&self, tx: &ShapeTx<'_>) -> AssignResult<BackfillReport> {
        let pallets = tx.select_unlabeled_open()?;
        let mut report = BackfillReport::default();
        for pallet in &pallets {
            let candidate = self.allocator.assign_next(tx, pallet.id)?;
            report.processed += 1;
            if candidate.is_fallback() {
                report.fallbacks += 1;
            }
        }
        Ok(report)
    }
}
