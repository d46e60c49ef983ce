//! Exclusive, atomic units of work for shape assignment.
//!
//! # Responsibility
//! - Wrap one or more allocations in a single SQLite transaction.
//! - Expose the only reads and writes an allocation may perform (`ShapeTx`).
//!
//! # Lock ordering
//! Every unit of work starts with `BEGIN IMMEDIATE`, taking the database
//! write lock before its first read. All callers therefore acquire the same
//! single lock in the same order, and a second coordinator waits in the busy
//! handler until the first commits or rolls back. Pallets to mutate are then
//! selected oldest first (`created_at ASC, id ASC`). Any new code path that
//! writes `pallets.shape` must go through `run_exclusive`; a deferred
//! transaction that reads first and upgrades later can deadlock against it.
//!
//! A stalled unit of work blocks every other coordinator on the same file
//! until `BUSY_TIMEOUT` elapses; the waiting side then fails with
//! `AssignError::Store`.
//!
//! # Invariants
//! - Reads inside a unit of work see that unit's earlier writes.
//! - `run_exclusive` commits only when the closure returns `Ok`; a failed
//!   commit leaves nothing behind.
//! - Units of work must not be nested on one connection.

use super::{AssignError, AssignResult};
use crate::db::DbError;
use crate::model::pallet::{Pallet, PalletId, PalletStatus};
use crate::repo::pallet_repo::{
    get_pallet, insert_pallet, parse_pallet_row, BLANK_SHAPE_SQL, PALLET_SELECT_SQL,
};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::time::Instant;

/// Runs closures as exclusive, all-or-nothing units of work.
pub struct AssignmentCoordinator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> AssignmentCoordinator<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Executes `work` inside one immediate transaction.
    ///
    /// Blocks while another connection holds the write lock. On `Ok` the
    /// transaction is committed; on `Err` every write made by `work` is
    /// rolled back and the error is returned unchanged.
    ///
    /// # Errors
    /// - `AssignError::Store` when the lock cannot be taken or commit fails.
    /// - Any error returned by `work`.
    pub fn run_exclusive<R, F>(&self, work: F) -> AssignResult<R>
    where
        F: FnOnce(&ShapeTx<'_>) -> AssignResult<R>,
    {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| {
                warn!(
                    "event=shape_unit_of_work module=coordinator status=error error_code=lock_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                AssignError::Store(DbError::Sqlite(err))
            })?;
        debug!(
            "event=shape_unit_of_work module=coordinator status=start wait_ms={}",
            started_at.elapsed().as_millis()
        );

        let outcome = work(&ShapeTx { conn: &tx });
        match outcome {
            Ok(value) => {
                if let Err(err) = tx.commit() {
                    error!(
                        "event=shape_unit_of_work module=coordinator status=error error_code=commit_failed duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(AssignError::Store(DbError::Sqlite(err)));
                }
                info!(
                    "event=shape_unit_of_work module=coordinator status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=shape_unit_of_work module=coordinator status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                warn!(
                    "event=shape_unit_of_work module=coordinator status=rollback duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Handle to the open unit of work.
///
/// Only valid inside `AssignmentCoordinator::run_exclusive`.
pub struct ShapeTx<'tx> {
    conn: &'tx Connection,
}

impl ShapeTx<'_> {
    /// Non-blank shapes of all open pallets, including shapes assigned
    /// earlier in this unit of work.
    pub fn read_open_shapes(&self) -> AssignResult<HashSet<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT shape
             FROM pallets
             WHERE status = 'open'
               AND shape IS NOT NULL
               AND {BLANK_SHAPE_SQL} <> '';"
        ))?;
        let mut rows = stmt.query([])?;
        let mut shapes = HashSet::new();
        while let Some(row) = rows.next()? {
            shapes.insert(row.get::<_, String>(0)?);
        }
        Ok(shapes)
    }

    /// Open pallets with a null or blank shape, oldest first.
    pub fn select_unlabeled_open(&self) -> AssignResult<Vec<Pallet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PALLET_SELECT_SQL}
             WHERE status = 'open'
               AND (shape IS NULL OR {BLANK_SHAPE_SQL} = '')
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut pallets = Vec::new();
        while let Some(row) = rows.next()? {
            pallets.push(parse_pallet_row(row)?);
        }
        Ok(pallets)
    }

    /// Writes `shape` to an open, unlabeled pallet.
    ///
    /// # Errors
    /// - `AssignError::PalletNotAssignable` when no open, unlabeled pallet
    ///   with `pallet_id` exists.
    /// - `AssignError::Write` when the update itself fails.
    pub fn assign(&self, pallet_id: PalletId, shape: &str) -> AssignResult<()> {
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE pallets
                     SET shape = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1
                       AND status = 'open'
                       AND (shape IS NULL OR {BLANK_SHAPE_SQL} = '');"
                ),
                params![pallet_id.to_string(), shape],
            )
            .map_err(|err| AssignError::Write {
                pallet_id,
                shape: shape.to_string(),
                source: DbError::Sqlite(err),
            })?;
        if changed == 0 {
            return Err(AssignError::PalletNotAssignable(pallet_id));
        }
        Ok(())
    }

    pub fn get_pallet(&self, pallet_id: PalletId) -> AssignResult<Option<Pallet>> {
        Ok(get_pallet(self.conn, pallet_id)?)
    }

    pub fn insert_pallet(&self, pallet: &Pallet) -> AssignResult<()> {
        Ok(insert_pallet(self.conn, pallet)?)
    }

    /// Changes lifecycle state. Leaving `open` releases the pallet's shape.
    ///
    /// # Errors
    /// - `AssignError::StatusConflict` when reopening hits the open-shape
    ///   uniqueness constraint because the shape was reused.
    /// - `AssignError::PalletNotAssignable` when the pallet does not exist.
    pub fn set_status(&self, pallet_id: PalletId, status: PalletStatus) -> AssignResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE pallets
                 SET status = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![pallet_id.to_string(), status.as_str()],
            )
            .map_err(|err| {
                let source = DbError::Sqlite(err);
                if source.is_constraint_violation() {
                    AssignError::StatusConflict {
                        pallet_id,
                        status,
                        source,
                    }
                } else {
                    AssignError::Store(source)
                }
            })?;
        if changed == 0 {
            return Err(AssignError::PalletNotAssignable(pallet_id));
        }
        Ok(())
    }
}
