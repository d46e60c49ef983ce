//! Shape assignment services.
//!
//! # Responsibility
//! - Run shape allocations inside exclusive, atomic units of work.
//! - Expose the backfill job and pallet lifecycle use-cases.
//!
//! # Invariants
//! - Every failure inside a unit of work rolls back all of its writes.
//! - Allocation exhaustion is not an error; it surfaces as
//!   `ShapeCandidate::Fallback` plus a warning event.

use crate::db::DbError;
use crate::model::pallet::{PalletId, PalletStatus};
use crate::repo::pallet_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocator;
pub mod backfill;
pub mod coordinator;
pub mod pallet_service;

pub type AssignResult<T> = Result<T, AssignError>;

/// Errors surfaced by shape assignment.
#[derive(Debug)]
pub enum AssignError {
    /// Connection, lock acquisition, read or commit failure. The whole unit
    /// of work was aborted. Busy errors may be retried later
    /// (`is_transient`).
    Store(DbError),
    /// Persisting a chosen shape failed, e.g. on the open-shape uniqueness
    /// constraint.
    Write {
        pallet_id: PalletId,
        shape: String,
        source: DbError,
    },
    /// A status change conflicts with stored data, e.g. reopening a pallet
    /// whose shape is now held by another open pallet.
    StatusConflict {
        pallet_id: PalletId,
        status: PalletStatus,
        source: DbError,
    },
    /// Pallet is missing, not open, or (for direct writes) already labeled.
    PalletNotAssignable(PalletId),
    /// Pallet record read/write failure outside the shape column.
    Repo(RepoError),
}

impl AssignError {
    /// Whether retrying the whole operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_busy(),
            Self::Repo(RepoError::Db(err)) => err.is_busy(),
            _ => false,
        }
    }
}

impl Display for AssignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "shape store unavailable: {err}"),
            Self::Write {
                pallet_id,
                shape,
                source,
            } => write!(
                f,
                "failed to assign shape `{shape}` to pallet {pallet_id}: {source}"
            ),
            Self::StatusConflict {
                pallet_id,
                status,
                source,
            } => write!(
                f,
                "failed to set pallet {pallet_id} to `{}`: {source}",
                status.as_str()
            ),
            Self::PalletNotAssignable(id) => {
                write!(f, "pallet {id} is missing, not open, or already has a shape")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssignError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Write { source, .. } => Some(source),
            Self::StatusConflict { source, .. } => Some(source),
            Self::PalletNotAssignable(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for AssignError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for AssignError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(DbError::Sqlite(value))
    }
}

impl From<RepoError> for AssignError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
