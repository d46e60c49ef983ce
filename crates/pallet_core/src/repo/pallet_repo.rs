//! Pallet repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/status APIs over the `pallets` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Listings are deterministic: `created_at ASC, id ASC`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Shapes and statuses are only changed through the assignment
//!   coordinator (`ShapeTx`), which holds the write lock; this repository
//!   only inserts and reads.

use crate::db::DbError;
use crate::model::pallet::{Pallet, PalletId, PalletStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub(crate) const PALLET_SELECT_SQL: &str = "SELECT
    id,
    status,
    shape,
    created_at
FROM pallets";

/// SQL expression that is `''` exactly when `is_blank_shape(shape)` holds.
///
/// SQLite's one-argument `trim` only strips spaces, so the character set of
/// `BLANK_SHAPE_CHARS` is spelled out.
pub(crate) const BLANK_SHAPE_SQL: &str = "trim(shape, ' ' || char(9) || char(10) || char(13))";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for pallet persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted pallet data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for pallet records.
pub trait PalletRepository {
    /// Inserts a pallet as given, including any pre-set shape.
    fn create_pallet(&self, pallet: &Pallet) -> RepoResult<PalletId>;
    fn get_pallet(&self, id: PalletId) -> RepoResult<Option<Pallet>>;
    /// Lists pallets, optionally filtered by status, oldest first.
    fn list_pallets(&self, status: Option<PalletStatus>) -> RepoResult<Vec<Pallet>>;
}

/// SQLite-backed pallet repository.
pub struct SqlitePalletRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePalletRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PalletRepository for SqlitePalletRepository<'_> {
    fn create_pallet(&self, pallet: &Pallet) -> RepoResult<PalletId> {
        insert_pallet(self.conn, pallet)?;
        Ok(pallet.id)
    }

    fn get_pallet(&self, id: PalletId) -> RepoResult<Option<Pallet>> {
        get_pallet(self.conn, id)
    }

    fn list_pallets(&self, status: Option<PalletStatus>) -> RepoResult<Vec<Pallet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PALLET_SELECT_SQL}
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([status.map(PalletStatus::as_str)])?;
        let mut pallets = Vec::new();
        while let Some(row) = rows.next()? {
            pallets.push(parse_pallet_row(row)?);
        }
        Ok(pallets)
    }
}

pub(crate) fn insert_pallet(conn: &Connection, pallet: &Pallet) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO pallets (id, status, shape, created_at)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            pallet.id.to_string(),
            pallet.status.as_str(),
            pallet.shape.as_deref(),
            pallet.created_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn get_pallet(conn: &Connection, id: PalletId) -> RepoResult<Option<Pallet>> {
    let row = conn
        .query_row(
            &format!("{PALLET_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    row.get::<_, String>("status")?,
                    row.get::<_, Option<String>>("shape")?,
                    row.get::<_, i64>("created_at")?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, status, shape, created_at)| build_pallet(&id, &status, shape, created_at))
        .transpose()
}

pub(crate) fn parse_pallet_row(row: &Row<'_>) -> RepoResult<Pallet> {
    let id: String = row.get("id")?;
    let status: String = row.get("status")?;
    build_pallet(&id, &status, row.get("shape")?, row.get("created_at")?)
}

fn build_pallet(
    id_text: &str,
    status_text: &str,
    shape: Option<String>,
    created_at: i64,
) -> RepoResult<Pallet> {
    let id = Uuid::parse_str(id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in pallets.id"))
    })?;
    let status = PalletStatus::parse(status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in pallets.status"))
    })?;
    Ok(Pallet {
        id,
        status,
        shape,
        created_at,
    })
}
