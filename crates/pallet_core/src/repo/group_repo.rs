//! Pallet group membership and the locked-group predicate.
//!
//! Groups are read by the surrounding system to decide whether a pallet may
//! still be edited. Nothing here takes part in shape allocation.
//!
//! # Invariants
//! - Membership removal is a soft flag (`is_removed = 1`).
//! - `pallet_in_locked_group` only counts non-removed memberships.

use crate::db::DbError;
use crate::model::pallet::PalletId;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GroupId = Uuid;

pub type GroupRepoResult<T> = Result<T, GroupRepoError>;

#[derive(Debug)]
pub enum GroupRepoError {
    Db(DbError),
    GroupNotFound(GroupId),
    /// Pallet is not (or no longer) a member of the group.
    MembershipNotFound {
        group_id: GroupId,
        pallet_id: PalletId,
    },
}

impl Display for GroupRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::GroupNotFound(id) => write!(f, "pallet group not found: {id}"),
            Self::MembershipNotFound {
                group_id,
                pallet_id,
            } => write!(f, "pallet {pallet_id} is not a member of group {group_id}"),
        }
    }
}

impl Error for GroupRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for GroupRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for pallet groups.
pub trait GroupRepository {
    fn create_group(&self, name: &str) -> GroupRepoResult<GroupId>;
    fn set_locked(&self, group_id: GroupId, locked: bool) -> GroupRepoResult<()>;
    /// Adds a pallet to a group, reviving a previously removed membership.
    fn add_member(&self, group_id: GroupId, pallet_id: PalletId) -> GroupRepoResult<()>;
    fn remove_member(&self, group_id: GroupId, pallet_id: PalletId) -> GroupRepoResult<()>;
    /// Whether the pallet has any non-removed membership in a locked group.
    fn pallet_in_locked_group(&self, pallet_id: PalletId) -> GroupRepoResult<bool>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn create_group(&self, name: &str) -> GroupRepoResult<GroupId> {
        let group_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO pallet_groups (group_id, name) VALUES (?1, ?2);",
            params![group_id.to_string(), name],
        )?;
        Ok(group_id)
    }

    fn set_locked(&self, group_id: GroupId, locked: bool) -> GroupRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pallet_groups SET is_locked = ?2 WHERE group_id = ?1;",
            params![group_id.to_string(), i64::from(locked)],
        )?;
        if changed == 0 {
            return Err(GroupRepoError::GroupNotFound(group_id));
        }
        Ok(())
    }

    fn add_member(&self, group_id: GroupId, pallet_id: PalletId) -> GroupRepoResult<()> {
        if !group_exists(self.conn, group_id)? {
            return Err(GroupRepoError::GroupNotFound(group_id));
        }
        self.conn.execute(
            "INSERT INTO pallet_group_members (group_id, pallet_id)
             VALUES (?1, ?2)
             ON CONFLICT (group_id, pallet_id) DO UPDATE SET is_removed = 0;",
            params![group_id.to_string(), pallet_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_member(&self, group_id: GroupId, pallet_id: PalletId) -> GroupRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pallet_group_members
             SET is_removed = 1
             WHERE group_id = ?1
               AND pallet_id = ?2
               AND is_removed = 0;",
            params![group_id.to_string(), pallet_id.to_string()],
        )?;
        if changed == 0 {
            return Err(GroupRepoError::MembershipNotFound {
                group_id,
                pallet_id,
            });
        }
        Ok(())
    }

    fn pallet_in_locked_group(&self, pallet_id: PalletId) -> GroupRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM pallet_group_members members
                INNER JOIN pallet_groups grp ON grp.group_id = members.group_id
                WHERE members.pallet_id = ?1
                  AND members.is_removed = 0
                  AND grp.is_locked = 1
            );",
            [pallet_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn group_exists(conn: &Connection, group_id: GroupId) -> GroupRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pallet_groups WHERE group_id = ?1);",
        [group_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
