//! Pallet domain model.
//!
//! # Responsibility
//! - Define the persisted pallet record read and written by the shape
//!   allocator.
//!
//! # Invariants
//! - `id` is stable and never reused for another pallet.
//! - `created_at` is the deterministic processing order for shape assignment.
//! - A blank `shape` is equivalent to no shape.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a pallet.
pub type PalletId = Uuid;

/// Lifecycle state of a pallet.
///
/// Only `Open` pallets take part in shape uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PalletStatus {
    /// Active on the floor; needs a distinguishable shape.
    Open,
    /// Work finished; its shape may be reused.
    Closed,
    /// Left the holding area.
    Shipped,
}

impl PalletStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Shipped => "shipped",
        }
    }

    /// Parses the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "shipped" => Some(Self::Shipped),
            _ => None,
        }
    }
}

/// Persisted pallet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pallet {
    pub id: PalletId,
    pub status: PalletStatus,
    /// Symbolic label. `None` or blank means unassigned.
    pub shape: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Pallet {
    /// Creates a new open, unlabeled pallet stamped with the current time.
    pub fn open() -> Self {
        Self::open_at(now_epoch_ms())
    }

    /// Creates a new open, unlabeled pallet with a caller-provided creation
    /// time. Used by imports and by tests that need a fixed order.
    pub fn open_at(created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: PalletStatus::Open,
            shape: None,
            created_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PalletStatus::Open
    }

    /// Returns the shape when it is set and non-blank.
    pub fn assigned_shape(&self) -> Option<&str> {
        self.shape.as_deref().filter(|shape| !is_blank_shape(shape))
    }

    pub fn has_shape(&self) -> bool {
        self.assigned_shape().is_some()
    }
}

/// Characters a stored shape may consist of and still count as unassigned.
///
/// Storage queries use the same set (`BLANK_SHAPE_SQL`); both must change
/// together.
pub const BLANK_SHAPE_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Whether a stored shape value counts as "unassigned".
pub fn is_blank_shape(value: &str) -> bool {
    value.trim_matches(&BLANK_SHAPE_CHARS[..]).is_empty()
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
