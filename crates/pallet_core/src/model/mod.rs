//! Domain model for tracked pallets.
//!
//! # Invariants
//! - Every pallet is identified by a stable `PalletId`.
//! - Among open pallets no two carry the same non-blank shape.

pub mod pallet;
