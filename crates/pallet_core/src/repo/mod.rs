//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for pallets and pallet groups.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`InvalidData`,
//!   `GroupNotFound`) in addition to DB transport errors.
//! - Pallet status and shape changes are not exposed here; they go through
//!   `service::coordinator::ShapeTx`.

pub mod group_repo;
pub mod pallet_repo;
