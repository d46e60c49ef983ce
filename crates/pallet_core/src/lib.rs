//! Shape allocation for open pallets.
//!
//! Every open pallet gets a human-distinguishable shape from a small ordered
//! vocabulary, overflowing into numbered variants (`star-2`) once the
//! vocabulary is used up. Allocation runs inside exclusive SQLite units of
//! work so concurrent callers and the bulk backfill never hand out the same
//! shape to two open pallets.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod shape;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::pallet::{Pallet, PalletId, PalletStatus};
pub use repo::group_repo::{GroupId, GroupRepoError, GroupRepository, SqliteGroupRepository};
pub use repo::pallet_repo::{PalletRepository, RepoError, RepoResult, SqlitePalletRepository};
pub use service::allocator::ShapeAllocator;
pub use service::backfill::{BackfillJob, BackfillReport};
pub use service::coordinator::{AssignmentCoordinator, ShapeTx};
pub use service::pallet_service::PalletService;
pub use service::{AssignError, AssignResult};
pub use shape::generator::{next_shape, ShapeCandidate};
pub use shape::label::{format_shape, parse_shape, ParsedShape};
pub use shape::vocabulary::{ShapeVocabulary, VocabularyError, PRIORITY_SHAPES};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
