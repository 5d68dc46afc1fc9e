//! Kernel module - server infrastructure and dependencies.

pub mod candidates;
pub mod deps;
pub mod lobby_locks;
pub mod pg_store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use candidates::{CatalogCandidateSupplier, HttpCandidateSupplier};
pub use deps::{LobbySettings, ServerDeps};
pub use lobby_locks::LobbyLocks;
pub use pg_store::{PgLobbyStore, PgVisitStore};
pub use stream_hub::{LobbyUpdate, StreamHub};
pub use test_dependencies::{
    mock_restaurant, MemoryLobbyStore, MemoryVisitStore, MockCandidateSupplier, TestDependencies,
};
pub use traits::*;
