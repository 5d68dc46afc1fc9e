//! Lobby domain actions - entry-point business logic
//!
//! Called directly from the HTTP routes. Actions take the caller's identity
//! and plain inputs, run the matching state machine transition through the
//! commit pipeline, and return the resulting lobby or a read model.

pub mod commit;
pub mod matching;
pub mod membership;
pub mod vibe;
pub mod voting;

pub use matching::*;
pub use membership::*;
pub use vibe::*;
pub use voting::*;
