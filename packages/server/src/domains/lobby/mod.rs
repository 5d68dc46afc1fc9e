//! Lobby domain - group restaurant decisions.
//!
//! Architecture:
//!   routes → actions (lock, load, transition, compare-and-swap) → effects
//!
//! Responsibilities:
//! - Join codes and participant membership
//! - Vibe checks and readiness
//! - Swipe ledger, ballot formation, vote tally and tie handling
//! - Recording the winning Visit once per completed round

pub mod actions;
pub mod code;
pub mod data;
pub mod effects;
pub mod errors;
pub mod events;
pub mod machines;
pub mod models;

pub use errors::LobbyError;
pub use events::LobbyEvent;
pub use models::{Lobby, LobbyStatus};
