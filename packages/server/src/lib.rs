// Vibe Check Dining - Lobby Core
//
// Backend for group restaurant decisions: friends gather in a lobby, answer a
// vibe check, swipe through a shared candidate list and vote on what they
// all liked.
//
// Lobby rules live in domains/lobby/machines as pure transitions; actions run
// them against the store under a version check.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
