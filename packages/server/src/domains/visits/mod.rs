//! Visits - the per-round record of where a lobby ended up eating.

pub mod actions;
pub mod models;

pub use models::*;
