//! Typed IDs for the lobby domain.

pub use super::id::{Id, V4, V7};

/// Marker type for Lobby aggregates.
pub struct Lobby;

/// Marker type for users (registered or guest). Identities are minted by the
/// identity provider, so they are random rather than time-ordered.
pub struct User;

pub type LobbyId = Id<Lobby>;

pub type UserId = Id<User, V4>;
