//! Auth domain - bearer identities for lobby participants
//!
//! Responsibilities:
//! - JWT verification for tokens minted by the identity provider
//! - Guest identity issuance (ephemeral user id, no credential)

pub mod guest;
pub mod jwt;

pub use guest::{display_name, issue_guest, GuestIdentity};
pub use jwt::{Claims, JwtService};
