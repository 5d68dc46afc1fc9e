// HTTP routes
pub mod auth;
pub mod health;
pub mod lobby;
pub mod stream;
pub mod visits;

pub use health::*;
pub use stream::*;
