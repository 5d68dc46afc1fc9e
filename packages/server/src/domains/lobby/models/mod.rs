pub mod lobby;
pub mod restaurant;
pub mod vibe;

pub use lobby::*;
pub use restaurant::*;
pub use vibe::*;
