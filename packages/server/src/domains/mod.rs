// Business domains
pub mod auth;
pub mod lobby;
pub mod visits;
