//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod repair;
pub mod schema;
pub mod serve;
