//! CLI command implementations.

pub mod add;
pub mod delete;
pub mod get;
pub mod info;
pub mod list;
pub mod publish;
pub mod query;
pub mod reload;
pub mod verify;
