//! Core types and traits for user memory storage and retrieval strategies.

pub mod store;
pub mod strategy_result;
pub mod types;

pub use store::*;
pub use strategy_result::*;
pub use types::*;
