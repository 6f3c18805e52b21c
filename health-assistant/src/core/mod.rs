//! Core: application error type and logging setup.

mod error;
mod logger;

pub use error::{AppError, Result};
pub use logger::init_tracing;
