//! Application configuration: BaseConfig (bind address, log, storage) + model, embedding and
//! agent settings.

mod app_config;
mod base;


pub use app_config::AppConfig;
pub use base::{BaseConfig, STORAGE_TYPE_MEMORY, STORAGE_TYPE_POSTGRES};
