pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod providers;
pub mod tools;
pub mod utils;

pub use crate::core::sync::SyncService;
pub use crate::models::error::SError;
