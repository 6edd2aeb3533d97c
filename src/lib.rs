pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod info;
pub mod migration;
pub mod progress;
pub mod resolver;
pub mod script;

pub use error::{MigrationError, Result};
