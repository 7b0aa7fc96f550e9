// Domain module - Errors, configuration and device value types
pub mod config;
pub mod error;
pub mod types;
