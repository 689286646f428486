//! Result model, encoding tags and settings.

pub mod config;
pub mod encoding;
pub mod error;
