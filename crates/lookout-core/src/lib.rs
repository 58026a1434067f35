//! Lookout core: chat wire types and configuration.

pub mod config;
pub mod types;
pub mod utils;
