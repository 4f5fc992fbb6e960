//! Schema module - configuration and road value types for the search.

mod config;
mod road;

pub use config::*;
pub use road::*;
