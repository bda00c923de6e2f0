//! Configuration module for cmapmerge
//!
//! Provides types, discovery, and loading for `cmapmerge.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
