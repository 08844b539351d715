//! Common types and utilities shared across the price oracle components

pub mod config;
pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
