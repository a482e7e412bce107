//! Data models
//!
//! Catalog-side entities the session core reads but never mutates.

pub mod dining_table;

// Re-exports
pub use dining_table::DiningTable;
