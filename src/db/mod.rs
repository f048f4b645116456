//! Database module: entity models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: typed entities, the grid query value, and page selections.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `barcode_grid::db` — we re-export the
//! repository API and commonly used models for convenience.

pub mod model;
pub mod repo;

// Re-export the repository API at `crate::db::*`.
pub use repo::*;

// Surface the models used by the table adapter and callers.
pub use model::{PageSelection, Product, ProductGridQuery, ProductRow, SortColumn, TableCounts};
