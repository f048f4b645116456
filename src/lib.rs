//! Admin grid listing products with their SKU, locale-specific name, and a
//! generated barcode image.
//!
//! The crate is glue between three collaborators: the product store (`db`),
//! the locale resolver (`locale`), and the barcode service (`barcode`).
//! `table` wires them into one renderable grid page.

pub mod barcode;
pub mod config;
pub mod db;
pub mod locale;
pub mod model;
pub mod table;
