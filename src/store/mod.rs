//! Catalog layer
//!
//! The SQLite reference catalog is the sole source of truth for which
//! base names are live. Files on disk with no reference row are orphans.

pub mod catalog;
pub mod data;
