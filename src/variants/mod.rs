//! Variant pipeline
//!
//! This module handles:
//! - Normalizing uploads into a fixed set of WEBP resolution variants
//! - Naming conventions and public path construction for variants
//! - Deleting every variant of a stored image
//! - Fetching image bytes by URL for seeding/import

pub mod addressing;
pub mod fetch;
pub mod normalizer;
