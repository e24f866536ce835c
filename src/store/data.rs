//! Shared data structures for the image catalog
//!
//! One row per logical image owned by a product. All resolution variants
//! of that image share the row's base name on disk.

/// A single ordered image reference owned by one product
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Unique database ID
    pub id: i64,
    /// Owning product; references are never shared across products
    pub product_id: i64,
    /// Opaque base filename shared by every variant (e.g. "9f2ac4….webp")
    pub base_name: String,
    /// Zero-based display rank within the product
    pub priority: i64,
}
