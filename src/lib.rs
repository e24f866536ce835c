//! Nuvora product image store
//!
//! The image subsystem of the Nuvora storefront backend. Uploads are
//! normalized into a fixed set of WEBP resolution variants on disk, an
//! SQLite catalog keeps each product's ordered image references, and
//! product edits are applied through keep-list reconciliation: the client
//! declares which images survive and in what order, the store deletes the
//! rest, re-ranks the survivors, and appends new uploads at the end.

pub mod config;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod variants;

pub use config::ImagesConfig;
pub use error::{ImageStoreError, Result};
pub use reconcile::{
    reconcile, reconcile_async, remove_product_images, ReconcileRequest, ReconcileSummary,
    UploadedImage,
};
pub use store::catalog::ImageCatalog;
pub use store::data::ImageRef;
