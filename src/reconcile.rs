//! Keep-list reconciliation for product image edits
//!
//! On edit, the client declares which stored images survive and in what
//! order; everything else is deleted, survivors are re-ranked to match
//! the declared order exactly, and new uploads are appended after them.
//! Deletions run first, then re-ranking, then insertions; the three
//! phases touch disjoint rows.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::ImagesConfig;
use crate::error::{ImageStoreError, Result};
use crate::store::catalog::ImageCatalog;
use crate::variants::addressing::normalize_base_name;
use crate::variants::normalizer::{delete_variants, normalize_upload};

/// One freshly uploaded image awaiting normalization
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-side filename, used only for log messages
    pub filename: String,
    /// Raw bytes in whatever format the client sent
    pub bytes: Vec<u8>,
}

/// One product edit as seen by the reconciler
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub product_id: i64,
    /// Desired final order of existing base names.
    /// None means the field was absent: retain everything in stored order,
    /// protecting against accidental wipes from malformed clients.
    pub keep: Option<Vec<String>>,
    /// New uploads, appended after the retained set in supply order
    pub uploads: Vec<UploadedImage>,
}

/// What one reconciliation run actually did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSummary {
    /// References re-ranked from the keep-list
    pub retained: usize,
    /// References removed (rows; file deletion is best-effort)
    pub deleted: usize,
    /// Uploads normalized and appended
    pub appended: usize,
    /// Uploads skipped because their bytes failed to decode or encode
    pub skipped_uploads: usize,
    /// Physical variant files that could not be removed (now orphans)
    pub failed_file_deletes: usize,
}

/// Apply one product image edit.
///
/// # Arguments
/// * `catalog` - the reference store, sole source of truth for live images
/// * `config` - sizes and images directory for variant files
/// * `request` - keep-list and new uploads for one product
///
/// # Returns
/// * `Ok(summary)` - counts of what happened, including swallowed file-delete
///   failures so callers can surface them
/// * `Err(Validation)` - the edit would leave the product with zero images;
///   rejected before any mutation
pub fn reconcile(
    catalog: &ImageCatalog,
    config: &ImagesConfig,
    request: ReconcileRequest,
) -> Result<ReconcileSummary> {
    let current = catalog.images_for(request.product_id)?;

    let keep: Vec<String> = match request.keep {
        Some(list) => normalize_keep_list(&list),
        // Absent keep-list: retain everything exactly as stored
        None => current.iter().map(|r| r.base_name.clone()).collect(),
    };

    if keep.is_empty() && request.uploads.is_empty() {
        return Err(ImageStoreError::Validation(
            "a product must retain at least one image".to_string(),
        ));
    }

    let mut summary = ReconcileSummary::default();

    // Phase 1: delete references absent from the keep-list,
    // files first, row second. A stuck file never blocks the row removal.
    let keep_lower: HashSet<String> = keep.iter().map(|n| n.to_lowercase()).collect();
    for reference in &current {
        if keep_lower.contains(&reference.base_name.to_lowercase()) {
            continue;
        }
        summary.failed_file_deletes += delete_variants(config, &reference.base_name);
        catalog.remove(request.product_id, &reference.base_name)?;
        summary.deleted += 1;
    }

    // Phase 2: re-rank survivors to the caller's order exactly.
    // Keep-list entries with no matching row are stale client state and
    // are skipped; their slot stays empty until the next edit.
    for (rank, base_name) in keep.iter().enumerate() {
        if catalog.set_priority(request.product_id, base_name, rank as i64)? {
            summary.retained += 1;
        }
    }

    // Phase 3: append new uploads after the retained block.
    // One bad file is logged and skipped, its siblings continue.
    let mut next_priority = keep.len() as i64;
    for upload in &request.uploads {
        match normalize_upload(&upload.bytes, config) {
            Ok(base_name) => {
                catalog.insert(request.product_id, &base_name, next_priority)?;
                next_priority += 1;
                summary.appended += 1;
            }
            Err(e) => {
                eprintln!("⚠️  Skipping upload {}: {}", upload.filename, e);
                summary.skipped_uploads += 1;
            }
        }
    }

    println!(
        "✅ Product {}: retained {}, deleted {}, appended {}{}",
        request.product_id,
        summary.retained,
        summary.deleted,
        summary.appended,
        if summary.failed_file_deletes > 0 {
            format!(" ({} files left orphaned)", summary.failed_file_deletes)
        } else {
            String::new()
        }
    );

    Ok(summary)
}

/// Run one reconciliation on the blocking pool.
///
/// rusqlite connections are not Send, so the task opens its own catalog
/// connection from the database path, the same way background imports do.
pub async fn reconcile_async(
    db_path: PathBuf,
    config: ImagesConfig,
    request: ReconcileRequest,
) -> Result<ReconcileSummary> {
    tokio::task::spawn_blocking(move || {
        let catalog = ImageCatalog::open(&db_path)?;
        reconcile(&catalog, &config, request)
    })
    .await?
}

/// Remove every image owned by a product, backing files included.
/// Returns the number of references removed.
pub fn remove_product_images(
    catalog: &ImageCatalog,
    config: &ImagesConfig,
    product_id: i64,
) -> Result<usize> {
    let names = catalog.remove_product(product_id)?;
    for base_name in &names {
        delete_variants(config, base_name);
    }
    if !names.is_empty() {
        println!("🧹 Removed {} images of product {}", names.len(), product_id);
    }
    Ok(names.len())
}

/// Normalize client-supplied keep-list entries: strip path and size
/// prefixes, deduplicate case-insensitively, first occurrence wins.
fn normalize_keep_list(list: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for raw in list {
        let name = normalize_base_name(raw.trim());
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }
    names
}
