//! Upload normalization
//!
//! One incoming image (any decodable raster format) becomes a fixed set
//! of WEBP files sharing a freshly generated opaque base name: one
//! resized variant per configured size plus the original under size 0.

use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::fs;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::ImagesConfig;
use crate::error::{ImageStoreError, Result};
use crate::variants::addressing::{variant_path, ORIGINAL_SIZE};

/// Generate the opaque base name for a newly accepted image.
/// Random, collision-improbable, no semantic content.
fn generate_base_name() -> String {
    format!("{}.webp", Uuid::new_v4().simple())
}

/// Decode raw upload bytes and write every configured variant plus the original.
///
/// # Arguments
/// * `bytes` - raw upload bytes, any format the `image` crate can decode
/// * `config` - target sizes and output directory
///
/// # Returns
/// * `Ok(base_name)` - the generated base name shared by all written files
/// * `Err(Decode)` - the bytes are not a decodable image
/// * `Err(Storage)` / `Err(Encode)` - the directory or a variant could not be written
pub fn normalize_upload(bytes: &[u8], config: &ImagesConfig) -> Result<String> {
    let decoded = image::load_from_memory(bytes).map_err(ImageStoreError::Decode)?;

    // The WEBP encoder only accepts 8-bit RGB(A), so convert up front
    let source = DynamicImage::ImageRgba8(decoded.to_rgba8());

    config.ensure_images_dir()?;

    let base_name = generate_base_name();

    for &size in &config.sizes {
        let variant = fit_within(&source, size);
        save_variant(&variant, size, &base_name, config)?;
    }

    // Size 0 holds the unscaled original, re-encoded to the output format
    save_variant(&source, ORIGINAL_SIZE, &base_name, config)?;

    println!(
        "📸 Stored {} ({} variants from {}x{} source)",
        base_name,
        config.sizes.len() + 1,
        source.width(),
        source.height()
    );

    Ok(base_name)
}

/// Async front door: encoding is CPU-bound, so it runs on the blocking pool
pub async fn normalize_upload_async(bytes: Vec<u8>, config: ImagesConfig) -> Result<String> {
    tokio::task::spawn_blocking(move || normalize_upload(&bytes, &config)).await?
}

/// Resize to fit within a square bounding box, preserving aspect ratio.
/// Sources already inside the box are kept at their original resolution.
fn fit_within(img: &DynamicImage, size: u32) -> DynamicImage {
    if img.width() <= size && img.height() <= size {
        img.clone()
    } else {
        img.resize(size, size, FilterType::Lanczos3)
    }
}

/// Encode one variant to WEBP at its conventional path
fn save_variant(
    img: &DynamicImage,
    size: u32,
    base_name: &str,
    config: &ImagesConfig,
) -> Result<()> {
    let path = variant_path(config, size, base_name);
    img.save_with_format(&path, ImageFormat::WebP)
        .map_err(ImageStoreError::Encode)?;
    Ok(())
}

/// Delete every variant file sharing the given base name.
///
/// Returns the number of files that could not be removed. Failures are
/// logged and swallowed so a stuck file never blocks the enclosing edit;
/// the caller surfaces the count in its summary.
pub fn delete_variants(config: &ImagesConfig, base_name: &str) -> usize {
    let suffix = format!("_{}", base_name.to_lowercase());
    let mut failed = 0;

    for entry in WalkDir::new(&config.images_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(&suffix) {
            continue;
        }
        if let Err(e) = fs::remove_file(entry.path()) {
            eprintln!("⚠️  Failed to delete variant {}: {}", entry.path().display(), e);
            failed += 1;
        }
    }

    failed
}
