use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use nuvora_images::variants::fetch::fetch_image_bytes;
use nuvora_images::{
    reconcile_async, ImagesConfig, ReconcileRequest, Result, UploadedImage,
};

/// Raster formats accepted by the seeding importer
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Seed one product's image set from local folders, files, or URLs.
///
/// Usage:
///   nuvora-images <catalog.db> <images-dir> <product-id> <source> [<source>…]
///
/// Each source is a folder (scanned recursively), a single image file,
/// or an http(s) URL. Everything found is appended after the product's
/// existing images.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: nuvora-images <catalog.db> <images-dir> <product-id> <source> [<source>…]"
        );
        std::process::exit(2);
    }

    let db_path = PathBuf::from(&args[0]);
    let images_dir = PathBuf::from(&args[1]);
    let product_id: i64 = match args[2].parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("❌ Product id must be an integer, got {:?}", args[2]);
            std::process::exit(2);
        }
    };

    let config = ImagesConfig {
        images_dir,
        ..ImagesConfig::default()
    };

    match seed(db_path, config, product_id, &args[3..]).await {
        Ok(appended) => {
            println!("✅ Seeding complete: {} images added to product {}", appended, product_id);
        }
        Err(e) => {
            eprintln!("❌ Seeding failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Collect every source into an upload batch and run one reconciliation
async fn seed(
    db_path: PathBuf,
    config: ImagesConfig,
    product_id: i64,
    sources: &[String],
) -> Result<usize> {
    // The client is scoped to this import run, not held globally
    let client = reqwest::Client::new();

    let mut uploads = Vec::new();
    for source in sources {
        if source.starts_with("http://") || source.starts_with("https://") {
            match fetch_image_bytes(&client, source).await {
                Ok(bytes) => uploads.push(UploadedImage {
                    filename: source.clone(),
                    bytes,
                }),
                Err(e) => {
                    // A dead URL skips one image, the rest of the batch continues
                    eprintln!("⚠️  Skipping {}: {}", source, e);
                }
            }
        } else {
            collect_local(Path::new(source), &mut uploads).await?;
        }
    }

    if uploads.is_empty() {
        eprintln!("⚠️  No images found in the given sources");
        return Ok(0);
    }

    println!("🔍 Importing {} images into product {}", uploads.len(), product_id);

    let summary = reconcile_async(
        db_path,
        config,
        ReconcileRequest {
            product_id,
            keep: None,
            uploads,
        },
    )
    .await?;

    if summary.skipped_uploads > 0 {
        eprintln!("⚠️  {} files were not decodable and were skipped", summary.skipped_uploads);
    }

    Ok(summary.appended)
}

/// Gather image files from a path: one file, or a folder walked recursively
async fn collect_local(path: &Path, uploads: &mut Vec<UploadedImage>) -> Result<()> {
    if path.is_file() {
        push_file(path, uploads).await?;
        return Ok(());
    }

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let Some(ext) = entry_path.extension() else {
            continue;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        push_file(entry_path, uploads).await?;
    }

    Ok(())
}

async fn push_file(path: &Path, uploads: &mut Vec<UploadedImage>) -> Result<()> {
    let bytes = tokio::fs::read(path).await?;
    uploads.push(UploadedImage {
        filename: path.display().to_string(),
        bytes,
    });
    Ok(())
}
