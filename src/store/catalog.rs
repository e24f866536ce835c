use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::data::ImageRef;
use crate::config::ImagesConfig;
use crate::error::Result;
use crate::variants::addressing::{normalize_base_name, variant_path, ORIGINAL_SIZE};

/// The ImageCatalog manages the SQLite reference table.
/// It maps each product to its ordered set of image base names.
pub struct ImageCatalog {
    conn: Connection,
    db_path: PathBuf,
}

impl ImageCatalog {
    /// Open (or create) the catalog database at the given path
    /// and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        println!("📁 Image catalog opened at: {}", db_path.display());

        let catalog = ImageCatalog {
            conn,
            db_path: db_path.to_path_buf(),
        };
        catalog.init_schema()?;

        Ok(catalog)
    }

    /// Open the catalog at its default location in the user's data directory:
    /// - Linux: ~/.local/share/nuvora/nuvora_images.db
    /// - macOS: ~/Library/Application Support/nuvora/nuvora_images.db
    /// - Windows: %APPDATA%\nuvora\nuvora_images.db
    pub fn open_default() -> Result<Self> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("nuvora");
        path.push("nuvora_images.db");
        Self::open(&path)
    }

    /// Create the reference table and its indexes if they don't exist
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS product_images (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id      INTEGER NOT NULL,
                base_name       TEXT NOT NULL,
                priority        INTEGER NOT NULL,
                created_at      INTEGER NOT NULL
            )",
            [],
        )?;

        // One logical image appears at most once per product
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_product_images_product_base
             ON product_images(product_id, base_name)",
            [],
        )?;

        // Ordered listing is the hot query path.
        // Priorities may collide transiently mid-reconciliation, so this
        // index is deliberately not unique.
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_product_images_product_priority
             ON product_images(product_id, priority)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Count the images referenced by one product
    pub fn count_for(&self, product_id: i64) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM product_images WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a product's image references ordered by priority
    pub fn images_for(&self, product_id: i64) -> Result<Vec<ImageRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, base_name, priority
             FROM product_images
             WHERE product_id = ?1
             ORDER BY priority, id",
        )?;

        let ref_iter = stmt.query_map(params![product_id], |row| {
            Ok(ImageRef {
                id: row.get(0)?,
                product_id: row.get(1)?,
                base_name: row.get(2)?,
                priority: row.get(3)?,
            })
        })?;

        let mut refs = Vec::new();
        for reference in ref_iter {
            refs.push(reference?);
        }

        Ok(refs)
    }

    /// Insert a new reference at the given priority
    pub fn insert(&self, product_id: i64, base_name: &str, priority: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO product_images (product_id, base_name, priority, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![product_id, base_name, priority, Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Re-rank one reference, matching its base name case-insensitively.
    /// Returns false when no row matched (stale client state).
    pub fn set_priority(&self, product_id: i64, base_name: &str, priority: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE product_images SET priority = ?1
             WHERE product_id = ?2 AND base_name = ?3 COLLATE NOCASE",
            params![priority, product_id, base_name],
        )?;
        Ok(affected > 0)
    }

    /// Delete one reference row. Returns false when no row matched.
    pub fn remove(&self, product_id: i64, base_name: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM product_images
             WHERE product_id = ?1 AND base_name = ?2 COLLATE NOCASE",
            params![product_id, base_name],
        )?;
        Ok(affected > 0)
    }

    /// Delete every reference of a product.
    /// Returns the removed base names so the caller can delete the files.
    pub fn remove_product(&self, product_id: i64) -> Result<Vec<String>> {
        let names: Vec<String> = self
            .images_for(product_id)?
            .into_iter()
            .map(|r| r.base_name)
            .collect();

        self.conn.execute(
            "DELETE FROM product_images WHERE product_id = ?1",
            params![product_id],
        )?;

        Ok(names)
    }

    /// Verify that the original variant still exists for every reference.
    /// Returns the number of references whose backing file is missing.
    pub fn verify_variants(&self, config: &ImagesConfig) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT product_id, base_name FROM product_images")?;

        let refs: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        let mut missing = 0;
        for (product_id, base_name) in refs {
            if !variant_path(config, ORIGINAL_SIZE, &base_name).exists() {
                eprintln!(
                    "⚠️  Missing original for {} (product {})",
                    base_name, product_id
                );
                missing += 1;
            }
        }

        if missing > 0 {
            println!("⚠️  {} references have no backing file", missing);
        }

        Ok(missing)
    }

    /// Delete variant files whose base name has no reference row.
    ///
    /// Orphans appear when a physical delete failed during an earlier edit
    /// or an upload was abandoned mid-request. Returns the number of files
    /// removed; removal failures are logged and skipped.
    pub fn sweep_orphans(&self, config: &ImagesConfig) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT lower(base_name) FROM product_images")?;
        let live: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();

        let mut removed = 0;
        for entry in WalkDir::new(&config.images_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let file_name = entry.file_name().to_string_lossy().to_string();
            let base = normalize_base_name(&file_name).to_lowercase();
            if live.contains(&base) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(_) => removed += 1,
                Err(e) => {
                    eprintln!("⚠️  Failed to remove orphan {}: {}", file_name, e);
                }
            }
        }

        if removed > 0 {
            println!("🧹 Swept {} orphaned variant files", removed);
        }

        Ok(removed)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for ImageCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCatalog")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_catalog() -> (ImageCatalog, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "nuvora-catalog-test-{}",
            Uuid::new_v4().simple()
        ));
        let catalog = ImageCatalog::open(&dir.join("catalog.db")).unwrap();
        (catalog, dir)
    }

    #[test]
    fn test_insert_and_ordered_listing() {
        let (catalog, dir) = temp_catalog();

        catalog.insert(1, "b.webp", 1).unwrap();
        catalog.insert(1, "a.webp", 0).unwrap();
        catalog.insert(1, "c.webp", 2).unwrap();
        catalog.insert(2, "other.webp", 0).unwrap();

        let refs = catalog.images_for(1).unwrap();
        let names: Vec<&str> = refs.iter().map(|r| r.base_name.as_str()).collect();
        assert_eq!(names, vec!["a.webp", "b.webp", "c.webp"]);
        assert_eq!(catalog.count_for(1).unwrap(), 3);
        assert_eq!(catalog.count_for(2).unwrap(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_set_priority_is_case_insensitive() {
        let (catalog, dir) = temp_catalog();

        catalog.insert(1, "Mixed.webp", 0).unwrap();
        assert!(catalog.set_priority(1, "mixed.WEBP", 5).unwrap());
        assert!(!catalog.set_priority(1, "absent.webp", 9).unwrap());

        let refs = catalog.images_for(1).unwrap();
        assert_eq!(refs[0].priority, 5);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_remove_product_returns_base_names() {
        let (catalog, dir) = temp_catalog();

        catalog.insert(7, "x.webp", 0).unwrap();
        catalog.insert(7, "y.webp", 1).unwrap();

        let removed = catalog.remove_product(7).unwrap();
        assert_eq!(removed, vec!["x.webp", "y.webp"]);
        assert_eq!(catalog.count_for(7).unwrap(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_duplicate_reference_is_rejected() {
        let (catalog, dir) = temp_catalog();

        catalog.insert(1, "dup.webp", 0).unwrap();
        assert!(catalog.insert(1, "dup.webp", 1).is_err());
        // Same base name under another product is fine
        catalog.insert(2, "dup.webp", 0).unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_verify_and_sweep() {
        let (catalog, dir) = temp_catalog();
        let config = ImagesConfig {
            images_dir: dir.join("images"),
            route: "/images".to_string(),
            sizes: vec![64],
        };
        std::fs::create_dir_all(&config.images_dir).unwrap();

        // One live reference with its original present, one dangling reference,
        // one orphaned file with no reference at all.
        catalog.insert(1, "live.webp", 0).unwrap();
        std::fs::write(config.images_dir.join("0_live.webp"), b"stub").unwrap();
        catalog.insert(1, "dangling.webp", 1).unwrap();
        std::fs::write(config.images_dir.join("0_orphan.webp"), b"stub").unwrap();

        assert_eq!(catalog.verify_variants(&config).unwrap(), 1);
        assert_eq!(catalog.sweep_orphans(&config).unwrap(), 1);
        assert!(config.images_dir.join("0_live.webp").exists());
        assert!(!config.images_dir.join("0_orphan.webp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
