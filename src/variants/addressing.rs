//! Variant naming and public path construction
//!
//! Every stored image is a set of files sharing one opaque base name:
//! `{size}_{baseName}` for each configured size plus `0_{baseName}` for
//! the unscaled original. The scheme is a plain convention, not a
//! negotiated protocol.

use crate::config::ImagesConfig;
use std::collections::HashSet;
use std::path::PathBuf;

/// Size index reserved for the unscaled original
pub const ORIGINAL_SIZE: u32 = 0;

/// Filename of one variant: `{size}_{baseName}`
pub fn variant_filename(size: u32, base_name: &str) -> String {
    format!("{}_{}", size, base_name)
}

/// Filesystem path of one variant inside the configured images directory
pub fn variant_path(config: &ImagesConfig, size: u32, base_name: &str) -> PathBuf {
    config.images_dir.join(variant_filename(size, base_name))
}

/// Public URL path for a variant: `{route}/{size}_{baseName}`
pub fn public_url(config: &ImagesConfig, size: u32, base_name: &str) -> String {
    format!(
        "{}/{}",
        config.route.trim_end_matches('/'),
        variant_filename(size, base_name)
    )
}

/// Resolve a requested size to a file that actually exists on disk.
///
/// Falls back to the size-0 original when the requested size was never
/// generated (e.g. the configuration changed after upload). Returns None
/// when not even the original exists.
pub fn resolve_variant(config: &ImagesConfig, size: u32, base_name: &str) -> Option<PathBuf> {
    let requested = variant_path(config, size, base_name);
    if requested.exists() {
        return Some(requested);
    }

    let original = variant_path(config, ORIGINAL_SIZE, base_name);
    if original.exists() {
        Some(original)
    } else {
        None
    }
}

/// Reduce a client-supplied image name to its bare base name.
///
/// Clients often echo back the full public path ("/images/200_abc.webp")
/// or a sized filename ("800_abc.webp"). Both the path prefix and the
/// numeric size prefix are stripped. Generated base names never contain
/// an underscore, so a leading `digits_` segment is always a size prefix.
pub fn normalize_base_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    match name.split_once('_') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => name.to_string(),
    }
}

/// Parse the comma-separated `keepImageNames` field of an edit request.
///
/// Entries are normalized (path and size prefix stripped) and deduplicated
/// case-insensitively, first occurrence wins. An absent or blank field
/// returns None so callers apply the keep-everything default instead of
/// wiping the product's images on a malformed request.
pub fn parse_keep_list(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let name = normalize_base_name(trimmed);
        if seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }

    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_variant_filename() {
        assert_eq!(variant_filename(200, "abc.webp"), "200_abc.webp");
        assert_eq!(variant_filename(ORIGINAL_SIZE, "abc.webp"), "0_abc.webp");
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let mut config = ImagesConfig::default();
        config.route = "/images/".to_string();
        assert_eq!(public_url(&config, 800, "abc.webp"), "/images/800_abc.webp");
    }

    #[test]
    fn test_normalize_strips_path_and_size_prefix() {
        assert_eq!(normalize_base_name("abc.webp"), "abc.webp");
        assert_eq!(normalize_base_name("200_abc.webp"), "abc.webp");
        assert_eq!(normalize_base_name("/images/800_abc.webp"), "abc.webp");
        assert_eq!(normalize_base_name("C:\\uploads\\0_abc.webp"), "abc.webp");
    }

    #[test]
    fn test_normalize_keeps_names_without_size_prefix() {
        // A uuid base name can start with a digit but never contains '_'
        assert_eq!(normalize_base_name("2f9ac1.webp"), "2f9ac1.webp");
        // Non-numeric prefix before '_' is part of the name, not a size
        assert_eq!(normalize_base_name("x2_abc.webp"), "x2_abc.webp");
    }

    #[test]
    fn test_parse_keep_list_absent_or_blank_is_none() {
        assert_eq!(parse_keep_list(None), None);
        assert_eq!(parse_keep_list(Some("")), None);
        assert_eq!(parse_keep_list(Some("   ")), None);
    }

    #[test]
    fn test_parse_keep_list_order_and_dedup() {
        let parsed = parse_keep_list(Some("c.webp, 200_a.webp,C.WEBP,, b.webp")).unwrap();
        assert_eq!(parsed, vec!["c.webp", "a.webp", "b.webp"]);
    }

    #[test]
    fn test_resolve_variant_falls_back_to_original() {
        let dir = std::env::temp_dir().join(format!(
            "nuvora-addr-test-{}",
            uuid::Uuid::new_v4().simple()
        ));
        fs::create_dir_all(&dir).unwrap();

        let mut config = ImagesConfig::default();
        config.images_dir = dir.clone();

        // Only the original exists on disk
        fs::write(dir.join("0_abc.webp"), b"stub").unwrap();

        let resolved = resolve_variant(&config, 999, "abc.webp").unwrap();
        assert_eq!(resolved, dir.join("0_abc.webp"));

        assert!(resolve_variant(&config, 200, "missing.webp").is_none());

        fs::remove_dir_all(&dir).unwrap();
    }
}
