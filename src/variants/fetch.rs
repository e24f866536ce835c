//! Fetch image bytes by URL
//!
//! Used by the seeding/import path. The HTTP client is injected by the
//! caller and scoped to the import run, not held as process-wide state.

use crate::error::Result;

/// Download one image and return its raw bytes.
///
/// Non-success status codes and transport failures both surface as
/// `Fetch` errors; the caller decides whether the batch continues.
pub async fn fetch_image_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    println!("🌐 Fetched {} ({} KB)", url, bytes.len() / 1024);

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageStoreError;

    #[tokio::test]
    async fn test_unreachable_url_is_a_fetch_error() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(500))
            .build()
            .unwrap();
        // Reserved TEST-NET-1 address, nothing listens there
        let result = fetch_image_bytes(&client, "http://192.0.2.1:9/image.png").await;
        match result {
            Err(ImageStoreError::Fetch(_)) => {}
            other => panic!("expected Fetch error, got {:?}", other.map(|b| b.len())),
        }
    }
}
