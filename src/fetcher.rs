//! Retrieval of menu image bytes for a source record.
//!
//! The production implementation pulls from a Cloudinary-style URL template
//! `{base}/{namespace}/{id}.jpg`. The pipeline only sees the [`ImageSource`]
//! trait, so tests substitute a fake.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// Failure to retrieve a record's image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote resource does not exist (HTTP 404).
    #[error("image not found: {url}")]
    NotFound { url: String },

    /// Transport-level failure or an unexpected HTTP status.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },
}

/// Anything that can resolve a record identifier to image bytes.
pub trait ImageSource {
    fn fetch(&self, id: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// Fetches images over HTTP from a fixed URL template.
pub struct CloudinaryImageSource {
    base_url: String,
    namespace: String,
    client: Client,
}

impl CloudinaryImageSource {
    /// `base_url` is the delivery root (e.g.
    /// `https://res.cloudinary.com/{cloud_name}/image/upload`); `namespace`
    /// is the folder the images were uploaded under.
    pub fn new(base_url: String, namespace: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url,
            namespace,
            client,
        }
    }

    fn url_for(&self, id: &str) -> String {
        format!("{}/{}/{}.jpg", self.base_url, self.namespace, id)
    }
}

impl ImageSource for CloudinaryImageSource {
    async fn fetch(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url });
        }
        if !status.is_success() {
            return Err(FetchError::Transport {
                url,
                message: format!("unexpected status {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url,
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
