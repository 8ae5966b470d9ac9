use reqwest::Client;

use super::ClassifierError;

/// Downloads images from caller-supplied URLs.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    http: Client,
    max_bytes: usize,
}

impl ImageFetcher {
    /// `http` should carry the fetch timeout.
    pub fn new(http: Client, max_bytes: usize) -> Self {
        Self { http, max_bytes }
    }

    /// GET `url` and return the body. Transport failures, non-2xx statuses
    /// and bodies over the size cap are all [`ClassifierError::Fetch`].
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ClassifierError> {
        let mut resp = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ClassifierError::Fetch(e.to_string()))?;

        if resp.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(self.too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ClassifierError::Fetch(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, bytes = body.len(), "Image fetched");
        Ok(body)
    }

    fn too_large(&self) -> ClassifierError {
        ClassifierError::Fetch(format!("image exceeds {} bytes", self.max_bytes))
    }
}
