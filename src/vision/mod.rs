pub mod fetch;
pub mod labels;
pub mod preprocess;
pub mod serving;

pub use fetch::ImageFetcher;
pub use labels::LabelIndex;
pub use preprocess::{preprocess, ImageTensor};
pub use serving::{InferenceBackend, TfServingBackend};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Prediction;

/// Number of ranked predictions returned per image.
pub const TOP_K: usize = 5;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("image fetch failed: {0}")]
    Fetch(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl ClassifierError {
    /// Short tag used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::Fetch(_) => "fetch",
            ClassifierError::Decode(_) => "decode",
            ClassifierError::Inference(_) => "inference",
        }
    }
}

/// Turns raw image bytes into ranked predictions.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, ClassifierError>;
}

/// Decode, preprocess, run the backend, then map scores to labels.
#[derive(Clone)]
pub struct ImageClassifier {
    backend: Arc<dyn InferenceBackend>,
    labels: Arc<LabelIndex>,
}

impl ImageClassifier {
    pub fn new(backend: Arc<dyn InferenceBackend>, labels: LabelIndex) -> Self {
        Self {
            backend,
            labels: Arc::new(labels),
        }
    }
}

#[async_trait]
impl Classifier for ImageClassifier {
    async fn classify(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, ClassifierError> {
        let bytes = image_bytes.to_vec();
        let tensor = tokio::task::spawn_blocking(move || preprocess(&bytes))
            .await
            .map_err(|e| ClassifierError::Decode(e.to_string()))??;

        let scores = self.backend.predict(&tensor).await?;
        self.labels.top_k(&scores, TOP_K)
    }
}
