use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::preprocess::ImageTensor;
use super::ClassifierError;

/// Runs the model on a prepared tensor and returns one probability per class.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<[f32; 3]>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// REST client for a TensorFlow Serving compatible model server.
///
/// Posts a batch of one image to `{base}/v1/models/{model}:predict`.
#[derive(Debug, Clone)]
pub struct TfServingBackend {
    http: Client,
    predict_url: String,
}

impl TfServingBackend {
    pub fn new(http: Client, base_url: &str, model: &str) -> Self {
        Self {
            http,
            predict_url: format!("{}/v1/models/{}:predict", base_url.trim_end_matches('/'), model),
        }
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

#[async_trait]
impl InferenceBackend for TfServingBackend {
    async fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let body = PredictRequest {
            instances: vec![input.rows()],
        };

        let resp = self
            .http
            .post(&self.predict_url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let parsed: PredictResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::Inference("model server returned no predictions".into()))
    }
}
