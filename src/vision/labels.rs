use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use super::ClassifierError;
use crate::models::Prediction;

/// Class-index to `(wnid, label)` lookup.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    entries: Vec<(String, String)>,
}

impl LabelIndex {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Parse the Keras `imagenet_class_index.json` layout:
    /// `{"0": ["n01440764", "tench"], "1": [...], ...}`.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: HashMap<String, (String, String)> =
            serde_json::from_str(json).context("label index is not valid JSON")?;

        let mut slots: Vec<Option<(String, String)>> = vec![None; raw.len()];
        for (key, entry) in raw {
            let idx: usize = key
                .parse()
                .with_context(|| format!("label key {key:?} is not an index"))?;
            let slot = slots
                .get_mut(idx)
                .with_context(|| format!("label index {idx} out of range"))?;
            *slot = Some(entry);
        }

        let entries = slots
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.with_context(|| format!("label index {i} missing")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label index {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` highest scores, descending. Equal scores keep class order.
    pub fn top_k(&self, scores: &[f32], k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        if scores.len() != self.entries.len() {
            return Err(ClassifierError::Inference(format!(
                "model returned {} scores, expected {}",
                scores.len(),
                self.entries.len()
            )));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        Ok(order
            .into_iter()
            .take(k)
            .map(|i| {
                let (wnid, label) = &self.entries[i];
                Prediction::new(wnid.as_str(), label.as_str(), scores[i])
            })
            .collect())
    }
}
