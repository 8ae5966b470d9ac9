use std::fmt;

/// One ranked output of the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// WordNet id of the class, e.g. `n02504458`.
    pub wnid: String,
    pub label: String,
    /// Probability in `[0, 1]`.
    pub confidence: f32,
}

impl Prediction {
    pub fn new(wnid: impl Into<String>, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            wnid: wnid.into(),
            label: label.into(),
            confidence,
        }
    }

    /// Confidence scaled to a percentage.
    pub fn likelihood_pct(&self) -> f32 {
        self.confidence * 100.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object: {}, Likelihood: {} %",
            self.label,
            self.likelihood_pct()
        )
    }
}

/// Pick the highest-confidence prediction with a linear scan.
///
/// The first entry wins unless a later one is strictly greater, so ties
/// resolve to the earliest position in the list.
pub fn top_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    let mut iter = predictions.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.confidence > best.confidence {
            best = candidate;
        }
    }
    Some(best)
}
