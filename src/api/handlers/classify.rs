use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::accounting::AccountError;
use crate::errors::ApiError;
use crate::models::{top_prediction, Prediction};
use crate::vision::ClassifierError;
use crate::AppState;

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub username: String,
    pub pwd: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /classify — classify the image at `url`, spending one token.
///
/// Guards run in order: credentials, balance, url. The token is taken only
/// after the classifier has produced a result.
pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;

    let user = match state.authenticator.authenticate(&body.username, &body.pwd).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AccountError::InvalidCredentials) {
                counter!("auth_failures_total").increment(1);
            }
            return Err(e.into());
        }
    };

    if user.tokens <= 0 {
        return Err(ApiError::InsufficientTokens);
    }

    let url = body
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::InvalidUrl)?;

    let started = Instant::now();
    let predictions = match fetch_and_classify(&state, url).await {
        Ok(predictions) => predictions,
        Err(e) => {
            counter!("classification_failures_total", "reason" => e.kind()).increment(1);
            tracing::warn!(username = %user.username, url, error = %e, "Classification failed");
            return Err(e.into());
        }
    };

    let top = top_prediction(&predictions)
        .ok_or_else(|| ApiError::Inference("classifier returned no predictions".into()))?;

    let remaining = state.ledger.spend_one(&user.username).await?;

    histogram!("classify_latency_seconds").record(started.elapsed().as_secs_f64());
    counter!("classifications_total").increment(1);
    tracing::info!(
        username = %user.username,
        label = %top.label,
        confidence = top.confidence,
        remaining,
        "Image classified"
    );

    Ok(Json(json!({
        "Status": 200,
        "Result": top.to_string(),
        "Tokens Remaining": remaining,
    })))
}

async fn fetch_and_classify(state: &AppState, url: &str) -> Result<Vec<Prediction>, ClassifierError> {
    let bytes = state.fetcher.fetch(url).await?;
    state.classifier.classify(&bytes).await
}
