use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct RefillRequest {
    pub username: String,
    pub auth_pwd: String,
    /// Read only once the user and secret checks have passed.
    #[serde(default)]
    pub new_tokens: Option<i64>,
}

/// POST /refill — admin-only credit of `new_tokens` to a user.
///
/// The user lookup happens before the secret check, so an unknown user is
/// reported even when the secret is wrong. A missing amount is reported
/// last.
pub async fn refill(
    State(state): State<AppState>,
    payload: Result<Json<RefillRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;

    let previous = state.ledger.balance(&body.username).await?;

    if !state.admin.verify(&body.auth_pwd) {
        tracing::warn!(username = %body.username, "Refill rejected: bad admin secret");
        return Err(ApiError::InvalidAdminSecret);
    }

    let amount = body
        .new_tokens
        .ok_or_else(|| ApiError::InvalidAmount("new_tokens is required".into()))?;

    let balance = state.ledger.credit(&body.username, amount).await?;
    counter!("refills_total").increment(1);
    tracing::info!(
        username = %body.username,
        previous,
        balance,
        "Refill applied"
    );

    Ok(Json(json!({
        "Status": 200,
        "Message": "Refill successful",
    })))
}
