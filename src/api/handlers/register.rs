use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub pwd: String,
}

/// POST /register — create an account with the starting token balance.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;

    state
        .authenticator
        .register(&body.username, &body.pwd)
        .await?;
    counter!("registrations_total").increment(1);

    Ok(Json(json!({
        "Status": 200,
        "Message": "Successful API Registration",
    })))
}
