use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounting::{AccountError, LedgerError};
use crate::db::StoreError;
use crate::vision::ClassifierError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Username already in use")]
    UsernameTaken,

    #[error("Pwd too short")]
    PasswordTooShort,

    #[error("incorrect username/pwd")]
    InvalidCredentials,

    #[error("Insufficient tokens, please refill!")]
    InsufficientTokens,

    #[error("incorrect url")]
    InvalidUrl,

    #[error("incorrect username")]
    UnknownUser,

    #[error("incorrect admin pwd")]
    InvalidAdminSecret,

    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("could not fetch image: {0}")]
    UpstreamFetch(String),

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("classification unavailable: {0}")]
    Inference(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// The code carried in the `Status` field of the JSON body.
    pub fn code(&self) -> u16 {
        match self {
            ApiError::UsernameTaken => 301,
            ApiError::PasswordTooShort => 302,
            ApiError::InvalidCredentials => 302,
            ApiError::InsufficientTokens => 301,
            ApiError::InvalidUrl => 400,
            ApiError::UnknownUser => 302,
            ApiError::InvalidAdminSecret => 303,
            ApiError::InvalidAmount(_) => 400,
            ApiError::Validation(_) => 400,
            ApiError::UpstreamFetch(_) => 502,
            ApiError::Decode(_) => 415,
            ApiError::Inference(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    /// Transport status used when strict HTTP status mode is on.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ApiError::UsernameTaken => StatusCode::CONFLICT,
            ApiError::PasswordTooShort => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientTokens => StatusCode::PAYMENT_REQUIRED,
            ApiError::InvalidUrl => StatusCode::BAD_REQUEST,
            ApiError::UnknownUser => StatusCode::NOT_FOUND,
            ApiError::InvalidAdminSecret => StatusCode::FORBIDDEN,
            ApiError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Decode(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Inference(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Stashed in response extensions so the status middleware can rewrite
/// the transport status without re-parsing the body.
#[derive(Debug, Clone, Copy)]
pub struct ErrorStatus(pub StatusCode);

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "Status")]
    status: u16,
    #[serde(rename = "Message")]
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (
            StatusCode::OK,
            Json(ErrorBody {
                status: self.code(),
                message,
            }),
        )
            .into_response();
        response
            .extensions_mut()
            .insert(ErrorStatus(self.http_status()));
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UsernameTaken => ApiError::UsernameTaken,
            AccountError::PasswordTooShort => ApiError::PasswordTooShort,
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserNotFound(_) => ApiError::UnknownUser,
            LedgerError::InsufficientTokens => ApiError::InsufficientTokens,
            LedgerError::NegativeRefill(n) => {
                ApiError::InvalidAmount(format!("negative refill of {n} not permitted"))
            }
            LedgerError::Overflow(n) => {
                ApiError::InvalidAmount(format!("refill of {n} exceeds the maximum balance"))
            }
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<ClassifierError> for ApiError {
    fn from(e: ClassifierError) -> Self {
        match e {
            ClassifierError::Fetch(msg) => ApiError::UpstreamFetch(msg),
            ClassifierError::Decode(msg) => ApiError::Decode(msg),
            ClassifierError::Inference(msg) => ApiError::Inference(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_embeds_status() {
        let resp = ApiError::InsufficientTokens.into_response();

        assert_eq!(resp.status(), StatusCode::OK);
        let status = resp.extensions().get::<ErrorStatus>().copied().unwrap();
        assert_eq!(status.0, StatusCode::PAYMENT_REQUIRED);

        let json = body_json(resp).await;
        assert_eq!(json["Status"], 301);
        assert_eq!(json["Message"], "Insufficient tokens, please refill!");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let resp = ApiError::Internal(anyhow::anyhow!("connection refused to 10.0.0.5")).into_response();

        let json = body_json(resp).await;
        assert_eq!(json["Status"], 500);
        assert_eq!(json["Message"], "Internal server error");
    }

    #[test]
    fn test_ledger_error_mapping() {
        assert_eq!(ApiError::from(LedgerError::UserNotFound("x".into())).code(), 302);
        assert_eq!(ApiError::from(LedgerError::InsufficientTokens).code(), 301);
        assert_eq!(ApiError::from(LedgerError::NegativeRefill(-3)).code(), 400);
        assert_eq!(ApiError::from(LedgerError::Overflow(i64::MAX)).code(), 400);
    }

    #[test]
    fn test_classifier_error_mapping() {
        assert_eq!(ApiError::from(ClassifierError::Fetch("404".into())).code(), 502);
        assert_eq!(ApiError::from(ClassifierError::Decode("bad".into())).code(), 415);
        assert_eq!(ApiError::from(ClassifierError::Inference("down".into())).code(), 503);
    }
}
