use axum::extract::State;
use axum::response::Response;

use crate::errors::ErrorStatus;
use crate::AppState;

/// Copy the error's transport status onto the response when
/// `STRICT_HTTP_STATUS` is enabled. Otherwise every reply stays HTTP 200
/// and the outcome lives only in the body's `Status` field.
pub async fn apply_error_status(State(state): State<AppState>, mut response: Response) -> Response {
    if !state.config.strict_http_status {
        return response;
    }

    if let Some(ErrorStatus(status)) = response.extensions().get::<ErrorStatus>().copied() {
        *response.status_mut() = status;
    }
    response
}
