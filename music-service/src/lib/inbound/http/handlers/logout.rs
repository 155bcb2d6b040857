use axum::extract::State;
use axum::http::StatusCode;

use super::refresh::RefreshTokenRequest;
use super::ApiError;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::extract::JsonOrForm;
use crate::inbound::http::router::AppState;

/// Revoke the presented refresh token. Access tokens stay valid until they expire.
pub async fn logout(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service
        .logout(&body.refresh_token)
        .await
        .map_err(|e| state.api_error(e))
        .map(|_| StatusCode::NO_CONTENT)
}
