use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::extract::JsonOrForm;
use crate::inbound::http::router::AppState;

pub async fn refresh(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<RefreshTokenRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    state
        .auth_service
        .refresh(&body.refresh_token)
        .await
        .map_err(|e| state.api_error(e))
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
