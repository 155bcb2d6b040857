use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::extract::JsonOrForm;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<LoginRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    state
        .auth_service
        .authenticate(&body.username_or_email, &body.password)
        .await
        .map_err(|e| state.api_error(e))
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

/// Login credentials. OAuth2 password-form clients send the identifier as `username`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    username_or_email: String,
    password: String,
}
