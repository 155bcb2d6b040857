use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::errors::INVALID_CREDENTIALS_MESSAGE;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Active user resolved from a bearer access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Like [`CurrentUser`], but anonymous or invalid callers resolve to `None`.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

/// Active user whose stored role is `admin` or `superuser`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(parts)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let claims = state
        .auth_service
        .verify_access_token(token)
        .await
        .map_err(|e| state.api_error(e))?;

    let invalid = || ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string());

    let user_id = UserId::from_string(&claims.sub).map_err(|_| invalid())?;

    let user = match state.user_service.get_user(&user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound(_)) => {
            tracing::debug!(user_id = %user_id, "Token subject no longer exists");
            return Err(invalid());
        }
        Err(e) => return Err(state.api_error(e)),
    };

    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user".to_string()));
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(resolve_user(parts, state).await.ok()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;

        if !user.role.is_admin() {
            tracing::debug!(user_id = %user.id, role = %user.role, "Admin route refused");
            return Err(ApiError::Forbidden("Not enough permissions".to_string()));
        }

        Ok(AdminUser(user))
    }
}
