use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::guards::AdminUser;
use crate::inbound::http::router::AppState;

/// Activate or deactivate an account. Deactivated users cannot log in or refresh.
pub async fn update_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateUserStatusRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::UnprocessableEntity(e.body_text()))?;
    let user_id =
        UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = state
        .user_service
        .set_active(&user_id, body.is_active)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        is_active = user.is_active,
        "Account status updated"
    );

    Ok(ApiSuccess::new(StatusCode::OK, (&user).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}
