use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::guards::AdminUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::PaginationError;

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(params): Query<ListUsersParams>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    let query = ListUsersQuery::new(params.skip, params.limit)?;

    tracing::debug!(admin_id = %admin.id, skip = query.skip, limit = query.limit, "Listing users");

    state
        .user_service
        .list_users(query)
        .await
        .map_err(|e| state.api_error(e))
        .map(|users| ApiSuccess::new(StatusCode::OK, users.iter().map(UserData::from).collect()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListUsersParams {
    skip: Option<i64>,
    limit: Option<i64>,
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
