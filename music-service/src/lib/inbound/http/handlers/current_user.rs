use axum::http::StatusCode;

use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::guards::CurrentUser;

pub async fn current_user(CurrentUser(user): CurrentUser) -> ApiSuccess<UserData> {
    ApiSuccess::new(StatusCode::OK, (&user).into())
}
