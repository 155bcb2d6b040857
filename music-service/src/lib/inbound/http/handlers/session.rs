use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::guards::OptionalUser;

pub async fn session(OptionalUser(user): OptionalUser) -> ApiSuccess<SessionResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        SessionResponseData {
            authenticated: user.is_some(),
            user: user.as_ref().map(UserData::from),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub authenticated: bool,
    pub user: Option<UserData>,
}
