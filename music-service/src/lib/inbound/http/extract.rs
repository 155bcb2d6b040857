use axum::async_trait;
use axum::extract::FromRequest;
use axum::extract::Request;
use axum::http::header;
use axum::Form;
use axum::Json;
use serde::de::DeserializeOwned;

use super::handlers::ApiError;

/// Body extractor accepting either JSON or `application/x-www-form-urlencoded`.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| {
            content_type.starts_with("application/x-www-form-urlencoded")
        })
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::UnprocessableEntity(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::UnprocessableEntity(e.body_text()))?;
            Ok(Self(value))
        }
    }
}
