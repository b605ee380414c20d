//! Authentication middleware for JWT token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use mongodb::bson::oid::ObjectId;
use tracing::error;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information attached to the request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub username: String,
}

/// Authentication middleware
///
/// Accepts the access token either as a `Bearer` Authorization header or as
/// the `access_token` cookie, verifies it, confirms the user still exists,
/// and inserts a [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = bearer
        .or_else(|| jar.get("access_token").map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;

    let claims = state
        .jwt_service
        .validate_access_token(&token)
        .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

    // The token may outlive the account; only a live user passes.
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load authenticated user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    req.extensions_mut().insert(CurrentUser {
        id: user_id,
        username: user.username,
    });

    let response = next.run(req).await;

    Ok(response)
}
