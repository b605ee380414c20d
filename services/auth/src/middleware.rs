//! Authentication and role middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use mongodb::bson::oid::ObjectId;

use crate::{error::AuthError, models::Role, state::AppState};

/// Authenticated user information attached to the request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub username: String,
    pub role: Role,
}

/// Authentication middleware: requires a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| AuthError::Unauthorized("Invalid token".to_string()))?;

    let id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AuthError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(CurrentUser {
        id,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

/// Role middleware: requires the admin role, layered after
/// [`auth_middleware`]
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| AuthError::Unauthorized("Missing bearer token".to_string()))?;

    if user.role != Role::Admin {
        return Err(AuthError::Forbidden(
            "Admin access required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
