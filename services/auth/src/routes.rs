//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::AuthError,
    middleware::{CurrentUser, admin_middleware, auth_middleware},
    models::{ChangePasswordRequest, LoginRequest, RegisterRequest, Role, UserResponse},
    state::AppState,
};

/// Response for token generation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/api/v1/auth/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/api/v1/admin/welcome", get(admin_welcome))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new user; the role defaults to `user`
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.trim().is_empty()
    {
        return Err(AuthError::Validation(
            "username, email, and password are required".to_string(),
        ));
    }

    let existing = state
        .user_repository
        .find_by_username_or_email(&payload.username, &payload.email)
        .await
        .map_err(|e| {
            error!("Failed to check for existing user: {}", e);
            AuthError::InternalServerError
        })?;

    if existing.is_some() {
        return Err(AuthError::Conflict(
            "Username or email already registered".to_string(),
        ));
    }

    let user = state
        .user_repository
        .create(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.role.unwrap_or(Role::User),
        )
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            AuthError::InternalServerError
        })?;

    info!("Registered user: {}", user.username);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "data": UserResponse::from(user),
            "message": "User registered successfully",
        })),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt for user: {}", payload.username);

    if !state.rate_limiter.check(&payload.username).await {
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| AuthError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !valid {
        return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
    }

    let user_id = user.id.ok_or(AuthError::InternalServerError)?;

    let access_token = state
        .jwt_service
        .generate_token(user_id, &user.username, user.role)
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            AuthError::InternalServerError
        })?;

    state.rate_limiter.reset(&payload.username).await;

    let response = TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(),
        user: UserResponse::from(user),
    };

    Ok((axum::http::StatusCode::OK, Json(response)))
}

/// Change the current user's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.new_password.trim().len() < 8 {
        return Err(AuthError::Validation(
            "New password must be at least 8 characters long".to_string(),
        ));
    }

    let user = state
        .user_repository
        .find_by_id(current.id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| AuthError::Unauthorized("Invalid token".to_string()))?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.old_password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !valid {
        return Err(AuthError::Unauthorized(
            "Old password is incorrect".to_string(),
        ));
    }

    state
        .user_repository
        .change_password(current.id, &payload.new_password)
        .await
        .map_err(|e| {
            error!("Failed to change password: {}", e);
            AuthError::InternalServerError
        })?;

    Ok(Json(json!({
        "status": 200,
        "data": {},
        "message": "Password changed successfully",
    })))
}

/// Admin-only landing route
pub async fn admin_welcome(
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(json!({
        "status": 200,
        "data": { "username": current.username },
        "message": "Welcome to the admin page",
    })))
}
