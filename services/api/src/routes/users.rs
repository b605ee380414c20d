//! User routes: registration, session lifecycle, account management, and
//! the channel/watch-history aggregations

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{error, info};

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::user::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
        TokenPair, UpdateAccountRequest, UserResponse,
    },
    response::ApiResponse,
    state::AppState,
    storage::TempMedia,
    validation::{validate_email, validate_non_blank, validate_password, validate_username},
};

/// Create the user router
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    for check in [
        validate_username(&payload.username),
        validate_email(&payload.email),
        validate_password(&payload.password),
        validate_non_blank(&payload.full_name, "fullName"),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let existing = state
        .user_repository
        .find_by_username_or_email(&payload.username, &payload.email)
        .await
        .map_err(|e| {
            error!("Failed to check for existing user: {}", e);
            ApiError::InternalServerError
        })?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Username or email already registered".to_string(),
        ));
    }

    let user = state
        .user_repository
        .create(
            &payload.username,
            &payload.email,
            &payload.full_name,
            &payload.password,
        )
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            ApiError::InternalServerError
        })?;

    info!("Registered user: {}", user.username);

    Ok(ApiResponse::created(
        UserResponse::from(user),
        "User registered successfully",
    ))
}

/// Log in with username and password, issuing both token classes
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    for check in [
        validate_non_blank(&payload.username, "username"),
        validate_non_blank(&payload.password, "password"),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;

    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user_id = user.id.ok_or(ApiError::InternalServerError)?;

    let access_token = state
        .jwt_service
        .generate_access_token(user_id, &user.username)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::InternalServerError
        })?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user_id, &user.username)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .user_repository
        .set_refresh_token(user_id, Some(&refresh_token))
        .await
        .map_err(|e| {
            error!("Failed to store refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    info!("User logged in: {}", user.username);

    let jar = jar
        .add(auth_cookie("access_token", access_token.clone()))
        .add(auth_cookie("refresh_token", refresh_token.clone()));

    let response = LoginResponse {
        user: UserResponse::from(user),
        tokens: TokenPair {
            access_token,
            refresh_token,
        },
    };

    Ok((
        jar,
        ApiResponse::ok(response, "User logged in successfully"),
    ))
}

/// Log out: clear the stored refresh token and both cookies
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_repository
        .set_refresh_token(user.id, None)
        .await
        .map_err(|e| {
            error!("Failed to clear refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    let jar = jar
        .remove(removal_cookie("access_token"))
        .remove(removal_cookie("refresh_token"));

    Ok((
        jar,
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully"),
    ))
}

/// Renew the session: validate the refresh token against the stored value
/// and rotate both tokens
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let provided = payload
        .and_then(|Json(request)| request.refresh_token)
        .or_else(|| jar.get("refresh_token").map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let claims = state
        .jwt_service
        .validate_refresh_token(&provided)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user_id = mongodb::bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    // A token that does not match the stored one has been rotated away.
    if user.refresh_token.as_deref() != Some(provided.as_str()) {
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".to_string(),
        ));
    }

    let access_token = state
        .jwt_service
        .generate_access_token(user_id, &user.username)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::InternalServerError
        })?;

    let new_refresh_token = state
        .jwt_service
        .generate_refresh_token(user_id, &user.username)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .user_repository
        .set_refresh_token(user_id, Some(&new_refresh_token))
        .await
        .map_err(|e| {
            error!("Failed to rotate refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    let jar = jar
        .add(auth_cookie("access_token", access_token.clone()))
        .add(auth_cookie("refresh_token", new_refresh_token.clone()));

    let tokens = TokenPair {
        access_token,
        refresh_token: new_refresh_token,
    };

    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

/// Change the current user's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(message) = validate_password(&payload.new_password) {
        return Err(ApiError::validation(message));
    }

    let user = state
        .user_repository
        .find_by_id(current.id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("User"))?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.old_password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;

    if !valid {
        return Err(ApiError::Unauthorized(
            "Old password is incorrect".to_string(),
        ));
    }

    state
        .user_repository
        .change_password(current.id, &payload.new_password)
        .await
        .map_err(|e| {
            error!("Failed to change password: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

/// Return the authenticated user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(current.id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Current user fetched successfully",
    ))
}

/// Update account details
pub async fn update_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    for check in [
        validate_non_blank(&payload.full_name, "fullName"),
        validate_email(&payload.email),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .user_repository
        .update_account(current.id, &payload.full_name, &payload.email)
        .await
        .map_err(|e| {
            error!("Failed to update account: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Account updated successfully",
    ))
}

/// Upload and store a new avatar
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    update_user_media(state, current, multipart, "avatar").await
}

/// Upload and store a new cover image
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    update_user_media(state, current, multipart, "cover_image").await
}

async fn update_user_media(
    state: AppState,
    current: CurrentUser,
    mut multipart: Multipart,
    field_name: &'static str,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let mut upload: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        if field.name() == Some(field_name) {
            let file_name = field.file_name().unwrap_or(field_name).to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::validation("Failed to read uploaded file"))?;

            upload = Some(TempMedia::persist(&file_name, &bytes).await.map_err(|e| {
                error!("Failed to persist upload: {}", e);
                ApiError::InternalServerError
            })?);
        }
    }

    let media = upload
        .ok_or_else(|| ApiError::validation(format!("{field_name} file is required")))?;

    let uploaded = state
        .media_storage
        .upload(media, "images")
        .await
        .ok_or(ApiError::InternalServerError)?;

    let update = match field_name {
        "avatar" => state.user_repository.set_avatar(current.id, &uploaded.url).await,
        _ => state
            .user_repository
            .set_cover_image(current.id, &uploaded.url)
            .await,
    };

    let user = update
        .map_err(|e| {
            error!("Failed to store media URL: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Image updated successfully",
    ))
}

/// Channel profile for a username, from the viewer's perspective
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(message) = validate_non_blank(&username, "username") {
        return Err(ApiError::validation(message));
    }

    let profile = state
        .user_repository
        .channel_profile(&username, current.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch channel profile: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Channel"))?;

    Ok(ApiResponse::ok(
        profile,
        "User channel fetched successfully",
    ))
}

/// The authenticated user's watch history
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state
        .user_repository
        .watch_history(current.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch watch history: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}
