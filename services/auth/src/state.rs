//! Application state shared across handlers

use crate::{jwt::JwtService, rate_limiter::RateLimiter, repository::UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}
