//! Application state shared across handlers
//!
//! Everything here is initialized once at startup and injected; handlers
//! never reach for ambient globals.

use mongodb::Database;

use crate::jwt::JwtService;
use crate::repositories::{
    CommentRepository, DashboardRepository, LikeRepository, PlaylistRepository,
    SubscriptionRepository, TweetRepository, UserRepository, VideoRepository,
};
use crate::storage::MediaStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub user_repository: UserRepository,
    pub video_repository: VideoRepository,
    pub comment_repository: CommentRepository,
    pub like_repository: LikeRepository,
    pub tweet_repository: TweetRepository,
    pub playlist_repository: PlaylistRepository,
    pub subscription_repository: SubscriptionRepository,
    pub dashboard_repository: DashboardRepository,
    pub jwt_service: JwtService,
    pub media_storage: MediaStorage,
}
