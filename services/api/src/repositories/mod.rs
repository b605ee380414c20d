//! Repositories for database operations
//!
//! Each repository owns one entity's collection access: plain CRUD through
//! typed collections, and read queries through aggregation pipelines that
//! are composed by pure functions so their stage sequences can be asserted
//! in tests.

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

pub use comments::CommentRepository;
pub use dashboard::DashboardRepository;
pub use likes::LikeRepository;
pub use playlists::PlaylistRepository;
pub use subscriptions::SubscriptionRepository;
pub use tweets::TweetRepository;
pub use users::UserRepository;
pub use videos::VideoRepository;
