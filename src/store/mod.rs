use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

mod pg;
#[cfg(test)]
pub mod memory;

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key violates unique constraint {constraint:?}")]
    UniqueViolation { constraint: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    /// True when the pool can no longer reach the database at all.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Feed {
    pub url: String,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub feed_url: String,
}

// follow row joined with the followed feed's display name
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FollowedFeed {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub feed_url: String,
    pub feed_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_url: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), created_at: Utc::now(), name: name.into() }
    }
}

#[derive(Debug, Clone)]
pub struct NewFeed {
    pub url: String,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewFeed {
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self { url: url.into(), name: name.into(), user_id, created_at: Utc::now() }
    }
}

#[derive(Debug, Clone)]
pub struct NewFeedFollow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub feed_url: String,
}

impl NewFeedFollow {
    pub fn new(user_id: Uuid, feed_url: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), created_at: Utc::now(), user_id, feed_url: feed_url.into() }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_url: String,
}

/// Persistence operations the feed pipeline and the command handlers rely on.
///
/// Creation methods report duplicate natural keys as [`StoreError::UniqueViolation`] so
/// callers can tell "already there" apart from real failures.
#[async_trait]
pub trait Store: Send + Sync {
    /// Feed with the oldest `last_fetched_at`, never-fetched feeds first.
    async fn get_next_feed_to_fetch(&self) -> StoreResult<Option<Feed>>;
    async fn mark_feed_fetched(&self, url: &str) -> StoreResult<()>;
    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;
    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<Post>>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, limit: i64) -> StoreResult<Vec<User>>;
    /// Removes every user; feeds, follows and posts go with them.
    async fn delete_all_users(&self) -> StoreResult<u64>;

    async fn create_feed(&self, feed: NewFeed) -> StoreResult<Feed>;
    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Option<Feed>>;
    async fn list_feeds(&self) -> StoreResult<Vec<Feed>>;

    async fn create_feed_follow(&self, follow: NewFeedFollow) -> StoreResult<FeedFollow>;
    async fn list_follows_for_user(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>>;
    async fn delete_follow(&self, user_id: Uuid, feed_url: &str) -> StoreResult<u64>;
}
