use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{
    Feed, FeedFollow, FollowedFeed, NewFeed, NewFeedFollow, NewPost, NewUser, Post, Store, StoreError,
    StoreResult, User,
};

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(dsn: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(dsn)
            .await?;

        // Apply any pending migrations (idempotent)
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation { constraint };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn get_next_feed_to_fetch(&self) -> StoreResult<Option<Feed>> {
        sqlx::query_as::<_, Feed>(
            r#"
            SELECT url, name, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn mark_feed_fetched(&self, url: &str) -> StoreResult<()> {
        sqlx::query("UPDATE feeds SET last_fetched_at = now(), updated_at = now() WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_url)
            VALUES ($1, $2, $2, $3, $4, $5, $6, $7)
            RETURNING id, created_at, updated_at, title, url, description, published_at, feed_url
            "#,
        )
        .bind(post.id)
        .bind(post.created_at)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(&post.feed_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.created_at, p.updated_at, p.title, p.url, p.description, p.published_at, p.feed_url
            FROM posts p
            JOIN feed_follows ff ON ff.feed_url = p.feed_url
            WHERE ff.user_id = $1
            ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, created_at, updated_at, name)
            VALUES ($1, $2, $2, $3)
            RETURNING id, created_at, updated_at, name
            "#,
        )
        .bind(user.id)
        .bind(user.created_at)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, created_at, updated_at, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, created_at, updated_at, name FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn list_users(&self, limit: i64) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, created_at, updated_at, name FROM users ORDER BY name LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(res.rows_affected())
    }

    async fn create_feed(&self, feed: NewFeed) -> StoreResult<Feed> {
        sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (url, name, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING url, name, user_id, created_at, updated_at, last_fetched_at
            "#,
        )
        .bind(&feed.url)
        .bind(&feed.name)
        .bind(feed.user_id)
        .bind(feed.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Option<Feed>> {
        sqlx::query_as::<_, Feed>(
            "SELECT url, name, user_id, created_at, updated_at, last_fetched_at FROM feeds WHERE url = $1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_feeds(&self) -> StoreResult<Vec<Feed>> {
        sqlx::query_as::<_, Feed>(
            "SELECT url, name, user_id, created_at, updated_at, last_fetched_at FROM feeds ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_feed_follow(&self, follow: NewFeedFollow) -> StoreResult<FeedFollow> {
        sqlx::query_as::<_, FeedFollow>(
            r#"
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_url)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, user_id, feed_url
            "#,
        )
        .bind(follow.id)
        .bind(follow.created_at)
        .bind(follow.user_id)
        .bind(&follow.feed_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_follows_for_user(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>> {
        sqlx::query_as::<_, FollowedFeed>(
            r#"
            SELECT ff.id, ff.created_at, ff.user_id, ff.feed_url, f.name AS feed_name
            FROM feed_follows ff
            JOIN feeds f ON f.url = ff.feed_url
            WHERE ff.user_id = $1
            ORDER BY ff.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_follow(&self, user_id: Uuid, feed_url: &str) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_url = $2")
            .bind(user_id)
            .bind(feed_url)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(res.rows_affected())
    }
}
