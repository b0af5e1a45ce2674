use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    Feed, FeedFollow, FollowedFeed, NewFeed, NewFeedFollow, NewPost, NewUser, Post, Store, StoreError,
    StoreResult, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    feeds: Vec<Feed>,
    follows: Vec<FeedFollow>,
    posts: Vec<Post>,
}

/// In-process store with the same uniqueness and ordering rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.tables.lock().unwrap().posts.clone()
    }

    pub fn follows(&self) -> Vec<FeedFollow> {
        self.tables.lock().unwrap().follows.clone()
    }

    pub fn set_last_fetched(&self, url: &str, at: Option<chrono::DateTime<Utc>>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(feed) = t.feeds.iter_mut().find(|f| f.url == url) {
            feed.last_fetched_at = at;
        }
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation { constraint: constraint.to_string() }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_next_feed_to_fetch(&self) -> StoreResult<Option<Feed>> {
        let t = self.tables.lock().unwrap();
        // None < Some(_) matches NULLS FIRST
        Ok(t.feeds.iter().min_by_key(|f| f.last_fetched_at).cloned())
    }

    async fn mark_feed_fetched(&self, url: &str) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(feed) = t.feeds.iter_mut().find(|f| f.url == url) {
            feed.last_fetched_at = Some(now);
            feed.updated_at = now;
        }
        Ok(())
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut t = self.tables.lock().unwrap();
        if t.posts.iter().any(|p| p.feed_url == post.feed_url && p.title == post.title && p.url == post.url) {
            return Err(unique("posts_feed_title_url_key"));
        }
        let row = Post {
            id: post.id,
            created_at: post.created_at,
            updated_at: post.created_at,
            title: post.title,
            url: post.url,
            description: post.description,
            published_at: post.published_at,
            feed_url: post.feed_url,
        };
        t.posts.push(row.clone());
        Ok(row)
    }

    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<Post>> {
        let t = self.tables.lock().unwrap();
        let followed: Vec<&str> = t.follows.iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.feed_url.as_str())
            .collect();
        let mut posts: Vec<Post> = t.posts.iter()
            .filter(|p| followed.contains(&p.feed_url.as_str()))
            .cloned()
            .collect();
        // newest first; None sorts below Some so undated posts land last
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.name == user.name) {
            return Err(unique("users_name_key"));
        }
        let row = User { id: user.id, created_at: user.created_at, updated_at: user.created_at, name: user.name };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().unwrap().users.iter().find(|u| u.name == name).cloned())
    }

    async fn list_users(&self, limit: i64) -> StoreResult<Vec<User>> {
        let t = self.tables.lock().unwrap();
        let mut users = t.users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let n = t.users.len() as u64;
        *t = Tables::default();
        Ok(n)
    }

    async fn create_feed(&self, feed: NewFeed) -> StoreResult<Feed> {
        let mut t = self.tables.lock().unwrap();
        if t.feeds.iter().any(|f| f.url == feed.url) {
            return Err(unique("feeds_pkey"));
        }
        let row = Feed {
            url: feed.url,
            name: feed.name,
            user_id: feed.user_id,
            created_at: feed.created_at,
            updated_at: feed.created_at,
            last_fetched_at: None,
        };
        t.feeds.push(row.clone());
        Ok(row)
    }

    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Option<Feed>> {
        Ok(self.tables.lock().unwrap().feeds.iter().find(|f| f.url == url).cloned())
    }

    async fn list_feeds(&self) -> StoreResult<Vec<Feed>> {
        Ok(self.tables.lock().unwrap().feeds.clone())
    }

    async fn create_feed_follow(&self, follow: NewFeedFollow) -> StoreResult<FeedFollow> {
        let mut t = self.tables.lock().unwrap();
        if t.follows.iter().any(|f| f.user_id == follow.user_id && f.feed_url == follow.feed_url) {
            return Err(unique("feed_follows_user_feed_key"));
        }
        let row = FeedFollow {
            id: follow.id,
            created_at: follow.created_at,
            updated_at: follow.created_at,
            user_id: follow.user_id,
            feed_url: follow.feed_url,
        };
        t.follows.push(row.clone());
        Ok(row)
    }

    async fn list_follows_for_user(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>> {
        let t = self.tables.lock().unwrap();
        let rows = t.follows.iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| {
                t.feeds.iter().find(|feed| feed.url == f.feed_url).map(|feed| FollowedFeed {
                    id: f.id,
                    created_at: f.created_at,
                    user_id: f.user_id,
                    feed_url: f.feed_url.clone(),
                    feed_name: feed.name.clone(),
                })
            })
            .collect();
        Ok(rows)
    }

    async fn delete_follow(&self, user_id: Uuid, feed_url: &str) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.follows.len();
        t.follows.retain(|f| !(f.user_id == user_id && f.feed_url == feed_url));
        Ok((before - t.follows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seed_feed(store: &MemoryStore, user: &User, url: &str) {
        store.create_feed(NewFeed::new(url, url, user.id)).await.unwrap();
    }

    #[tokio::test]
    async fn next_feed_prefers_never_fetched_then_oldest() {
        let store = MemoryStore::new();
        let user = store.create_user(NewUser::new("kahya")).await.unwrap();
        seed_feed(&store, &user, "https://a.example/rss").await;
        seed_feed(&store, &user, "https://b.example/rss").await;
        seed_feed(&store, &user, "https://c.example/rss").await;

        let now = Utc::now();
        store.set_last_fetched("https://a.example/rss", Some(now - Duration::hours(1)));
        store.set_last_fetched("https://b.example/rss", Some(now - Duration::hours(3)));

        let next = store.get_next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.url, "https://c.example/rss");

        store.mark_feed_fetched("https://c.example/rss").await.unwrap();
        let next = store.get_next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.url, "https://b.example/rss");
    }

    #[tokio::test]
    async fn duplicate_follow_is_a_unique_violation() {
        let store = MemoryStore::new();
        let user = store.create_user(NewUser::new("lane")).await.unwrap();
        seed_feed(&store, &user, "https://blog.example/index.xml").await;

        store.create_feed_follow(NewFeedFollow::new(user.id, "https://blog.example/index.xml")).await.unwrap();
        let err = store
            .create_feed_follow(NewFeedFollow::new(user.id, "https://blog.example/index.xml"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.follows().len(), 1);
    }
}
