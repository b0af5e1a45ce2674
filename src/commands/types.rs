use chrono::{DateTime, Utc};
use serde::Serialize;

// JSON result views for the list commands
#[derive(Serialize)]
pub struct UserRow { pub name: String, pub current: bool }

#[derive(Serialize)]
pub struct FeedRow { pub name: String, pub url: String, pub user: Option<String>, pub last_fetched_at: Option<DateTime<Utc>> }

#[derive(Serialize)]
pub struct FollowRow { pub feed_name: String, pub feed_url: String }
