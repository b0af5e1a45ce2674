use async_trait::async_trait;

use super::{Command, CommandError, State, UserHandler};
use crate::store::User;
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::browse::Phase as BrowsePhase;

const DEFAULT_LIMIT: i64 = 2;

pub struct Browse;

fn parse_limit(raw: Option<&str>) -> Result<i64, CommandError> {
    let Some(raw) = raw else { return Ok(DEFAULT_LIMIT) };
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::Validation(format!("limit must be a positive integer, got {raw:?}"))),
    }
}

#[async_trait(?Send)]
impl UserHandler for Browse {
    async fn run(&self, state: &mut State, cmd: &Command, user: User) -> Result<(), CommandError> {
        let log = telemetry::browse();
        let limit = parse_limit(cmd.args.first().map(String::as_str))?;
        let _g = log.span_kv(&BrowsePhase::ListPosts, [("user", user.name.clone()), ("limit", limit.to_string())]).entered();

        let posts = state.store.list_posts_for_user(user.id, limit).await?;
        log.debug(format!("{} post(s) for {}", posts.len(), user.name));

        if telemetry::config::json_mode() {
            log.result(&posts, Some(Meta { duration_ms: None, user: Some(user.name) }))?;
            return Ok(());
        }
        if posts.is_empty() {
            println!("No posts yet. Follow a feed and run `gator agg` to collect some.");
        }
        for post in &posts {
            let published = post.published_at.map(|d| d.format("%a %b %e %Y").to_string()).unwrap_or_else(|| "undated".to_string());
            println!("{} from {}", published, post.feed_url);
            println!("--- {} ---", post.title);
            if !post.description.is_empty() {
                println!("    {}", post.description);
            }
            println!("Link: {}", post.url);
            println!("=====================================");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::*;
    use crate::commands::testing::{cmd, state};
    use crate::commands::{logged_in, Handler};
    use crate::store::{NewFeed, NewFeedFollow, NewPost, NewUser, Store};

    #[test]
    fn limit_defaults_to_two_and_must_be_positive() {
        assert_eq!(parse_limit(None).unwrap(), 2);
        assert_eq!(parse_limit(Some("10")).unwrap(), 10);
        assert!(matches!(parse_limit(Some("0")), Err(CommandError::Validation(_))));
        assert!(matches!(parse_limit(Some("-3")), Err(CommandError::Validation(_))));
        assert!(matches!(parse_limit(Some("abc")), Err(CommandError::Validation(_))));
    }

    fn post(feed_url: &str, title: &str, day: Option<u32>) -> NewPost {
        NewPost {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: title.to_string(),
            url: format!("{feed_url}/{title}"),
            description: String::new(),
            published_at: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()),
            feed_url: feed_url.to_string(),
        }
    }

    #[tokio::test]
    async fn browse_shows_only_followed_posts_newest_first() {
        let dir = tempdir().unwrap();
        let (mut st, store) = state(dir.path(), "lane");
        let lane = store.create_user(NewUser::new("lane")).await.unwrap();
        store.create_feed(NewFeed::new("a", "https://a.example/rss", lane.id)).await.unwrap();
        store.create_feed(NewFeed::new("b", "https://b.example/rss", lane.id)).await.unwrap();
        store.create_feed_follow(NewFeedFollow::new(lane.id, "https://a.example/rss")).await.unwrap();

        store.create_post(post("https://a.example/rss", "old", Some(1))).await.unwrap();
        store.create_post(post("https://a.example/rss", "undated", None)).await.unwrap();
        store.create_post(post("https://a.example/rss", "new", Some(9))).await.unwrap();
        store.create_post(post("https://b.example/rss", "elsewhere", Some(20))).await.unwrap();

        let posts = store.list_posts_for_user(lane.id, 2).await.unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);

        logged_in(Browse).run(&mut st, &cmd("browse", &[])).await.unwrap();
        let err = logged_in(Browse).run(&mut st, &cmd("browse", &["abc"])).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }
}
