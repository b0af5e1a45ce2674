use std::collections::HashMap;

use async_trait::async_trait;

use super::types::FeedRow;
use super::{Command, CommandError, Handler, State, UserHandler};
use crate::ingestion::fetch::{validate_url, FetchError};
use crate::store::{NewFeed, NewFeedFollow, User};
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::feeds::Phase as FeedsPhase;

/// Registers a feed and follows it. A URL someone already added is followed instead.
pub struct AddFeed;

#[async_trait(?Send)]
impl UserHandler for AddFeed {
    async fn run(&self, state: &mut State, cmd: &Command, user: User) -> Result<(), CommandError> {
        let log = telemetry::feeds();
        let name = cmd.arg(0, "addfeed <name> <url>")?;
        let raw_url = cmd.arg(1, "addfeed <name> <url>")?;
        let _g = log.span_kv(&FeedsPhase::Add, [("name", name.to_string()), ("url", raw_url.to_string())]).entered();

        // the user's spelling stays the natural key
        validate_url(raw_url).map_err(|err| match err {
            FetchError::Forbidden(_) => CommandError::Fetch(err),
            other => CommandError::Validation(other.to_string()),
        })?;

        let feed = match state.store.create_feed(NewFeed::new(name, raw_url, user.id)).await {
            Ok(feed) => Some(feed),
            Err(err) if err.is_unique_violation() => None,
            Err(err) => return Err(err.into()),
        };
        let created = feed.is_some();

        match state.store.create_feed_follow(NewFeedFollow::new(user.id, raw_url)).await {
            Ok(_) => {}
            Err(err) if err.is_unique_violation() => {
                println!("Already following this feed");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        match feed {
            Some(feed) => {
                log.debug_kv("➕ feed", [("url", feed.url.clone()), ("user", user.name.clone())]);
                println!("Feed created:");
                println!("  Name: {}", feed.name);
                println!("  URL:  {}", feed.url);
                println!("  User: {}", user.name);
            }
            None => println!("Feed already exists - followed"),
        }
        log.info(format!("📌 {} now follows {raw_url} (new feed: {created})", user.name));
        Ok(())
    }
}

pub struct ListFeeds;

#[async_trait(?Send)]
impl Handler for ListFeeds {
    async fn run(&self, state: &mut State, _cmd: &Command) -> Result<(), CommandError> {
        let log = telemetry::feeds();
        let _g = log.span(&FeedsPhase::List).entered();

        let feeds = state.store.list_feeds().await?;
        let mut owners: HashMap<uuid::Uuid, Option<String>> = HashMap::new();
        let mut rows = Vec::with_capacity(feeds.len());
        for feed in feeds {
            if !owners.contains_key(&feed.user_id) {
                let owner = state.store.get_user(feed.user_id).await?.map(|u| u.name);
                owners.insert(feed.user_id, owner);
            }
            rows.push(FeedRow {
                name: feed.name,
                url: feed.url,
                user: owners.get(&feed.user_id).cloned().flatten(),
                last_fetched_at: feed.last_fetched_at,
            });
        }

        if telemetry::config::json_mode() {
            log.result(&rows, Some(Meta { duration_ms: None, user: state.config.current_user().map(str::to_string) }))?;
            return Ok(());
        }
        if rows.is_empty() {
            println!("No feeds yet. Add one with `gator addfeed <name> <url>`");
        }
        for row in &rows {
            println!("* {}", row.name);
            println!("  URL:  {}", row.url);
            println!("  User: {}", row.user.as_deref().unwrap_or("<unknown>"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::commands::logged_in;
    use crate::commands::testing::{cmd, state};
    use crate::store::{NewUser, Store};

    const URL: &str = "https://blog.boot.dev/index.xml";

    #[tokio::test]
    async fn addfeed_creates_feed_and_follow() {
        let dir = tempdir().unwrap();
        let (mut st, store) = state(dir.path(), "kahya");
        let user = store.create_user(NewUser::new("kahya")).await.unwrap();

        logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["Boot.dev", URL])).await.unwrap();

        let feed = store.get_feed_by_url(URL).await.unwrap().unwrap();
        assert_eq!(feed.user_id, user.id);
        assert_eq!(feed.last_fetched_at, None);
        let follows = store.follows();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].user_id, user.id);
    }

    #[tokio::test]
    async fn existing_feed_is_followed_instead() {
        let dir = tempdir().unwrap();
        let (mut st, store) = state(dir.path(), "lane");
        let owner = store.create_user(NewUser::new("kahya")).await.unwrap();
        let lane = store.create_user(NewUser::new("lane")).await.unwrap();
        store.create_feed(NewFeed::new("Boot.dev", URL, owner.id)).await.unwrap();

        logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["Mine", URL])).await.unwrap();
        logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["Mine", URL])).await.unwrap();

        assert_eq!(store.list_feeds().await.unwrap().len(), 1);
        assert_eq!(store.get_feed_by_url(URL).await.unwrap().unwrap().name, "Boot.dev");
        let follows = store.follows();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].user_id, lane.id);
    }

    #[tokio::test]
    async fn loopback_and_malformed_urls_are_rejected() {
        let dir = tempdir().unwrap();
        let (mut st, store) = state(dir.path(), "kahya");
        store.create_user(NewUser::new("kahya")).await.unwrap();

        let err = logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["local", "http://127.0.0.1:8080/rss"])).await.unwrap_err();
        assert!(matches!(err, CommandError::Fetch(FetchError::Forbidden(_))));
        let err = logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["bad", "not a url"])).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
        let err = logged_in(AddFeed).run(&mut st, &cmd("addfeed", &["only-name"])).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(msg) if msg.contains("addfeed <name> <url>")));

        assert!(store.list_feeds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feeds_lists_without_login() {
        let dir = tempdir().unwrap();
        let (mut st, store) = state(dir.path(), "");
        let owner = store.create_user(NewUser::new("kahya")).await.unwrap();
        store.create_feed(NewFeed::new("Boot.dev", URL, owner.id)).await.unwrap();

        ListFeeds.run(&mut st, &cmd("feeds", &[])).await.unwrap();
    }
}
