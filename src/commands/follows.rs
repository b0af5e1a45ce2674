use async_trait::async_trait;

use super::types::FollowRow;
use super::{Command, CommandError, State, UserHandler};
use crate::store::{NewFeedFollow, User};
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::follows::Phase as FollowsPhase;

pub struct Follow;

#[async_trait(?Send)]
impl UserHandler for Follow {
    async fn run(&self, state: &mut State, cmd: &Command, user: User) -> Result<(), CommandError> {
        let log = telemetry::follows();
        let url = cmd.arg(0, "follow <url>")?;
        let _g = log.span_kv(&FollowsPhase::Follow, [("url", url.to_string())]).entered();

        let Some(feed) = state.store.get_feed_by_url(url).await? else {
            return Err(CommandError::NotFound(format!("no feed with URL {url:?} (add it with `gator addfeed`)")));
        };
        match state.store.create_feed_follow(NewFeedFollow::new(user.id, &feed.url)).await {
            Ok(_) => println!("{} now follows {}", user.name, feed.name),
            Err(err) if err.is_unique_violation() => println!("Already following this feed"),
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}

pub struct Following;

#[async_trait(?Send)]
impl UserHandler for Following {
    async fn run(&self, state: &mut State, _cmd: &Command, user: User) -> Result<(), CommandError> {
        let log = telemetry::follows();
        let _g = log.span(&FollowsPhase::List).entered();

        let rows: Vec<FollowRow> = state.store.list_follows_for_user(user.id).await?
            .into_iter()
            .map(|f| FollowRow { feed_name: f.feed_name, feed_url: f.feed_url })
            .collect();

        if telemetry::config::json_mode() {
            log.result(&rows, Some(Meta { duration_ms: None, user: Some(user.name) }))?;
            return Ok(());
        }
        if rows.is_empty() {
            println!("{} is not following any feeds", user.name);
        }
        for row in &rows {
            println!("* {}", row.feed_name);
        }
        Ok(())
    }
}

pub struct Unfollow;

#[async_trait(?Send)]
impl UserHandler for Unfollow {
    async fn run(&self, state: &mut State, cmd: &Command, user: User) -> Result<(), CommandError> {
        let log = telemetry::follows();
        let url = cmd.arg(0, "unfollow <url>")?;
        let _g = log.span_kv(&FollowsPhase::Unfollow, [("url", url.to_string())]).entered();

        if state.store.delete_follow(user.id, url).await? == 0 {
            return Err(CommandError::NotFound(format!("{} is not following {url:?}", user.name)));
        }
        println!("Unfollowed {url}");
        Ok(())
    }
}
