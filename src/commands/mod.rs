use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::ingestion::fetch::{FeedSource, FetchError};
use crate::ingestion::IngestError;
use crate::store::{Store, StoreError, User};

mod agg;
mod browse;
mod feeds;
mod follows;
pub mod middleware;
pub mod registry;
mod types;
mod users;

pub use middleware::logged_in;
pub use registry::Registry;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("not logged in: no user named {0:?} (run `gator register <name>` or `gator login <name>`)")]
    Unauthenticated(String),
    #[error("command not found: {0:?}")]
    CommandNotFound(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

/// Everything a handler may touch, passed explicitly instead of living in globals.
pub struct State {
    pub store: Arc<dyn Store>,
    pub source: Arc<dyn FeedSource>,
    pub config: Config,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self { name: name.into(), args }
    }

    /// Positional argument `i`, or a usage error.
    pub fn arg(&self, i: usize, usage: &str) -> Result<&str, CommandError> {
        self.args
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| CommandError::Validation(format!("usage: gator {usage}")))
    }
}

#[async_trait(?Send)]
pub trait Handler {
    async fn run(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError>;
}

/// A handler that needs the logged-in user; wrap it with [`logged_in`] to register it.
#[async_trait(?Send)]
pub trait UserHandler {
    async fn run(&self, state: &mut State, cmd: &Command, user: User) -> Result<(), CommandError>;
}

/// The gator command table.
pub fn gator_commands() -> Registry {
    let mut r = Registry::default();
    r.register("login", users::Login);
    r.register("register", users::Register);
    r.register("reset", users::Reset);
    r.register("users", users::ListUsers);
    r.register("agg", agg::Agg);
    r.register("addfeed", logged_in(feeds::AddFeed));
    r.register("feeds", feeds::ListFeeds);
    r.register("follow", logged_in(follows::Follow));
    r.register("following", logged_in(follows::Following));
    r.register("unfollow", logged_in(follows::Unfollow));
    r.register("browse", logged_in(browse::Browse));
    r
}
