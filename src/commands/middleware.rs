use async_trait::async_trait;

use super::{Command, CommandError, Handler, State, UserHandler};
use crate::store::User;

/// Adapts a [`UserHandler`] into a plain [`Handler`] that first resolves the logged-in user.
pub struct LoggedIn<H> {
    inner: H,
}

pub fn logged_in<H: UserHandler>(inner: H) -> LoggedIn<H> {
    LoggedIn { inner }
}

/// The user named in the local config, looked up in the store.
pub async fn current_user(state: &State) -> Result<User, CommandError> {
    let Some(name) = state.config.current_user() else {
        return Err(CommandError::Unauthenticated(String::new()));
    };
    state
        .store
        .get_user_by_name(name)
        .await?
        .ok_or_else(|| CommandError::Unauthenticated(name.to_string()))
}

#[async_trait(?Send)]
impl<H: UserHandler> Handler for LoggedIn<H> {
    async fn run(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError> {
        let user = current_user(state).await?;
        self.inner.run(state, cmd, user).await
    }
}
