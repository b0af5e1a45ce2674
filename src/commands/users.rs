use async_trait::async_trait;

use super::types::UserRow;
use super::{Command, CommandError, Handler, State};
use crate::store::NewUser;
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::users::Phase as UsersPhase;

const LIST_LIMIT: i64 = 10;

pub struct Login;

#[async_trait(?Send)]
impl Handler for Login {
    async fn run(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError> {
        let log = telemetry::users();
        let _g = log.span(&UsersPhase::Login).entered();
        let name = cmd.arg(0, "login <name>")?;

        if state.store.get_user_by_name(name).await?.is_none() {
            return Err(CommandError::NotFound(format!("user {name:?} not found")));
        }
        state.config.set_user(name)?;
        log.debug(format!("config written to {}", state.config.path().display()));
        println!("Logged in as {name}");
        Ok(())
    }
}

pub struct Register;

#[async_trait(?Send)]
impl Handler for Register {
    async fn run(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError> {
        let log = telemetry::users();
        let _g = log.span(&UsersPhase::Register).entered();
        let name = cmd.arg(0, "register <name>")?;
        let exists = || CommandError::Validation(format!("user {name:?} already exists"));

        if state.store.get_user_by_name(name).await?.is_some() {
            return Err(exists());
        }
        let user = match state.store.create_user(NewUser::new(name)).await {
            Ok(user) => user,
            Err(err) if err.is_unique_violation() => return Err(exists()),
            Err(err) => return Err(err.into()),
        };
        log.debug_kv("➕ user", [("id", user.id.to_string()), ("name", user.name.clone())]);
        state.config.set_user(&user.name)?;
        println!("Registered user: {}", user.name);
        println!("Logged in as {}", user.name);
        Ok(())
    }
}

pub struct Reset;

#[async_trait(?Send)]
impl Handler for Reset {
    async fn run(&self, state: &mut State, _cmd: &Command) -> Result<(), CommandError> {
        let log = telemetry::users();
        let _g = log.span(&UsersPhase::Reset).entered();
        let removed = state.store.delete_all_users().await?;
        log.info(format!("🧹 removed {removed} user(s) with their feeds, follows and posts"));
        println!("Users cleared");
        Ok(())
    }
}

pub struct ListUsers;

#[async_trait(?Send)]
impl Handler for ListUsers {
    async fn run(&self, state: &mut State, _cmd: &Command) -> Result<(), CommandError> {
        let log = telemetry::users();
        let _g = log.span(&UsersPhase::List).entered();
        let current = state.config.current_user();
        let rows: Vec<UserRow> = state.store.list_users(LIST_LIMIT).await?
            .into_iter()
            .map(|u| UserRow { current: Some(u.name.as_str()) == current, name: u.name })
            .collect();

        if telemetry::config::json_mode() {
            log.result(&rows, Some(Meta { duration_ms: None, user: current.map(str::to_string) }))?;
            return Ok(());
        }
        for row in &rows {
            if row.current { println!("* {} (current)", row.name); } else { println!("* {}", row.name); }
        }
        Ok(())
    }
}
