use std::collections::HashMap;

use super::{Command, CommandError, Handler, State};

/// Command name → handler. Registering a name twice replaces the earlier handler.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl Registry {
    pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError> {
        let handler = self
            .handlers
            .get(&cmd.name)
            .ok_or_else(|| CommandError::CommandNotFound(cmd.name.clone()))?;
        handler.run(state, cmd).await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use tempfile::tempdir;

    use super::*;
    use crate::commands::testing::{cmd, state};

    struct Spy(Rc<Cell<usize>>);

    #[async_trait(?Send)]
    impl Handler for Spy {
        async fn run(&self, _state: &mut State, _cmd: &Command) -> Result<(), CommandError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let dir = tempdir().unwrap();
        let (mut st, _) = state(dir.path(), "");
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let mut registry = Registry::default();
        registry.register("x", Spy(first.clone()));
        registry.register("x", Spy(second.clone()));
        registry.dispatch(&mut st, &cmd("x", &[])).await.unwrap();

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(registry.names(), vec!["x"]);
    }

    #[tokio::test]
    async fn unknown_command_is_named_in_the_error() {
        let dir = tempdir().unwrap();
        let (mut st, _) = state(dir.path(), "");
        let registry = Registry::default();

        let err = registry.dispatch(&mut st, &cmd("frobnicate", &[])).await.unwrap_err();
        assert!(matches!(&err, CommandError::CommandNotFound(name) if name == "frobnicate"));
        assert!(err.to_string().contains("frobnicate"));
        assert!(!registry.contains("frobnicate"));
    }
}
