use async_trait::async_trait;

use super::{Command, CommandError, Handler, State};
use crate::ingestion::run_cycle;
use crate::ingestion::scheduler::Scheduler;

/// `agg <interval>`: collect feeds forever, one feed per tick.
pub struct Agg;

#[async_trait(?Send)]
impl Handler for Agg {
    async fn run(&self, state: &mut State, cmd: &Command) -> Result<(), CommandError> {
        let raw = cmd.arg(0, "agg <interval>")?;
        let scheduler = Scheduler::parse(raw).map_err(|e| CommandError::Validation(e.to_string()))?;
        println!("Collecting feeds every {:?}", scheduler.interval());

        let store = state.store.as_ref();
        let source = state.source.as_ref();
        scheduler.run(|| run_cycle(store, source)).await?;
        Ok(())
    }
}
