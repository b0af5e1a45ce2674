use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Follows;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Follow, List, Unfollow }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Follow => "follow", Phase::List => "list", Phase::Unfollow => "unfollow" } }
    fn span(&self) -> Span { match self { Phase::Follow => info_span!("follow"), Phase::List => info_span!("list"), Phase::Unfollow => info_span!("unfollow") } }
}

impl OpMarker for Follows {
    const NAME: &'static str = "follows";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("follows") }
}
