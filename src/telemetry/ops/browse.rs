use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Browse;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ListPosts }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::ListPosts => "list_posts" } }
    fn span(&self) -> Span { match self { Phase::ListPosts => info_span!("list_posts") } }
}

impl OpMarker for Browse {
    const NAME: &'static str = "browse";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("browse") }
}
