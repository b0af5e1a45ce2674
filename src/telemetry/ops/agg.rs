use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Agg;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Cycle, SelectFeed, MarkFetched, FetchRss, WritePost }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Cycle => "cycle",
        Phase::SelectFeed => "select_feed",
        Phase::MarkFetched => "mark_fetched",
        Phase::FetchRss => "fetch_rss",
        Phase::WritePost => "write_post",
    }}
    fn span(&self) -> Span { match self {
        Phase::Cycle => info_span!("cycle"),
        Phase::SelectFeed => info_span!("select_feed"),
        Phase::MarkFetched => info_span!("mark_fetched"),
        Phase::FetchRss => info_span!("fetch_rss"),
        Phase::WritePost => info_span!("write_post"),
    }}
}

impl OpMarker for Agg {
    const NAME: &'static str = "agg";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("agg") }
}
