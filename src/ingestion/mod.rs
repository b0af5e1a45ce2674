use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{NewPost, Store, StoreError};
use crate::telemetry::{self};
use crate::telemetry::config::sanitize;
use crate::telemetry::ops::agg::Phase as AggPhase;

pub mod dates;
pub mod fetch;
mod parse;
pub mod scheduler;
pub mod types;

use fetch::{FeedSource, FetchError};
use types::{CycleSummary, RawItem};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("fetching {url}: {source}")]
    Fetch { url: String, #[source] source: FetchError },
}

impl IngestError {
    /// Only losing the database ends the polling loop; everything else costs one cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            IngestError::Store(err) => err.is_connection_loss(),
            IngestError::Fetch { .. } => false,
        }
    }
}

/// One selection-fetch-ingest pass over the least recently fetched feed.
///
/// The feed is marked fetched before its document is requested, so a feed that keeps
/// failing rotates to the back of the queue instead of being retried every tick.
/// Returns `Ok(None)` when no feeds are registered.
pub async fn run_cycle(store: &dyn Store, source: &dyn FeedSource) -> Result<Option<CycleSummary>, IngestError> {
    let log = telemetry::agg();
    let _g = log.span(&AggPhase::Cycle).entered();

    let feed = { let _s = log.span(&AggPhase::SelectFeed).entered(); store.get_next_feed_to_fetch().await? };
    let Some(feed) = feed else {
        log.info("ℹ️  No feeds registered, nothing to fetch");
        return Ok(None);
    };
    log.info(format!("📡 Fetching {} ({})", feed.name, feed.url));

    { let _s = log.span(&AggPhase::MarkFetched).entered(); store.mark_feed_fetched(&feed.url).await?; }

    let doc = {
        let _s = log.span_kv(&AggPhase::FetchRss, [("url", feed.url.clone())]).entered();
        source.fetch(&feed.url).await.map_err(|source| IngestError::Fetch { url: feed.url.clone(), source })?
    };

    log.debug_kv("📰 channel", [("title", sanitize(&doc.title)), ("link", sanitize(&doc.link)), ("description", sanitize(&doc.description))]);

    let mut summary = CycleSummary { feed_url: feed.url.clone(), items: doc.items.len(), ..Default::default() };
    for item in doc.items {
        let _w = log.span(&AggPhase::WritePost).entered();
        let post = new_post(&feed.url, item, &mut summary);
        let title = post.title.clone();
        match store.create_post(post).await {
            Ok(_) => { summary.inserted += 1; log.debug_kv("➕ insert", [("title", title)]); }
            Err(err) if err.is_unique_violation() => { summary.skipped += 1; log.debug_kv("↩️ skip", [("title", title)]); }
            Err(err) => return Err(err.into()),
        }
    }

    log.cycle_summary(&summary);
    Ok(Some(summary))
}

fn new_post(feed_url: &str, item: RawItem, summary: &mut CycleSummary) -> NewPost {
    let published_at = match item.pub_date.as_deref().map(dates::parse_published) {
        Some(Ok(dt)) => Some(dt),
        Some(Err(err)) => {
            // keep the post, drop the timestamp
            if !err.raw.is_empty() {
                telemetry::agg().warn_kv("⚠️ unparseable pubDate", [("raw", sanitize(&err.raw)), ("link", sanitize(&item.link))]);
            }
            summary.undated += 1;
            None
        }
        None => { summary.undated += 1; None }
    };
    NewPost {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        title: item.title,
        url: item.link,
        description: item.description,
        published_at,
        feed_url: feed_url.to_string(),
    }
}
