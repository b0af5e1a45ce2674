use html_escape::decode_html_entities;
use rss::{Channel, Item};

use super::fetch::FetchError;
use super::types::{RawFeed, RawItem};

pub fn parse_channel(xml: &[u8]) -> Result<RawFeed, FetchError> {
    let ch = Channel::read_from(xml).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(RawFeed {
        title: unescape(ch.title()),
        link: ch.link().to_string(),
        description: unescape(ch.description()),
        items: ch.items().iter().map(raw_item).collect(),
    })
}

fn raw_item(item: &Item) -> RawItem {
    RawItem {
        title: unescape(item.title().unwrap_or("")),
        link: item.link().unwrap_or("").trim().to_string(),
        description: unescape(item.description().unwrap_or("")),
        pub_date: item.pub_date().map(|s| s.to_string()),
    }
}

// feeds often double-encode entities (&amp;amp;)
fn unescape(s: &str) -> String {
    decode_html_entities(s).into_owned()
}
