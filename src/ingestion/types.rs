use serde::Serialize;

// Parsed channel, only alive for one fetch-and-ingest cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: Option<String>,
}

// Result envelope for one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary { pub feed_url: String, pub items: usize, pub inserted: usize, pub skipped: usize, pub undated: usize }
