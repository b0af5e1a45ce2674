use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, StatusCode};
use thiserror::Error;
use url::{Host, Url};

use super::parse;
use super::types::RawFeed;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 5;
pub const MAX_FEED_BYTES: u64 = 10 * 1024 * 1024;
const USER_AGENT: &str = concat!("gator/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("only http and https URLs are allowed, got {0:?}")]
    UnsupportedScheme(String),
    #[error("refusing to fetch loopback address {0:?}")]
    Forbidden(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("feed too large: {0} bytes (max 10 MiB)")]
    TooLarge(u64),
    #[error("malformed feed XML: {0}")]
    Parse(String),
}

/// Reject anything that is not a plain http(s) URL pointing away from this host.
/// Runs before any network I/O.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl { url: raw.to_string(), reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }
    let forbidden = match url.host() {
        None => return Err(FetchError::InvalidUrl { url: raw.to_string(), reason: "missing host".to_string() }),
        Some(Host::Domain(d)) => {
            let d = d.trim_end_matches('.').to_ascii_lowercase();
            d == "localhost" || d.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_local_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_local_ip(IpAddr::V6(ip)),
    };
    if forbidden {
        return Err(FetchError::Forbidden(url.host_str().unwrap_or_default().to_string()));
    }
    Ok(url)
}

/// Loopback and unspecified addresses, including their IPv4-mapped IPv6 forms.
fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback() || v4.is_unspecified())
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn public_addrs(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<SocketAddr> {
    addrs.into_iter().filter(|a| !is_local_ip(a.ip())).collect()
}

// Drops local addresses from DNS answers so a public-looking name cannot point at this host.
struct PublicResolver;

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let found = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|e| -> BoxError { Box::new(e) })?;
            let public = public_addrs(found);
            if public.is_empty() {
                return Err(Box::new(FetchError::Forbidden(host)) as BoxError);
            }
            let addrs: Addrs = Box::new(public.into_iter());
            Ok::<Addrs, BoxError>(addrs)
        })
    }
}

// Every hop is held to the same rules as the URL the user gave.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("too many redirects (max {MAX_REDIRECTS})"));
        }
        match validate_url(attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(err) => attempt.error(err),
        }
    })
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(redirect_policy())
        .dns_resolver(Arc::new(PublicResolver))
        .user_agent(USER_AGENT)
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawFeed, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self { client: client_builder(timeout).build()? })
    }

    async fn fetch_rss(&self, url: Url) -> Result<Bytes, FetchError> {
        let mut res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }
        if let Some(len) = res.content_length() {
            if len > MAX_FEED_BYTES { return Err(FetchError::TooLarge(len)); }
        }
        // the header may be absent or wrong, so count what actually arrives
        let mut body = BytesMut::new();
        while let Some(chunk) = res.chunk().await? {
            let total = (body.len() + chunk.len()) as u64;
            if total > MAX_FEED_BYTES { return Err(FetchError::TooLarge(total)); }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeed, FetchError> {
        let url = validate_url(url)?;
        let xml = self.fetch_rss(url).await?;
        parse::parse_channel(&xml)
    }
}
