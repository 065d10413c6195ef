// src/source/mod.rs
pub mod legacy;
pub mod marker;
pub mod scrape;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT};
use url::Url;

use crate::listing::RawItem;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One configured search, tagged by upstream API generation. The query
/// parameters of the configured URL encode the search filters (city, rooms,
/// price range); each variant knows how to turn them into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// Current map-marker JSON API.
    MarkerApi { search_url: Url },
    /// Previous-generation feed JSON API.
    LegacyFeed { search_url: Url },
    /// Server-rendered search page, scraped with fixed selectors.
    HtmlScrape { page_url: Url },
}

impl SourceDescriptor {
    /// Classify a configured URL string. `mode=feed` / `mode=scrape` query
    /// hints (stripped before use) or a `feed.` host select the older
    /// variants; everything else is the marker API.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut url: Url = raw
            .parse()
            .with_context(|| format!("invalid source url: {raw}"))?;

        let mode = url
            .query_pairs()
            .find(|(k, _)| k == "mode")
            .map(|(_, v)| v.to_string());
        if mode.is_some() {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "mode")
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            url.query_pairs_mut().clear().extend_pairs(kept);
            if url.query() == Some("") {
                url.set_query(None);
            }
        }

        let feed_host = url
            .host_str()
            .is_some_and(|h| h.starts_with("feed."));

        match mode.as_deref() {
            Some("feed") => Ok(Self::LegacyFeed { search_url: url }),
            Some("scrape") => Ok(Self::HtmlScrape { page_url: url }),
            Some(other) => anyhow::bail!("unknown source mode: {other}"),
            None if feed_host => Ok(Self::LegacyFeed { search_url: url }),
            None => Ok(Self::MarkerApi { search_url: url }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarkerApi { .. } => "marker-api",
            Self::LegacyFeed { .. } => "legacy-feed",
            Self::HtmlScrape { .. } => "html-scrape",
        }
    }

    /// The URL shown in logs; never used for fetching directly.
    pub fn display_url(&self) -> &Url {
        match self {
            Self::MarkerApi { search_url } | Self::LegacyFeed { search_url } => search_url,
            Self::HtmlScrape { page_url } => page_url,
        }
    }
}

/// Fetch contract: given a descriptor, return raw items or an error. Errors
/// are returned, never panicked, so the pipeline can isolate them per source.
#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>>;
}

/// Real HTTP client covering all descriptor variants. Applies a fixed
/// pre-request delay to stay under upstream rate limits.
pub struct HttpSourceClient {
    client: reqwest::Client,
    api_url: Url,
    request_delay: Duration,
}

impl HttpSourceClient {
    pub fn new(api_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(upstream_headers())
            .timeout(Duration::from_secs(20))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            api_url,
            request_delay: Duration::from_secs(1),
        })
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Carry the search filters over to the marker API endpoint: the
    /// configured URL's query string is re-applied verbatim to API_URL.
    fn marker_request_url(&self, search_url: &Url) -> Url {
        let mut u = self.api_url.clone();
        u.set_query(search_url.query());
        u
    }
}

#[async_trait::async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<RawItem>> {
        tokio::time::sleep(self.request_delay).await;
        match source {
            SourceDescriptor::MarkerApi { search_url } => {
                let req_url = self.marker_request_url(search_url);
                let body = self
                    .client
                    .get(req_url)
                    .send()
                    .await
                    .context("marker api get")?
                    .error_for_status()
                    .context("marker api status")?
                    .text()
                    .await
                    .context("marker api body")?;
                marker::parse_response(&body)
            }
            SourceDescriptor::LegacyFeed { search_url } => {
                let body = self
                    .client
                    .get(search_url.clone())
                    .send()
                    .await
                    .context("legacy feed get")?
                    .error_for_status()
                    .context("legacy feed status")?
                    .text()
                    .await
                    .context("legacy feed body")?;
                legacy::parse_response(&body)
            }
            SourceDescriptor::HtmlScrape { page_url } => {
                let body = self
                    .client
                    .get(page_url.clone())
                    .send()
                    .await
                    .context("scrape get")?
                    .error_for_status()
                    .context("scrape status")?
                    .text()
                    .await
                    .context("scrape body")?;
                Ok(scrape::parse_page(&body))
            }
        }
    }
}

fn upstream_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("he-IL"));
    h.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    h.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    h
}
