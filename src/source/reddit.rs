//! Subreddit listing source over HTTP.
//!
//! Requests look like
//! `GET <api-base>/r/<subreddit><sort>/.json?limit=<n>[&after=<cursor>]`.
//! URL construction is a pure function ([`listing_url`]) so it can be tested
//! without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{PageSource, RawPage};
use crate::error::FetchError;
use crate::settings::FeedSettings;

const USER_AGENT: &str = concat!("gifscroll/", env!("CARGO_PKG_VERSION"));

/// Build the listing URL for one raw page.
///
/// `limit` is the raw page size, independent of `settings.per_page`, so the
/// filter has more candidates than it needs. The subreddit is appended as a
/// single percent-encoded path segment, so it can never add query pairs or a
/// fragment of its own.
pub fn listing_url(
    api_base: &str,
    settings: &FeedSettings,
    limit: u32,
    after: Option<&str>,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(api_base)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend([
            "r",
            settings.subreddit.as_str(),
            settings.sort.path().trim_start_matches('/'),
            ".json",
        ]);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("limit", &limit.to_string());
        if let Some(after) = after {
            query.append_pair("after", after);
        }
    }

    Ok(url.to_string())
}

/// Fetches listing pages with a shared [`reqwest::Client`].
pub struct RedditSource {
    client: Client,
}

impl RedditSource {
    /// Create a source whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for RedditSource {
    async fn fetch_page(&self, url: &str) -> Result<RawPage, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let page = RawPage::from_json(&body)?;
        debug!(url, children = page.children.len(), "fetched raw page");
        Ok(page)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
