//! Raw listing records exactly as the content API returns them.
//!
//! A listing response has the shape
//! `{ "data": { "children": [ { "data": { ... } } ] } }`.  Only the fields the
//! feed engine reads are modelled; everything else in the payload is ignored.
//! `id` and `url` are required, so a child without them makes the whole page
//! fail to parse.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One API response, unwrapped down to its ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub children: Vec<RawPost>,
}

impl RawPage {
    pub fn new(children: Vec<RawPost>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Parse a listing body into a page.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let listing: Listing = serde_json::from_slice(body)?;
        Ok(listing.into())
    }
}

/// A candidate post before the media-format filter has looked at it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPost {
    /// Short id (e.g. `abc123`).
    pub id: String,

    /// Fullname (e.g. `t3_abc123`), the token the API expects in `after=`.
    #[serde(default)]
    pub name: Option<String>,

    /// Link target; the media URL for image/video posts.
    pub url: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Site-relative path to the comment thread.
    #[serde(default)]
    pub permalink: Option<String>,

    /// Creation time as fractional unix seconds.
    #[serde(default)]
    pub created_utc: Option<f64>,

    #[serde(default)]
    pub preview: Option<Preview>,
}

impl RawPost {
    /// Token to send as `after=` when this post is the last one consumed.
    pub fn cursor_token(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Source URL of the first preview image, still HTML-escaped.
    pub fn first_preview_url(&self) -> Option<&str> {
        self.preview
            .as_ref()
            .and_then(|p| p.images.first())
            .map(|img| img.source.url.as_str())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_utc
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewImage {
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageSource {
    pub url: String,
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: RawPost,
}

impl From<Listing> for RawPage {
    fn from(listing: Listing) -> Self {
        Self {
            children: listing.data.children.into_iter().map(|c| c.data).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
