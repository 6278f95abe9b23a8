//! Displayable posts and the media-format filter.
//!
//! Only posts linking to `.gifv` or `.webm` media survive; their URL is
//! rewritten to the `.mp4` rendition, which every host serving those formats
//! also exposes and which plays inline everywhere.

use chrono::{DateTime, Utc};

use crate::source::{RawPage, RawPost};

const SOURCE_EXTENSIONS: [&str; 2] = [".gifv", ".webm"];
const PLAYABLE_EXTENSION: &str = ".mp4";

/// A post that passed the media-format filter.
///
/// `media_url` never contains `.gifv` or `.webm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub media_url: String,
    /// Still image shown before playback; empty when the API had no preview.
    pub snapshot_url: String,
    pub title: Option<String>,
    pub permalink: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Apply the media-format filter to one raw post.
    pub fn from_raw(raw: &RawPost) -> Option<Self> {
        if !is_convertible_media(&raw.url) {
            return None;
        }

        Some(Self {
            id: raw.id.clone(),
            media_url: to_playable(&raw.url),
            snapshot_url: raw
                .first_preview_url()
                .map(|url| url.replace("&amp;", "&"))
                .unwrap_or_default(),
            title: raw.title.clone(),
            permalink: raw.permalink.clone(),
            created_at: raw.created_at(),
        })
    }

    /// Link to the comment thread on `site_base` (e.g. `https://www.reddit.com`).
    pub fn comments_url(&self, site_base: &str) -> Option<String> {
        self.permalink
            .as_deref()
            .map(|p| format!("{}{p}", site_base.trim_end_matches('/')))
    }
}

pub fn is_convertible_media(url: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| url.contains(ext))
}

/// Rewrite every `.gifv`/`.webm` occurrence to `.mp4`.
pub fn to_playable(url: &str) -> String {
    SOURCE_EXTENSIONS
        .iter()
        .fold(url.to_string(), |acc, ext| acc.replace(ext, PLAYABLE_EXTENSION))
}

/// Result of filtering one raw page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredPage {
    /// At most `per_page` posts, in raw-response order.
    pub posts: Vec<Post>,
    /// Where the next request should start, or `None` to keep the current cursor.
    pub next_cursor: Option<String>,
}

/// Filter `page` down to at most `per_page` posts and pick the next cursor.
///
/// Evaluation stops at the `per_page`-th match; later children are never
/// looked at.  When the page filled up, the cursor points at that last match
/// so the next request resumes right after the consumed content.  Otherwise
/// it points at the last raw child so low-yield pages still move forward.
/// An empty page leaves the cursor alone.
pub fn filter_page(page: &RawPage, per_page: usize) -> FilteredPage {
    let mut posts = Vec::with_capacity(per_page.min(page.children.len()));
    let mut last_match: Option<&RawPost> = None;

    for raw in &page.children {
        if posts.len() >= per_page {
            break;
        }
        if let Some(post) = Post::from_raw(raw) {
            posts.push(post);
            last_match = Some(raw);
        }
    }

    let next_cursor = if posts.len() >= per_page {
        last_match.map(|raw| raw.cursor_token().to_string())
    } else {
        page.children.last().map(|raw| raw.cursor_token().to_string())
    };

    FilteredPage { posts, next_cursor }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
