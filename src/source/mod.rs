//! Page source abstraction layer.
//!
//! This module defines the [`PageSource`] trait (the HTTP fetch primitive the
//! feed engine consumes) and the raw listing types it yields.  The concrete
//! network implementation lives in [`reddit`].
//!
//! ## Adding a new source
//!
//! 1. Create a new file in this directory.
//! 2. Define a struct and implement [`PageSource`] for it, returning a
//!    [`RawPage`] for a fully-built request URL.
//! 3. Add the module below and re-export the struct.
//!
//! Tests swap in an in-memory source the same way; the fetcher never knows
//! which implementation it talks to.

mod raw_post;
pub mod reddit;

pub use raw_post::{ImageSource, Preview, PreviewImage, RawPage, RawPost};
pub use reddit::{listing_url, RedditSource};

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait that every page source must implement.
///
/// The fetcher awaits at most one call at a time per fetch cycle, and the
/// future must be [`Send`] so cycles can run on spawned tasks.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// GET `url` and parse the response into a [`RawPage`].
    ///
    /// Transport failures, non-success statuses and malformed bodies are all
    /// reported as [`FetchError`]; the caller treats them identically.
    async fn fetch_page(&self, url: &str) -> Result<RawPage, FetchError>;
}
