//! The feed engine: pagination state, cursor and the bounded refetch loop.
//!
//! A *fetch cycle* starts with [`FeedFetcher::load`], [`next_page`],
//! [`reset_posts`] or [`change_subreddit`] and keeps requesting raw pages
//! until the feed holds at least `per_page × page` posts or the retry cap is
//! hit.  Each raw page goes through [`filter_page`], its posts are appended,
//! and the cursor moves forward.
//!
//! All operations take `&self`, so a fetcher can sit in an [`Arc`] while a
//! cycle is in flight and the caller still reads state or starts another
//! cycle.  Every cycle captures a generation number when it starts; starting
//! a new cycle bumps it, and an older cycle that wakes up to a newer
//! generation drops its response without touching state.
//!
//! [`next_page`]: FeedFetcher::next_page
//! [`reset_posts`]: FeedFetcher::reset_posts
//! [`change_subreddit`]: FeedFetcher::change_subreddit
//! [`Arc`]: std::sync::Arc

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::error::{FetchError, SettingsError};
use crate::post::{filter_page, Post};
use crate::settings::{validate_subreddit, FeedSettings, SettingsStore};
use crate::source::{listing_url, PageSource, RawPage};

/// Pagination state visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    /// Display order; only ever appended to between resets.
    pub posts: Vec<Post>,
    /// 1-based page the caller has asked for.
    pub page: usize,
    pub retry_count: u32,
    pub loading: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            page: 1,
            retry_count: 0,
            loading: false,
        }
    }
}

/// How a fetch cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The feed reached `per_page × page` posts.
    Satisfied,
    /// The retry cap was hit first; the feed may be short.
    GaveUp,
    /// A raw page could not be fetched or parsed.
    Failed(FetchError),
    /// A newer cycle started while this one was waiting; its response was dropped.
    Superseded,
}

impl CycleOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CycleOutcome::Satisfied => OutcomeKind::Satisfied,
            CycleOutcome::GaveUp => OutcomeKind::GaveUp,
            CycleOutcome::Failed(_) => OutcomeKind::Failed,
            CycleOutcome::Superseded => OutcomeKind::Superseded,
        }
    }
}

/// [`CycleOutcome`] without the error payload, cheap to copy into snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Satisfied,
    GaveUp,
    Failed,
    Superseded,
}

/// Point-in-time copy of everything a caller may want to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub settings: FeedSettings,
    pub state: FeedState,
    pub cursor: Option<String>,
    pub last_outcome: Option<OutcomeKind>,
    pub last_error: Option<String>,
}

struct Inner {
    settings: FeedSettings,
    state: FeedState,
    cursor: Option<String>,
    generation: u64,
    last_outcome: Option<OutcomeKind>,
    last_error: Option<String>,
}

/// A fetch cycle that has been started but not yet run.
///
/// Returned by the `begin_*` methods and consumed by
/// [`FeedFetcher::run_cycle`].
#[derive(Debug)]
#[must_use = "a started cycle does nothing until it is run"]
pub struct CycleTicket(u64);

enum Step {
    Continue,
    Done(CycleOutcome),
}

/// Owns one feed session.
pub struct FeedFetcher<P, S> {
    source: P,
    store: S,
    config: FetcherConfig,
    inner: Mutex<Inner>,
}

impl<P: PageSource, S: SettingsStore> FeedFetcher<P, S> {
    /// Create a fetcher with default settings; nothing is fetched until
    /// [`load`](Self::load) is called.
    pub fn new(source: P, store: S, config: FetcherConfig) -> Self {
        Self {
            source,
            store,
            config,
            inner: Mutex::new(Inner {
                settings: FeedSettings::default(),
                state: FeedState::default(),
                cursor: None,
                generation: 0,
                last_outcome: None,
                last_error: None,
            }),
        }
    }

    /// Replace the in-memory settings without fetching.
    ///
    /// Invalid settings are rejected and the current ones stay in place.
    pub fn seed_settings(&self, settings: FeedSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.lock().settings = settings;
        Ok(())
    }

    // -- operations ----------------------------------------------------------
    //
    // Each operation is a synchronous `begin_*` step that mutates the state and
    // opens a new generation, followed by an awaited `run_cycle`.  Callers that
    // dispatch operations onto separate tasks call `begin_*` themselves, in
    // arrival order, and spawn only `run_cycle`.

    /// Adopt the stored settings (if any) and run a fetch cycle.
    ///
    /// A store that is empty, unreadable or holds invalid settings leaves the
    /// in-memory settings in place.
    pub async fn load(&self) -> CycleOutcome {
        let ticket = self.begin_load();
        self.run_cycle(ticket).await
    }

    /// Ask for one more page of posts, continuing from the current cursor.
    pub async fn next_page(&self) -> CycleOutcome {
        let ticket = self.begin_next_page();
        self.run_cycle(ticket).await
    }

    /// Drop all posts and start again from the top of the listing.
    pub async fn reset_posts(&self) -> CycleOutcome {
        let ticket = self.begin_reset();
        self.run_cycle(ticket).await
    }

    /// Switch to another subreddit and start from its top.
    ///
    /// The new name is not persisted.
    pub async fn change_subreddit(&self, name: &str) -> Result<CycleOutcome, SettingsError> {
        let ticket = self.begin_change_subreddit(name)?;
        Ok(self.run_cycle(ticket).await)
    }

    /// Validate, persist and adopt new settings, then start from the top.
    pub async fn apply_settings(
        &self,
        settings: FeedSettings,
    ) -> Result<CycleOutcome, SettingsError> {
        let ticket = self.begin_apply_settings(settings)?;
        Ok(self.run_cycle(ticket).await)
    }

    pub fn begin_load(&self) -> CycleTicket {
        let stored = match self.store.get() {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => Some(settings),
                Err(e) => {
                    warn!(error = %e, "ignoring invalid stored settings");
                    None
                }
            },
            Ok(None) => {
                debug!("no stored settings, keeping current ones");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to read stored settings, keeping current ones");
                None
            }
        };

        self.begin_cycle(|inner| {
            if let Some(settings) = stored {
                inner.settings = settings;
            }
        })
    }

    pub fn begin_next_page(&self) -> CycleTicket {
        self.begin_cycle(|inner| inner.state.page += 1)
    }

    pub fn begin_reset(&self) -> CycleTicket {
        self.begin_cycle(Inner::clear_feed)
    }

    pub fn begin_change_subreddit(&self, name: &str) -> Result<CycleTicket, SettingsError> {
        let name = name.trim();
        validate_subreddit(name)?;

        Ok(self.begin_cycle(|inner| {
            inner.settings.subreddit = name.to_string();
            inner.clear_feed();
        }))
    }

    pub fn begin_apply_settings(&self, settings: FeedSettings) -> Result<CycleTicket, SettingsError> {
        settings.validate()?;
        self.store.set(&settings)?;

        Ok(self.begin_cycle(|inner| {
            inner.settings = settings;
            inner.clear_feed();
        }))
    }

    /// Fetch raw pages for the cycle opened by `ticket` until it is satisfied,
    /// exhausted, failed or superseded by a newer cycle.
    pub async fn run_cycle(&self, ticket: CycleTicket) -> CycleOutcome {
        let generation = ticket.0;
        loop {
            let (request, per_page) = match self.next_request(generation) {
                Some(next) => next,
                None => return CycleOutcome::Superseded,
            };

            let result = match request {
                Ok(url) => self.source.fetch_page(&url).await,
                Err(e) => Err(e.into()),
            };

            if let Step::Done(outcome) = self.absorb(generation, per_page, result) {
                return outcome;
            }
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn posts(&self) -> Vec<Post> {
        self.lock().state.posts.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().state.loading
    }

    pub fn page(&self) -> usize {
        self.lock().state.page
    }

    pub fn retry_count(&self) -> u32 {
        self.lock().state.retry_count
    }

    pub fn cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    pub fn settings(&self) -> FeedSettings {
        self.lock().settings.clone()
    }

    /// Outcome of the most recent cycle that was not superseded.
    pub fn last_outcome(&self) -> Option<OutcomeKind> {
        self.lock().last_outcome
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.lock();
        FeedSnapshot {
            settings: inner.settings.clone(),
            state: inner.state.clone(),
            cursor: inner.cursor.clone(),
            last_outcome: inner.last_outcome,
            last_error: inner.last_error.clone(),
        }
    }

    // -- engine --------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `prepare` and open a new generation.  Any cycle still waiting on
    /// a response becomes stale.
    fn begin_cycle(&self, prepare: impl FnOnce(&mut Inner)) -> CycleTicket {
        let mut inner = self.lock();
        prepare(&mut *inner);
        inner.generation = inner.generation.wrapping_add(1);
        inner.state.retry_count = 0;
        inner.state.loading = true;
        CycleTicket(inner.generation)
    }

    /// URL and page size for the next raw page, or `None` if the cycle is stale.
    fn next_request(
        &self,
        generation: u64,
    ) -> Option<(Result<String, url::ParseError>, usize)> {
        let inner = self.lock();
        if inner.generation != generation {
            return None;
        }
        let url = listing_url(
            &self.config.api_base,
            &inner.settings,
            self.config.raw_page_limit,
            inner.cursor.as_deref(),
        );
        Some((url, inner.settings.per_page))
    }

    /// Fold one raw-page result into the state and decide whether to go on.
    fn absorb(
        &self,
        generation: u64,
        per_page: usize,
        result: Result<RawPage, FetchError>,
    ) -> Step {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, "discarding response for a stale cycle");
            return Step::Done(CycleOutcome::Superseded);
        }

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, subreddit = %inner.settings.subreddit, "fetch cycle failed");
                inner.last_outcome = Some(OutcomeKind::Failed);
                inner.last_error = Some(err.to_string());
                if !self.config.sticky_loading_on_error {
                    inner.state.loading = false;
                    inner.state.retry_count = 0;
                }
                return Step::Done(CycleOutcome::Failed(err));
            }
        };

        let filtered = filter_page(&page, per_page);
        if let Some(cursor) = filtered.next_cursor {
            inner.cursor = Some(cursor);
        }
        let found = filtered.posts.len();
        inner.state.posts.extend(filtered.posts);

        let target = per_page.saturating_mul(inner.state.page);
        let have = inner.state.posts.len();
        debug!(
            raw = page.children.len(),
            found,
            have,
            target,
            retry = inner.state.retry_count,
            cursor = inner.cursor.as_deref().unwrap_or(""),
            "processed raw page"
        );

        if have >= target {
            inner.finish(OutcomeKind::Satisfied);
            return Step::Done(CycleOutcome::Satisfied);
        }
        if inner.state.retry_count >= self.config.max_retries {
            info!(have, target, "giving up after {} refetches", inner.state.retry_count);
            inner.finish(OutcomeKind::GaveUp);
            return Step::Done(CycleOutcome::GaveUp);
        }

        inner.state.retry_count += 1;
        Step::Continue
    }
}

impl Inner {
    fn clear_feed(&mut self) {
        self.state.page = 1;
        self.state.posts.clear();
        self.cursor = None;
    }

    fn finish(&mut self, outcome: OutcomeKind) {
        if outcome == OutcomeKind::Satisfied {
            info!(posts = self.state.posts.len(), page = self.state.page, "feed page ready");
        }
        self.state.retry_count = 0;
        self.state.loading = false;
        self.last_outcome = Some(outcome);
        self.last_error = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
