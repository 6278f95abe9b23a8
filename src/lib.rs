//! gifscroll: a paginated GIF-video feed engine.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ FeedCommand ┌────────────┐ fetch_page() ┌────────────┐
//! │   caller   │ ──────────► │ driver.rs  │ ──────┐      │  source/   │
//! │ (UI / CLI) │ ◄────────── │  (tasks)   │       ▼      │ (reqwest)  │
//! └────────────┘  FeedEvent  └────────────┘  ┌──────────┐└────────────┘
//!                                            │fetcher.rs│ ──► post.rs
//!                                            │ (state)  │     (filter)
//!                                            └──────────┘
//!                                                 ▲ get()/set()
//!                                            ┌──────────┐
//!                                            │settings  │
//!                                            └──────────┘
//! ```
//!
//! * **`source/`**: the `PageSource` trait, raw listing types and the HTTP
//!   implementation.
//! * **`post`**: the media-format filter and per-page cursor decision.
//! * **`fetcher`**: owns posts, cursor and page; runs the bounded refetch loop.
//! * **`driver`**: background task turning commands into fetch cycles.
//! * **`settings`**: feed settings and their persistence.
//! * **`config`** / **`logging`**: environment configuration and tracing setup.

pub mod config;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod post;
pub mod settings;
pub mod source;

pub use config::FetcherConfig;
pub use driver::{FeedCommand, FeedEvent};
pub use error::{ConfigError, FetchError, SettingsError};
pub use fetcher::{CycleOutcome, CycleTicket, FeedFetcher, FeedSnapshot, FeedState, OutcomeKind};
pub use post::Post;
pub use settings::{FeedSettings, JsonFileSettings, MemorySettings, SettingsStore, Sort};
pub use source::{PageSource, RawPage, RawPost, RedditSource};
