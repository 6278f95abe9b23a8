//! gifscroll: print the media URLs of a subreddit's GIF-video feed.
//!
//! ```text
//! gifscroll [subreddit] [pages]
//! ```
//!
//! Without a subreddit the stored settings (or the defaults) are used.  Each
//! line of output is `<media url>\t<snapshot url>\t<title>`; logs go to stderr.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, warn};

use gifscroll::driver::{self, FeedCommand, FeedEvent};
use gifscroll::{
    logging, CycleOutcome, FeedFetcher, FetcherConfig, JsonFileSettings, RedditSource,
    SettingsStore,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = FetcherConfig::from_env().context("invalid configuration")?;
    logging::init(&config.log_level)?;

    // -- parse arguments -----------------------------------------------------
    let mut args = std::env::args().skip(1);
    let subreddit = args.next();
    let pages: usize = match args.next() {
        Some(p) => p.parse().context("pages must be a positive integer")?,
        None => 1,
    };

    // -- wire the engine -----------------------------------------------------
    let source = RedditSource::new(config.http_timeout).context("failed to build HTTP client")?;
    let store = JsonFileSettings::new(&config.settings_path);
    // `Load` adopts the stored settings itself; `ChangeSubreddit` does not, so
    // seed them first to keep the stored sort and page size.
    let stored = if subreddit.is_some() {
        store.get().unwrap_or_else(|e| {
            warn!(path = %store.path().display(), "ignoring unreadable settings: {e}");
            None
        })
    } else {
        None
    };

    let fetcher = FeedFetcher::new(source, store, config);
    if let Some(settings) = stored {
        if let Err(e) = fetcher.seed_settings(settings) {
            warn!("ignoring invalid stored settings: {e}");
        }
    }
    let (commands, mut events, _driver) = driver::spawn(Arc::new(fetcher));

    commands.send(match subreddit {
        Some(name) => FeedCommand::ChangeSubreddit(name),
        None => FeedCommand::Load,
    })?;

    // -- event loop ----------------------------------------------------------
    let mut remaining = pages.saturating_sub(1);

    while let Some(event) = events.recv().await {
        let (outcome, snapshot) = match event {
            FeedEvent::CycleFinished { outcome, snapshot, .. } => (outcome, snapshot),
            FeedEvent::Rejected { reason, .. } => bail!("{reason}"),
        };

        match outcome {
            CycleOutcome::Superseded => continue,
            CycleOutcome::Failed(e) => {
                error!("feed fetch failed: {e}");
                bail!("could not fetch r/{}: {e}", snapshot.settings.subreddit);
            }
            CycleOutcome::GaveUp => {
                warn!(
                    posts = snapshot.state.posts.len(),
                    "listing ran out of playable posts"
                );
            }
            CycleOutcome::Satisfied if remaining > 0 => {
                remaining -= 1;
                commands.send(FeedCommand::NextPage)?;
                continue;
            }
            CycleOutcome::Satisfied => {}
        }

        for post in &snapshot.state.posts {
            println!(
                "{}\t{}\t{}",
                post.media_url,
                post.snapshot_url,
                post.title.as_deref().unwrap_or("")
            );
        }
        break;
    }

    Ok(())
}
