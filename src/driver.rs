//! Background feed driver.
//!
//! Runs a tokio task that turns [`FeedCommand`]s into fetch cycles on a shared
//! [`FeedFetcher`] and reports each result as a [`FeedEvent`] over an
//! [`mpsc`] channel.  This is the surface a UI layer talks to.
//!
//! The driver applies each command's state change (page bump, feed reset,
//! settings swap) in the order the commands arrive, then runs the fetch on its
//! own task.  A `Reset` or `ChangeSubreddit` can therefore be issued while an
//! earlier cycle is still waiting on the network, and the earlier cycle
//! finishes as [`CycleOutcome::Superseded`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::SettingsError;
use crate::fetcher::{CycleOutcome, CycleTicket, FeedFetcher, FeedSnapshot};
use crate::settings::SettingsStore;
use crate::source::PageSource;

/// Requests from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    Load,
    NextPage,
    Reset,
    ChangeSubreddit(String),
}

/// Messages sent back to the caller.
#[derive(Debug)]
pub enum FeedEvent {
    /// A cycle ended; `snapshot` is the state right after it.
    CycleFinished {
        command: FeedCommand,
        outcome: CycleOutcome,
        snapshot: FeedSnapshot,
    },
    /// The command was refused before any fetch started.
    Rejected { command: FeedCommand, reason: String },
}

/// Spawn the driver task.
///
/// The task runs until every command sender is dropped; cycles already in
/// flight still finish and report.
pub fn spawn<P, S>(
    fetcher: Arc<FeedFetcher<P, S>>,
) -> (
    mpsc::UnboundedSender<FeedCommand>,
    mpsc::UnboundedReceiver<FeedEvent>,
    JoinHandle<()>,
)
where
    P: PageSource + 'static,
    S: SettingsStore + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            debug!(?command, "feed command");
            let ticket = match begin_command(&fetcher, &command) {
                Ok(ticket) => ticket,
                Err(e) => {
                    let reason = e.to_string();
                    // Receiver gone means the caller stopped listening.
                    let _ = evt_tx.send(FeedEvent::Rejected { command, reason });
                    continue;
                }
            };

            let fetcher = Arc::clone(&fetcher);
            let events = evt_tx.clone();
            tokio::spawn(async move {
                let outcome = fetcher.run_cycle(ticket).await;
                let _ = events.send(FeedEvent::CycleFinished {
                    command,
                    outcome,
                    snapshot: fetcher.snapshot(),
                });
            });
        }
    });

    (cmd_tx, evt_rx, handle)
}

fn begin_command<P, S>(
    fetcher: &FeedFetcher<P, S>,
    command: &FeedCommand,
) -> Result<CycleTicket, SettingsError>
where
    P: PageSource,
    S: SettingsStore,
{
    match command {
        FeedCommand::Load => Ok(fetcher.begin_load()),
        FeedCommand::NextPage => Ok(fetcher.begin_next_page()),
        FeedCommand::Reset => Ok(fetcher.begin_reset()),
        FeedCommand::ChangeSubreddit(name) => fetcher.begin_change_subreddit(name),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;
    use crate::fetcher::tests::ScriptedSource;
    use crate::fetcher::OutcomeKind;
    use crate::post::tests::page_with_matches;
    use crate::settings::MemorySettings;

    fn fetcher(source: ScriptedSource) -> Arc<FeedFetcher<ScriptedSource, MemorySettings>> {
        Arc::new(FeedFetcher::new(
            source,
            MemorySettings::new(),
            FetcherConfig::default(),
        ))
    }

    fn full_page(prefix: &str) -> crate::source::RawPage {
        page_with_matches(prefix, 30, &(0..10).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn load_reports_finished_cycle() {
        let (tx, mut rx, _task) = spawn(fetcher(ScriptedSource::new(vec![full_page("a")])));

        tx.send(FeedCommand::Load).unwrap();

        match rx.recv().await.unwrap() {
            FeedEvent::CycleFinished { command, outcome, snapshot } => {
                assert_eq!(command, FeedCommand::Load);
                assert_eq!(outcome.kind(), OutcomeKind::Satisfied);
                assert_eq!(snapshot.state.posts.len(), 10);
                assert!(!snapshot.state.loading);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_subreddit_is_rejected() {
        let (tx, mut rx, _task) = spawn(fetcher(ScriptedSource::default()));

        tx.send(FeedCommand::ChangeSubreddit(String::new())).unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            FeedEvent::Rejected { command: FeedCommand::ChangeSubreddit(_), .. }
        ));
    }

    #[tokio::test]
    async fn change_subreddit_supersedes_in_flight_load() {
        let source = ScriptedSource::new(vec![full_page("old"), full_page("new")]).gated_at(0);
        let f = fetcher(source);
        let (tx, mut rx, _task) = spawn(Arc::clone(&f));

        tx.send(FeedCommand::Load).unwrap();
        f.source().wait_gated().await;
        tx.send(FeedCommand::ChangeSubreddit("aww".into())).unwrap();

        let first = rx.recv().await.unwrap();
        f.source().release();
        let second = rx.recv().await.unwrap();

        let FeedEvent::CycleFinished { outcome, snapshot, .. } = first else {
            panic!("expected the fresh cycle to finish first");
        };
        assert_eq!(outcome.kind(), OutcomeKind::Satisfied);
        assert_eq!(snapshot.settings.subreddit, "aww");
        assert!(snapshot.state.posts.iter().all(|p| p.id.starts_with("new")));

        let FeedEvent::CycleFinished { command, outcome, .. } = second else {
            panic!("expected the stale cycle to report");
        };
        assert_eq!(command, FeedCommand::Load);
        assert_eq!(outcome.kind(), OutcomeKind::Superseded);
    }

    #[tokio::test]
    async fn malformed_subreddit_is_rejected_without_fetching() {
        let f = fetcher(ScriptedSource::default());
        let (tx, mut rx, _task) = spawn(Arc::clone(&f));

        tx.send(FeedCommand::ChangeSubreddit("gifs?limit=1#".into())).unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            FeedEvent::Rejected { command: FeedCommand::ChangeSubreddit(_), .. }
        ));
        assert_eq!(f.source().calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn commands_take_effect_in_arrival_order() {
        for _ in 0..25 {
            let f = Arc::new(FeedFetcher::new(
                ScriptedSource::default(),
                MemorySettings::new(),
                FetcherConfig {
                    max_retries: 0,
                    ..FetcherConfig::default()
                },
            ));
            let (tx, mut rx, _task) = spawn(Arc::clone(&f));

            tx.send(FeedCommand::Reset).unwrap();
            tx.send(FeedCommand::NextPage).unwrap();
            rx.recv().await.unwrap();
            rx.recv().await.unwrap();

            assert_eq!(f.page(), 2);
            assert!(!f.is_loading());
        }
    }

    #[tokio::test]
    async fn task_ends_when_commands_are_dropped() {
        let (tx, _rx, task) = spawn(fetcher(ScriptedSource::default()));
        drop(tx);
        task.await.unwrap();
    }
}
