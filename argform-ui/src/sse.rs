//! Server-Sent Events stream and drop-directory importer.

use std::collections::HashSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::Duration;

use argform::io::batch::is_batch_file;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.session.subscribe();

    let stream = async_stream::stream! {
        // Renderers re-read state on connect.
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(session_event) => {
                    if let Ok(json) = serde_json::to_string(&session_event) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                    yield Ok(Event::default().event("resync").data("{}"));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the drop-directory watcher in a background task.
pub fn start_drop_watcher(state: AppState, drop_dir: PathBuf) {
    tokio::spawn(async move {
        if let Err(e) = run_drop_watcher(state, drop_dir).await {
            warn!(error = %e, "drop watcher failed");
        }
    });
}

async fn run_drop_watcher(state: AppState, drop_dir: PathBuf) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(250)),
    )?;
    watcher.watch(&drop_dir, RecursiveMode::NonRecursive)?;
    info!(path = %drop_dir.display(), "watching drop directory");

    // Batch at a fixed interval so a file still being written settles first.
    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(250));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                for path in dropped_files(&drop_dir, &pending_events) {
                    import_dropped(&state, &path).await;
                }
                pending_events.clear();
            }
        }
    }
}

/// Batch files created or modified directly inside `drop_dir`, deduplicated
/// and sorted.
fn dropped_files(drop_dir: &Path, events: &[NotifyEvent]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files: Vec<PathBuf> = events
        .iter()
        .filter(|event| matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)))
        .flat_map(|event| event.paths.iter())
        .filter(|path| path.parent() == Some(drop_dir) && is_batch_file(path))
        .filter(|path| seen.insert((*path).clone()))
        .cloned()
        .collect();
    files.sort();
    files
}

async fn import_dropped(state: &AppState, path: &Path) {
    debug!(path = %path.display(), "importing dropped file");
    match state.session.import_file(path).await {
        Ok(report) => {
            info!(path = %path.display(), all_valid = ?report.all_valid(), "dropped file imported");
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "dropped file rejected");
        }
    }
}
