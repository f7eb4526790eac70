//! File-system watcher for the downloads folder.
//!
//! Wraps the OS notification facility behind a single cooperative task:
//! one `tokio::select!` loop over the event stream, the error stream, and a
//! cancellation token. Create and rename events become classification
//! requests; everything else is ignored. A single bad file never kills the
//! loop.

use kalycs_classifier::{Classifier, FileMeta};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors raised while constructing the watch subscription.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("watch target is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to create watch subscription: {0}")]
    Subscribe(#[from] notify::Error),
}

/// Non-recursive watcher over a single directory.
///
/// The OS subscription lives inside the spawned loop and is released when
/// the loop exits, whatever the exit path.
#[derive(Debug)]
pub struct DownloadsWatcher {
    watcher: Option<RecommendedWatcher>,
    event_rx: Option<mpsc::UnboundedReceiver<Event>>,
    error_rx: Option<mpsc::UnboundedReceiver<notify::Error>>,
    token: CancellationToken,
    classifier: Arc<Classifier>,
    path: PathBuf,
}

impl DownloadsWatcher {
    /// Subscribe to `path`. Fails if the directory is missing or the
    /// subscription cannot be created; partially constructed resources are
    /// released on the failure path.
    pub fn new(
        parent: &CancellationToken,
        path: impl AsRef<Path>,
        classifier: Arc<Classifier>,
    ) -> Result<Self, WatchError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(WatchError::NotADirectory(path));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
                match result {
                    Ok(event) => {
                        let _ = event_tx.send(event);
                    }
                    Err(err) => {
                        let _ = error_tx.send(err);
                    }
                }
            })?;

        // On failure the watcher drops here, releasing the subscription.
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            watcher: Some(watcher),
            event_rx: Some(event_rx),
            error_rx: Some(error_rx),
            token: parent.child_token(),
            classifier,
            path,
        })
    }

    /// Spawn the event loop. Calling `start` a second time is a no-op.
    pub fn start(&mut self) {
        let (Some(watcher), Some(event_rx), Some(error_rx)) = (
            self.watcher.take(),
            self.event_rx.take(),
            self.error_rx.take(),
        ) else {
            warn!("Watcher already started");
            return;
        };

        info!(path = %self.path.display(), "Starting watcher");
        tokio::spawn(run_loop(
            watcher,
            event_rx,
            error_rx,
            self.token.clone(),
            Arc::clone(&self.classifier),
        ));
    }

    /// Cancel the loop. Idempotent.
    pub fn stop(&self) {
        info!("Stopping watcher");
        self.token.cancel();
    }

    /// The watched directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn run_loop(
    watcher: RecommendedWatcher,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    mut error_rx: mpsc::UnboundedReceiver<notify::Error>,
    token: CancellationToken,
    classifier: Arc<Classifier>,
) {
    debug!("Watcher loop started");
    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("Event channel closed");
                    break;
                };
                if is_create_or_rename(&event.kind) {
                    for path in &event.paths {
                        classify_candidate(&classifier, path).await;
                    }
                }
            }
            maybe_error = error_rx.recv() => {
                match maybe_error {
                    Some(err) => error!(error = %err, "Watch subscription error"),
                    None => {
                        warn!("Error channel closed");
                        break;
                    }
                }
            }
            _ = token.cancelled() => {
                info!("Watcher cancelled");
                break;
            }
        }
    }
    // Dropping the subscription releases the OS watch.
    drop(watcher);
}

fn is_create_or_rename(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

async fn classify_candidate(classifier: &Classifier, path: &Path) {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        // Raced with a delete or a rename-away; nothing to classify.
        Err(err) if err.kind() == io::ErrorKind::NotFound => return,
        Err(err) => {
            error!(file = %path.display(), error = %err, "Failed to stat file after event");
            return;
        }
    };

    if metadata.is_dir() {
        return;
    }

    info!(path = %path.display(), "Classifying new file");
    if let Err(err) = classifier
        .classify(path, FileMeta::from_metadata(&metadata))
        .await
    {
        error!(file = %path.display(), error = %err, "Failed to classify file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RenameMode};

    #[test]
    fn create_and_rename_events_are_selected() {
        assert!(is_create_or_rename(&EventKind::Create(CreateKind::File)));
        assert!(is_create_or_rename(&EventKind::Create(CreateKind::Any)));
        assert!(is_create_or_rename(&EventKind::Modify(ModifyKind::Name(
            RenameMode::To
        ))));
        assert!(is_create_or_rename(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
    }

    #[test]
    fn other_events_are_ignored() {
        assert!(!is_create_or_rename(&EventKind::Modify(ModifyKind::Data(
            DataChange::Any
        ))));
        assert!(!is_create_or_rename(&EventKind::Modify(
            ModifyKind::Metadata(MetadataKind::Any)
        )));
        assert!(!is_create_or_rename(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
        assert!(!is_create_or_rename(&EventKind::Access(
            notify::event::AccessKind::Any
        )));
    }
}
