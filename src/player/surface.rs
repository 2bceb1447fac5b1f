// ==========================================
// PLAYBACK SURFACE
// ==========================================
// The thing that actually shows the video. The queue only tells it which
// entry is current; the surface reports back when that entry finished.
//
// Contract:
// - show(Some(entry)) loads the entry unless it is already loaded
// - show(None) clears whatever is loaded
// - poll_event() yields Ended exactly once per natural finish of the
//   loaded entry, never because show() replaced or cleared it
//
// ExternalPlayer implements this by running a video player process
// (mpv by default) on the YouTube watch page of the entry.

use std::process::{Child, Command, ExitStatus, Stdio};

use super::queue::{QueueEntry, QueueId};
use crate::error::PlaybackError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The entry played to the end.
    Ended(QueueId),
    /// The player gave up on the entry (bad URL, missing codec, ...).
    Failed { queue_id: QueueId, reason: String },
}

pub trait PlaybackSurface {
    fn show(&mut self, entry: Option<&QueueEntry>) -> Result<(), PlaybackError>;

    fn poll_event(&mut self) -> Option<SurfaceEvent>;

    /// Queue id of the entry currently loaded, if any.
    fn loaded(&self) -> Option<&QueueId>;
}

// A running player process and the entry it is playing
struct LoadedEntry {
    queue_id: QueueId,
    child: Child,
}

pub struct ExternalPlayer {
    command: String,
    args: Vec<String>,
    loaded: Option<LoadedEntry>,
}

impl ExternalPlayer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        ExternalPlayer {
            command: command.into(),
            args,
            loaded: None,
        }
    }

    // Kills and reaps the running player. Its exit status is thrown away,
    // so a programmatic stop never turns into an Ended event.
    fn stop(&mut self) -> Result<(), PlaybackError> {
        let Some(mut loaded) = self.loaded.take() else {
            return Ok(());
        };

        tracing::debug!(queue_id = %loaded.queue_id, "stopping player");
        if let Err(e) = loaded.child.kill() {
            // Already exited on its own; nothing left to kill
            if e.kind() != std::io::ErrorKind::InvalidInput {
                return Err(PlaybackError::Kill(e));
            }
        }
        loaded.child.wait().map_err(PlaybackError::Kill)?;
        Ok(())
    }

    fn launch(&mut self, entry: &QueueEntry) -> Result<(), PlaybackError> {
        let url = entry.item.watch_url();
        tracing::info!(queue_id = %entry.queue_id, title = %entry.item.title, %url, "launching player");

        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        self.loaded = Some(LoadedEntry {
            queue_id: entry.queue_id.clone(),
            child,
        });
        Ok(())
    }

    fn exit_event(queue_id: QueueId, status: ExitStatus) -> SurfaceEvent {
        if status.success() {
            SurfaceEvent::Ended(queue_id)
        } else {
            SurfaceEvent::Failed {
                queue_id,
                reason: format!("player exited with {}", status),
            }
        }
    }
}

impl PlaybackSurface for ExternalPlayer {
    fn show(&mut self, entry: Option<&QueueEntry>) -> Result<(), PlaybackError> {
        // Same entry again: keep playing, don't restart
        if entry.map(|e| &e.queue_id) == self.loaded() {
            return Ok(());
        }

        self.stop()?;
        match entry {
            Some(entry) => self.launch(entry),
            None => Ok(()),
        }
    }

    fn poll_event(&mut self) -> Option<SurfaceEvent> {
        let loaded = self.loaded.as_mut()?;

        match loaded.child.try_wait() {
            Ok(None) => None,
            Ok(Some(status)) => {
                let queue_id = self.loaded.take()?.queue_id;
                tracing::info!(%queue_id, %status, "player exited");
                Some(Self::exit_event(queue_id, status))
            }
            Err(e) => {
                let queue_id = self.loaded.take()?.queue_id;
                tracing::warn!(%queue_id, error = %e, "lost track of player process");
                Some(SurfaceEvent::Failed {
                    queue_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn loaded(&self) -> Option<&QueueId> {
        self.loaded.as_ref().map(|loaded| &loaded.queue_id)
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "player did not stop cleanly");
        }
    }
}
