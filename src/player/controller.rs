// Glue between the queue and the playback surface.
//
// Every queue mutation is followed by handing the surface whatever is now
// current, and every "ended" from the surface is turned into advance().
// The UI only talks to this type, never to the queue or surface directly.
//
// A song whose player failed stays current but is not relaunched by
// unrelated queue changes; only select() or skip() retries or moves on.

use super::queue::{QueueEntry, QueueId, QueueManager};
use super::surface::{PlaybackSurface, SurfaceEvent};
use crate::error::PlaybackError;
use crate::youtube::search::CatalogItem;

pub struct PlaybackController<S: PlaybackSurface> {
    queue: QueueManager,
    surface: S,
    // Current entry whose player failed; not shown again until explicitly selected
    failed: Option<QueueId>,
}

impl<S: PlaybackSurface> PlaybackController<S> {
    pub fn new(surface: S) -> Self {
        PlaybackController {
            queue: QueueManager::new(),
            surface,
            failed: None,
        }
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn enqueue(&mut self, item: CatalogItem) -> Result<QueueId, PlaybackError> {
        let queue_id = self.queue.enqueue(item);
        self.sync()?;
        Ok(queue_id)
    }

    /// Returns false when the id is no longer queued.
    pub fn select(&mut self, queue_id: &QueueId) -> Result<bool, PlaybackError> {
        let selected = self.queue.select_for_playback(queue_id);
        if selected {
            self.failed = None;
            self.sync()?;
        }
        Ok(selected)
    }

    pub fn remove(&mut self, queue_id: &QueueId) -> Result<Option<QueueEntry>, PlaybackError> {
        let removed = self.queue.remove(queue_id);
        if removed.is_some() {
            self.sync()?;
        }
        Ok(removed)
    }

    /// Drops the current song and moves on, same as if it had ended.
    pub fn skip(&mut self) -> Result<(), PlaybackError> {
        if let Some(current) = self.queue.current_id().cloned() {
            self.queue.advance(&current);
            self.failed = None;
            self.sync()?;
        }
        Ok(())
    }

    /// Drains surface events, advancing the queue for every finished song.
    ///
    /// Returns failures so the caller can tell the user; the failed entry
    /// stays queued.
    pub fn pump(&mut self) -> Result<Vec<SurfaceEvent>, PlaybackError> {
        let mut failures = Vec::new();

        while let Some(event) = self.surface.poll_event() {
            match event {
                SurfaceEvent::Ended(finished) => {
                    if !self.queue.is_current(&finished) {
                        tracing::debug!(%finished, "ignoring ended event for entry that is no longer current");
                        continue;
                    }
                    self.queue.advance(&finished);
                    self.sync()?;
                }
                SurfaceEvent::Failed { queue_id, reason } => {
                    tracing::warn!(%queue_id, %reason, "playback failed");
                    if self.queue.is_current(&queue_id) {
                        self.failed = Some(queue_id.clone());
                    }
                    failures.push(SurfaceEvent::Failed { queue_id, reason });
                }
            }
        }

        Ok(failures)
    }

    fn sync(&mut self) -> Result<(), PlaybackError> {
        if self.failed.is_some() && self.failed.as_ref() != self.queue.current_id() {
            self.failed = None;
        }
        if self.failed.is_some() {
            tracing::debug!("current entry failed earlier, leaving the surface empty");
            return Ok(());
        }
        self.surface.show(self.queue.current())
    }
}
