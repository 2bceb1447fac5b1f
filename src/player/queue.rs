// ==========================================
// QUEUE MANAGEMENT MODULE
// ==========================================
// This module owns the karaoke queue: the ordered list of songs people
// have picked, plus which one of them is playing right now.
// It handles:
// - Adding songs to the back of the queue (auto-playing the very first one)
// - Picking any queued song to play now
// - Removing songs, including the one that is playing
// - Advancing to the head of the queue when a song ends
//
// All mutation goes through four methods: enqueue, select_for_playback,
// remove and advance. Each one leaves the queue in a consistent state:
// the current pointer is either None or names an entry that is still queued.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

use crate::youtube::search::CatalogItem;

// ==========================================
// QUEUE ID
// ==========================================
// Identifies one *instance* of a song in the queue. The same video can be
// queued twice (two people want to sing it), so the catalog id is not
// enough; each entry gets "<catalog id>-<sequence>" where the sequence
// number never repeats within a QueueManager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(String);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for QueueId {
    fn from(raw: String) -> Self {
        QueueId(raw)
    }
}

// ==========================================
// QUEUE ENTRY
// ==========================================
// A catalog item as it sits in the queue.
//
// queue_id:  unique per entry (see QueueId)
// item:      the search result, never modified after it was queued
// queued_at: when it was added, shown next to the song in the UI
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub queue_id: QueueId,
    pub item: CatalogItem,
    pub queued_at: DateTime<Local>,
}

// Coarse state of the queue, derived from the fields below.
//
// Idle (songs queued, nothing selected) can't be reached through enqueue
// because the first song auto-plays; it only exists transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Empty,
    Idle,
    Playing,
}

// ==========================================
// QUEUE MANAGER
// ==========================================
// entries:  playback order, front = plays first
// current:  queue id of the entry playing now (None = nothing playing)
// next_seq: counter used to build fresh queue ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueManager {
    entries: VecDeque<QueueEntry>,
    current: Option<QueueId>,
    next_seq: u64,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // ADDING SONGS: enqueue()
    // ==========================================
    // Appends the item as a new entry and returns the entry's id.
    //
    // If nothing is queued and nothing is selected, the new entry becomes
    // current straight away (first song auto-plays). In every other case
    // the current pointer is left alone.
    //
    // Example:
    // - Queue: [], Current: None
    // - enqueue(A) -> Queue: [A], Current: A
    // - enqueue(B) -> Queue: [A, B], Current: A
    pub fn enqueue(&mut self, item: CatalogItem) -> QueueId {
        let queue_id = self.fresh_queue_id(&item.id);
        let auto_play = self.entries.is_empty() && self.current.is_none();

        tracing::debug!(%queue_id, title = %item.title, auto_play, "enqueue");

        self.entries.push_back(QueueEntry {
            queue_id: queue_id.clone(),
            item,
            queued_at: Local::now(),
        });

        if auto_play {
            self.current = Some(queue_id.clone());
        }

        queue_id
    }

    // ==========================================
    // PICKING A SONG: select_for_playback()
    // ==========================================
    // Makes the given entry current. Unknown ids (a stale row in the UI)
    // are ignored. Returns whether anything changed hands.
    pub fn select_for_playback(&mut self, queue_id: &QueueId) -> bool {
        if self.position(queue_id).is_none() {
            tracing::debug!(%queue_id, "select ignored, entry not queued");
            return false;
        }

        self.current = Some(queue_id.clone());
        true
    }

    // ==========================================
    // REMOVING SONGS: remove()
    // ==========================================
    // Deletes the entry with this id and returns it.
    //
    // Removing the song that is playing behaves exactly like that song
    // ending: it goes through advance(). Removing any other song leaves
    // the current pointer untouched.
    //
    // Example:
    // - Queue: [A, B, C], Current: A
    // - remove(C) -> Queue: [A, B], Current: A
    // - remove(A) -> Queue: [B],    Current: B
    pub fn remove(&mut self, queue_id: &QueueId) -> Option<QueueEntry> {
        let index = self.position(queue_id)?;
        let removed = self.entries.remove(index)?;

        if self.current.as_ref() == Some(queue_id) {
            self.advance(queue_id);
        }

        Some(removed)
    }

    // ==========================================
    // AUTO-ADVANCE: advance()
    // ==========================================
    // Called when a song finishes playing, and by remove() when the
    // playing song is deleted.
    //
    // 1. Drop the finished entry if it is still queued
    // 2. Head of the queue becomes current (always position 0, not the
    //    neighbour of the finished song)
    // 3. Empty queue -> nothing playing
    //
    // Example:
    // - Queue: [B, A, C], Current: A
    // - advance(A) -> Queue: [B, C], Current: B
    pub fn advance(&mut self, finished_id: &QueueId) {
        if let Some(index) = self.position(finished_id) {
            self.entries.remove(index);
        }

        self.current = self.entries.front().map(|entry| entry.queue_id.clone());

        match &self.current {
            Some(next) => tracing::info!(finished = %finished_id, %next, "advanced to head of queue"),
            None => tracing::info!(finished = %finished_id, "queue finished"),
        }
    }

    // ==========================================
    // QUEUE INSPECTION
    // ==========================================

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &QueueEntry> + '_ {
        self.entries.iter()
    }

    pub fn get(&self, queue_id: &QueueId) -> Option<&QueueEntry> {
        self.entries.iter().find(|entry| &entry.queue_id == queue_id)
    }

    pub fn position(&self, queue_id: &QueueId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.queue_id == queue_id)
    }

    /// The entry that should be on screen right now.
    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&QueueId> {
        self.current.as_ref()
    }

    pub fn is_current(&self, queue_id: &QueueId) -> bool {
        self.current.as_ref() == Some(queue_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> QueueStatus {
        match (&self.current, self.entries.is_empty()) {
            (Some(_), _) => QueueStatus::Playing,
            (None, true) => QueueStatus::Empty,
            (None, false) => QueueStatus::Idle,
        }
    }

    fn fresh_queue_id(&mut self, catalog_id: &str) -> QueueId {
        let seq = self.next_seq;
        self.next_seq += 1;
        QueueId(format!("{}-{}", catalog_id, seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn song(id: &str) -> CatalogItem {
        CatalogItem::new(id, format!("Song {}", id), "Channel", "", "3:30")
    }

    fn ids(queue: &QueueManager) -> Vec<QueueId> {
        queue.entries().map(|entry| entry.queue_id.clone()).collect()
    }

    // Queue with `n` songs where the first one is playing
    fn filled(n: usize) -> (QueueManager, Vec<QueueId>) {
        let mut queue = QueueManager::new();
        let queue_ids = (0..n).map(|i| queue.enqueue(song(&format!("v{}", i)))).collect();
        (queue, queue_ids)
    }

    #[test]
    fn first_enqueue_auto_plays() {
        let mut queue = QueueManager::new();
        assert_eq!(queue.status(), QueueStatus::Empty);

        let a = queue.enqueue(song("a"));

        assert_eq!(ids(&queue), vec![a.clone()]);
        assert_eq!(queue.current_id(), Some(&a));
        assert_eq!(queue.current().map(|e| e.item.id.as_str()), Some("a"));
        assert_eq!(queue.status(), QueueStatus::Playing);
    }

    #[test]
    fn later_enqueues_never_move_current() {
        let (mut queue, ids_before) = filled(3);
        let playing = ids_before[0].clone();

        queue.enqueue(song("late"));
        assert_eq!(queue.current_id(), Some(&playing));

        // Current set on something other than the head
        queue.select_for_playback(&ids_before[2]);
        queue.enqueue(song("later"));
        assert_eq!(queue.current_id(), Some(&ids_before[2]));
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn enqueue_into_idle_queue_keeps_nothing_selected() {
        // Idle is only reachable transiently, so force it here
        let mut queue = QueueManager::new();
        let a = queue.enqueue(song("a"));
        queue.current = None;
        assert_eq!(queue.status(), QueueStatus::Idle);

        queue.enqueue(song("b"));
        assert_eq!(queue.current_id(), None);
        assert_eq!(ids(&queue)[0], a);
    }

    #[test]
    fn advance_on_current_promotes_second_entry() {
        for n in 1..=6 {
            let (mut queue, original) = filled(n);
            queue.advance(&original[0]);

            if n == 1 {
                assert!(queue.is_empty());
                assert_eq!(queue.current_id(), None);
                assert_eq!(queue.status(), QueueStatus::Empty);
            } else {
                assert_eq!(queue.len(), n - 1);
                assert_eq!(queue.current_id(), Some(&original[1]));
            }
        }
    }

    #[test]
    fn advance_jumps_to_head_not_neighbour() {
        let (mut queue, original) = filled(4);
        queue.select_for_playback(&original[2]);

        queue.advance(&original[2]);

        assert_eq!(ids(&queue), vec![original[0].clone(), original[1].clone(), original[3].clone()]);
        assert_eq!(queue.current_id(), Some(&original[0]));
    }

    #[test]
    fn advance_after_entry_already_gone_still_repairs_current() {
        let (mut queue, original) = filled(3);
        queue.entries.remove(0);

        queue.advance(&original[0]);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_id(), Some(&original[1]));
    }

    #[test]
    fn removing_non_current_only_shrinks_queue() {
        let (mut queue, original) = filled(4);
        queue.select_for_playback(&original[1]);

        let removed = queue.remove(&original[3]).unwrap();

        assert_eq!(removed.queue_id, original[3]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.current_id(), Some(&original[1]));
    }

    #[test]
    fn removing_current_matches_playback_end() {
        for n in 1..=5 {
            for current in 0..n {
                let (mut start, original) = filled(n);
                start.select_for_playback(&original[current]);

                let mut via_remove = start.clone();
                let mut via_end = start.clone();
                via_remove.remove(&original[current]);
                via_end.advance(&original[current]);

                assert_eq!(via_remove, via_end, "n={} current={}", n, current);
            }
        }
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let (mut queue, _) = filled(2);
        let before = queue.clone();
        let stale = QueueId::from("gone-99".to_string());

        assert!(!queue.select_for_playback(&stale));
        assert!(queue.remove(&stale).is_none());
        assert_eq!(queue, before);
    }

    #[test]
    fn select_switches_current() {
        let (mut queue, original) = filled(3);
        assert!(queue.select_for_playback(&original[2]));
        assert!(queue.is_current(&original[2]));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn queue_ids_stay_unique_for_repeated_songs() {
        let mut queue = QueueManager::new();
        let mut seen = HashSet::new();

        for _ in 0..50 {
            assert!(seen.insert(queue.enqueue(song("same"))));
        }
        // Ids of consumed entries are never handed out again
        let first = queue.current_id().cloned().unwrap();
        queue.advance(&first);
        assert!(seen.insert(queue.enqueue(song("same"))));
    }

    #[test]
    fn full_karaoke_night() {
        let mut queue = QueueManager::new();

        let a = queue.enqueue(song("a"));
        assert_eq!(ids(&queue), vec![a.clone()]);
        assert_eq!(queue.current_id(), Some(&a));

        let b = queue.enqueue(song("b"));
        assert_eq!(ids(&queue), vec![a.clone(), b.clone()]);
        assert_eq!(queue.current_id(), Some(&a));

        let c = queue.enqueue(song("c"));
        assert_eq!(ids(&queue), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(queue.current_id(), Some(&a));

        queue.advance(&a);
        assert_eq!(ids(&queue), vec![b.clone(), c.clone()]);
        assert_eq!(queue.current_id(), Some(&b));

        queue.remove(&c);
        assert_eq!(ids(&queue), vec![b.clone()]);
        assert_eq!(queue.current_id(), Some(&b));

        queue.advance(&b);
        assert!(queue.is_empty());
        assert_eq!(queue.current_id(), None);
        assert_eq!(queue.status(), QueueStatus::Empty);
    }
}
