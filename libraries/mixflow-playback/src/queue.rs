//! Upcoming-track queue
//!
//! An append log of track identifiers with a consumption cursor. Entries
//! are resolved into full tracks lazily; the queue itself never holds
//! stream URLs. After insertion the log is never reordered, only filtered
//! on the way in.

use mixflow_core::TrackId;
use std::collections::HashSet;

/// Recommendation-derived queue of upcoming track ids
///
/// Entries at or before the cursor are consumed. A new user search resets
/// the queue entirely; refills extend it without touching unconsumed
/// entries.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    /// Append log of candidate ids, never reordered
    entries: Vec<TrackId>,

    /// Index of the first unconsumed entry
    cursor: usize,
}

impl PlayQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything (new user-initiated search)
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Install a fresh candidate list (queue was empty)
    ///
    /// Filters out the context id and every already-played id, then
    /// deduplicates preserving relative order. The cursor restarts at 0.
    pub fn populate(&mut self, context: &TrackId, candidates: Vec<TrackId>, played: &HashSet<TrackId>) {
        let mut seen: HashSet<TrackId> = HashSet::with_capacity(candidates.len());
        self.entries = candidates
            .into_iter()
            .filter(|id| id != context && !played.contains(id) && seen.insert(id.clone()))
            .collect();
        self.cursor = 0;
    }

    /// Append filtered candidates to the existing queue
    ///
    /// Candidates already played or already present anywhere in the queue
    /// (consumed or not) are dropped. Returns how many entries were added.
    pub fn refill(&mut self, context: &TrackId, candidates: Vec<TrackId>, played: &HashSet<TrackId>) -> usize {
        let mut known: HashSet<TrackId> = self.entries.iter().cloned().collect();
        let before = self.entries.len();

        for id in candidates {
            if &id == context || played.contains(&id) || known.contains(&id) {
                continue;
            }
            known.insert(id.clone());
            self.entries.push(id);
        }

        self.entries.len() - before
    }

    /// First unconsumed id that has not been played, without advancing
    ///
    /// Ids can become played between enqueue and consumption; the scan
    /// skips those. `None` means the queue is exhausted.
    pub fn next_candidate(&self, played: &HashSet<TrackId>) -> Option<&TrackId> {
        self.entries[self.cursor..]
            .iter()
            .find(|id| !played.contains(*id))
    }

    /// Move the cursor past the identifier just consumed
    pub fn advance_past(&mut self, id: &TrackId) {
        if let Some(pos) = self.entries[self.cursor..].iter().position(|e| e == id) {
            self.cursor += pos + 1;
        }
    }

    /// Number of unconsumed entries
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Whether the queue holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries including consumed ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[TrackId] {
        &self.entries
    }
}
