//! Append-only, randomly indexable commit sequence that fills in by pages.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use lanegraph_protocol::SharedStr;
use tracing::{debug, warn};

use crate::model::{Commit, RowItem, TrackRow};
use crate::window::RowSource;

pub const DEFAULT_PAGE_SIZE: usize = 50;

const HISTORY_ENDED: &str = "history ended early";

#[derive(Debug, Clone)]
pub struct LoadedRow {
    pub commit: Arc<Commit>,
    pub tracks: Option<Arc<TrackRow>>,
}

#[derive(Debug, Clone)]
pub enum Slot {
    Placeholder,
    Failed(SharedStr),
    Loaded(LoadedRow),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    /// Bumped on every write to the slot.
    revision: u64,
}

impl Entry {
    fn placeholder() -> Self {
        Self {
            slot: Slot::Placeholder,
            revision: 0,
        }
    }
}

/// Ordered commit rows; index 0 is the most recent commit.
///
/// Rows are only ever appended or have their slot replaced (placeholder →
/// loaded, loaded → loaded-with-tracks); nothing is removed or reordered.
#[derive(Debug, Clone)]
pub struct CommitStore {
    entries: Vec<Entry>,
    page_size: usize,
    next_revision: u64,
}

impl CommitStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            page_size: page_size.max(1),
            next_revision: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_of(&self, index: usize) -> usize {
        index / self.page_size
    }

    /// Row indices covered by `page`, clipped to the current length.
    pub fn page_range(&self, page: usize) -> Range<usize> {
        let start = (page * self.page_size).min(self.len());
        let end = ((page + 1) * self.page_size).min(self.len());
        start..end
    }

    /// Grow to `total` rows with placeholders. Never shrinks.
    pub fn extend_to(&mut self, total: usize) {
        if total > self.entries.len() {
            self.entries.resize_with(total, Entry::placeholder);
        }
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.entries.get(index).map(|e| &e.slot)
    }

    pub fn revision(&self, index: usize) -> Option<u64> {
        self.entries.get(index).map(|e| e.revision)
    }

    pub fn commit(&self, index: usize) -> Option<&Arc<Commit>> {
        match self.slot(index) {
            Some(Slot::Loaded(row)) => Some(&row.commit),
            _ => None,
        }
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        matches!(self.slot(index), Some(Slot::Loaded(_)))
    }

    pub fn item(&self, index: usize) -> Option<RowItem> {
        self.slot(index).map(|slot| match slot {
            Slot::Placeholder => RowItem::Placeholder,
            Slot::Failed(msg) => RowItem::Failed(msg.clone()),
            Slot::Loaded(row) => RowItem::Commit {
                commit: row.commit.clone(),
                tracks: row.tracks.clone(),
            },
        })
    }

    fn write(&mut self, index: usize, slot: Slot) {
        let revision = self.next_revision;
        self.next_revision += 1;
        if let Some(entry) = self.entries.get_mut(index) {
            entry.slot = slot;
            entry.revision = revision;
        }
    }

    /// Store a fetched page. Pages may arrive in any order.
    ///
    /// Returns the indices whose slot changed. Rows that were already loaded
    /// keep their data. When the backend returns fewer commits than the page
    /// should hold, the remaining placeholders are marked as failed.
    pub fn fill_page(&mut self, page: usize, commits: Vec<Commit>) -> Vec<usize> {
        let start = page * self.page_size;
        let expected_end = self.page_range(page).end.max(start);
        self.extend_to(start + commits.len());

        let mut changed = Vec::with_capacity(commits.len());
        for (offset, commit) in commits.into_iter().enumerate() {
            let index = start + offset;
            if self.is_loaded(index) {
                continue;
            }
            self.write(
                index,
                Slot::Loaded(LoadedRow {
                    commit: Arc::new(commit),
                    tracks: None,
                }),
            );
            changed.push(index);
        }

        let filled_end = start + changed.len().max(self.loaded_run(start));
        if filled_end < expected_end {
            warn!(page, filled_end, expected_end, "page shorter than expected");
            for index in filled_end..expected_end {
                if matches!(self.slot(index), Some(Slot::Placeholder)) {
                    self.write(index, Slot::Failed(SharedStr::from(HISTORY_ENDED)));
                    changed.push(index);
                }
            }
        }

        debug!(page, rows = changed.len(), "page stored");
        changed
    }

    /// Number of consecutive loaded rows starting at `start`.
    fn loaded_run(&self, start: usize) -> usize {
        (start..self.len())
            .take_while(|&i| self.is_loaded(i))
            .count()
    }

    /// Mark the still-unfetched rows of `page` as failed.
    pub fn fail_page(&mut self, page: usize, message: &str) -> Vec<usize> {
        let message = SharedStr::from(message);
        let mut changed = Vec::new();
        for index in self.page_range(page) {
            if matches!(self.slot(index), Some(Slot::Placeholder)) {
                self.write(index, Slot::Failed(message.clone()));
                changed.push(index);
            }
        }
        changed
    }

    /// Attach lane output to a loaded row. Returns `false` if the row is not
    /// loaded.
    pub fn set_tracks(&mut self, index: usize, tracks: TrackRow) -> bool {
        let Some(Slot::Loaded(row)) = self.slot(index) else {
            return false;
        };
        let commit = row.commit.clone();
        self.write(
            index,
            Slot::Loaded(LoadedRow {
                commit,
                tracks: Some(Arc::new(tracks)),
            }),
        );
        true
    }
}

impl RowSource for CommitStore {
    type Item = RowItem;

    fn len(&self) -> usize {
        CommitStore::len(self)
    }

    fn item(&self, index: usize) -> Option<RowItem> {
        CommitStore::item(self, index)
    }
}

/// Deduplicates page fetches: at most one in-flight request per page.
#[derive(Debug, Default, Clone)]
pub struct PageTracker {
    pending: HashSet<usize>,
    loaded: HashSet<usize>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `page` for fetching. `false` if it is already pending or loaded.
    pub fn request(&mut self, page: usize) -> bool {
        if self.loaded.contains(&page) || self.pending.contains(&page) {
            return false;
        }
        self.pending.insert(page);
        true
    }

    pub fn complete(&mut self, page: usize) {
        self.pending.remove(&page);
        self.loaded.insert(page);
    }

    /// A failed page can be requested again.
    pub fn fail(&mut self, page: usize) {
        self.pending.remove(&page);
    }

    pub fn is_pending(&self, page: usize) -> bool {
        self.pending.contains(&page)
    }

    pub fn is_loaded(&self, page: usize) -> bool {
        self.loaded.contains(&page)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitId;

    fn commits(range: Range<usize>) -> Vec<Commit> {
        range
            .map(|i| {
                let id = CommitId::parse(&format!("{i:08x}")).expect("valid id");
                Commit::new(id, Vec::new())
            })
            .collect()
    }

    #[test]
    fn pages_fill_out_of_order() {
        let mut store = CommitStore::new(4);
        store.extend_to(10);
        assert_eq!(store.page_range(2), 8..10);

        let changed = store.fill_page(1, commits(4..8));
        assert_eq!(changed, vec![4, 5, 6, 7]);
        assert!(!store.is_loaded(0));
        assert!(store.is_loaded(4));

        store.fill_page(0, commits(0..4));
        assert!((0..8).all(|i| store.is_loaded(i)));
        assert_eq!(store.item(9), Some(RowItem::Placeholder));
    }

    #[test]
    fn loaded_rows_are_not_overwritten() {
        let mut store = CommitStore::new(2);
        store.extend_to(2);
        store.fill_page(0, commits(0..2));
        let revision = store.revision(0);
        let changed = store.fill_page(0, commits(10..12));
        assert!(changed.is_empty());
        assert_eq!(store.revision(0), revision);
        assert_eq!(store.commit(0).map(|c| c.id.as_str().to_string()), Some("00000000".into()));
    }

    #[test]
    fn short_page_marks_missing_rows() {
        let mut store = CommitStore::new(4);
        store.extend_to(4);
        let changed = store.fill_page(0, commits(0..2));
        assert_eq!(changed, vec![0, 1, 2, 3]);
        assert!(matches!(store.slot(3), Some(Slot::Failed(_))));
    }

    #[test]
    fn page_beyond_declared_length_extends_store() {
        let mut store = CommitStore::new(3);
        store.fill_page(0, commits(0..3));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn failed_rows_recover_on_retry() {
        let mut store = CommitStore::new(2);
        store.extend_to(2);
        assert_eq!(store.fail_page(0, "offline"), vec![0, 1]);
        assert!(matches!(store.item(0), Some(RowItem::Failed(_))));
        store.fill_page(0, commits(0..2));
        assert!(store.is_loaded(1));
    }

    #[test]
    fn set_tracks_bumps_revision_and_keeps_commit() {
        let mut store = CommitStore::new(2);
        store.extend_to(2);
        assert!(!store.set_tracks(0, TrackRow::default()));
        store.fill_page(0, commits(0..2));
        let before = store.revision(0);
        let commit = store.commit(0).cloned();
        assert!(store.set_tracks(0, TrackRow::with_width(1)));
        assert!(store.revision(0) > before);
        assert!(Arc::ptr_eq(
            store.commit(0).expect("loaded"),
            &commit.expect("loaded")
        ));
        assert!(store.item(0).and_then(|i| i.tracks().cloned()).is_some());
    }

    #[test]
    fn tracker_dedups_and_allows_retry() {
        let mut tracker = PageTracker::new();
        assert!(tracker.request(3));
        assert!(!tracker.request(3));
        assert!(tracker.is_pending(3));
        tracker.fail(3);
        assert!(tracker.request(3));
        tracker.complete(3);
        assert!(tracker.is_loaded(3));
        assert!(!tracker.request(3));
        assert_eq!(tracker.pending_count(), 0);
    }
}
