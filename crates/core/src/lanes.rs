//! Incremental lane assignment.
//!
//! Rows are processed strictly in index order. The engine keeps one slot per
//! open lane holding the commit id it expects next on that lane; each row
//! consumes the slots matching the row's commit and refills them with the
//! commit's parents. All state lives here, so a later page of commits picks
//! up exactly where the previous one stopped.

use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::model::{Commit, CommitId, Track, TrackRow, Visibility};
use crate::store::CommitStore;

#[derive(Debug, Clone)]
pub struct LaneEngine {
    /// Expected next commit per lane column; `None` marks a free column.
    lanes: Vec<Option<CommitId>>,
    next_row: usize,
    /// Lane 0 has not shown a real commit yet; rows above the head draw it
    /// hidden.
    first_lane_empty: bool,
}

impl LaneEngine {
    /// Engine with no open lanes. The first commit opens lane 0.
    pub fn new() -> Self {
        Self {
            lanes: Vec::new(),
            next_row: 0,
            first_lane_empty: true,
        }
    }

    /// Engine whose lane 0 waits for the primary branch head.
    pub fn seeded(head: CommitId) -> Self {
        Self {
            lanes: vec![Some(head)],
            ..Self::new()
        }
    }

    /// Index of the next row `assign` will process.
    pub fn next_row(&self) -> usize {
        self.next_row
    }

    pub fn lanes(&self) -> &[Option<CommitId>] {
        &self.lanes
    }

    pub fn open_lanes(&self) -> usize {
        self.lanes.iter().filter(|l| l.is_some()).count()
    }

    /// Process the next row.
    ///
    /// The returned row is indexed by lane positions as they were before this
    /// commit was applied, so outgoing column `k` here meets incoming column
    /// `k` in the following row.
    pub fn assign(&mut self, commit: &Commit) -> TrackRow {
        let mut tracks = TrackRow::with_width(self.lanes.len());
        let mut primary: Option<usize> = None;

        for lane in 0..self.lanes.len() {
            let matches = match &self.lanes[lane] {
                None => continue,
                Some(expected) => *expected == commit.id,
            };

            if !matches {
                tracks.insert(Track::pass_through(lane, self.lane_visibility(lane)));
                continue;
            }

            match primary {
                None => {
                    let mut track = self.open_primary(lane, commit);
                    track.incoming.push(lane);
                    tracks.insert(track);
                    primary = Some(lane);
                }
                Some(primary_lane) => {
                    // Merge-in: absorbed into the primary node.
                    if let Some(track) = tracks.get_mut(primary_lane) {
                        track.push_incoming(lane);
                    }
                    self.lanes[lane] = None;
                }
            }
        }

        let primary = match primary {
            Some(lane) => lane,
            None => {
                // Nothing was waiting for this commit: a new branch tip.
                let lane = self.free_lane();
                let track = self.open_primary(lane, commit);
                tracks.insert(track);
                lane
            }
        };

        for parent in commit.parents.iter().skip(1) {
            // First match by ascending lane index wins.
            let existing = self
                .lanes
                .iter()
                .position(|expected| expected.as_ref() == Some(parent));
            let lane = match existing {
                Some(lane) => lane,
                None => {
                    let lane = self.free_lane();
                    self.lanes[lane] = Some(parent.clone());
                    tracks.insert(Track {
                        depth: lane,
                        visibility: self.lane_visibility(lane),
                        incoming: Vec::new(),
                        outgoing: vec![lane],
                        active: false,
                    });
                    lane
                }
            };
            if let Some(track) = tracks.get_mut(primary) {
                track.push_outgoing(lane);
            }
        }

        while self.lanes.last().is_some_and(Option::is_none) {
            self.lanes.pop();
        }

        trace!(
            row = self.next_row,
            commit = commit.id.short(),
            lane = primary,
            open = self.open_lanes(),
            "assigned lanes"
        );
        self.next_row += 1;
        tracks
    }

    /// Process a batch of consecutive rows.
    pub fn advance(&mut self, commits: &[Arc<Commit>]) -> Vec<TrackRow> {
        let rows: Vec<TrackRow> = commits.iter().map(|c| self.assign(c)).collect();
        debug!(rows = rows.len(), next_row = self.next_row, "lane batch");
        rows
    }

    /// Assign lanes to every loaded row from `next_row` onward, stopping at
    /// the first row that is not loaded. Returns the rows processed.
    pub fn advance_store(&mut self, store: &mut CommitStore) -> Range<usize> {
        let start = self.next_row;
        while let Some(commit) = store.commit(self.next_row).cloned() {
            let index = self.next_row;
            let tracks = self.assign(&commit);
            store.set_tracks(index, tracks);
        }
        if self.next_row > start {
            debug!(
                rows = self.next_row - start,
                next_row = self.next_row,
                open = self.open_lanes(),
                "lanes advanced"
            );
        }
        start..self.next_row
    }

    /// Make `lane` the primary lane of `commit`: continue it with the first
    /// parent, or close it for a root commit.
    fn open_primary(&mut self, lane: usize, commit: &Commit) -> Track {
        let visibility = if lane == 0 && self.first_lane_empty {
            self.first_lane_empty = false;
            Visibility::Emerging
        } else {
            Visibility::Established
        };

        let mut track = Track {
            depth: lane,
            visibility,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            active: true,
        };
        match commit.first_parent() {
            Some(parent) => {
                self.lanes[lane] = Some(parent.clone());
                track.outgoing.push(lane);
            }
            None => self.lanes[lane] = None,
        }
        track
    }

    fn lane_visibility(&self, lane: usize) -> Visibility {
        if lane == 0 && self.first_lane_empty {
            Visibility::Hidden
        } else {
            Visibility::Established
        }
    }

    /// Lowest free column, appending one if every column is taken.
    fn free_lane(&mut self) -> usize {
        match self.lanes.iter().position(Option::is_none) {
            Some(lane) => lane,
            None => {
                self.lanes.push(None);
                self.lanes.len() - 1
            }
        }
    }
}

impl Default for LaneEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn id(name: &str) -> CommitId {
        // Letters a-f are valid hex; repeat to reach the minimum length.
        CommitId::parse(&name.repeat(4)).expect("valid id")
    }

    fn commit(name: &str, parents: &[&str]) -> Arc<Commit> {
        Arc::new(Commit::new(id(name), parents.iter().map(|p| id(p)).collect()))
    }

    fn track(row: &TrackRow, lane: usize) -> &Track {
        row.get(lane).expect("track present")
    }

    #[test]
    fn linear_history_with_one_merge() {
        let mut engine = LaneEngine::seeded(id("a"));
        let rows = engine.advance(&[
            commit("a", &["b"]),
            commit("b", &["c", "d"]),
            commit("c", &[]),
            commit("d", &[]),
        ]);

        let t = track(&rows[0], 0);
        assert_eq!(t.incoming, vec![0]);
        assert_eq!(t.outgoing, vec![0]);
        assert!(t.active);
        assert_eq!(t.visibility, Visibility::Emerging);
        assert_eq!(rows[0].occupied_count(), 1);

        let t = track(&rows[1], 0);
        assert_eq!(t.incoming, vec![0]);
        assert_eq!(t.outgoing, vec![0, 1]);
        assert!(t.active);
        assert_eq!(t.visibility, Visibility::Established);

        let t = track(&rows[2], 0);
        assert_eq!(t.incoming, vec![0]);
        assert!(t.outgoing.is_empty());
        assert!(t.active);
        let t = track(&rows[2], 1);
        assert_eq!(t.incoming, vec![1]);
        assert_eq!(t.outgoing, vec![1]);
        assert!(!t.active);

        assert!(rows[3].get(0).is_none());
        let t = track(&rows[3], 1);
        assert_eq!(t.incoming, vec![1]);
        assert!(t.outgoing.is_empty());
        assert!(t.active);

        assert_eq!(engine.open_lanes(), 0);
        assert_eq!(engine.next_row(), 4);
    }

    #[test]
    fn lane_state_after_each_row() {
        let mut engine = LaneEngine::seeded(id("a"));
        engine.assign(&commit("a", &["b"]));
        assert_eq!(engine.lanes(), &[Some(id("b"))]);
        engine.assign(&commit("b", &["c", "d"]));
        assert_eq!(engine.lanes(), &[Some(id("c")), Some(id("d"))]);
        engine.assign(&commit("c", &[]));
        assert_eq!(engine.lanes(), &[None, Some(id("d"))]);
        engine.assign(&commit("d", &[]));
        assert!(engine.lanes().is_empty());
    }

    #[test]
    fn branches_converging_on_one_parent_merge_in() {
        // Two children of `c` occupy lanes 0 and 1; `c` absorbs lane 1.
        let mut engine = LaneEngine::seeded(id("a"));
        let rows = engine.advance(&[
            commit("a", &["c"]),
            commit("b", &["c"]),
            commit("c", &["d"]),
        ]);
        assert_eq!(track(&rows[1], 1).incoming, Vec::<usize>::new());
        assert!(track(&rows[1], 1).active);

        let merge = &rows[2];
        assert_eq!(track(merge, 0).incoming, vec![0, 1]);
        assert_eq!(track(merge, 0).outgoing, vec![0]);
        assert!(merge.get(1).is_none());
        assert_eq!(engine.lanes(), &[Some(id("d"))]);
    }

    #[test]
    fn octopus_merge_allocates_a_lane_per_parent() {
        let mut engine = LaneEngine::seeded(id("a"));
        let rows = engine.advance(&[commit("a", &["b", "c", "d"])]);
        let primary = track(&rows[0], 0);
        assert_eq!(primary.outgoing, vec![0, 1, 2]);
        for lane in 1..3 {
            let t = track(&rows[0], lane);
            assert!(t.incoming.is_empty());
            assert_eq!(t.outgoing, vec![lane]);
            assert!(!t.active);
        }
        assert_eq!(engine.open_lanes(), 3);
    }

    #[test]
    fn merge_parent_already_open_is_reused() {
        // `b` is waited on in lane 1 when merge `f` names it as second parent.
        let mut engine = LaneEngine::seeded(id("e"));
        let rows = engine.advance(&[
            commit("e", &["f"]),
            commit("c", &["b"]),
            commit("f", &["a", "b"]),
        ]);
        let merge = &rows[2];
        assert_eq!(track(merge, 0).outgoing, vec![0, 1]);
        // Lane 1 just passes through; no new lane was opened.
        assert_eq!(track(merge, 1).incoming, vec![1]);
        assert!(!track(merge, 1).active);
        assert_eq!(engine.lanes().len(), 2);
    }

    #[test]
    fn duplicate_parents_do_not_duplicate_edges() {
        let mut engine = LaneEngine::seeded(id("a"));
        let rows = engine.advance(&[commit("a", &["b", "b"])]);
        assert_eq!(track(&rows[0], 0).outgoing, vec![0]);
        assert_eq!(engine.open_lanes(), 1);
    }

    #[test]
    fn freed_lanes_are_reused_lowest_first() {
        let mut engine = LaneEngine::seeded(id("a"));
        engine.advance(&[
            commit("a", &["b", "c", "d"]),
            commit("c", &[]),
        ]);
        assert_eq!(engine.lanes(), &[Some(id("b")), None, Some(id("d"))]);
        let rows = engine.advance(&[commit("b", &["e", "f"])]);
        assert_eq!(track(&rows[0], 0).outgoing, vec![0, 1]);
        assert_eq!(engine.lanes()[1], Some(id("f")));
    }

    #[test]
    fn unseeded_engine_opens_lane_zero() {
        let mut engine = LaneEngine::new();
        let rows = engine.advance(&[commit("a", &["b"])]);
        let t = track(&rows[0], 0);
        assert!(t.incoming.is_empty());
        assert_eq!(t.visibility, Visibility::Emerging);
    }

    #[test]
    fn rows_above_head_draw_lane_zero_hidden() {
        // A branch newer than the seeded head comes first.
        let mut engine = LaneEngine::seeded(id("a"));
        let rows = engine.advance(&[commit("f", &["a"]), commit("a", &[])]);
        assert_eq!(track(&rows[0], 0).visibility, Visibility::Hidden);
        let tip = track(&rows[0], 1);
        assert!(tip.active);
        assert_eq!(tip.visibility, Visibility::Established);

        let head = track(&rows[1], 0);
        assert_eq!(head.visibility, Visibility::Emerging);
        assert_eq!(head.incoming, vec![0, 1]);
    }

    #[test]
    fn dangling_parent_keeps_lane_open() {
        let mut engine = LaneEngine::seeded(id("a"));
        engine.advance(&[commit("a", &["b", "c"]), commit("b", &[])]);
        assert_eq!(engine.lanes(), &[None, Some(id("c"))]);
        assert_eq!(engine.open_lanes(), 1);
    }

    #[test]
    fn split_batches_match_single_batch() {
        let history = vec![
            commit("a", &["b", "c"]),
            commit("b", &["d"]),
            commit("c", &["d"]),
            commit("d", &["e"]),
            commit("e", &[]),
        ];
        let mut whole = LaneEngine::seeded(id("a"));
        let expected = whole.advance(&history);

        let mut paged = LaneEngine::seeded(id("a"));
        let mut rows = paged.advance(&history[..2]);
        rows.extend(paged.advance(&history[2..]));
        assert_eq!(rows, expected);
    }

    #[test]
    fn advance_store_halts_at_placeholder_and_resumes() {
        let mut store = CommitStore::new(2);
        store.extend_to(4);
        let mut engine = LaneEngine::seeded(id("a"));

        store.fill_page(1, vec![(*commit("c", &["d"])).clone(), (*commit("d", &[])).clone()]);
        assert_eq!(engine.advance_store(&mut store), 0..0);
        assert!(store.item(2).and_then(|i| i.tracks().cloned()).is_none());

        store.fill_page(0, vec![(*commit("a", &["b"])).clone(), (*commit("b", &["c"])).clone()]);
        assert_eq!(engine.advance_store(&mut store), 0..4);
        assert!((0..4).all(|i| store.item(i).and_then(|r| r.tracks().cloned()).is_some()));
        assert_eq!(engine.advance_store(&mut store), 4..4);
    }

    /// Random DAG, newest commit first, parents always after children.
    fn random_history(seed: u64, len: usize) -> Vec<Arc<Commit>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let ids: Vec<CommitId> = (0..len)
            .map(|i| CommitId::parse(&format!("{i:08x}")).expect("valid id"))
            .collect();
        // Build oldest-first so parents already exist.
        let mut oldest_first = Vec::with_capacity(len);
        for i in 0..len {
            let mut parents = Vec::new();
            if i > 0 {
                let count = match rng.gen_range(0..10) {
                    0 => 0,
                    1 | 2 => 2,
                    3 => 3,
                    _ => 1,
                };
                for _ in 0..count {
                    let p = i - 1 - rng.gen_range(0..i.min(6));
                    if !parents.contains(&ids[p]) {
                        parents.push(ids[p].clone());
                    }
                }
            }
            oldest_first.push(Arc::new(Commit::new(ids[i].clone(), parents)));
        }
        oldest_first.reverse();
        oldest_first
    }

    #[test]
    fn random_histories_keep_lanes_connected_and_stable() {
        for seed in 1..40u64 {
            let history = random_history(seed * 7919, 60);
            let mut engine = LaneEngine::seeded(history[0].id.clone());
            let mut rows = Vec::new();

            for commit in &history {
                let before = engine.lanes().to_vec();
                let row = engine.assign(commit);
                let after = engine.lanes().to_vec();

                // Exactly one node per row.
                assert_eq!(row.occupied().filter(|t| t.active).count(), 1);
                let primary = row.primary().map(|t| t.depth).expect("primary");

                // Untouched lanes keep their expected commit.
                for (lane, expected) in before.iter().enumerate() {
                    if let Some(expected) = expected
                        && *expected != commit.id
                    {
                        assert_eq!(after.get(lane), Some(&Some(expected.clone())));
                    }
                }

                // One track per open branch at this row.
                let mut open: Vec<usize> = after
                    .iter()
                    .enumerate()
                    .filter_map(|(lane, e)| e.as_ref().map(|_| lane))
                    .collect();
                if !open.contains(&primary) {
                    open.push(primary);
                }
                assert_eq!(row.occupied_count(), open.len(), "seed {seed}");

                rows.push(row);
            }

            for pair in rows.windows(2) {
                for track in pair[0].occupied() {
                    for &k in &track.outgoing {
                        assert!(
                            pair[1].occupied().any(|t| t.incoming.contains(&k)),
                            "seed {seed}: outgoing {k} has no continuation"
                        );
                    }
                }
            }
        }
    }
}
