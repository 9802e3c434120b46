use std::sync::Arc;

use lanegraph_protocol::SharedStr;

use super::{Commit, TrackRow};

/// What one row of the history list shows.
#[derive(Debug, Clone)]
pub enum RowItem {
    /// Not fetched yet.
    Placeholder,
    /// The page holding this row could not be fetched.
    Failed(SharedStr),
    Commit {
        commit: Arc<Commit>,
        /// `None` until the lane engine has reached this row.
        tracks: Option<Arc<TrackRow>>,
    },
}

impl RowItem {
    pub fn commit(&self) -> Option<&Arc<Commit>> {
        match self {
            RowItem::Commit { commit, .. } => Some(commit),
            _ => None,
        }
    }

    pub fn tracks(&self) -> Option<&Arc<TrackRow>> {
        match self {
            RowItem::Commit { tracks, .. } => tracks.as_ref(),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, RowItem::Placeholder)
    }
}

fn same_arc<T: PartialEq>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

impl PartialEq for RowItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RowItem::Placeholder, RowItem::Placeholder) => true,
            (RowItem::Failed(a), RowItem::Failed(b)) => a == b,
            (
                RowItem::Commit {
                    commit: ca,
                    tracks: ta,
                },
                RowItem::Commit {
                    commit: cb,
                    tracks: tb,
                },
            ) => {
                same_arc(ca, cb)
                    && match (ta, tb) {
                        (Some(a), Some(b)) => same_arc(a, b),
                        (None, None) => true,
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitId;

    fn commit(hash: &str) -> Arc<Commit> {
        Arc::new(Commit::new(CommitId::parse(hash).expect("valid id"), Vec::new()))
    }

    #[test]
    fn track_arrival_changes_equality() {
        let c = commit("abcd");
        let bare = RowItem::Commit {
            commit: c.clone(),
            tracks: None,
        };
        let laned = RowItem::Commit {
            commit: c.clone(),
            tracks: Some(Arc::new(TrackRow::with_width(1))),
        };
        assert_ne!(bare, laned);
        assert_eq!(bare, bare.clone());
    }

    #[test]
    fn equal_values_in_different_allocations_compare_equal() {
        let a = RowItem::Commit {
            commit: commit("abcd"),
            tracks: None,
        };
        let b = RowItem::Commit {
            commit: commit("abcd"),
            tracks: None,
        };
        assert_eq!(a, b);
        assert_ne!(a, RowItem::Placeholder);
        assert_ne!(RowItem::Failed("x".into()), RowItem::Placeholder);
    }
}
