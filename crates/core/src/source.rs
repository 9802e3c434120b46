//! The history backend the session pulls commits from.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::model::{Commit, CommitDetail, CommitId, Ref};
use crate::parsers::{HistoryDump, ParseError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("commit {0} not found")]
    NotFound(CommitId),
}

/// A commit-history backend.
///
/// `fetch_commits` must return commits in the same global order for every
/// call, since `skip` addresses row indices.
pub trait CommitSource {
    fn fetch_commits(&mut self, skip: usize, limit: usize) -> Result<Vec<Commit>, FetchError>;

    fn fetch_refs(&mut self) -> Result<Vec<Ref>, FetchError>;

    /// Total number of rows in the history.
    fn count_commits(&mut self) -> Result<usize, FetchError>;

    fn fetch_detail(&mut self, id: &CommitId) -> Result<CommitDetail, FetchError>;
}

/// Serves an in-memory [`HistoryDump`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    dump: HistoryDump,
    details: HashMap<CommitId, usize>,
    /// Number of upcoming `fetch_commits` calls that fail.
    failures: usize,
    fetches: usize,
}

impl MemorySource {
    pub fn new(dump: HistoryDump) -> Self {
        let details = dump
            .details
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        Self {
            dump,
            details,
            failures: 0,
            fetches: 0,
        }
    }

    /// Make the next `count` page fetches fail with a backend error.
    pub fn fail_next(&mut self, count: usize) {
        self.failures = count;
    }

    /// Number of `fetch_commits` calls served so far, failed ones included.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn dump(&self) -> &HistoryDump {
        &self.dump
    }
}

impl CommitSource for MemorySource {
    fn fetch_commits(&mut self, skip: usize, limit: usize) -> Result<Vec<Commit>, FetchError> {
        self.fetches += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(FetchError::Backend("injected failure".to_string()));
        }
        let commits = &self.dump.commits;
        let start = skip.min(commits.len());
        let end = skip.saturating_add(limit).min(commits.len());
        debug!(skip, limit, returned = end - start, "memory fetch");
        Ok(commits[start..end].to_vec())
    }

    fn fetch_refs(&mut self) -> Result<Vec<Ref>, FetchError> {
        Ok(self.dump.refs.clone())
    }

    fn count_commits(&mut self) -> Result<usize, FetchError> {
        Ok(self.dump.commits.len())
    }

    fn fetch_detail(&mut self, id: &CommitId) -> Result<CommitDetail, FetchError> {
        if let Some(&index) = self.details.get(id) {
            return Ok(self.dump.details[index].clone());
        }
        // Without a stored detail, fall back to what the row itself knows.
        self.dump
            .commits
            .iter()
            .find(|c| c.id == *id)
            .map(|c| CommitDetail {
                id: c.id.clone(),
                message: c.summary.clone(),
                files: Vec::new(),
            })
            .ok_or_else(|| FetchError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CommitId {
        CommitId::parse(&name.repeat(4)).expect("valid id")
    }

    fn source() -> MemorySource {
        let commits = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|n| Commit::new(id(n), Vec::new()))
            .collect();
        MemorySource::new(HistoryDump {
            refs: Vec::new(),
            commits,
            details: vec![CommitDetail {
                id: id("b"),
                message: "full message".into(),
                files: Vec::new(),
            }],
        })
    }

    #[test]
    fn pages_are_clipped_to_history() {
        let mut src = source();
        assert_eq!(src.count_commits().expect("count"), 5);
        assert_eq!(src.fetch_commits(0, 2).expect("page").len(), 2);
        assert_eq!(src.fetch_commits(4, 2).expect("page").len(), 1);
        assert!(src.fetch_commits(10, 2).expect("page").is_empty());
    }

    #[test]
    fn injected_failures_are_consumed() {
        let mut src = source();
        src.fail_next(1);
        assert!(matches!(src.fetch_commits(0, 2), Err(FetchError::Backend(_))));
        assert!(src.fetch_commits(0, 2).is_ok());
        assert_eq!(src.fetches(), 2);
    }

    #[test]
    fn detail_lookup() {
        let mut src = source();
        assert_eq!(src.fetch_detail(&id("b")).expect("stored").message, "full message");
        assert_eq!(src.fetch_detail(&id("c")).expect("derived").id, id("c"));
        assert!(matches!(
            src.fetch_detail(&id("f")),
            Err(FetchError::NotFound(_))
        ));
    }
}
