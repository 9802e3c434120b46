use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Commit, CommitDetail, CommitId, Ref};

#[derive(Debug, Error)]
pub enum JsonParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("commit {0} appears more than once")]
    DuplicateCommit(CommitId),
}

/// A serialized history: commits in row order plus the refs pointing into
/// it. `details` optionally carries full messages and file stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDump {
    #[serde(default)]
    pub refs: Vec<Ref>,
    pub commits: Vec<Commit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<CommitDetail>,
}

/// Parse a [`HistoryDump`] document.
pub fn parse_history(data: &[u8]) -> Result<HistoryDump, JsonParseError> {
    let dump: HistoryDump = serde_json::from_slice(data)?;

    let duplicate = {
        let mut seen = HashSet::with_capacity(dump.commits.len());
        dump.commits
            .iter()
            .find(|c| !seen.insert(&c.id))
            .map(|c| c.id.clone())
    };
    if let Some(id) = duplicate {
        return Err(JsonParseError::DuplicateCommit(id));
    }

    Ok(dump)
}
