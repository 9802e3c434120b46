use lanegraph_protocol::SharedStr;
use serde::{Deserialize, Serialize};

use super::CommitId;

/// Lines changed in one file. Binary files report `None` for both counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub path: SharedStr,
    #[serde(default)]
    pub insertions: Option<u32>,
    #[serde(default)]
    pub deletions: Option<u32>,
}

/// Everything shown for the selected commit that the list rows do not carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub id: CommitId,
    /// Full commit message, subject line included.
    #[serde(default)]
    pub message: SharedStr,
    #[serde(default)]
    pub files: Vec<FileStat>,
}

impl FileStat {
    pub fn is_binary(&self) -> bool {
        self.insertions.is_none() && self.deletions.is_none()
    }
}

impl CommitDetail {
    pub fn total_insertions(&self) -> u32 {
        self.files.iter().filter_map(|f| f.insertions).sum()
    }

    pub fn total_deletions(&self) -> u32 {
        self.files.iter().filter_map(|f| f.deletions).sum()
    }
}
