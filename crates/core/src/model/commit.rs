use lanegraph_protocol::SharedStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MIN_ID_LEN: usize = 4;
const MAX_ID_LEN: usize = 64;
const SHORT_ID_LEN: usize = 7;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid commit id {0:?}: expected 4 to 64 hex characters")]
pub struct InvalidCommitId(pub String);

/// A commit hash. Identity of a commit in the graph.
///
/// Always lowercase hex; clones are a refcount bump since ids are copied
/// into the lane state and into parent lists all the time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(SharedStr);

impl CommitId {
    pub fn parse(s: &str) -> Result<Self, InvalidCommitId> {
        let s = s.trim();
        let valid_len = (MIN_ID_LEN..=MAX_ID_LEN).contains(&s.len());
        if !valid_len || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidCommitId(s.to_string()));
        }
        Ok(CommitId(SharedStr::from(s.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        let s = self.as_str();
        &s[..s.len().min(SHORT_ID_LEN)]
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommitId {
    type Err = InvalidCommitId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitId::parse(s)
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CommitId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Author or committer identity plus a unix timestamp (seconds).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub name: SharedStr,
    #[serde(default)]
    pub email: SharedStr,
    #[serde(default)]
    pub time: i64,
}

/// Short change statistics, as printed by `git log --shortstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeStat {
    pub files: u32,
    pub insertions: u32,
    pub deletions: u32,
}

/// One fetched commit. Immutable once it lands in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    /// First parent first. Empty for a root commit.
    #[serde(default)]
    pub parents: Vec<CommitId>,
    #[serde(default)]
    pub author: Signature,
    #[serde(default)]
    pub committer: Signature,
    #[serde(default)]
    pub summary: SharedStr,
    /// Human-readable ref labels pointing at this commit.
    #[serde(default)]
    pub refs: Vec<SharedStr>,
    #[serde(default)]
    pub stat: Option<ChangeStat>,
}

impl Commit {
    /// Minimal commit with only graph data, handy for building histories.
    pub fn new(id: CommitId, parents: Vec<CommitId>) -> Self {
        Self {
            id,
            parents,
            author: Signature::default(),
            committer: Signature::default(),
            summary: SharedStr::default(),
            refs: Vec::new(),
            stat: None,
        }
    }

    pub fn first_parent(&self) -> Option<&CommitId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}
