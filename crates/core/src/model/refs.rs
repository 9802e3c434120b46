use lanegraph_protocol::SharedStr;
use serde::{Deserialize, Serialize};

use super::CommitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// The checked-out `HEAD`.
    Head,
    Branch,
    RemoteBranch,
    Tag,
}

/// A named pointer into history (branch, tag, `HEAD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub name: SharedStr,
    pub target: CommitId,
    pub kind: RefKind,
}

impl Ref {
    pub fn new(name: impl Into<SharedStr>, target: CommitId, kind: RefKind) -> Self {
        Self {
            name: name.into(),
            target,
            kind,
        }
    }
}

/// The ref whose head seeds the lane engine: `HEAD`, then `main`, then
/// `master`, then the first local branch, then whatever comes first.
pub fn primary_head(refs: &[Ref]) -> Option<&Ref> {
    let branch_named = |name: &str| {
        refs.iter()
            .find(|r| r.kind == RefKind::Branch && r.name == name)
    };
    refs.iter()
        .find(|r| r.kind == RefKind::Head)
        .or_else(|| branch_named("main"))
        .or_else(|| branch_named("master"))
        .or_else(|| refs.iter().find(|r| r.kind == RefKind::Branch))
        .or_else(|| refs.first())
}
