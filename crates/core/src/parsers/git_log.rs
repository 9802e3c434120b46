use lanegraph_protocol::SharedStr;
use thiserror::Error;

use crate::model::{
    ChangeStat, Commit, CommitDetail, CommitId, FileStat, InvalidCommitId, Ref, RefKind, Signature,
};

pub(crate) const FIELD_SEP: u8 = 0x1f;
const RECORD_SEP: char = '\x1e';
const FIELD_COUNT: usize = 10;

/// `--format` argument for `git log` matching [`parse_git_log`]. Add
/// `--shortstat` to get change statistics.
pub const GIT_LOG_FORMAT: &str =
    "%H%x1f%P%x1f%an%x1f%ae%x1f%at%x1f%cn%x1f%ce%x1f%ct%x1f%D%x1f%s%x1e";

/// `--format` argument for `git show --numstat` matching [`parse_git_show`].
pub const GIT_SHOW_FORMAT: &str = "%B%x1e";

#[derive(Debug, Error)]
pub enum GitLogParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("record {record}: expected 10 fields, found {found}")]
    FieldCount { record: usize, found: usize },
    #[error("record {record}: {source}")]
    Id {
        record: usize,
        #[source]
        source: InvalidCommitId,
    },
    #[error("record {record}: invalid timestamp {value:?}")]
    Timestamp { record: usize, value: String },
    #[error("line {line}: expected `<object> <refname>`")]
    RefLine { line: usize },
    #[error("line {line}: invalid numstat entry")]
    Numstat { line: usize },
}

/// Parse `git log --format=GIT_LOG_FORMAT [--shortstat]` output.
///
/// Records end with `0x1e` and hold `0x1f`-separated fields. With
/// `--shortstat`, git prints the stat line after the record separator, so
/// any non-record line is attached to the preceding commit.
pub fn parse_git_log(data: &[u8]) -> Result<Vec<Commit>, GitLogParseError> {
    let text = std::str::from_utf8(data)?;
    let mut commits: Vec<Commit> = Vec::new();

    for chunk in text.split(RECORD_SEP) {
        for line in chunk.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.as_bytes().contains(&FIELD_SEP) {
                let record = commits.len();
                commits.push(parse_record(record, line)?);
            } else if let Some(stat) = parse_shortstat(line)
                && let Some(last) = commits.last_mut()
            {
                last.stat = Some(stat);
            }
        }
    }

    Ok(commits)
}

fn parse_record(record: usize, line: &str) -> Result<Commit, GitLogParseError> {
    let fields: Vec<&str> = line.split(FIELD_SEP as char).collect();
    if fields.len() != FIELD_COUNT {
        return Err(GitLogParseError::FieldCount {
            record,
            found: fields.len(),
        });
    }

    let id = |s: &str| CommitId::parse(s).map_err(|source| GitLogParseError::Id { record, source });
    let time = |s: &str| {
        s.trim().parse::<i64>().map_err(|_| GitLogParseError::Timestamp {
            record,
            value: s.to_string(),
        })
    };

    let parents = fields[1]
        .split_whitespace()
        .map(&id)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Commit {
        id: id(fields[0])?,
        parents,
        author: Signature {
            name: fields[2].into(),
            email: fields[3].into(),
            time: time(fields[4])?,
        },
        committer: Signature {
            name: fields[5].into(),
            email: fields[6].into(),
            time: time(fields[7])?,
        },
        refs: parse_decorations(fields[8]),
        summary: fields[9].into(),
        stat: None,
    })
}

/// `HEAD -> main, origin/main, tag: v1.0` → `["HEAD", "main", "origin/main", "v1.0"]`.
fn parse_decorations(field: &str) -> Vec<SharedStr> {
    let mut refs = Vec::new();
    for d in field.split(", ").map(str::trim).filter(|d| !d.is_empty()) {
        if let Some(branch) = d.strip_prefix("HEAD -> ") {
            refs.push(SharedStr::from("HEAD"));
            refs.push(SharedStr::from(branch));
        } else {
            refs.push(SharedStr::from(d.strip_prefix("tag: ").unwrap_or(d)));
        }
    }
    refs
}

/// ` 3 files changed, 10 insertions(+), 2 deletions(-)`; either count may be
/// missing.
fn parse_shortstat(line: &str) -> Option<ChangeStat> {
    let mut stat = ChangeStat::default();
    let mut matched = false;
    for part in line.split(',') {
        let mut words = part.split_whitespace();
        let (Some(count), Some(kind)) = (words.next(), words.next()) else {
            continue;
        };
        let Ok(count) = count.parse::<u32>() else {
            continue;
        };
        if kind.starts_with("file") {
            stat.files = count;
        } else if kind.starts_with("insertion") {
            stat.insertions = count;
        } else if kind.starts_with("deletion") {
            stat.deletions = count;
        } else {
            continue;
        }
        matched = true;
    }
    matched.then_some(stat)
}

/// Parse `git for-each-ref --format='%(objectname) %(refname)'` output,
/// optionally preceded or followed by a `<object> HEAD` line.
///
/// Symbolic remote heads (`refs/remotes/origin/HEAD`) and refs outside
/// heads/remotes/tags are skipped.
pub fn parse_refs(data: &[u8]) -> Result<Vec<Ref>, GitLogParseError> {
    let text = std::str::from_utf8(data)?;
    let mut refs = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((object, name)) = line.split_once(char::is_whitespace) else {
            return Err(GitLogParseError::RefLine { line: index + 1 });
        };
        let target = CommitId::parse(object).map_err(|source| GitLogParseError::Id {
            record: index,
            source,
        })?;
        let name = name.trim();

        let (short, kind) = if name == "HEAD" {
            ("HEAD", RefKind::Head)
        } else if let Some(branch) = name.strip_prefix("refs/heads/") {
            (branch, RefKind::Branch)
        } else if let Some(remote) = name.strip_prefix("refs/remotes/") {
            if remote.ends_with("/HEAD") {
                continue;
            }
            (remote, RefKind::RemoteBranch)
        } else if let Some(tag) = name.strip_prefix("refs/tags/") {
            (tag, RefKind::Tag)
        } else {
            continue;
        };
        refs.push(Ref::new(short, target, kind));
    }

    Ok(refs)
}

/// Parse `git show --numstat --format=GIT_SHOW_FORMAT <id>` output into the
/// detail shown for a selected commit.
pub fn parse_git_show(id: CommitId, data: &[u8]) -> Result<CommitDetail, GitLogParseError> {
    let text = std::str::from_utf8(data)?;
    let (message, numstat) = text.split_once(RECORD_SEP).unwrap_or((text, ""));

    let mut files = Vec::new();
    for (index, line) in numstat.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, '\t');
        let (Some(ins), Some(del), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GitLogParseError::Numstat { line: index + 1 });
        };
        let count = |s: &str| -> Result<Option<u32>, GitLogParseError> {
            if s == "-" {
                return Ok(None);
            }
            s.parse()
                .map(Some)
                .map_err(|_| GitLogParseError::Numstat { line: index + 1 })
        };
        files.push(FileStat {
            path: path.into(),
            insertions: count(ins)?,
            deletions: count(del)?,
        });
    }

    Ok(CommitDetail {
        id,
        message: message.trim_end().into(),
        files,
    })
}
