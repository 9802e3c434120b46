//! `CommitSource` backed by the `git` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use lanegraph_core::model::{Commit, CommitDetail, CommitId, Ref};
use lanegraph_core::parsers::{
    GIT_LOG_FORMAT, GIT_SHOW_FORMAT, ParseError, parse_git_log, parse_git_show, parse_refs,
};
use lanegraph_core::{CommitSource, FetchError};
use tracing::debug;

pub struct GitSource {
    repo: PathBuf,
}

impl GitSource {
    pub fn open(repo: &Path) -> Result<Self, FetchError> {
        let source = Self {
            repo: repo.to_path_buf(),
        };
        source.git(&["rev-parse", "--git-dir"])?;
        Ok(source)
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>, FetchError> {
        debug!(repo = %self.repo.display(), ?args, "running git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Backend(stderr.trim().to_string()));
        }
        Ok(output.stdout)
    }
}

fn parse_err(err: impl Into<ParseError>) -> FetchError {
    FetchError::Parse(err.into())
}

impl CommitSource for GitSource {
    fn fetch_commits(&mut self, skip: usize, limit: usize) -> Result<Vec<Commit>, FetchError> {
        let format = format!("--format={GIT_LOG_FORMAT}");
        let skip = format!("--skip={skip}");
        let limit = format!("--max-count={limit}");
        let out = self.git(&[
            "log",
            "--all",
            "--date-order",
            "--shortstat",
            &format,
            &skip,
            &limit,
        ])?;
        parse_git_log(&out).map_err(parse_err)
    }

    fn fetch_refs(&mut self) -> Result<Vec<Ref>, FetchError> {
        let mut listing = self.git(&["for-each-ref", "--format=%(objectname) %(refname)"])?;
        // An empty repository has no HEAD commit yet.
        if let Ok(head) = self.git(&["rev-parse", "HEAD"]) {
            listing.extend_from_slice(String::from_utf8_lossy(&head).trim().as_bytes());
            listing.extend_from_slice(b" HEAD\n");
        }
        parse_refs(&listing).map_err(parse_err)
    }

    fn count_commits(&mut self) -> Result<usize, FetchError> {
        let out = self.git(&["rev-list", "--all", "--count"])?;
        String::from_utf8_lossy(&out)
            .trim()
            .parse()
            .map_err(|_| FetchError::Backend("unexpected rev-list output".to_string()))
    }

    fn fetch_detail(&mut self, id: &CommitId) -> Result<CommitDetail, FetchError> {
        let format = format!("--format={GIT_SHOW_FORMAT}");
        let out = self.git(&["show", "--numstat", &format, id.as_str()])?;
        parse_git_show(id.clone(), &out).map_err(parse_err)
    }
}
