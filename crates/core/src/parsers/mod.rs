pub mod git_log;
pub mod json;

use thiserror::Error;

pub use git_log::{GIT_LOG_FORMAT, GIT_SHOW_FORMAT, parse_git_log, parse_git_show, parse_refs};
pub use json::{HistoryDump, parse_history};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("git log: {0}")]
    GitLog(#[from] git_log::GitLogParseError),
    #[error("history json: {0}")]
    Json(#[from] json::JsonParseError),
    #[error("unable to detect format")]
    UnknownFormat,
}

/// Detect the input format and parse it into a history dump.
///
/// A JSON object is read as a [`HistoryDump`]; anything else is treated as
/// `git log` output in [`GIT_LOG_FORMAT`], which carries no ref list.
pub fn parse_auto(data: &[u8]) -> Result<HistoryDump, ParseError> {
    let trimmed = data.trim_ascii_start();
    if trimmed.is_empty() {
        return Err(ParseError::UnknownFormat);
    }

    if trimmed.starts_with(b"{") {
        return Ok(parse_history(data)?);
    }

    if trimmed.contains(&git_log::FIELD_SEP) {
        let commits = parse_git_log(data)?;
        return Ok(HistoryDump {
            refs: Vec::new(),
            commits,
            details: Vec::new(),
        });
    }

    Err(ParseError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json() {
        let dump = parse_auto(br#" {"commits": [{"id": "abcd1234"}]}"#).expect("json");
        assert_eq!(dump.commits.len(), 1);
    }

    #[test]
    fn detects_git_log() {
        let data = b"abcd1234\x1f\x1fSam\x1fsam@example.com\x1f10\x1fSam\x1fsam@example.com\x1f10\x1f\x1froot\x1e\n";
        let dump = parse_auto(data).expect("git log");
        assert_eq!(dump.commits[0].summary, "root");
        assert!(dump.refs.is_empty());
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(parse_auto(b""), Err(ParseError::UnknownFormat)));
        assert!(matches!(
            parse_auto(b"just some text"),
            Err(ParseError::UnknownFormat)
        ));
    }
}
