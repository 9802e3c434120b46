pub mod commit;
pub mod detail;
pub mod refs;
pub mod row;
pub mod track;

pub use commit::{ChangeStat, Commit, CommitId, InvalidCommitId, Signature};
pub use detail::{CommitDetail, FileStat};
pub use refs::{Ref, RefKind, primary_head};
pub use row::RowItem;
pub use track::{Track, TrackRow, Visibility};
