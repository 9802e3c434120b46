//! Commit history graph: incremental lane assignment plus a windowed,
//! recycling row renderer.
//!
//! ```text
//!   CommitSource ──▶ CommitStore ──▶ LaneEngine ──▶ TrackRow per row
//!   (paged fetch)     (slots)         (advance)          │
//!                        │                               ▼
//!                        └──────▶ WindowedRenderer ──▶ RowPresenter ──▶ RenderCommand[]
//!                                 (visible range,      (curves, nodes,
//!                                  target pool)         labels)
//! ```

pub mod config;
pub mod content;
pub mod lanes;
pub mod model;
pub mod parsers;
pub mod presenter;
pub mod session;
pub mod source;
pub mod store;
pub mod svg;
pub mod window;

pub use config::{ConfigError, GraphConfig};
pub use content::{ContentState, LatestRequest, Ticket};
pub use lanes::LaneEngine;
pub use presenter::{GraphRowPresenter, RowSurface};
pub use session::{DetailRequest, GraphSession, PageRequest, SessionError};
pub use source::{CommitSource, FetchError, MemorySource};
pub use store::CommitStore;
