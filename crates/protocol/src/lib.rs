pub mod commands;
pub mod shared_str;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, Stroke, TextAlign};
pub use shared_str::SharedStr;
pub use theme::{LANE_PALETTE_SIZE, ThemeToken};
pub use types::{Point, Rect, Viewport};
