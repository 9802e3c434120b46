use serde::{Deserialize, Serialize};

/// Number of distinct lane accent colors every renderer must provide.
pub const LANE_PALETTE_SIZE: u8 = 8;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Lane color, indexed into the renderer's palette (wraps at
    /// `LANE_PALETTE_SIZE`).
    LaneAccent(u8),
    NodeBorder,

    RowBackground,
    RowSelected,
    RowHover,

    TextPrimary,
    TextSecondary,
    TextMuted,
    ErrorText,

    RefLabelBackground,
    RefLabelText,
    HeadLabelBackground,

    StatInsertions,
    StatDeletions,

    Background,
    Border,
}

impl ThemeToken {
    /// Accent token for a lane column, cycling through the first `palette`
    /// colors (at most `LANE_PALETTE_SIZE`).
    pub fn lane(lane: usize, palette: u8) -> Self {
        let palette = usize::from(palette.clamp(1, LANE_PALETTE_SIZE));
        ThemeToken::LaneAccent((lane % palette) as u8)
    }
}
