use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The row presenter emits a `Vec<RenderCommand>` for each visible history
/// row. Renderers consume this list sequentially; each command carries all
/// the data it needs, in row-local coordinates unless a transform is pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally with a text label and the row
    /// index it belongs to (for hit-testing / selection).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<SharedStr>,
        row: Option<usize>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a straight line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
        stroke: Stroke,
    },

    /// Draw a cubic Bézier curve from `from` to `to`.
    ///
    /// Lane curves use vertical tangents at both ends so that segments of
    /// adjacent rows join smoothly.
    DrawCurve {
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
        stroke: Stroke,
    },

    /// Draw a filled circle (a commit node).
    DrawCircle {
        center: Point,
        radius: f64,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Push an affine transform (applied to all subsequent commands until
    /// the matching `PopTransform`).
    PushTransform { translate: Point, scale: Point },

    /// Pop the most recent transform.
    PopTransform,

    /// Begin a logical group (e.g. one history row).
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Line style. Dashed strokes mark lanes whose history has not been
/// reached yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stroke {
    #[default]
    Solid,
    Dashed,
    /// Not drawn at all, but still present so geometry stays aligned.
    Hidden,
}

impl Stroke {
    pub fn is_visible(self) -> bool {
        self != Stroke::Hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_as_tagged_variants() {
        let cmd = RenderCommand::DrawCircle {
            center: Point::new(8.0, 24.0),
            radius: 4.0,
            color: ThemeToken::LaneAccent(2),
            border_color: None,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.starts_with("{\"DrawCircle\""));
        assert!(json.contains("\"LaneAccent\":2"));
    }

    #[test]
    fn hidden_stroke_is_not_visible() {
        assert!(Stroke::Solid.is_visible());
        assert!(Stroke::Dashed.is_visible());
        assert!(!Stroke::Hidden.is_visible());
    }
}
