//! Turns a history row (commit + lane tracks) into render commands.

use lanegraph_protocol::{Point, Rect, RenderCommand, SharedStr, Stroke, TextAlign, ThemeToken};

use crate::config::GraphConfig;
use crate::model::{Commit, RowItem, Track, TrackRow, Visibility};
use crate::window::{Disposer, RowPresenter};

const LOADING_TEXT: &str = "Loading…";

/// Render target for one history row.
#[derive(Debug, Clone, Default)]
pub struct RowSurface {
    /// Absolute offset of the row's top edge within the scrolled content.
    pub top: f64,
    /// Row currently shown, if bound.
    pub index: Option<usize>,
    /// Commands in row-local coordinates.
    pub commands: Vec<RenderCommand>,
    pub attached: bool,
}

/// Draws lane curves, the commit node and the commit's text columns.
#[derive(Debug, Clone)]
pub struct GraphRowPresenter {
    config: GraphConfig,
}

impl GraphRowPresenter {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn lane_x(&self, lane: usize) -> f64 {
        lane as f64 * self.config.lane_width + self.config.lane_width / 2.0
    }

    fn lane_color(&self, lane: usize) -> ThemeToken {
        ThemeToken::lane(lane, self.config.palette_size)
    }

    fn text_x(&self, tracks: Option<&TrackRow>) -> f64 {
        if self.config.text_offset > 0.0 {
            return self.config.text_offset;
        }
        let lanes = tracks.map_or(1, |t| t.width().max(1));
        lanes as f64 * self.config.lane_width + self.config.lane_width / 2.0
    }

    /// Row-local render commands for `item`.
    pub fn commands_for(&self, index: usize, item: &RowItem) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        commands.push(RenderCommand::BeginGroup {
            id: SharedStr::from(format!("row-{index}")),
            label: item.commit().map(|c| c.summary.clone()),
        });

        let text_y = self.config.row_height / 2.0;
        match item {
            RowItem::Placeholder => {
                commands.push(self.text(self.text_x(None), text_y, LOADING_TEXT.into(), ThemeToken::TextMuted));
            }
            RowItem::Failed(message) => {
                commands.push(self.text(self.text_x(None), text_y, message.clone(), ThemeToken::ErrorText));
            }
            RowItem::Commit { commit, tracks } => {
                if let Some(tracks) = tracks {
                    for track in tracks.occupied() {
                        self.push_track(&mut commands, track);
                    }
                }
                self.push_labels(&mut commands, commit, self.text_x(tracks.as_deref()));
            }
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }

    fn push_track(&self, commands: &mut Vec<RenderCommand>, track: &Track) {
        let height = self.config.row_height;
        let mid = height / 2.0;
        let node = Point::new(self.lane_x(track.depth), mid);

        let (own_stroke, own_lane_stroke) = match track.visibility {
            Visibility::Hidden => (Stroke::Hidden, Stroke::Hidden),
            Visibility::Emerging => (Stroke::Dashed, Stroke::Solid),
            Visibility::Established => (Stroke::Solid, Stroke::Solid),
        };

        for &lane in &track.incoming {
            let stroke = if lane == track.depth { own_stroke } else { Stroke::Solid };
            let from = Point::new(self.lane_x(lane), 0.0);
            commands.push(self.segment(from, node, self.lane_color(lane), stroke));
        }
        // A lane opened for a later parent has no node; the primary's curve
        // already reaches it.
        let branch_out = !track.active && track.incoming.is_empty();
        for &lane in &track.outgoing {
            if branch_out && lane == track.depth {
                continue;
            }
            let stroke = if lane == track.depth { own_lane_stroke } else { Stroke::Solid };
            let to = Point::new(self.lane_x(lane), height);
            commands.push(self.segment(node, to, self.lane_color(lane), stroke));
        }

        if track.active {
            commands.push(RenderCommand::DrawCircle {
                center: node,
                radius: self.config.node_radius,
                color: self.lane_color(track.depth),
                border_color: Some(ThemeToken::NodeBorder),
            });
        }
    }

    /// Straight line within a lane, S-curve between lanes.
    fn segment(&self, from: Point, to: Point, color: ThemeToken, stroke: Stroke) -> RenderCommand {
        let width = (self.config.lane_width / 8.0).max(1.0);
        if from.x == to.x {
            return RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
                stroke,
            };
        }
        let bend = (from.y + to.y) / 2.0;
        RenderCommand::DrawCurve {
            from,
            ctrl1: Point::new(from.x, bend),
            ctrl2: Point::new(to.x, bend),
            to,
            color,
            width,
            stroke,
        }
    }

    fn push_labels(&self, commands: &mut Vec<RenderCommand>, commit: &Commit, mut x: f64) {
        let y = self.config.row_height / 2.0;
        let gap = self.config.char_width;

        for name in &commit.refs {
            let label = SharedStr::from(format!("[{name}]"));
            let width = self.text_width(&label);
            let background = if *name == "HEAD" {
                ThemeToken::HeadLabelBackground
            } else {
                ThemeToken::RefLabelBackground
            };
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(x, 0.0, width, self.config.row_height),
                color: background,
                border_color: None,
                label: None,
                row: None,
            });
            commands.push(self.text(x, y, label, ThemeToken::RefLabelText));
            x += width + gap;
        }

        let short = SharedStr::from(commit.id.short());
        let width = self.text_width(&short);
        commands.push(self.text(x, y, short, ThemeToken::TextMuted));
        x += width + gap;

        let width = self.text_width(&commit.summary);
        commands.push(self.text(x, y, commit.summary.clone(), ThemeToken::TextPrimary));
        x += width + gap;

        if !commit.author.name.is_empty() {
            let author = commit.author.name.clone();
            let width = self.text_width(&author);
            commands.push(self.text(x, y, author, ThemeToken::TextSecondary));
            x += width + gap;
        }

        if let Some(stat) = commit.stat {
            let plus = SharedStr::from(format!("+{}", stat.insertions));
            let width = self.text_width(&plus);
            commands.push(self.text(x, y, plus, ThemeToken::StatInsertions));
            x += width + gap;
            commands.push(self.text(
                x,
                y,
                SharedStr::from(format!("-{}", stat.deletions)),
                ThemeToken::StatDeletions,
            ));
        }
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.config.char_width
    }

    fn text(&self, x: f64, y: f64, text: SharedStr, color: ThemeToken) -> RenderCommand {
        RenderCommand::DrawText {
            position: Point::new(x, y),
            text,
            color,
            font_size: self.config.font_size,
            align: TextAlign::Left,
        }
    }
}

impl RowPresenter for GraphRowPresenter {
    type Item = RowItem;
    type Target = RowSurface;

    fn create_target(&mut self) -> RowSurface {
        RowSurface::default()
    }

    fn present(&mut self, index: usize, item: &RowItem, target: &mut RowSurface) -> Disposer<RowSurface> {
        target.index = Some(index);
        target.commands = self.commands_for(index, item);
        target.attached = true;
        Box::new(|surface: &mut RowSurface| {
            surface.index = None;
            surface.commands.clear();
        })
    }

    fn place(&mut self, target: &mut RowSurface, top: f64) {
        target.top = top;
    }

    fn detach(&mut self, target: &mut RowSurface) {
        target.attached = false;
    }
}
