use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lanegraph_core::model::CommitDetail;
use lanegraph_core::window::PointerKind;
use lanegraph_core::{CommitSource, ContentState, DetailRequest, GraphSession};
use lanegraph_protocol::{Point, RenderCommand, Stroke, ThemeToken};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use tracing::debug;

const DETAIL_HEIGHT: u16 = 8;
const WHEEL_ROWS: f64 = 3.0;

const LANE_COLORS: [Color; 8] = [
    Color::Blue,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightGreen,
];

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::LaneAccent(i) => LANE_COLORS[usize::from(i) % LANE_COLORS.len()],
        ThemeToken::NodeBorder | ThemeToken::Background | ThemeToken::RowBackground => Color::Black,
        ThemeToken::RowSelected => Color::Rgb(38, 56, 89),
        ThemeToken::RowHover => Color::Rgb(34, 40, 49),
        ThemeToken::TextPrimary | ThemeToken::RefLabelText => Color::White,
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted | ThemeToken::Border => Color::DarkGray,
        ThemeToken::ErrorText | ThemeToken::StatDeletions => Color::Red,
        ThemeToken::StatInsertions => Color::Green,
        ThemeToken::RefLabelBackground => Color::Rgb(55, 71, 79),
        ThemeToken::HeadLabelBackground => Color::Rgb(21, 101, 192),
    }
}

/// Run the interactive viewer until the user quits.
pub fn run(session: &mut GraphSession, source: &mut dyn CommitSource) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, session, source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Split the screen into header, graph and (when a commit is selected)
/// detail areas.
fn layout(area: Rect, with_detail: bool) -> (Rect, Rect, Rect) {
    let header = Rect::new(area.x, area.y, area.width, 1.min(area.height));
    let rest = area.height.saturating_sub(1);
    let detail_height = if with_detail { DETAIL_HEIGHT.min(rest / 2) } else { 0 };
    let graph = Rect::new(area.x, area.y + 1, area.width, rest - detail_height);
    let detail = Rect::new(area.x, graph.bottom(), area.width, detail_height);
    (header, graph, detail)
}

fn fetch_pages(session: &mut GraphSession, source: &mut dyn CommitSource) {
    for request in session.pending_requests() {
        let result = source.fetch_commits(request.skip, request.limit);
        session.complete_page(request, result);
    }
}

fn load_detail(session: &mut GraphSession, source: &mut dyn CommitSource, request: Option<DetailRequest>) {
    if let Some(request) = request {
        let result = source.fetch_detail(&request.id);
        session.complete_detail(request.ticket, result);
    }
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut GraphSession,
    source: &mut dyn CommitSource,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        let with_detail = !matches!(session.detail().state(), ContentState::Idle);
        let (_, graph, _) = layout(Rect::new(0, 0, size.width, size.height), with_detail);
        session.resize(f64::from(graph.height));
        fetch_pages(session, source);
        session.flush_frame();

        terminal.draw(|frame| draw(frame, session))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let page = graph.height.max(1) as isize;
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let request = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Up => session.move_selection(-1),
                    KeyCode::Down => session.move_selection(1),
                    KeyCode::PageUp => session.move_selection(-page),
                    KeyCode::PageDown => session.move_selection(page),
                    KeyCode::Home => session.select(0),
                    KeyCode::End => session.select(session.store().len().saturating_sub(1)),
                    KeyCode::Enter => match session.selected() {
                        Some(index) => session.select(index),
                        None => session.move_selection(0),
                    },
                    KeyCode::Char('r') => {
                        let pages = session.retry_failed();
                        debug!(pages, "retrying failed pages");
                        None
                    }
                    _ => None,
                };
                load_detail(session, source, request);
            }
            Event::Mouse(mouse) => {
                let inside = mouse.row >= graph.y && mouse.row < graph.bottom();
                let y = f64::from(mouse.row.saturating_sub(graph.y)) + 0.5;
                let request = match mouse.kind {
                    MouseEventKind::ScrollDown => {
                        session.scroll_by(WHEEL_ROWS);
                        None
                    }
                    MouseEventKind::ScrollUp => {
                        session.scroll_by(-WHEEL_ROWS);
                        None
                    }
                    MouseEventKind::Down(MouseButton::Left) if inside => {
                        session.pointer(PointerKind::Click, y)
                    }
                    MouseEventKind::Moved if inside => session.pointer(PointerKind::Move, y),
                    _ => None,
                };
                load_detail(session, source, request);
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, session: &GraphSession) {
    let with_detail = !matches!(session.detail().state(), ContentState::Idle);
    let (header_area, graph, detail_area) = layout(frame.area(), with_detail);

    let store = session.store();
    let title = format!(
        " lanegraph | {} commits | lanes ready {} | open lanes {} | {} pending, {} failed | ↑↓ select  Enter detail  r retry  q quit ",
        store.len(),
        session.engine().next_row(),
        session.engine().open_lanes(),
        session.pending_pages(),
        session.failed_pages(),
    );
    let header = Block::default()
        .title(title)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let background = Block::default()
        .borders(Borders::NONE)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(background, graph);

    let scroll = session.renderer().scroll_offset();
    let highlight = |index: Option<usize>, token: ThemeToken, buf: &mut Buffer| {
        let Some(index) = index else { return };
        let row = index as f64 - scroll;
        if row < 0.0 || row >= f64::from(graph.height) {
            return;
        }
        let y = graph.y + row as u16;
        for x in graph.x..graph.right() {
            buf[(x, y)].set_bg(theme_to_color(token));
        }
    };
    highlight(session.hovered(), ThemeToken::RowHover, frame.buffer_mut());
    highlight(session.selected(), ThemeToken::RowSelected, frame.buffer_mut());

    let viewport = session.viewport(f64::from(graph.width));
    let mut painter = CellPainter::new(frame.buffer_mut(), graph);
    for cmd in &session.scene_commands(&viewport) {
        painter.apply(cmd);
    }

    if with_detail {
        draw_detail(frame, session, detail_area);
    }
}

fn draw_detail(frame: &mut Frame, session: &GraphSession, area: Rect) {
    let lines: Vec<Line> = match session.detail().state() {
        ContentState::Idle => Vec::new(),
        ContentState::Loading(id) => vec![Line::from(format!("Loading {}…", id.short()))],
        ContentState::Failed(id, message) => vec![
            Line::styled(
                format!("{}: {message}", id.short()),
                Style::default().fg(theme_to_color(ThemeToken::ErrorText)),
            ),
        ],
        ContentState::Ready(_, detail) => detail_lines(detail),
    };
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme_to_color(ThemeToken::Border)))
        .title(" detail ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn detail_lines(detail: &CommitDetail) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = detail
        .message
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    if !detail.files.is_empty() {
        lines.push(Line::from(format!(
            "{} files, +{} -{}",
            detail.files.len(),
            detail.total_insertions(),
            detail.total_deletions()
        )));
    }
    for file in &detail.files {
        let counts = if file.is_binary() {
            "bin".to_string()
        } else {
            format!(
                "+{} -{}",
                file.insertions.unwrap_or(0),
                file.deletions.unwrap_or(0)
            )
        };
        lines.push(Line::styled(
            format!("  {counts:>10}  {}", file.path),
            Style::default().fg(theme_to_color(ThemeToken::TextSecondary)),
        ));
    }
    lines
}

/// Corners beat straight lanes, nodes beat everything.
fn glyph_rank(glyph: char) -> u8 {
    match glyph {
        '●' => 4,
        '╮' | '╭' | '╯' | '╰' => 3,
        '│' | '┆' => 2,
        '─' => 1,
        _ => 0,
    }
}

/// Rasterizes render commands onto terminal cells, one unit per cell.
struct CellPainter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    offset: Point,
    saved: Vec<Point>,
}

impl<'a> CellPainter<'a> {
    fn new(buf: &'a mut Buffer, area: Rect) -> Self {
        Self {
            buf,
            area,
            offset: Point::new(0.0, 0.0),
            saved: Vec::new(),
        }
    }

    fn cell(&self, x: f64, y: f64) -> Option<(u16, u16)> {
        let x = (x + self.offset.x).floor();
        let y = (y + self.offset.y).floor();
        if x < 0.0 || y < 0.0 || x >= f64::from(self.area.width) || y >= f64::from(self.area.height) {
            return None;
        }
        Some((self.area.x + x as u16, self.area.y + y as u16))
    }

    /// Write a lane glyph unless a stronger one already sits there.
    fn put(&mut self, pos: (u16, u16), glyph: char, color: ThemeToken) {
        let existing = self.buf[pos].symbol().chars().next().unwrap_or(' ');
        if glyph_rank(glyph) < glyph_rank(existing) {
            return;
        }
        self.buf[pos].set_char(glyph).set_fg(theme_to_color(color));
    }

    fn apply(&mut self, cmd: &RenderCommand) {
        match cmd {
            RenderCommand::PushTransform { translate, .. } => {
                self.saved.push(self.offset);
                self.offset = Point::new(self.offset.x + translate.x, self.offset.y + translate.y);
            }
            RenderCommand::PopTransform => {
                if let Some(offset) = self.saved.pop() {
                    self.offset = offset;
                }
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                stroke,
                ..
            } => {
                let glyph = match stroke {
                    Stroke::Hidden => return,
                    Stroke::Dashed => '┆',
                    Stroke::Solid => '│',
                };
                if let Some(pos) = self.cell(from.x, (from.y + to.y) / 2.0) {
                    self.put(pos, glyph, *color);
                }
            }
            RenderCommand::DrawCurve {
                from,
                to,
                color,
                stroke,
                ..
            } => {
                if !stroke.is_visible() {
                    return;
                }
                let mid_y = (from.y + to.y) / 2.0;
                // Incoming curves start on the row's top edge.
                let incoming = from.y + self.offset.y - (from.y + self.offset.y).floor() < 0.25;
                let (lane_x, node_x) = if incoming { (from.x, to.x) } else { (to.x, from.x) };
                let (Some(lane), Some(node)) = (self.cell(lane_x, mid_y), self.cell(node_x, mid_y))
                else {
                    return;
                };
                let right = lane.0 > node.0;
                let corner = match (incoming, right) {
                    (true, true) => '╯',
                    (true, false) => '╰',
                    (false, true) => '╮',
                    (false, false) => '╭',
                };
                let (lo, hi) = if right { (node.0, lane.0) } else { (lane.0, node.0) };
                for x in lo + 1..hi {
                    self.put((x, lane.1), '─', *color);
                }
                self.put(lane, corner, *color);
            }
            RenderCommand::DrawCircle { center, color, .. } => {
                if let Some(pos) = self.cell(center.x, center.y) {
                    self.put(pos, '●', *color);
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                ..
            } => {
                let Some((x0, y)) = self.cell(position.x, position.y) else {
                    return;
                };
                let fg = theme_to_color(*color);
                for (i, ch) in text.chars().enumerate() {
                    let x = x0 + i as u16;
                    if x >= self.area.right() {
                        break;
                    }
                    self.buf[(x, y)].set_char(ch).set_fg(fg);
                }
            }
            RenderCommand::DrawRect { rect, color, .. } => {
                let bg = theme_to_color(*color);
                let Some((x0, y)) = self.cell(rect.x, rect.y) else {
                    return;
                };
                let width = rect.w.max(0.0) as u16;
                for x in x0..x0.saturating_add(width).min(self.area.right()) {
                    self.buf[(x, y)].set_bg(bg);
                }
            }
            RenderCommand::SetClip { .. }
            | RenderCommand::ClearClip
            | RenderCommand::BeginGroup { .. }
            | RenderCommand::EndGroup => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanegraph_core::model::{Commit, CommitId, Ref, RefKind};
    use lanegraph_core::parsers::HistoryDump;
    use lanegraph_core::{GraphConfig, MemorySource};

    fn id(name: &str) -> CommitId {
        CommitId::parse(&name.repeat(4)).expect("valid id")
    }

    fn render(session: &GraphSession, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        let viewport = session.viewport(f64::from(width));
        let mut painter = CellPainter::new(&mut buf, area);
        for cmd in &session.scene_commands(&viewport) {
            painter.apply(cmd);
        }
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn paints_merge_as_box_glyphs() {
        let commits = vec![
            Commit::new(id("a"), vec![id("b"), id("c")]),
            Commit::new(id("c"), vec![id("b")]),
            Commit::new(id("b"), vec![]),
        ];
        let mut source = MemorySource::new(HistoryDump {
            refs: vec![Ref::new("main", id("a"), RefKind::Branch)],
            commits,
            details: Vec::new(),
        });
        let mut session =
            GraphSession::new(GraphConfig::terminal(), &source.fetch_refs().expect("refs"), 3)
                .expect("session");
        session.resize(3.0);
        fetch_pages(&mut session, &mut source);
        session.flush_frame();

        let lines = render(&session, 12, 3);
        assert!(lines[0].starts_with(" ●─╮"), "{lines:?}");
        assert!(lines[1].starts_with(" │ ●"), "{lines:?}");
        assert!(lines[2].starts_with(" ●─╯"), "{lines:?}");
    }

    #[test]
    fn layout_reserves_detail_rows() {
        let (header, graph, detail) = layout(Rect::new(0, 0, 80, 30), true);
        assert_eq!(header.height, 1);
        assert_eq!(detail.height, DETAIL_HEIGHT);
        assert_eq!(graph.height + detail.height + 1, 30);

        let (_, graph, detail) = layout(Rect::new(0, 0, 80, 30), false);
        assert_eq!(detail.height, 0);
        assert_eq!(graph.height, 29);
    }
}
