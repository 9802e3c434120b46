//! SVG export: converts `RenderCommand` lists into standalone SVG documents.

use lanegraph_protocol::{RenderCommand, Stroke, TextAlign, ThemeToken};

const DARK_LANES: [&str; 8] = [
    "#42a5f5", "#ef5350", "#66bb6a", "#ffa726", "#ab47bc", "#26c6da", "#ec407a", "#d4e157",
];
const LIGHT_LANES: [&str; 8] = [
    "#1e88e5", "#e53935", "#43a047", "#fb8c00", "#8e24aa", "#00acc1", "#d81b60", "#9e9d24",
];

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the viewBox; `dark` selects the palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:ui-monospace,monospace">"#,
    ));
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        resolve_color(ThemeToken::Background, dark),
    ));

    let mut clips = 0usize;
    let mut open_clip = false;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                ..
            } => {
                let fill = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}" rx="2""#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if let Some(border) = border_color {
                    svg.push_str(&format!(r#" stroke="{}""#, resolve_color(*border, dark)));
                }
                svg.push('>');
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"#,
                    position.x,
                    position.y,
                    resolve_color(*color, dark),
                    escape_xml(text),
                ));
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
                stroke,
            } => {
                if !stroke.is_visible() {
                    continue;
                }
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{line_width}"{}/>"#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    resolve_color(*color, dark),
                    dash_attr(*stroke, *line_width),
                ));
            }
            RenderCommand::DrawCurve {
                from,
                ctrl1,
                ctrl2,
                to,
                color,
                width: line_width,
                stroke,
            } => {
                if !stroke.is_visible() {
                    continue;
                }
                svg.push_str(&format!(
                    r#"<path d="M{} {} C{} {} {} {} {} {}" fill="none" stroke="{}" stroke-width="{line_width}"{}/>"#,
                    from.x,
                    from.y,
                    ctrl1.x,
                    ctrl1.y,
                    ctrl2.x,
                    ctrl2.y,
                    to.x,
                    to.y,
                    resolve_color(*color, dark),
                    dash_attr(*stroke, *line_width),
                ));
            }
            RenderCommand::DrawCircle {
                center,
                radius,
                color,
                border_color,
            } => {
                svg.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="{radius}" fill="{}""#,
                    center.x,
                    center.y,
                    resolve_color(*color, dark),
                ));
                if let Some(border) = border_color {
                    svg.push_str(&format!(r#" stroke="{}""#, resolve_color(*border, dark)));
                }
                svg.push_str("/>");
            }
            RenderCommand::SetClip { rect } => {
                if open_clip {
                    svg.push_str("</g>");
                }
                clips += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="clip{clips}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#clip{clips})">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                open_clip = true;
            }
            RenderCommand::ClearClip => {
                if open_clip {
                    svg.push_str("</g>");
                    open_clip = false;
                }
            }
            RenderCommand::PushTransform { translate, scale } => {
                svg.push_str(&format!(
                    r#"<g transform="translate({} {}) scale({} {})">"#,
                    translate.x, translate.y, scale.x, scale.y,
                ));
            }
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
            }
            RenderCommand::PopTransform | RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    if open_clip {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn dash_attr(stroke: Stroke, width: f64) -> String {
    match stroke {
        Stroke::Dashed => format!(r#" stroke-dasharray="{} {}""#, width * 3.0, width * 2.0),
        Stroke::Solid | Stroke::Hidden => String::new(),
    }
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::LaneAccent(i) => DARK_LANES[usize::from(i) % DARK_LANES.len()],
            ThemeToken::NodeBorder | ThemeToken::Background | ThemeToken::RowBackground => {
                "#181818"
            }
            ThemeToken::RowSelected => "#263859",
            ThemeToken::RowHover => "#222831",
            ThemeToken::TextPrimary | ThemeToken::RefLabelText => "#ececec",
            ThemeToken::TextSecondary => "#b0b0b0",
            ThemeToken::TextMuted => "#8a8a8a",
            ThemeToken::ErrorText | ThemeToken::StatDeletions => "#ef5350",
            ThemeToken::StatInsertions => "#66bb6a",
            ThemeToken::RefLabelBackground => "#37474f",
            ThemeToken::HeadLabelBackground => "#1565c0",
            ThemeToken::Border => "#303030",
        }
    } else {
        match token {
            ThemeToken::LaneAccent(i) => LIGHT_LANES[usize::from(i) % LIGHT_LANES.len()],
            ThemeToken::NodeBorder | ThemeToken::Background | ThemeToken::RowBackground => {
                "#ffffff"
            }
            ThemeToken::RowSelected => "#dbe9ff",
            ThemeToken::RowHover => "#f1f3f5",
            ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::TextSecondary => "#495057",
            ThemeToken::TextMuted => "#868e96",
            ThemeToken::ErrorText | ThemeToken::StatDeletions => "#c62828",
            ThemeToken::StatInsertions => "#2e7d32",
            ThemeToken::RefLabelBackground => "#e9ecef",
            ThemeToken::RefLabelText => "#212529",
            ThemeToken::HeadLabelBackground => "#a5d8ff",
            ThemeToken::Border => "#dee2e6",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanegraph_protocol::{Point, Rect};

    #[test]
    fn basic_svg_output() {
        let commands = vec![
            RenderCommand::BeginGroup {
                id: "row-0".into(),
                label: None,
            },
            RenderCommand::DrawCircle {
                center: Point::new(8.0, 24.0),
                radius: 4.0,
                color: ThemeToken::LaneAccent(1),
                border_color: Some(ThemeToken::NodeBorder),
            },
            RenderCommand::DrawText {
                position: Point::new(30.0, 24.0),
                text: "main".into(),
                color: ThemeToken::TextPrimary,
                font_size: 12.0,
                align: TextAlign::Left,
            },
            RenderCommand::EndGroup,
        ];
        let svg = render_svg(&commands, 800.0, 400.0, true);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<g id="row-0">"#));
        assert!(svg.contains("main"));
        assert!(svg.contains(DARK_LANES[1]));
    }

    #[test]
    fn strokes_map_to_svg_attributes() {
        let line = |stroke| RenderCommand::DrawLine {
            from: Point::new(0.0, 0.0),
            to: Point::new(0.0, 10.0),
            color: ThemeToken::LaneAccent(0),
            width: 2.0,
            stroke,
        };
        let svg = render_svg(&[line(Stroke::Dashed)], 10.0, 10.0, false);
        assert!(svg.contains(r#"stroke-dasharray="6 4""#));

        let svg = render_svg(&[line(Stroke::Hidden)], 10.0, 10.0, false);
        assert!(!svg.contains("<line"));
    }

    #[test]
    fn curves_become_cubic_paths() {
        let commands = vec![RenderCommand::DrawCurve {
            from: Point::new(8.0, 24.0),
            ctrl1: Point::new(8.0, 36.0),
            ctrl2: Point::new(24.0, 36.0),
            to: Point::new(24.0, 48.0),
            color: ThemeToken::LaneAccent(1),
            width: 2.0,
            stroke: Stroke::Solid,
        }];
        let svg = render_svg(&commands, 100.0, 48.0, false);
        assert!(svg.contains(r#"d="M8 24 C8 36 24 36 24 48""#));
    }

    #[test]
    fn escapes_xml_entities() {
        let commands = vec![RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 200.0, 18.0),
            color: ThemeToken::RefLabelBackground,
            border_color: None,
            label: Some("fix <T> & \"quotes\"".into()),
            row: None,
        }];
        let svg = render_svg(&commands, 400.0, 100.0, false);
        assert!(svg.contains("fix &lt;T&gt; &amp; &quot;quotes&quot;"));
    }
}
