use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::{App, InputMode};
use crate::braille::BrailleCanvas;
use crate::config::Palette;
use crate::destinations::{compact_date, format_price};
use crate::map::{Glyph, GlyphKind, MapLayers, Scene};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let map_area = render_map(frame, app, chunks[0]);
    if app.hovered_values().is_some() {
        render_hover_popup(frame, app, map_area);
    }
    if app.selected.is_some() {
        render_selection(frame, app, map_area);
    }
    match app.input_mode {
        InputMode::Departure => render_prompt(frame, app, chunks[1]),
        InputMode::Normal => render_status_bar(frame, app, chunks[1]),
    }
}

/// Returns the inner map area
fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let title = format!(" Flights from {} ", app.departure_summary());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let scene = Scene {
        markers: &app.markers,
        hovered: app.hovered,
        flight_path: app.flight_path.as_ref(),
    };
    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, &scene);

    frame.render_widget(
        MapWidget {
            layers,
            palette: app.palette,
        },
        inner,
    );
    inner
}

/// Braille layers with marker glyphs drawn over them
struct MapWidget {
    layers: MapLayers,
    palette: Palette,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(ch) = canvas.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn glyph_spans(&self, glyph: &Glyph) -> Vec<(String, Style)> {
        let p = &self.palette;
        let plain = |color: Color| Style::default().fg(color);
        match glyph.kind {
            GlyphKind::LabelDot => vec![(glyph.text.clone(), plain(p.price))],
            GlyphKind::Pin => vec![(glyph.text.clone(), plain(p.pin))],
            GlyphKind::DisabledPin => vec![(glyph.text.clone(), plain(p.disabled_pin))],
            GlyphKind::Origin => vec![(glyph.text.clone(), plain(p.origin).add_modifier(Modifier::BOLD))],
            GlyphKind::Label | GlyphKind::HoveredLabel => {
                let extra = if glyph.kind == GlyphKind::HoveredLabel {
                    Modifier::REVERSED
                } else {
                    Modifier::empty()
                };
                // name in label colour, price and cluster count in price colour
                let (name, price) = glyph.text.split_once(" $").unwrap_or((glyph.text.as_str(), ""));
                let mut spans = vec![(name.to_string(), plain(p.label).add_modifier(extra))];
                if !price.is_empty() {
                    spans.push((format!(" ${price}"), plain(p.price).add_modifier(extra | Modifier::BOLD)));
                }
                spans
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.coastlines, self.palette.coastline, area, buf);
        Self::render_layer(&self.layers.flight_path, self.palette.flight_path, area, buf);

        for glyph in &self.layers.glyphs {
            if glyph.row >= area.height || glyph.col >= area.width {
                continue;
            }
            let y = area.y + glyph.row;
            let mut x = area.x + glyph.col;
            for (text, style) in self.glyph_spans(glyph) {
                for ch in text.chars() {
                    if x >= area.x + area.width {
                        break;
                    }
                    buf[(x, y)].set_char(ch).set_style(style);
                    x += 1;
                }
            }
        }
    }
}

/// Grouped destinations of the hovered label, top right of the map
fn render_hover_popup(frame: &mut Frame, app: &App, map: Rect) {
    let Some(values) = app.hovered_values() else {
        return;
    };
    let lines: Vec<Line> = values
        .iter()
        .map(|v| {
            Line::from(vec![
                Span::styled(format!("{:<4}", v.destination_code), Style::default().fg(Color::DarkGray)),
                Span::styled(v.destination.clone(), Style::default().fg(app.palette.label)),
                Span::raw(" "),
                Span::styled(format_price(v.price), Style::default().fg(app.palette.price)),
                Span::styled(
                    format!("  {} → {}", date_or_dash(v.date_out), date_or_dash(v.date_back)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    let area = corner(map, width, height, false);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Flight search prepared by the last click, bottom right of the map
fn render_selection(frame: &mut Frame, app: &App, map: Rect) {
    let Some(params) = &app.selected else {
        return;
    };
    let key = |k: &str| Span::styled(format!("{k:<10}"), Style::default().fg(Color::DarkGray));
    let lines = vec![
        Line::from(vec![key("from"), Span::raw(format!("{} {}", params.from, params.from_city))]),
        Line::from(vec![key("to"), Span::raw(format!("{} {}", params.to, params.to_city))]),
        Line::from(vec![key("trip"), Span::raw(params.trip_type)]),
        Line::from(vec![key("dateOut"), Span::raw(params.date_out.clone())]),
        Line::from(vec![key("dateBack"), Span::raw(params.date_back.clone())]),
    ];

    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 2;
    let area = corner(map, width.max(24), lines.len() as u16 + 2, true);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.palette.price))
        .title(" Search flights ");

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    match date {
        Some(_) => compact_date(date),
        None => "-".to_string(),
    }
}

/// Box of at most `width` x `height` in the top or bottom right of `area`
fn corner(area: Rect, width: u16, height: u16, bottom: bool) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let y = if bottom {
        area.y + area.height - height
    } else {
        area.y
    };
    Rect::new(area.x + area.width - width, y, width, height)
}

fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let prompt = Line::from(vec![
        Span::styled(" Departure airport: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}_", app.input),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  enter:apply esc:cancel", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(prompt), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(app.dates_summary(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", dim),
    ];

    if let Some(message) = app.orchestrator.error() {
        spans.push(Span::styled(format!("{message} "), Style::default().fg(app.palette.error)));
    } else if app.orchestrator.is_loading() {
        spans.push(Span::styled("loading… ", Style::default().fg(Color::Yellow)));
    } else {
        let count = app.orchestrator.destinations().len();
        spans.push(Span::styled(format!("{count} destinations "), Style::default().fg(Color::Green)));
    }

    spans.push(Span::styled(
        "| hjkl:pan +/-:zoom d:departure m:month w:length q:quit",
        dim,
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_fits_inside() {
        let area = Rect::new(1, 1, 40, 10);
        let top = corner(area, 20, 4, false);
        assert_eq!(top, Rect::new(21, 1, 20, 4));
        let bottom = corner(area, 60, 4, true);
        assert_eq!(bottom, Rect::new(1, 7, 40, 4));
    }

    #[test]
    fn test_label_spans_split_price() {
        let widget = MapWidget {
            layers: MapLayers {
                coastlines: BrailleCanvas::new(1, 1),
                flight_path: BrailleCanvas::new(1, 1),
                glyphs: Vec::new(),
            },
            palette: crate::config::MapStyle::default().palette(),
        };
        let glyph = Glyph {
            col: 0,
            row: 0,
            text: "Nadi $1,412 +2".to_string(),
            kind: GlyphKind::Label,
        };
        let spans = widget.glyph_spans(&glyph);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].0, "Nadi");
        assert_eq!(spans[1].0, " $1,412 +2");
    }
}
