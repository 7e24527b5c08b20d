use crate::braille::BrailleCanvas;
use crate::destinations::{MarkerKind, RenderMarker};
use crate::geo::LatLng;
use crate::map::geometry::draw_polyline;
use crate::map::overlay::FlightPath;
use crate::map::projection::Viewport;

/// A coastline as a sequence of coordinates
pub type LineString = Vec<LatLng>;

/// Level of detail for basemap data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: u8) -> Self {
        match zoom {
            0..=2 => Lod::Low,
            3..=5 => Lod::Medium,
            _ => Lod::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    /// Dot under a price label
    LabelDot,
    Label,
    HoveredLabel,
    Pin,
    DisabledPin,
    Origin,
}

/// Text placed on a character cell of the map area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub kind: GlyphKind,
}

/// What to draw over the basemap this frame
#[derive(Default)]
pub struct Scene<'a> {
    pub markers: &'a [RenderMarker],
    /// Index into `markers` of the label under the mouse
    pub hovered: Option<usize>,
    pub flight_path: Option<&'a FlightPath>,
}

/// Rendered layers, composed back to front by the UI
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub flight_path: BrailleCanvas,
    pub glyphs: Vec<Glyph>,
}

/// Character cell a coordinate falls on, if it is on screen
pub fn marker_cell(viewport: &Viewport, at: LatLng) -> Option<(u16, u16)> {
    let (px, py) = viewport.project(at);
    if !viewport.is_visible(px, py) {
        return None;
    }
    Some(((px / 2) as u16, (py / 4) as u16))
}

/// Index of the full-label marker whose dot or text covers `cell`.
/// Walks the draw order back to front, so the label on top wins.
pub fn label_at(markers: &[RenderMarker], viewport: &Viewport, cell: (u16, u16)) -> Option<usize> {
    draw_sequence(markers).into_iter().rev().find_map(|i| {
        let marker = &markers[i];
        let text = marker.label()?;
        let (col, row) = marker_cell(viewport, marker.position)?;
        let end = col as usize + 2 + text.chars().count();
        (row == cell.1 && (cell.0 as usize) >= col as usize && (cell.0 as usize) < end).then_some(i)
    })
}

/// Basemap with coastlines at three resolutions plus the marker layer
#[derive(Default)]
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finest loaded set at or below `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.coastlines_high.is_empty() {
            &self.coastlines_high
        } else if lod != Lod::Low && !self.coastlines_medium.is_empty() {
            &self.coastlines_medium
        } else {
            &self.coastlines_low
        }
    }

    /// `width` x `height` in characters; `viewport` is in braille pixels
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, scene: &Scene<'_>) -> MapLayers {
        let mut coastlines = BrailleCanvas::new(width, height);
        let max_jump = viewport.width as i32;
        let visible = |a: (i32, i32), b: (i32, i32)| viewport.line_might_be_visible(a, b);

        for line in self.coastlines(Lod::from_zoom(viewport.zoom)) {
            let points: Vec<_> = line.iter().map(|&p| viewport.project(p)).collect();
            draw_polyline(&mut coastlines, &points, max_jump, visible, false);
        }

        let mut flight_path = BrailleCanvas::new(width, height);
        if let Some(path) = scene.flight_path {
            let points: Vec<_> = path.points(2.0).into_iter().map(|p| viewport.project(p)).collect();
            draw_polyline(&mut flight_path, &points, max_jump, visible, true);
        }

        MapLayers {
            coastlines,
            flight_path,
            glyphs: marker_glyphs(viewport, scene),
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        if line.len() < 2 {
            return;
        }
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty() || !self.coastlines_medium.is_empty() || !self.coastlines_high.is_empty()
    }
}

fn draw_order(kind: &MarkerKind) -> u8 {
    match kind {
        MarkerKind::DisabledPin => 0,
        MarkerKind::MinimalPin => 1,
        MarkerKind::FullLabel { .. } => 2,
        MarkerKind::OriginPin => 3,
    }
}

/// Pins first, then labels, then the origin so the important glyphs win
/// when cells collide. Ties keep input order.
fn draw_sequence(markers: &[RenderMarker]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..markers.len()).collect();
    order.sort_by_key(|&i| draw_order(&markers[i].kind));
    order
}

fn marker_glyphs(viewport: &Viewport, scene: &Scene<'_>) -> Vec<Glyph> {
    let order = draw_sequence(scene.markers);
    let mut glyphs = Vec::with_capacity(order.len() * 2);
    for i in order {
        let marker = &scene.markers[i];
        let Some((col, row)) = marker_cell(viewport, marker.position) else {
            continue;
        };
        let glyph = |text: &str, kind| Glyph {
            col,
            row,
            text: text.to_string(),
            kind,
        };
        match &marker.kind {
            MarkerKind::DisabledPin => glyphs.push(glyph("◦", GlyphKind::DisabledPin)),
            MarkerKind::MinimalPin => glyphs.push(glyph("•", GlyphKind::Pin)),
            MarkerKind::OriginPin => glyphs.push(glyph("✈", GlyphKind::Origin)),
            MarkerKind::FullLabel { .. } => {
                glyphs.push(glyph("●", GlyphKind::LabelDot));
                if let Some(text) = marker.label() {
                    let kind = if scene.hovered == Some(i) {
                        GlyphKind::HoveredLabel
                    } else {
                        GlyphKind::Label
                    };
                    glyphs.push(Glyph {
                        col: col.saturating_add(2),
                        row,
                        text,
                        kind,
                    });
                }
            }
        }
    }
    glyphs
}
