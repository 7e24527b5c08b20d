use std::sync::Arc;

use chrono::{Datelike, Local};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::{Config, MapInit, Palette};
use crate::departure::DepartureResolver;
use crate::destinations::{layout, DestinationSummary, FlightSearchParams, MarkerKind, RenderMarker};
use crate::fetch::{DatesFilter, FetchOrchestrator, FilterChange, FlightApi, ResponseOrdering, SearchRequest};
use crate::map::{label_at, FlightPath, Lod, MapRenderer, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing a departure airport code
    Departure,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub palette: Palette,
    pub map_init: MapInit,
    pub orchestrator: FetchOrchestrator,
    pub departure: DepartureResolver,
    pub departure_code: String,
    pub departure_label: String,
    pub dates: DatesFilter,
    max_labeled: usize,
    /// Markers for the current result at the current zoom
    pub markers: Vec<RenderMarker>,
    /// Full-label marker under the mouse
    pub hovered: Option<usize>,
    /// Route drawn while a label is hovered
    pub flight_path: Option<FlightPath>,
    /// Search handed off by the last label click
    pub selected: Option<FlightSearchParams>,
    pub input_mode: InputMode,
    pub input: String,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    pub mouse_pos: Option<(u16, u16)>,
    dragged: bool,
    /// Zoom is only known once the map has reported its first viewport
    map_ready: bool,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn FlightApi>, runtime: Handle, width: u16, height: u16) -> Self {
        let map_init = config.map_init(width);
        let (pixel_width, pixel_height) = map_pixels(width, height);
        let viewport = Viewport::new(config.default_center, map_init.default_zoom, pixel_width, pixel_height)
            .with_zoom_limits(map_init.min_zoom(), map_init.max_zoom());

        let departure_code = config.default_departure.trim().to_uppercase();
        let dates = DatesFilter::default();
        let ordering = if config.discard_stale_responses {
            ResponseOrdering::LatestOnly
        } else {
            ResponseOrdering::ArrivalOrder
        };
        let initial = SearchRequest::initial(non_empty(&departure_code), dates);

        Self {
            viewport,
            map_renderer: MapRenderer::new(),
            palette: config.style.palette(),
            map_init,
            orchestrator: FetchOrchestrator::new(Arc::clone(&api), runtime.clone(), initial, ordering),
            departure: DepartureResolver::new(api, runtime, config.departure_fallback()),
            departure_code,
            departure_label: config.default_departure_label.clone(),
            dates,
            max_labeled: config.max_concurrent_price_markers,
            markers: Vec::new(),
            hovered: None,
            flight_path: None,
            selected: None,
            input_mode: InputMode::Normal,
            input: String::new(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            map_ready: false,
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        self.map_changed();
    }

    /// Zoom handed to the clusterer; `None` until the first viewport event
    pub fn cluster_zoom(&self) -> Option<u8> {
        self.map_ready.then_some(self.viewport.zoom)
    }

    /// Viewport-change event: initial load, pan, zoom or drag end
    pub fn map_changed(&mut self) {
        self.map_ready = true;
        self.hovered = None;
        self.flight_path = None;
        let bounds = self.viewport.bounds();
        self.orchestrator.on_viewport_changed(bounds);
        self.refresh_markers();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.map_changed();
    }

    pub fn zoom_in(&mut self) {
        if self.viewport.zoom_in() {
            self.map_changed();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.viewport.zoom_out() {
            self.map_changed();
        }
    }

    /// Mouse wheel. On the narrow layout the wheel pans instead of zooming.
    pub fn scroll(&mut self, col: u16, row: u16, up: bool) {
        if !self.map_init.scroll_zoom {
            self.pan(0, if up { -6 } else { 6 });
            return;
        }
        let (px, py) = cell_to_pixel(col, row);
        if self.viewport.zoom_at(px, py, up) {
            self.map_changed();
        }
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Move the map under the mouse; the fetch waits for the drag to end
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.viewport.pan(dx, dy);
                self.dragged = true;
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a drag emits its viewport change, a plain press is a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = None;
        if std::mem::take(&mut self.dragged) {
            self.map_changed();
        } else {
            self.click(col, row);
        }
    }

    /// Start lookups that are due; called before every draw
    pub fn render_pass(&mut self) {
        self.departure.resolve(&self.departure_code);
    }

    /// Apply finished requests. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let fetched = self.orchestrator.poll();
        let moved = self.departure.poll();
        if fetched || moved {
            self.refresh_markers();
        }
        fetched || moved
    }

    /// Rebuild markers from the current result. A hovered label that
    /// survives keeps its overlay.
    pub fn refresh_markers(&mut self) {
        let hovered_at = self.hovered.and_then(|i| self.markers.get(i)).map(|m| m.position);

        let destinations = Arc::clone(self.orchestrator.destinations());
        let mut markers = layout(&destinations, self.cluster_zoom(), self.max_labeled);
        if !self.departure_code.is_empty() {
            markers.push(RenderMarker::origin(self.departure.coords()));
        }
        debug!(markers = markers.len(), zoom = ?self.cluster_zoom(), "markers rebuilt");
        self.markers = markers;

        self.hovered = hovered_at.and_then(|at| {
            self.markers
                .iter()
                .position(|m| m.position == at && matches!(m.kind, MarkerKind::FullLabel { .. }))
        });
        match self.hovered {
            Some(i) => self.flight_path = Some(FlightPath::new(self.departure.coords(), self.markers[i].position)),
            None => self.flight_path = None,
        }
    }

    /// Track the mouse; entering a price label draws its route, leaving
    /// removes it.
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let hit = self.label_under(col, row);
        if hit == self.hovered {
            return;
        }
        self.hovered = hit;
        self.flight_path = hit.map(|i| FlightPath::new(self.departure.coords(), self.markers[i].position));
    }

    fn label_under(&self, col: u16, row: u16) -> Option<usize> {
        let cell = map_cell(col, row)?;
        label_at(&self.markers, &self.viewport, cell)
    }

    /// Clicking a price label prepares the flight search for it
    pub fn click(&mut self, col: u16, row: u16) {
        let summary = self.label_under(col, row).and_then(|i| match &self.markers[i].kind {
            MarkerKind::FullLabel { values } => values.first(),
            _ => None,
        });
        self.selected = summary.map(|s| FlightSearchParams::new(&self.departure_code, &self.departure_label, s));
        if let Some(params) = &self.selected {
            info!(?params, "flight search selected");
        }
    }

    /// Summaries of the hovered cluster, for the detail popup
    pub fn hovered_values(&self) -> Option<&[DestinationSummary]> {
        match &self.markers.get(self.hovered?)?.kind {
            MarkerKind::FullLabel { values } => Some(values),
            _ => None,
        }
    }

    pub fn cycle_month(&mut self) {
        self.set_dates(self.dates.next_month(Local::now().month0()));
    }

    pub fn cycle_duration(&mut self) {
        self.set_dates(self.dates.next_duration());
    }

    fn set_dates(&mut self, dates: DatesFilter) {
        self.dates = dates;
        self.orchestrator.on_filter_changed(FilterChange::Dates(dates));
    }

    pub fn begin_departure_input(&mut self) {
        self.input_mode = InputMode::Departure;
        self.input = self.departure_code.clone();
    }

    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_alphanumeric() && self.input.len() < 4 {
            self.input.push(c.to_ascii_uppercase());
        }
    }

    pub fn input_backspace(&mut self) {
        self.input.pop();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Switch departure airport; the resolver picks it up on the next draw
    pub fn submit_departure(&mut self) {
        self.input_mode = InputMode::Normal;
        let code = std::mem::take(&mut self.input).trim().to_uppercase();
        if code == self.departure_code {
            return;
        }
        info!(from = %self.departure_code, to = %code, "departure changed");
        self.departure_label = code.clone();
        self.departure_code = code;
        self.selected = None;
        self.orchestrator
            .on_filter_changed(FilterChange::Departure(non_empty(&self.departure_code)));
        self.refresh_markers();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("z{} ({})", self.viewport.zoom, Lod::from_zoom(self.viewport.zoom).label())
    }

    pub fn center_coords(&self) -> String {
        let (lat, lng) = (self.viewport.center_lat, self.viewport.center_lng);
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lng.abs(),
            if lng >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn departure_summary(&self) -> String {
        if self.departure_code.is_empty() {
            "no departure".to_string()
        } else if self.departure_label.eq_ignore_ascii_case(&self.departure_code) {
            self.departure_code.clone()
        } else {
            format!("{} {}", self.departure_code, self.departure_label)
        }
    }

    pub fn dates_summary(&self) -> String {
        format!("{} · {}", self.dates.month_label(), self.dates.duration.label())
    }
}

fn non_empty(code: &str) -> Option<String> {
    (!code.is_empty()).then(|| code.to_string())
}

/// Braille pixels of the map area: borders take two columns, borders and
/// the status bar three rows.
fn map_pixels(width: u16, height: u16) -> (usize, usize) {
    let inner_width = width.saturating_sub(2) as usize;
    let inner_height = height.saturating_sub(3) as usize;
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to a cell inside the map border
fn map_cell(col: u16, row: u16) -> Option<(u16, u16)> {
    Some((col.checked_sub(1)?, row.checked_sub(1)?))
}

fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = col.saturating_sub(1) as i32 * 2;
    let py = row.saturating_sub(1) as i32 * 4;
    (px, py)
}
