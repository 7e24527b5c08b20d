use std::f64::consts::PI;

use crate::geo::{Bounds, LatLng};

/// Visible map area in braille pixels with an integer zoom level.
/// Level 1 fits the whole world across the canvas; each level doubles.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lng: f64,
    /// Center latitude, clamped to the Mercator-safe band
    pub center_lat: f64,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

const MAX_LAT: f64 = 85.0;

impl Viewport {
    pub fn new(center: LatLng, zoom: u8, width: usize, height: usize) -> Self {
        Self {
            center_lng: center.lng,
            center_lat: center.lat.clamp(-MAX_LAT, MAX_LAT),
            zoom: zoom.max(1),
            min_zoom: 1,
            max_zoom: u8::MAX,
            width,
            height,
        }
    }

    pub fn with_zoom_limits(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom.max(1);
        self.max_zoom = max_zoom.max(self.min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }

    /// Pixels spanned by 360 degrees of longitude
    fn scale(&self) -> f64 {
        self.width.max(1) as f64 * 2f64.powi(self.zoom as i32 - 1)
    }

    fn center_xy(&self) -> (f64, f64) {
        (mercator_x(self.center_lng), mercator_y(self.center_lat))
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let degrees_per_px = 360.0 / self.scale();
        self.center_lng += dx as f64 * degrees_per_px;
        self.center_lat -= dy as f64 * degrees_per_px * 0.5;

        if self.center_lng > 180.0 {
            self.center_lng -= 360.0;
        } else if self.center_lng < -180.0 {
            self.center_lng += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-MAX_LAT, MAX_LAT);
    }

    /// Returns false when already at the limit
    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom.saturating_add(1))
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom.saturating_sub(1))
    }

    fn set_zoom(&mut self, zoom: u8) -> bool {
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    /// Zoom by one level keeping the point under (px, py) in place
    pub fn zoom_at(&mut self, px: i32, py: i32, zoom_in: bool) -> bool {
        let anchor = self.unproject(px, py);
        let changed = if zoom_in { self.zoom_in() } else { self.zoom_out() };
        if changed {
            let (nx, ny) = self.project(anchor);
            self.pan(nx - px, ny - py);
        }
        changed
    }

    /// Screen pixel back to a coordinate. Longitude is not wrapped.
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let scale = self.scale();
        let (cx, cy) = self.center_xy();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + cx;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + cy;

        let lng = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    /// Coordinate to screen pixel (Web Mercator)
    pub fn project(&self, at: LatLng) -> (i32, i32) {
        let scale = self.scale();
        let (cx, cy) = self.center_xy();
        let mut x = mercator_x(at.lng);
        // draw the copy of the point nearest the center
        if x - cx > 0.5 {
            x -= 1.0;
        } else if cx - x > 0.5 {
            x += 1.0;
        }
        let y = mercator_y(at.lat.clamp(-MAX_LAT, MAX_LAT));

        let px = ((x - cx) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - cy) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Raw corner coordinates. Near the antimeridian these fall outside
    /// [-180, 180]; the search request normalises them.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.unproject(0, 0),
            self.unproject(self.width as i32, self.height as i32),
        )
    }

    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Rough bounding box check for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let (min_x, max_x) = (p1.0.min(p2.0), p1.0.max(p2.0));
        let (min_y, max_y) = (p1.1.min(p2.1), p1.1.max(p2.1));
        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

fn mercator_x(lng: f64) -> f64 {
    (lng + 180.0) / 360.0
}

fn mercator_y(lat: f64) -> f64 {
    let rad = lat.to_radians();
    (1.0 - (rad.tan() + 1.0 / rad.cos()).ln() / PI) / 2.0
}
