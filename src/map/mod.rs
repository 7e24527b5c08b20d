mod geometry;
mod overlay;
mod projection;
mod renderer;

pub use overlay::FlightPath;
pub use projection::Viewport;
pub use renderer::{label_at, marker_cell, Glyph, GlyphKind, LineString, Lod, MapLayers, MapRenderer, Scene};
