use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use tracing::{debug, info, warn};

use crate::geo::LatLng;
use crate::map::{LineString, Lod, MapRenderer};

/// Natural Earth coastline files looked up in the data directory
const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

/// Load whatever coastline files exist under `data_dir`; falls back to a
/// coarse built-in outline when none could be read.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    for (filename, lod) in COASTLINE_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            debug!(path = %path.display(), "coastline file not present");
            continue;
        }
        match load_coastlines(&path) {
            Ok(lines) => {
                info!(file = filename, lines = lines.len(), lod = lod.label(), "loaded coastlines");
                for line in lines {
                    renderer.add_coastline(line, lod);
                }
            }
            Err(e) => warn!(file = filename, error = %e, "failed to load coastlines"),
        }
    }

    if !renderer.has_data() {
        info!("no basemap data found, using built-in outline");
        add_builtin_outline(renderer);
    }
}

/// Every line or polygon exterior ring in a GeoJSON file
pub fn load_coastlines(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse().with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines),
    }
    Ok(lines)
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    // GeoJSON positions are [lng, lat]
    let to_line = |coords: &[Vec<f64>]| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| LatLng::new(c[1], c[0]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|l| to_line(l))),
        Value::Polygon(rings) => out.extend(rings.first().map(|r| to_line(r))),
        Value::MultiPolygon(polygons) => out.extend(polygons.iter().filter_map(|p| p.first()).map(|r| to_line(r))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Coarse landmasses around the default view, as (lat, lng) rings
const BUILTIN_OUTLINE: &[&[(f64, f64)]] = &[
    // Australia
    &[
        (-10.7, 142.5), (-14.5, 143.8), (-19.3, 146.8), (-23.4, 150.9), (-28.2, 153.6),
        (-32.9, 151.8), (-37.5, 149.9), (-38.7, 146.3), (-38.3, 141.6), (-35.6, 138.1),
        (-32.5, 133.8), (-31.6, 129.0), (-33.9, 123.6), (-35.0, 117.9), (-33.6, 115.0),
        (-28.8, 114.6), (-22.6, 113.7), (-20.3, 118.8), (-17.0, 122.2), (-14.1, 126.2),
        (-14.9, 129.6), (-12.2, 131.0), (-12.0, 136.7), (-15.0, 135.6), (-17.6, 140.8),
        (-10.7, 142.5),
    ],
    // Tasmania
    &[(-40.8, 144.7), (-41.0, 148.3), (-43.2, 148.0), (-43.6, 146.0), (-40.8, 144.7)],
    // New Zealand
    &[
        (-34.4, 172.7), (-36.8, 175.9), (-37.6, 178.5), (-39.6, 177.0), (-41.6, 175.2),
        (-39.8, 174.2), (-38.0, 174.6), (-34.4, 172.7),
    ],
    &[
        (-40.5, 172.7), (-41.8, 174.2), (-43.8, 173.1), (-45.9, 170.7), (-46.6, 168.3),
        (-45.5, 166.9), (-43.0, 170.5), (-40.5, 172.7),
    ],
    // New Guinea
    &[
        (-0.9, 131.2), (-2.6, 137.9), (-3.4, 144.3), (-5.9, 147.8), (-10.3, 150.7),
        (-8.1, 143.4), (-8.4, 138.6), (-4.4, 135.0), (-0.9, 131.2),
    ],
    // Borneo
    &[(6.9, 116.8), (4.0, 117.9), (1.0, 118.9), (-3.9, 116.0), (-2.9, 110.3), (1.6, 109.0), (6.9, 116.8)],
    // Sumatra and Java
    &[(5.6, 95.3), (1.3, 102.5), (-5.9, 106.0), (-3.6, 102.0), (5.6, 95.3)],
    &[(-6.0, 106.1), (-6.9, 112.6), (-8.7, 114.5), (-7.7, 108.3), (-6.0, 106.1)],
    // Japan
    &[(41.4, 140.0), (38.3, 141.5), (35.0, 140.0), (33.6, 135.2), (34.3, 133.0), (35.6, 135.2), (41.4, 140.0)],
    // Mainland Asia, east and south coasts
    &[
        (59.5, 143.2), (53.3, 141.4), (43.1, 131.9), (38.9, 121.6), (34.9, 119.2),
        (30.8, 121.9), (25.0, 119.6), (21.5, 109.7), (16.1, 108.2), (10.4, 107.1),
        (8.6, 104.8), (13.4, 100.6), (7.9, 100.4), (1.3, 103.8), (8.5, 98.3),
        (16.3, 97.6), (21.9, 90.3), (16.4, 81.4), (8.1, 77.5), (20.9, 70.2),
        (25.0, 62.0), (26.6, 56.3), (24.4, 54.2), (22.6, 59.8), (12.6, 43.5),
    ],
    // Africa
    &[
        (31.5, -9.8), (21.0, -17.0), (14.7, -17.5), (4.4, -7.5), (5.6, 0.0),
        (4.2, 9.6), (-4.8, 11.9), (-17.2, 11.8), (-34.4, 18.5), (-34.0, 25.6),
        (-25.9, 32.9), (-15.0, 40.6), (-4.0, 39.7), (2.0, 45.3), (11.8, 51.3),
        (11.6, 43.2), (15.0, 39.8), (22.0, 36.9), (30.0, 32.6), (31.3, 27.2),
        (32.9, 13.2), (37.0, 10.2), (35.8, -5.9), (31.5, -9.8),
    ],
    // Europe
    &[
        (36.0, -5.6), (36.7, -9.0), (43.4, -8.7), (43.4, -1.8), (48.4, -4.8),
        (51.0, 2.4), (53.5, 8.5), (57.7, 10.6), (55.4, 12.9), (54.3, 19.6),
        (59.9, 29.9), (65.7, 24.5), (63.1, 20.9), (59.3, 18.1), (55.6, 14.3),
        (58.1, 6.6), (62.9, 7.0), (70.7, 23.7), (69.3, 33.0),
    ],
    &[(50.7, 1.6), (53.4, 0.2), (57.6, -1.8), (58.6, -5.0), (55.0, -4.9), (51.6, -5.1), (50.7, 1.6)],
    // North America
    &[
        (70.3, -148.5), (65.6, -168.1), (58.5, -157.5), (60.5, -146.0), (54.3, -130.3),
        (48.4, -124.7), (40.4, -124.4), (34.4, -120.5), (32.7, -117.2), (23.0, -109.7),
        (16.0, -95.0), (15.8, -88.0), (21.5, -87.0), (18.5, -91.5), (22.0, -97.8),
        (29.0, -95.0), (30.2, -88.0), (29.9, -84.0), (25.1, -80.4), (35.2, -75.5),
        (40.7, -74.0), (44.8, -66.9), (46.8, -60.0), (52.3, -55.7), (60.4, -64.5),
        (58.8, -94.2), (68.6, -95.0), (69.6, -116.0), (70.3, -148.5),
    ],
    // South America
    &[
        (11.8, -72.2), (10.6, -61.7), (4.3, -51.6), (-1.4, -48.5), (-5.2, -35.3),
        (-13.0, -38.5), (-23.0, -43.2), (-34.9, -54.9), (-38.9, -62.0), (-47.8, -65.9),
        (-55.0, -67.3), (-52.4, -74.7), (-41.5, -73.8), (-33.0, -71.6), (-18.3, -70.3),
        (-14.0, -76.3), (-5.0, -81.1), (1.2, -79.0), (7.8, -77.7), (11.8, -72.2),
    ],
];

fn add_builtin_outline(renderer: &mut MapRenderer) {
    for ring in BUILTIN_OUTLINE {
        let line = ring.iter().map(|&(lat, lng)| LatLng::new(lat, lng)).collect();
        renderer.add_coastline(line, Lod::Low);
    }
}
