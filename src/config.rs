use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::geo::LatLng;

/// Runtime settings: TOML file, then `FLIGHTMAP_*` environment, then CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Price service root; the offline demo backend is used when unset
    pub api_base_url: Option<String>,
    pub default_departure: String,
    pub default_departure_label: String,
    pub default_departure_lat: f64,
    pub default_departure_lng: f64,
    pub default_center: LatLng,
    pub default_desktop_zoom: u8,
    pub default_mobile_zoom: u8,
    /// Terminals narrower than this many columns get the mobile layout
    pub mobile_width: u16,
    /// Rich price labels drawn at once
    pub max_concurrent_price_markers: usize,
    pub discard_stale_responses: bool,
    pub request_timeout_secs: u64,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub style: MapStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            default_departure: "SYD".to_string(),
            default_departure_label: "Sydney".to_string(),
            default_departure_lat: -33.8688,
            default_departure_lng: 151.2093,
            default_center: LatLng::new(-25.0, 135.0),
            default_desktop_zoom: 3,
            default_mobile_zoom: 2,
            mobile_width: 80,
            max_concurrent_price_markers: 20,
            discard_stale_responses: true,
            request_timeout_secs: 15,
            data_dir: PathBuf::from("data"),
            log_file: PathBuf::from("tui-flightmap.log"),
            style: MapStyle::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `path` if it is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `FLIGHTMAP_*` overrides. Unparsable numbers are ignored.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("FLIGHTMAP_API_URL").filter(|s| !s.is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(code) = var("FLIGHTMAP_DEFAULT_DEPARTURE") {
            self.default_departure = code;
        }
        if let Some(label) = var("FLIGHTMAP_DEFAULT_DEPARTURE_LABEL") {
            self.default_departure_label = label;
        }
        for (key, slot) in [
            ("FLIGHTMAP_DEFAULT_DEPARTURE_LAT", &mut self.default_departure_lat),
            ("FLIGHTMAP_DEFAULT_DEPARTURE_LNG", &mut self.default_departure_lng),
        ] {
            if let Some(raw) = var(key) {
                match raw.trim().parse::<f64>() {
                    Ok(v) => *slot = v,
                    Err(_) => warn!(key, value = %raw, "ignoring non-numeric coordinate"),
                }
            }
        }
    }

    pub fn departure_fallback(&self) -> LatLng {
        LatLng::new(self.default_departure_lat, self.default_departure_lng)
    }

    /// Startup zoom and gesture handling for a terminal `width` columns wide
    pub fn map_init(&self, width: u16) -> MapInit {
        if width < self.mobile_width {
            MapInit {
                default_zoom: self.default_mobile_zoom.max(1),
                scroll_zoom: false,
            }
        } else {
            MapInit {
                default_zoom: self.default_desktop_zoom.max(1),
                scroll_zoom: true,
            }
        }
    }
}

/// Layout-dependent map options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInit {
    pub default_zoom: u8,
    /// Mobile layouts are cooperative: the wheel scrolls, it doesn't zoom
    pub scroll_zoom: bool,
}

impl MapInit {
    pub fn min_zoom(&self) -> u8 {
        ((self.default_zoom as f64 * 0.8).round() as u8).max(1)
    }

    pub fn max_zoom(&self) -> u8 {
        self.default_zoom.saturating_mul(3)
    }
}

/// Colour table; names (`cyan`, `light-red`) or `#rrggbb`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub coastline: String,
    pub label: String,
    pub price: String,
    pub pin: String,
    pub disabled_pin: String,
    pub origin: String,
    pub flight_path: String,
    pub error: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            coastline: "cyan".into(),
            label: "white".into(),
            price: "yellow".into(),
            pin: "gray".into(),
            disabled_pin: "dark-gray".into(),
            origin: "light-red".into(),
            flight_path: "#aaaaaa".into(),
            error: "red".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub coastline: Color,
    pub label: Color,
    pub price: Color,
    pub pin: Color,
    pub disabled_pin: Color,
    pub origin: Color,
    pub flight_path: Color,
    pub error: Color,
}

impl MapStyle {
    pub fn palette(&self) -> Palette {
        let defaults = MapStyle::default();
        let pick = |value: &str, fallback: &str| {
            Color::from_str(value).unwrap_or_else(|_| {
                warn!(value, "unknown colour, using default");
                Color::from_str(fallback).unwrap_or(Color::White)
            })
        };
        Palette {
            coastline: pick(&self.coastline, &defaults.coastline),
            label: pick(&self.label, &defaults.label),
            price: pick(&self.price, &defaults.price),
            pin: pick(&self.pin, &defaults.pin),
            disabled_pin: pick(&self.disabled_pin, &defaults.disabled_pin),
            origin: pick(&self.origin, &defaults.origin),
            flight_path: pick(&self.flight_path, &defaults.flight_path),
            error: pick(&self.error, &defaults.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "http://localhost:5000"
max_concurrent_price_markers = 7
default_center = {{ lat = 1.5, lng = 2.5 }}

[style]
price = "green"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.max_concurrent_price_markers, 7);
        assert_eq!(config.default_center, LatLng::new(1.5, 2.5));
        assert_eq!(config.style.price, "green");
        assert_eq!(config.style.coastline, "cyan");
        assert_eq!(config.default_departure, "SYD");
    }

    #[test]
    fn test_bad_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_price_markers = \"lots\"").unwrap();
        assert!(matches!(Config::load(Some(file.path())), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(Some(Path::new("/nonexistent/flightmap.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FLIGHTMAP_DEFAULT_DEPARTURE", "MEL"),
            ("FLIGHTMAP_DEFAULT_DEPARTURE_LAT", "-37.67"),
            ("FLIGHTMAP_DEFAULT_DEPARTURE_LNG", "east-ish"),
            ("FLIGHTMAP_API_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.default_departure, "MEL");
        assert_eq!(config.default_departure_lat, -37.67);
        assert_eq!(config.default_departure_lng, 151.2093);
        assert_eq!(config.api_base_url, None);
    }

    #[test]
    fn test_mobile_layout() {
        let config = Config::default();
        let mobile = config.map_init(60);
        assert_eq!(mobile.default_zoom, 2);
        assert!(!mobile.scroll_zoom);

        let desktop = config.map_init(160);
        assert_eq!(desktop.default_zoom, 3);
        assert!(desktop.scroll_zoom);
        assert_eq!(desktop.min_zoom(), 2);
        assert_eq!(desktop.max_zoom(), 9);
    }

    #[test]
    fn test_palette_falls_back_on_unknown_colour() {
        let style = MapStyle {
            price: "not-a-colour".into(),
            flight_path: "#102030".into(),
            ..MapStyle::default()
        };
        let palette = style.palette();
        assert_eq!(palette.price, Color::Yellow);
        assert_eq!(palette.flight_path, Color::Rgb(0x10, 0x20, 0x30));
    }
}
