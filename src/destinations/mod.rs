//! Destination records returned by the price search and the display
//! payloads derived from them.

mod cluster;
mod rank;

pub use cluster::{cluster, ClusterThreshold};
pub use rank::{layout, rank, MarkerKind, RenderMarker};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::LatLng;

/// Sentinel price meaning "not yet known for this destination"
pub const UNKNOWN_PRICE: f64 = -1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDates {
    #[serde(default, deserialize_with = "lenient_date")]
    pub departure_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub return_date: Option<NaiveDate>,
}

/// One candidate trip. Fields the backend may omit are optional; a record
/// missing any of them is still accepted and simply never rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub airport_name: Option<String>,
    #[serde(default)]
    pub dest_airport_code: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub personal_priority_idx: Option<f64>,
    #[serde(default)]
    pub flight_dates: FlightDates,
}

impl Destination {
    /// Unpriced destinations render as disabled pins and never cluster.
    pub fn is_unpriced(&self) -> bool {
        self.price == Some(UNKNOWN_PRICE)
    }

    pub fn position(&self) -> Option<LatLng> {
        Some(LatLng::new(self.lat?, self.lng?))
    }

    /// Everything a full label needs is present
    pub fn is_renderable(&self) -> bool {
        self.lat.is_some()
            && self.lng.is_some()
            && self.price.is_some()
            && self.personal_priority_idx.is_some()
            && self.city_name.is_some()
    }

    /// Summary for the destination that anchors a group
    pub fn anchor_summary(&self) -> DestinationSummary {
        let label = self
            .city_name
            .clone()
            .or_else(|| self.airport_name.clone())
            .unwrap_or_else(|| self.dest_airport_code.clone());
        self.summary_with_label(label)
    }

    /// Summary for a destination merged into someone else's group. Several
    /// airports can share a cluster, so the airport name wins here.
    pub fn member_summary(&self) -> DestinationSummary {
        let label = self
            .airport_name
            .clone()
            .or_else(|| self.city_name.clone())
            .unwrap_or_else(|| self.dest_airport_code.clone());
        self.summary_with_label(label)
    }

    fn summary_with_label(&self, destination: String) -> DestinationSummary {
        DestinationSummary {
            destination,
            destination_code: self.dest_airport_code.clone(),
            priority: self.personal_priority_idx.unwrap_or(f64::NEG_INFINITY),
            date_out: self.flight_dates.departure_date,
            date_back: self.flight_dates.return_date,
            price: self.price.unwrap_or(UNKNOWN_PRICE),
        }
    }
}

/// Per-destination payload carried by a cluster for display
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationSummary {
    pub destination: String,
    pub destination_code: String,
    pub priority: f64,
    pub date_out: Option<NaiveDate>,
    pub date_back: Option<NaiveDate>,
    pub price: f64,
}

/// Destinations merged into one marker at the current zoom. `key` is the
/// first destination seen in the cluster; `values` keep encounter order
/// and start with the key's own summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationGroup {
    pub key: Destination,
    pub values: Vec<DestinationSummary>,
}

/// Parameters handed to the booking form when a price label is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSearchParams {
    pub from: String,
    pub from_city: String,
    pub to: String,
    pub to_city: String,
    pub trip_type: &'static str,
    pub date_out: String,
    pub date_back: String,
}

impl FlightSearchParams {
    pub fn new(from: &str, from_city: &str, summary: &DestinationSummary) -> Self {
        Self {
            from: from.to_string(),
            from_city: from_city.to_string(),
            to: summary.destination_code.clone(),
            to_city: summary.destination.clone(),
            trip_type: "Return",
            date_out: compact_date(summary.date_out),
            date_back: compact_date(summary.date_back),
        }
    }
}

/// `YYYYMMDD`, or empty when the date is unknown
pub fn compact_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y%m%d").to_string()).unwrap_or_default()
}

/// Price label text: one decimal, thousands separators, no trailing `.0`
pub fn format_price(price: f64) -> String {
    let tenths = (price.abs() * 10.0).round() as u64;
    let whole = tenths / 10;
    let frac = tenths % 10;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 && tenths > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{frac}")
    }
}

/// Accepts `2024-03-01`, `2024-03-01T00:00:00` and RFC 3339 timestamps
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let day = s.get(..10).unwrap_or(s.as_str());
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }))
}
