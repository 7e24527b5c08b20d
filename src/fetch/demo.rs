use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, NaiveDate};

use super::{FlightApi, SearchRequest};
use crate::destinations::{Destination, FlightDates, UNKNOWN_PRICE};
use crate::error::ApiError;
use crate::geo::LatLng;

/// (code, city, airport, lat, lng)
const AIRPORTS: &[(&str, &str, &str, f64, f64)] = &[
    ("SYD", "Sydney", "Kingsford Smith", -33.95, 151.18),
    ("MEL", "Melbourne", "Tullamarine", -37.67, 144.84),
    ("BNE", "Brisbane", "Brisbane Airport", -27.38, 153.12),
    ("OOL", "Gold Coast", "Coolangatta", -28.16, 153.50),
    ("CBR", "Canberra", "Canberra Airport", -35.31, 149.19),
    ("ADL", "Adelaide", "Adelaide Airport", -34.94, 138.53),
    ("PER", "Perth", "Perth Airport", -31.94, 115.97),
    ("HBA", "Hobart", "Hobart Airport", -42.84, 147.51),
    ("CNS", "Cairns", "Cairns Airport", -16.88, 145.75),
    ("DRW", "Darwin", "Darwin Airport", -12.41, 130.88),
    ("AKL", "Auckland", "Auckland Airport", -37.01, 174.79),
    ("WLG", "Wellington", "Wellington Airport", -41.33, 174.81),
    ("CHC", "Christchurch", "Christchurch Airport", -43.49, 172.53),
    ("ZQN", "Queenstown", "Queenstown Airport", -45.02, 168.74),
    ("NAN", "Nadi", "Nadi International", -17.76, 177.44),
    ("NOU", "Noumea", "La Tontouta", -22.01, 166.21),
    ("VLI", "Port Vila", "Bauerfield", -17.70, 168.32),
    ("APW", "Apia", "Faleolo", -13.83, -172.01),
    ("TBU", "Nuku'alofa", "Fua'amotu", -21.24, -175.15),
    ("PPT", "Papeete", "Faa'a", -17.55, -149.61),
    ("HNL", "Honolulu", "Daniel K. Inouye", 21.32, -157.92),
    ("DPS", "Denpasar", "Ngurah Rai", -8.75, 115.17),
    ("CGK", "Jakarta", "Soekarno-Hatta", -6.13, 106.66),
    ("SIN", "Singapore", "Changi", 1.36, 103.99),
    ("KUL", "Kuala Lumpur", "KLIA", 2.75, 101.71),
    ("BKK", "Bangkok", "Suvarnabhumi", 13.69, 100.75),
    ("HKT", "Phuket", "Phuket International", 8.11, 98.32),
    ("SGN", "Ho Chi Minh City", "Tan Son Nhat", 10.82, 106.65),
    ("MNL", "Manila", "Ninoy Aquino", 14.51, 121.02),
    ("HKG", "Hong Kong", "Chek Lap Kok", 22.31, 113.92),
    ("TPE", "Taipei", "Taoyuan", 25.08, 121.23),
    ("NRT", "Tokyo", "Narita", 35.77, 140.39),
    ("HND", "Tokyo", "Haneda", 35.55, 139.78),
    ("KIX", "Osaka", "Kansai", 34.43, 135.24),
    ("ICN", "Seoul", "Incheon", 37.46, 126.44),
    ("PEK", "Beijing", "Capital", 40.08, 116.58),
    ("PVG", "Shanghai", "Pudong", 31.14, 121.81),
    ("DEL", "Delhi", "Indira Gandhi", 28.56, 77.10),
    ("DXB", "Dubai", "Dubai International", 25.25, 55.36),
    ("LAX", "Los Angeles", "LAX", 33.94, -118.41),
    ("SFO", "San Francisco", "SFO", 37.62, -122.38),
    ("YVR", "Vancouver", "Vancouver International", 49.19, -123.18),
    ("LHR", "London", "Heathrow", 51.47, -0.45),
    ("CDG", "Paris", "Charles de Gaulle", 49.01, 2.55),
];

/// Offline backend: serves airports from a built-in table with prices
/// derived deterministically from the request, so the same view always
/// shows the same fares.
pub struct DemoFlightApi {
    latency: Duration,
}

impl DemoFlightApi {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn in_area(request: &SearchRequest, at: LatLng) -> bool {
        let area = &request.search_area;
        let (north, south) = (area.north_west.lat, area.south_east.lat);
        if at.lat > north.max(south) || at.lat < north.min(south) {
            return false;
        }
        let (west, east) = (area.north_west.lng, area.south_east.lng);
        if west <= east {
            at.lng >= west && at.lng <= east
        } else {
            // box straddles the antimeridian
            at.lng >= west || at.lng <= east
        }
    }

    fn destination(request: &SearchRequest, airport: &(&str, &str, &str, f64, f64)) -> Destination {
        let (code, city, name, lat, lng) = *airport;
        let departure = request.departure_airport_id.as_deref().unwrap_or("");
        let seed = hash2(code_seed(code), code_seed(departure));
        let seed = hash2(seed, request.dates.month.map(u64::from).unwrap_or(99));
        let seed = hash2(seed, u64::from(request.dates.duration.code()));

        let price = if seed % 8 == 0 {
            UNKNOWN_PRICE
        } else {
            (79.0 + rand_simple(seed) * 1400.0).round()
        };

        Destination {
            city_name: Some(city.to_string()),
            airport_name: Some(name.to_string()),
            dest_airport_code: code.to_string(),
            lat: Some(lat),
            lng: Some(lng),
            price: Some(price),
            personal_priority_idx: Some((rand_simple(seed ^ 0x5bd1) * 100.0).round() / 10.0),
            flight_dates: trip_dates(request, seed),
        }
    }
}

#[async_trait]
impl FlightApi for DemoFlightApi {
    async fn destination_prices(&self, request: &SearchRequest) -> Result<Vec<Destination>, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let departure = request.departure_airport_id.as_deref();
        Ok(AIRPORTS
            .iter()
            .filter(|a| Some(a.0) != departure)
            .filter(|a| Self::in_area(request, LatLng::new(a.3, a.4)))
            .map(|a| Self::destination(request, a))
            .collect())
    }

    async fn departure_airport(&self, code: &str) -> Result<Option<Vec<f64>>, ApiError> {
        Ok(AIRPORTS
            .iter()
            .find(|a| a.0.eq_ignore_ascii_case(code))
            .map(|a| vec![a.3, a.4]))
    }
}

/// Departure in the requested month (or a few weeks out), return after the
/// requested trip length
fn trip_dates(request: &SearchRequest, seed: u64) -> FlightDates {
    let today = Local::now().date_naive();
    let start = match request.dates.month {
        Some(m) => {
            let year = if m < today.month0() { today.year() + 1 } else { today.year() };
            NaiveDate::from_ymd_opt(year, m + 1, 1).unwrap_or(today)
        }
        None => today + Days::new(14),
    };
    let departure = start + Days::new(seed % 21);
    let nights = match request.dates.duration.code() {
        1 => 2,
        2 => 7,
        _ => 14,
    };
    FlightDates {
        departure_date: Some(departure),
        return_date: Some(departure + Days::new(nights)),
    }
}

fn code_seed(code: &str) -> u64 {
    code.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

/// Two-value hash with xorshift mixing
#[inline(always)]
fn hash2(a: u64, b: u64) -> u64 {
    let mut seed = a.wrapping_mul(2654435761).wrapping_add(b.wrapping_mul(2246822519));
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// splitmix64 finaliser mapped onto [0, 1)
#[inline(always)]
fn rand_simple(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DatesFilter, TripDuration};
    use crate::geo::Bounds;

    fn request(nw: (f64, f64), se: (f64, f64)) -> SearchRequest {
        SearchRequest {
            departure_airport_id: Some("SYD".into()),
            search_area: Bounds::new(LatLng::new(nw.0, nw.1), LatLng::new(se.0, se.1)),
            dates: DatesFilter {
                month: None,
                duration: TripDuration::Week,
            },
        }
    }

    #[tokio::test]
    async fn test_only_airports_in_area() {
        let api = DemoFlightApi::new(Duration::ZERO);
        let found = api
            .destination_prices(&request((-10.0, 110.0), (-45.0, 155.0)))
            .await
            .unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|d| d.dest_airport_code != "SYD"));
        assert!(found.iter().any(|d| d.dest_airport_code == "MEL"));
        assert!(found.iter().all(|d| d.dest_airport_code != "AKL"));
    }

    #[tokio::test]
    async fn test_antimeridian_area() {
        let api = DemoFlightApi::new(Duration::ZERO);
        let found = api
            .destination_prices(&request((0.0, 170.0), (-30.0, -170.0)))
            .await
            .unwrap();
        let codes: Vec<_> = found.iter().map(|d| d.dest_airport_code.as_str()).collect();
        assert!(codes.contains(&"NAN"));
        assert!(codes.contains(&"TBU"));
        assert!(!codes.contains(&"BNE"));
    }

    #[tokio::test]
    async fn test_prices_are_stable() {
        let api = DemoFlightApi::new(Duration::ZERO);
        let req = request((60.0, -180.0), (-60.0, 180.0));
        let a = api.destination_prices(&req).await.unwrap();
        let b = api.destination_prices(&req).await.unwrap();
        let prices = |v: &[Destination]| v.iter().map(|d| d.price).collect::<Vec<_>>();
        assert_eq!(prices(&a), prices(&b));
        assert!(a.iter().all(|d| {
            let dates = &d.flight_dates;
            dates.return_date.unwrap() - dates.departure_date.unwrap() == chrono::Duration::days(7)
        }));
    }

    #[tokio::test]
    async fn test_departure_lookup() {
        let api = DemoFlightApi::new(Duration::ZERO);
        assert_eq!(api.departure_airport("akl").await.unwrap(), Some(vec![-37.01, 174.79]));
        assert_eq!(api.departure_airport("XXX").await.unwrap(), None);
    }
}
