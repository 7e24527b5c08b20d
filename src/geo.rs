use serde::{Deserialize, Serialize};

/// A geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Bounding box reported by the map after a drag/zoom/load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub north_west: LatLng,
    pub south_east: LatLng,
}

impl Bounds {
    pub const fn new(north_west: LatLng, south_east: LatLng) -> Self {
        Self {
            north_west,
            south_east,
        }
    }

    /// Correct longitude wrap-around on both corners. Latitudes are untouched.
    pub fn normalized(self) -> Self {
        Self {
            north_west: LatLng::new(self.north_west.lat, normalize_lng(self.north_west.lng)),
            south_east: LatLng::new(self.south_east.lat, normalize_lng(self.south_east.lng)),
        }
    }

    /// True once both longitudes lie in [-180, 180]
    pub fn is_normalized(&self) -> bool {
        (-180.0..=180.0).contains(&self.north_west.lng)
            && (-180.0..=180.0).contains(&self.south_east.lng)
    }
}

/// Bring a longitude that crossed the antimeridian back into range.
///
/// Values already in [-180, 180] are returned as-is, so the function is
/// idempotent. Anything outside wraps into (-180, 180]: one turn off
/// gives the familiar `190 -> -170` and `-190 -> 170`.
#[inline]
pub fn normalize_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) || !lng.is_finite() {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_antimeridian_viewport() {
        let bounds = Bounds::new(LatLng::new(10.0, 190.0), LatLng::new(-10.0, 170.0));
        let fixed = bounds.normalized();
        assert_eq!(fixed.north_west.lng, -170.0);
        assert_eq!(fixed.south_east.lng, 170.0);
        assert_eq!(fixed.north_west.lat, 10.0);
        assert_eq!(fixed.south_east.lat, -10.0);
        assert!(fixed.is_normalized());
    }

    #[test]
    fn test_negative_overflow() {
        assert_eq!(normalize_lng(-190.0), 170.0);
        assert_eq!(normalize_lng(-180.0), -180.0);
        assert_eq!(normalize_lng(180.0), 180.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut lng = 180.25;
        while lng < 900.0 {
            let once = normalize_lng(lng);
            assert!(once > -180.0 && once <= 180.0, "{lng} -> {once}");
            assert_eq!(normalize_lng(once), once);
            lng += 7.3;
        }
    }

    #[test]
    fn test_normalized_box_is_unchanged() {
        let bounds = Bounds::new(LatLng::new(40.0, -20.0), LatLng::new(30.0, 15.5));
        assert_eq!(bounds.normalized(), bounds);
    }
}
