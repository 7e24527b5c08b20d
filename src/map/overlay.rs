use glam::DVec3;

use crate::geo::LatLng;

/// Great-circle route drawn while a price label is hovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightPath {
    pub from: LatLng,
    pub to: LatLng,
}

impl FlightPath {
    pub fn new(from: LatLng, to: LatLng) -> Self {
        Self { from, to }
    }

    /// Points along the arc in roughly `step_deg` increments, endpoints included
    pub fn points(&self, step_deg: f64) -> Vec<LatLng> {
        let a = to_unit(self.from);
        let b = to_unit(self.to);
        let angle = a.dot(b).clamp(-1.0, 1.0).acos();
        let sin_angle = angle.sin();

        let mut points = vec![self.from];
        let steps = (angle.to_degrees() / step_deg.max(0.1)).ceil() as usize;
        // nearly identical or antipodal: no unique arc
        if steps <= 1 || sin_angle.abs() < 1e-10 {
            points.push(self.to);
            return points;
        }

        for i in 1..steps {
            let t = i as f64 / steps as f64;
            let p = a * (((1.0 - t) * angle).sin() / sin_angle) + b * ((t * angle).sin() / sin_angle);
            points.push(from_unit(p));
        }
        points.push(self.to);
        points
    }
}

#[inline(always)]
fn to_unit(at: LatLng) -> DVec3 {
    let (lat, lng) = (at.lat.to_radians(), at.lng.to_radians());
    DVec3::new(lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin())
}

#[inline(always)]
fn from_unit(p: DVec3) -> LatLng {
    LatLng::new(p.z.clamp(-1.0, 1.0).asin().to_degrees(), p.y.atan2(p.x).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        let path = FlightPath::new(LatLng::new(-33.9, 151.2), LatLng::new(51.5, -0.4));
        let points = path.points(2.0);
        assert!(points.len() > 10);
        assert_eq!(points.first(), Some(&path.from));
        assert_eq!(points.last(), Some(&path.to));
    }

    #[test]
    fn test_short_hop_is_a_single_segment() {
        let path = FlightPath::new(LatLng::new(-33.9, 151.2), LatLng::new(-34.0, 151.0));
        assert_eq!(path.points(2.0).len(), 2);
    }

    #[test]
    fn test_arc_bends_poleward() {
        let path = FlightPath::new(LatLng::new(40.0, -120.0), LatLng::new(40.0, 120.0));
        let points = path.points(2.0);
        let mid = points[points.len() / 2];
        assert!(mid.lat > 40.0);
        assert!(mid.lng.abs() > 170.0);
    }
}
