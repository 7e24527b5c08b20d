use super::{Destination, DestinationGroup};

/// How close two destinations must be to share a marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterThreshold {
    /// Map not initialised yet: only identical coordinates merge
    Exact,
    Within { max_lat_delta: f64, max_lng_delta: f64 },
}

impl ClusterThreshold {
    /// Merge radius shrinks as the user zooms in, so clusters split apart.
    pub fn for_zoom(zoom: Option<u8>) -> Self {
        match zoom {
            Some(z) if z >= 1 => {
                let z = z as f64;
                Self::Within {
                    max_lat_delta: 8.0 / z,
                    max_lng_delta: 16.0 / z,
                }
            }
            _ => Self::Exact,
        }
    }

    fn close_enough(&self, a: &Destination, b: &Destination) -> bool {
        let (Some(pa), Some(pb)) = (a.position(), b.position()) else {
            return false;
        };
        match *self {
            Self::Exact => pa.lat == pb.lat && pa.lng == pb.lng,
            Self::Within {
                max_lat_delta,
                max_lng_delta,
            } => (pa.lat - pb.lat).abs() < max_lat_delta && (pa.lng - pb.lng).abs() < max_lng_delta,
        }
    }
}

/// Collapse destinations that overlap at `zoom` into marker groups.
///
/// Unpriced destinations are skipped. Input order drives everything: each
/// destination joins the first existing group whose key is within the
/// threshold, otherwise it starts a new group keyed by itself.
pub fn cluster(destinations: &[Destination], zoom: Option<u8>) -> Vec<DestinationGroup> {
    let priced: Vec<&Destination> = destinations.iter().filter(|d| !d.is_unpriced()).collect();
    cluster_priced(&priced, zoom).into_iter().map(|(_, group)| group).collect()
}

/// Groups paired with the index of their key in `priced`
pub(crate) fn cluster_priced(priced: &[&Destination], zoom: Option<u8>) -> Vec<(usize, DestinationGroup)> {
    let threshold = ClusterThreshold::for_zoom(zoom);
    let mut groups: Vec<(usize, DestinationGroup)> = Vec::new();

    for (idx, item) in priced.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|(_, g)| threshold.close_enough(&g.key, item))
        {
            Some((_, group)) => group.values.push(item.member_summary()),
            None => groups.push((
                idx,
                DestinationGroup {
                    key: (*item).clone(),
                    values: vec![item.anchor_summary()],
                },
            )),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::tests::dest;
    use crate::destinations::UNKNOWN_PRICE;
    use std::collections::HashMap;

    #[test]
    fn test_neighbours_merge_at_low_zoom() {
        let dests = vec![dest("AAA", 10.0, 20.0, 100.0, 1.0), dest("BBB", 10.1, 20.1, 90.0, 2.0)];
        let groups = cluster(&dests, Some(4));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key.dest_airport_code, "AAA");
        let codes: Vec<_> = groups[0].values.iter().map(|v| v.destination_code.as_str()).collect();
        assert_eq!(codes, ["AAA", "BBB"]);
    }

    #[test]
    fn test_clusters_split_when_zooming_in() {
        let dests = vec![dest("AAA", 10.0, 20.0, 100.0, 1.0), dest("BBB", 13.0, 20.0, 90.0, 2.0)];
        assert_eq!(cluster(&dests, Some(2)).len(), 1);
        assert_eq!(cluster(&dests, Some(8)).len(), 2);
    }

    #[test]
    fn test_threshold_is_strict() {
        // zoom 4 -> lat delta 2.0 exactly, which is not "< 2.0"
        let dests = vec![dest("AAA", 0.0, 0.0, 1.0, 1.0), dest("BBB", 2.0, 0.0, 1.0, 1.0)];
        assert_eq!(cluster(&dests, Some(4)).len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        // C is close to both A and B; it joins A because A's group came first
        let dests = vec![
            dest("AAA", 0.0, 0.0, 1.0, 1.0),
            dest("BBB", 0.0, 6.0, 1.0, 1.0),
            dest("CCC", 0.0, 3.0, 1.0, 1.0),
        ];
        let groups = cluster(&dests, Some(4));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].values.len(), 2);
        assert_eq!(groups[0].values[1].destination_code, "CCC");
        assert_eq!(groups[1].key.dest_airport_code, "BBB");
    }

    #[test]
    fn test_unknown_zoom_groups_exact_matches_only() {
        let dests = vec![
            dest("AAA", 1.0, 1.0, 10.0, 1.0),
            dest("BBB", 1.0, 1.0, 20.0, 1.0),
            dest("CCC", 1.0, 1.01, 30.0, 1.0),
        ];
        let groups = cluster(&dests, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].values.len(), 2);
        assert_eq!(cluster(&dests, Some(0)).len(), 2);
    }

    #[test]
    fn test_unpriced_never_grouped() {
        let dests = vec![
            dest("AAA", 5.0, 5.0, 10.0, 1.0),
            dest("ZZZ", 5.0, 5.0, UNKNOWN_PRICE, 9.0),
            dest("BBB", 5.1, 5.1, 12.0, 1.0),
        ];
        for zoom in [None, Some(1), Some(10)] {
            let groups = cluster(&dests, zoom);
            assert!(groups
                .iter()
                .all(|g| g.key.dest_airport_code != "ZZZ"
                    && g.values.iter().all(|v| v.destination_code != "ZZZ")));
        }
    }

    #[test]
    fn test_missing_coordinates_form_their_own_group() {
        let mut lost = dest("LST", 0.0, 0.0, 50.0, 1.0);
        lost.lat = None;
        let dests = vec![dest("AAA", 0.0, 0.0, 10.0, 1.0), lost];
        assert_eq!(cluster(&dests, Some(1)).len(), 2);
    }

    /// splitmix64 scaled into [0, 1)
    fn unit(seed: u64) -> f64 {
        let mut x = seed.wrapping_add(0x9e3779b97f4a7c15);
        x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
        x ^= x >> 31;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    #[test]
    fn test_every_priced_destination_lands_in_one_group() {
        let dests: Vec<_> = (0..300u64)
            .map(|i| {
                let price = if i % 7 == 0 { UNKNOWN_PRICE } else { 50.0 + unit(i * 3) * 900.0 };
                dest(
                    &format!("D{i:03}"),
                    -60.0 + unit(i * 3 + 1) * 120.0,
                    -180.0 + unit(i * 3 + 2) * 360.0,
                    price,
                    unit(i * 5),
                )
            })
            .collect();

        for zoom in 1..=10u8 {
            let groups = cluster(&dests, Some(zoom));
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for group in &groups {
                assert_eq!(group.values[0].destination_code, group.key.dest_airport_code);
                for v in &group.values {
                    *seen.entry(v.destination_code.as_str()).or_default() += 1;
                }
            }
            for d in &dests {
                let hits = seen.get(d.dest_airport_code.as_str()).copied().unwrap_or(0);
                let expected = if d.is_unpriced() { 0 } else { 1 };
                assert_eq!(hits, expected, "zoom {zoom}, {}", d.dest_airport_code);
            }
        }
    }

    #[test]
    fn test_group_count_never_drops_as_zoom_increases() {
        // Evenly spaced rows keep first-match grouping well behaved: each
        // group holds the run of points within one threshold of its key.
        let mut dests = Vec::new();
        for i in 0..40 {
            dests.push(dest(&format!("N{i:02}"), i as f64 * 0.7, 0.0, 100.0, 1.0));
            dests.push(dest(&format!("E{i:02}"), 0.0, 40.0 + i as f64 * 1.3, 100.0, 1.0));
        }

        let mut previous = 0;
        for zoom in 1..=10u8 {
            let count = cluster(&dests, Some(zoom)).len();
            assert!(count >= previous, "zoom {zoom}: {count} < {previous}");
            previous = count;
        }
        assert!(previous > cluster(&dests, Some(1)).len());
    }
}
