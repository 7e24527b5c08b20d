use std::cmp::Ordering;

use super::cluster::cluster_priced;
use super::{format_price, Destination, DestinationSummary};
use crate::geo::LatLng;

/// What the map draws at a marker position
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// Interactive price label carrying every summary of its cluster
    FullLabel { values: Vec<DestinationSummary> },
    /// Priced cluster past the label budget
    MinimalPin,
    /// Destination whose price is not known yet
    DisabledPin,
    /// The departure airport
    OriginPin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderMarker {
    pub position: LatLng,
    pub kind: MarkerKind,
}

impl RenderMarker {
    pub fn origin(position: LatLng) -> Self {
        Self {
            position,
            kind: MarkerKind::OriginPin,
        }
    }

    /// Text shown next to a full label, e.g. `Nadi $412 +2`
    pub fn label(&self) -> Option<String> {
        let MarkerKind::FullLabel { values } = &self.kind else {
            return None;
        };
        let head = values.first()?;
        let mut text = format!("{} {}", head.destination, format_price(head.price));
        if values.len() > 1 {
            text.push_str(&format!(" +{}", values.len() - 1));
        }
        Some(text)
    }
}

/// Rank position of each destination, highest `personal_priority_idx`
/// first. Equal priorities keep their input order. `result[i]` is the
/// position of `priced[i]`.
pub fn rank(priced: &[&Destination]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..priced.len()).collect();
    order.sort_by(|&a, &b| {
        let pa = priced[a].personal_priority_idx.unwrap_or(f64::NEG_INFINITY);
        let pb = priced[b].personal_priority_idx.unwrap_or(f64::NEG_INFINITY);
        pb.partial_cmp(&pa).unwrap_or(Ordering::Equal)
    });

    let mut positions = vec![0; priced.len()];
    for (position, idx) in order.into_iter().enumerate() {
        positions[idx] = position;
    }
    positions
}

/// Turn a fetch result into the markers the map should draw.
///
/// Priced destinations are clustered at `zoom`. Every priced destination is
/// ranked, and a cluster gets a full label when its key ranks within the
/// first `max_labeled`; otherwise it gets a minimal pin. A member that
/// outranks its key still takes a rank slot. Clusters whose key is missing
/// display fields are dropped. Unpriced destinations follow as disabled pins.
pub fn layout(destinations: &[Destination], zoom: Option<u8>, max_labeled: usize) -> Vec<RenderMarker> {
    let priced: Vec<&Destination> = destinations.iter().filter(|d| !d.is_unpriced()).collect();
    let positions = rank(&priced);

    let groups: Vec<_> = cluster_priced(&priced, zoom)
        .into_iter()
        .filter(|(_, g)| g.key.is_renderable())
        .map(|(anchor, g)| (g, positions[anchor]))
        .collect();

    let mut markers = Vec::with_capacity(destinations.len());
    for (group, position) in &groups {
        let Some(at) = group.key.position() else {
            continue;
        };
        let kind = if *position < max_labeled {
            MarkerKind::FullLabel {
                values: group.values.clone(),
            }
        } else {
            MarkerKind::MinimalPin
        };
        markers.push(RenderMarker { position: at, kind });
    }

    markers.extend(
        destinations
            .iter()
            .filter(|d| d.is_unpriced())
            .filter_map(|d| d.position())
            .map(|position| RenderMarker {
                position,
                kind: MarkerKind::DisabledPin,
            }),
    );

    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::tests::dest;
    use crate::destinations::UNKNOWN_PRICE;

    fn labeled_codes(markers: &[RenderMarker]) -> Vec<String> {
        let mut codes: Vec<String> = markers
            .iter()
            .filter_map(|m| match &m.kind {
                MarkerKind::FullLabel { values } => Some(values[0].destination_code.clone()),
                _ => None,
            })
            .collect();
        codes.sort();
        codes
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let a = dest("AAA", 0.0, 0.0, 1.0, 2.0);
        let b = dest("BBB", 0.0, 0.0, 1.0, 5.0);
        let c = dest("CCC", 0.0, 0.0, 1.0, 2.0);
        let d = dest("DDD", 0.0, 0.0, 1.0, 9.0);
        assert_eq!(rank(&[&a, &b, &c, &d]), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_budget_limits_full_labels() {
        // spread out so nothing clusters at zoom 10
        let dests: Vec<_> = (0..6)
            .map(|i| dest(&format!("P{i}"), 0.0, i as f64 * 10.0, 100.0, i as f64))
            .collect();
        let markers = layout(&dests, Some(10), 3);
        assert_eq!(markers.len(), 6);
        assert_eq!(labeled_codes(&markers), ["P3", "P4", "P5"]);
        let pins = markers.iter().filter(|m| m.kind == MarkerKind::MinimalPin).count();
        assert_eq!(pins, 3);
    }

    #[test]
    fn test_cluster_label_carries_all_members() {
        let dests = vec![dest("AAA", 10.0, 20.0, 100.0, 1.0), dest("BBB", 10.1, 20.1, 90.0, 2.0)];
        let markers = layout(&dests, Some(4), 5);
        assert_eq!(markers.len(), 1);
        match &markers[0].kind {
            MarkerKind::FullLabel { values } => assert_eq!(values.len(), 2),
            other => panic!("expected label, got {other:?}"),
        }
        assert_eq!(markers[0].label().as_deref(), Some("AAA City $100 +1"));
    }

    #[test]
    fn test_unpriced_is_always_disabled_pin() {
        let dests = vec![
            dest("ZZZ", 1.0, 1.0, UNKNOWN_PRICE, 100.0),
            dest("AAA", 1.0, 1.0, 50.0, 1.0),
        ];
        let markers = layout(&dests, Some(3), 10);
        assert_eq!(markers.len(), 2);
        assert!(matches!(markers[0].kind, MarkerKind::FullLabel { .. }));
        assert_eq!(markers[1].kind, MarkerKind::DisabledPin);
        assert_eq!(markers[1].position, LatLng::new(1.0, 1.0));
    }

    #[test]
    fn test_unrenderable_keys_are_dropped() {
        let mut nameless = dest("NNN", 0.0, 0.0, 10.0, 99.0);
        nameless.city_name = None;
        let mut no_priority = dest("QQQ", 0.0, 50.0, 10.0, 1.0);
        no_priority.personal_priority_idx = None;
        let dests = vec![nameless, no_priority, dest("OK1", 0.0, 100.0, 10.0, 1.0)];
        // the nameless key is not drawn but still holds the first rank slot
        assert!(layout(&dests, Some(5), 1).iter().all(|m| m.kind == MarkerKind::MinimalPin));
        let markers = layout(&dests, Some(5), 2);
        assert_eq!(markers.len(), 1);
        assert_eq!(labeled_codes(&markers), ["OK1"]);
    }

    #[test]
    fn test_member_outranking_its_key_uses_a_slot() {
        let dests = vec![
            dest("AAA", 0.0, 0.0, 10.0, 1.0),
            dest("BBB", 0.1, 0.1, 10.0, 5.0),
            dest("CCC", 0.0, 100.0, 10.0, 2.0),
        ];
        // BBB joins AAA's cluster, yet ranks first among all priced destinations
        let markers = layout(&dests, Some(4), 1);
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.kind == MarkerKind::MinimalPin));

        let markers = layout(&dests, Some(4), 2);
        assert_eq!(labeled_codes(&markers), ["CCC"]);
        let markers = layout(&dests, Some(4), 3);
        assert_eq!(labeled_codes(&markers), ["AAA", "CCC"]);
    }

    #[test]
    fn test_equal_priorities_within_budget_ignore_order() {
        let mut dests: Vec<_> = (0..4)
            .map(|i| dest(&format!("E{i}"), 0.0, i as f64 * 30.0, 10.0, 1.0))
            .collect();
        dests.push(dest("TOP", 0.0, 150.0, 10.0, 7.0));
        dests.push(dest("LOW", 0.0, 170.0, 10.0, 0.5));

        let forward = labeled_codes(&layout(&dests, Some(6), 5));
        dests[..4].reverse();
        let reversed = labeled_codes(&layout(&dests, Some(6), 5));
        assert_eq!(forward, reversed);
        assert!(!forward.contains(&"LOW".to_string()));
    }
}
