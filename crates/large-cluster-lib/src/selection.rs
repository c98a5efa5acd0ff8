//! Framing a selected cluster
//!
//! Selecting a cluster zooms the map to the smallest region holding all of its members.

use crate::{BoundingBox, Cluster, PresentableItem, ViewportRegion};

/// Bounding box of a cluster's members
///
/// Built by unioning each member's zero-size box in order. A one-member cluster
/// yields a zero-area box.
pub fn bounding_box(cluster: &Cluster) -> BoundingBox {
    let mut zoom_box: Option<BoundingBox> = None;
    for member in cluster.members() {
        let point_box = BoundingBox::from_coordinate(member.coordinate());
        zoom_box = Some(match zoom_box {
            Some(current) => current.union(&point_box),
            None => point_box,
        });
    }
    zoom_box.unwrap_or_else(|| BoundingBox::from_coordinate(cluster.coordinate()))
}

/// Region to show after selecting `item`, or `None` when selection does not zoom
pub fn zoom_region(item: &PresentableItem) -> Option<ViewportRegion> {
    match item {
        PresentableItem::Singleton(_) => None,
        PresentableItem::Cluster(cluster) => {
            Some(ViewportRegion::from_bounds(&bounding_box(cluster)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, Point};

    fn cluster(coordinates: &[(f64, f64)]) -> Cluster {
        let members = coordinates
            .iter()
            .map(|&(lat, lon)| Point::new(Coordinate::new(lat, lon)))
            .collect();
        Cluster::new(Coordinate::new(0.0, 0.0), members).unwrap()
    }

    #[test]
    fn test_bounding_box_spans_members_exactly() {
        let cluster = cluster(&[(0.0, 0.0), (1.0, 1.0), (-1.0, 2.0)]);
        let region = zoom_region(&PresentableItem::Cluster(cluster)).unwrap();

        assert_eq!(region.min_latitude(), -1.0);
        assert_eq!(region.max_latitude(), 1.0);
        assert_eq!(region.min_longitude(), 0.0);
        assert_eq!(region.max_longitude(), 2.0);
        assert_eq!(region.latitude_delta(), 2.0);
        assert_eq!(region.longitude_delta(), 2.0);
    }

    #[test]
    fn test_single_member_cluster_gives_zero_area() {
        let cluster = cluster(&[(37.787994, -122.407437)]);
        let bbox = bounding_box(&cluster);
        assert_eq!(bbox.min_latitude(), bbox.max_latitude());
        assert_eq!(bbox.min_longitude(), bbox.max_longitude());

        let region = zoom_region(&PresentableItem::Cluster(cluster)).unwrap();
        assert_eq!(region.center(), Coordinate::new(37.787994, -122.407437));
        assert_eq!(region.latitude_delta(), 0.0);
    }

    #[test]
    fn test_singleton_does_not_zoom() {
        let item = PresentableItem::Singleton(Point::new(Coordinate::new(1.0, 1.0)));
        assert!(zoom_region(&item).is_none());
    }

    #[test]
    fn test_box_ignores_representative_coordinate() {
        // The representative sits far away; only members count
        let members = vec![
            Point::new(Coordinate::new(10.0, 10.0)),
            Point::new(Coordinate::new(11.0, 12.0)),
        ];
        let cluster = Cluster::new(Coordinate::new(-50.0, -50.0), members).unwrap();
        let bbox = bounding_box(&cluster);
        assert_eq!(bbox.min_latitude(), 10.0);
        assert_eq!(bbox.max_longitude(), 12.0);
    }

    #[test]
    fn test_zoom_region_matches_members_exactly() {
        let cluster = cluster(&[(37.7431, -122.4601), (37.8329, -122.3555), (37.79, -122.41)]);
        let region = zoom_region(&PresentableItem::Cluster(cluster)).unwrap();

        assert_eq!(region.min_latitude(), 37.7431);
        assert_eq!(region.max_latitude(), 37.8329);
        assert_eq!(region.min_longitude(), -122.4601);
        assert_eq!(region.max_longitude(), -122.3555);
    }
}
