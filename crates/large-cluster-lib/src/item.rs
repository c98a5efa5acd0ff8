//! Items produced by a recluster pass
//!
//! Items carry no identity across passes. [`ItemKey`] gives each item a value-based key
//! so consecutive results can be diffed.

use crate::{ClusterError, Coordinate, Point, PointId, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A group of nearby points shown as one visual
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    coordinate: Coordinate,
    members: Vec<Point>,
}

impl Cluster {
    /// Create a cluster; `members` must not be empty
    pub fn new(coordinate: Coordinate, members: Vec<Point>) -> Result<Self> {
        if members.is_empty() {
            return Err(ClusterError::EmptyCluster);
        }
        Ok(Self {
            coordinate,
            members,
        })
    }

    /// Representative position of the cluster
    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[inline]
    pub fn members(&self) -> &[Point] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result entry of a recluster pass
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PresentableItem {
    Singleton(Point),
    Cluster(Cluster),
}

impl PresentableItem {
    /// Position at which the item's visual is drawn
    pub fn coordinate(&self) -> Coordinate {
        match self {
            PresentableItem::Singleton(point) => point.coordinate(),
            PresentableItem::Cluster(cluster) => cluster.coordinate(),
        }
    }

    /// Number of underlying points
    pub fn point_count(&self) -> usize {
        match self {
            PresentableItem::Singleton(_) => 1,
            PresentableItem::Cluster(cluster) => cluster.len(),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, PresentableItem::Cluster(_))
    }

    /// Value key used to diff consecutive results
    pub fn key(&self) -> ItemKey {
        match self {
            PresentableItem::Singleton(point) => ItemKey::Singleton {
                id: point.id(),
                position: point.coordinate().bits(),
            },
            PresentableItem::Cluster(cluster) => ItemKey::Cluster {
                position: cluster.coordinate().bits(),
                members: cluster.members().iter().map(Point::id).collect(),
            },
        }
    }
}

/// Value identity of a [`PresentableItem`]
///
/// Two items from different passes share a key when they draw the same thing at the same
/// place: the same point, or a cluster with the same position and membership.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Singleton {
        id: PointId,
        position: (u64, u64),
    },
    Cluster {
        position: (u64, u64),
        members: Vec<PointId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(Coordinate::new(lat, lon))
    }

    #[test]
    fn test_empty_cluster_rejected() {
        let result = Cluster::new(Coordinate::default(), Vec::new());
        assert!(matches!(result, Err(ClusterError::EmptyCluster)));
    }

    #[test]
    fn test_point_count() {
        let members = vec![point(0.0, 0.0), point(0.1, 0.1)];
        let cluster = Cluster::new(Coordinate::new(0.05, 0.05), members).unwrap();
        let item = PresentableItem::Cluster(cluster);
        assert_eq!(item.point_count(), 2);
        assert!(item.is_cluster());
        assert_eq!(PresentableItem::Singleton(point(1.0, 1.0)).point_count(), 1);
    }

    #[test]
    fn test_keys_compare_by_value() {
        let a = point(1.0, 2.0);
        let b = point(1.0, 2.0);
        let members = vec![a.clone(), b.clone()];

        let first = PresentableItem::Cluster(
            Cluster::new(Coordinate::new(1.0, 2.0), members.clone()).unwrap(),
        );
        let second =
            PresentableItem::Cluster(Cluster::new(Coordinate::new(1.0, 2.0), members).unwrap());
        assert_eq!(first.key(), second.key());

        // Same place, different membership
        let third =
            PresentableItem::Cluster(Cluster::new(Coordinate::new(1.0, 2.0), vec![a]).unwrap());
        assert_ne!(first.key(), third.key());

        // A singleton never shares a key with a cluster
        assert_ne!(PresentableItem::Singleton(b).key(), first.key());
    }
}
