//! Viewport regions and bounding boxes in geographic coordinates
//!
//! Both types work directly in latitude/longitude degrees so that framing a set of
//! points is exact: no projection round trip is involved.

use crate::Coordinate;
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Visible map area: a center plus an angular span
///
/// The edges are stored alongside the span, so a region built from a bounding box
/// reports exactly that box's edges.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewportRegion {
    center: Coordinate,
    latitude_delta: f64,
    longitude_delta: f64,
    /// Edges (x = longitude, y = latitude)
    bounds: Rect<f64>,
}

impl ViewportRegion {
    /// Create a region; negative or non-finite deltas are normalized to non-negative values
    pub fn new(center: Coordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        let latitude_delta = sanitize_delta(latitude_delta);
        let longitude_delta = sanitize_delta(longitude_delta);
        let bounds = Rect::new(
            Coord {
                x: center.longitude - longitude_delta / 2.0,
                y: center.latitude - latitude_delta / 2.0,
            },
            Coord {
                x: center.longitude + longitude_delta / 2.0,
                y: center.latitude + latitude_delta / 2.0,
            },
        );
        Self {
            center,
            latitude_delta,
            longitude_delta,
            bounds,
        }
    }

    /// Region covering exactly the given bounding box
    pub fn from_bounds(bounds: &BoundingBox) -> Self {
        let rect = bounds.rect();
        let center = rect.center();
        Self {
            center: Coordinate::new(center.y, center.x),
            latitude_delta: rect.height(),
            longitude_delta: rect.width(),
            bounds: rect,
        }
    }

    #[inline]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[inline]
    pub fn latitude_delta(&self) -> f64 {
        self.latitude_delta
    }

    #[inline]
    pub fn longitude_delta(&self) -> f64 {
        self.longitude_delta
    }

    #[inline]
    pub fn min_latitude(&self) -> f64 {
        self.bounds.min().y
    }

    #[inline]
    pub fn max_latitude(&self) -> f64 {
        self.bounds.max().y
    }

    #[inline]
    pub fn min_longitude(&self) -> f64 {
        self.bounds.min().x
    }

    #[inline]
    pub fn max_longitude(&self) -> f64 {
        self.bounds.max().x
    }

    /// True when the span has no area
    pub fn is_degenerate(&self) -> bool {
        self.latitude_delta == 0.0 || self.longitude_delta == 0.0
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.latitude >= self.min_latitude()
            && coordinate.latitude <= self.max_latitude()
            && coordinate.longitude >= self.min_longitude()
            && coordinate.longitude <= self.max_longitude()
    }

    /// The region as a `geo` rectangle (x = longitude, y = latitude)
    #[inline]
    pub fn to_rect(&self) -> Rect<f64> {
        self.bounds
    }
}

fn sanitize_delta(delta: f64) -> f64 {
    if delta.is_finite() { delta.abs() } else { 0.0 }
}

/// Axis-aligned box grown by unioning coordinates
///
/// A box built from one coordinate has zero area and is still valid.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    /// Zero-size box at a single coordinate
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        let coord: Coord<f64> = coordinate.into();
        Self {
            rect: Rect::new(coord, coord),
        }
    }

    /// Smallest box containing both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min_x = self.rect.min().x.min(other.rect.min().x);
        let min_y = self.rect.min().y.min(other.rect.min().y);
        let max_x = self.rect.max().x.max(other.rect.max().x);
        let max_y = self.rect.max().y.max(other.rect.max().y);
        BoundingBox {
            rect: Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }),
        }
    }

    /// Box enclosing every coordinate, or `None` for an empty iterator
    pub fn enclosing<I>(coordinates: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        coordinates
            .into_iter()
            .map(BoundingBox::from_coordinate)
            .reduce(|acc, next| acc.union(&next))
    }

    #[inline]
    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }

    pub fn min_latitude(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_latitude(&self) -> f64 {
        self.rect.max().y
    }

    pub fn min_longitude(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_longitude(&self) -> f64 {
        self.rect.max().x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_deltas_are_normalized() {
        let region = ViewportRegion::new(Coordinate::new(10.0, 20.0), -2.0, f64::NAN);
        assert_eq!(region.latitude_delta(), 2.0);
        assert_eq!(region.longitude_delta(), 0.0);
        assert!(region.is_degenerate());
    }

    #[test]
    fn test_region_edges_and_contains() {
        let region = ViewportRegion::new(Coordinate::new(0.0, 0.0), 2.0, 4.0);
        assert_eq!(region.min_latitude(), -1.0);
        assert_eq!(region.max_latitude(), 1.0);
        assert_eq!(region.min_longitude(), -2.0);
        assert_eq!(region.max_longitude(), 2.0);
        assert!(region.contains(Coordinate::new(1.0, -2.0)));
        assert!(!region.contains(Coordinate::new(1.5, 0.0)));
    }

    #[test]
    fn test_zero_span_region_contains_its_center() {
        let center = Coordinate::new(37.78, -122.4);
        let region = ViewportRegion::new(center, 0.0, 0.0);
        assert!(region.contains(center));
        assert!(!region.contains(Coordinate::new(37.79, -122.4)));
    }

    #[test]
    fn test_single_coordinate_box_is_zero_area() {
        let bbox = BoundingBox::from_coordinate(Coordinate::new(5.0, 6.0));
        assert_eq!(bbox.rect().width(), 0.0);
        assert_eq!(bbox.rect().height(), 0.0);

        let region = ViewportRegion::from_bounds(&bbox);
        assert_eq!(region.center(), Coordinate::new(5.0, 6.0));
        assert!(region.is_degenerate());
    }

    #[test]
    fn test_enclosing() {
        assert!(BoundingBox::enclosing(Vec::new()).is_none());

        let bbox = BoundingBox::enclosing([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(-1.0, 2.0),
        ])
        .unwrap();
        assert_eq!(bbox.min_latitude(), -1.0);
        assert_eq!(bbox.max_latitude(), 1.0);
        assert_eq!(bbox.min_longitude(), 0.0);
        assert_eq!(bbox.max_longitude(), 2.0);
    }

    #[test]
    fn test_union_is_commutative() {
        let a = BoundingBox::from_coordinate(Coordinate::new(-3.0, 7.0));
        let b = BoundingBox::from_coordinate(Coordinate::new(4.0, -1.0));
        assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn test_region_from_bounds_frames_box_exactly() {
        let bbox = BoundingBox::enclosing([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(-1.0, 2.0),
        ])
        .unwrap();
        let region = ViewportRegion::from_bounds(&bbox);
        assert_eq!(region.min_latitude(), -1.0);
        assert_eq!(region.max_latitude(), 1.0);
        assert_eq!(region.min_longitude(), 0.0);
        assert_eq!(region.max_longitude(), 2.0);
        assert_eq!(region.to_rect(), bbox.rect());
    }

    #[test]
    fn test_region_from_bounds_keeps_inexact_edges() {
        // None of these are exactly representable, so center +- half span would drift
        let pairs = [
            ((0.049, 0.049), (0.051, 0.052)),
            ((37.7431, -122.4601), (37.8329, -122.3555)),
            ((0.1, 0.3), (0.7, 0.9)),
            ((1e-9, -3.3), (3.3, 1e-9)),
        ];
        for (a, b) in pairs {
            let corners = [Coordinate::new(a.0, a.1), Coordinate::new(b.0, b.1)];
            let bbox = BoundingBox::enclosing(corners).unwrap();
            let region = ViewportRegion::from_bounds(&bbox);
            assert_eq!(region.min_latitude(), a.0.min(b.0));
            assert_eq!(region.max_latitude(), a.0.max(b.0));
            assert_eq!(region.min_longitude(), a.1.min(b.1));
            assert_eq!(region.max_longitude(), a.1.max(b.1));
            assert_eq!(region.to_rect(), bbox.rect());
            assert!(region.contains(Coordinate::new(a.0, a.1)));
            assert!(region.contains(Coordinate::new(b.0, b.1)));
        }
    }
}
