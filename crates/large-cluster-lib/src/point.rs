//! Point storage types
//!
//! Points are immutable once created. Moving a point means removing it from the engine
//! and adding a replacement.

use crate::utils;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of process-unique point identities
static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

/// Geographic coordinate in WGS84 degrees
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Project into Web Mercator meters
    #[inline]
    pub fn to_mercator(self) -> geo::Point<f64> {
        utils::wgs84_to_mercator(self.latitude, self.longitude)
    }

    /// Inverse of [`Coordinate::to_mercator`]
    #[inline]
    pub fn from_mercator(point: geo::Point<f64>) -> Self {
        let (latitude, longitude) = utils::mercator_to_wgs84(point.x(), point.y());
        Self::new(latitude, longitude)
    }

    /// Bit pattern used for value comparison and hashing
    #[inline]
    pub(crate) fn bits(self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    /// `geo` stores longitude in `x` and latitude in `y`
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(coordinate: Coordinate) -> Self {
        geo::Coord {
            x: coordinate.longitude,
            y: coordinate.latitude,
        }
    }
}

/// Identity of a point, stable for the point's whole lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointId(u64);

impl PointId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        Self(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single data item on the map
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    id: PointId,
    coordinate: Coordinate,
    /// Opaque caller data carried alongside the point (e.g. a title)
    payload: Option<Arc<str>>,
}

impl Point {
    /// Create a point with a freshly allocated identity
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: PointId::next(),
            coordinate,
            payload: None,
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: impl Into<Arc<str>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    #[inline]
    pub fn id(&self) -> PointId {
        self.id
    }

    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[inline]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}
