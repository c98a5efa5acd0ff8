//! Clustering engine configuration

use crate::utils::MAX_ZOOM_LEVEL;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a cluster's representative coordinate is placed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterPosition {
    /// Mean of the member coordinates
    Average,
    /// Center of the grid cell the members fall into
    Center,
    /// Coordinate of the member closest to the cell center
    #[default]
    NearCenter,
}

impl ClusterPosition {
    pub fn all() -> &'static [Self] {
        &[Self::Average, Self::Center, Self::NearCenter]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Center => "center",
            Self::NearCenter => "near-center",
        }
    }
}

/// Configuration for a clustering engine
///
/// Changes apply to the next recluster call. Out-of-range values are clamped by
/// [`ClusterConfig::normalized`] instead of being rejected.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterConfig {
    /// At or above this zoom level every point is shown on its own.
    /// Default: 20
    pub max_zoom_level: u32,
    /// Minimum number of points in a cell before they are merged into a cluster.
    /// Values below 2 are raised to 2: a lone point is never a cluster.
    /// Default: 2
    pub min_count_for_clustering: usize,
    /// Placement policy for cluster coordinates
    pub cluster_position: ClusterPosition,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_zoom_level: 20,
            min_count_for_clustering: 2,
            cluster_position: ClusterPosition::NearCenter,
        }
    }
}

impl ClusterConfig {
    /// Copy of this configuration with every field in its usable range
    pub fn normalized(&self) -> Self {
        Self {
            max_zoom_level: self.max_zoom_level.min(MAX_ZOOM_LEVEL),
            min_count_for_clustering: self.min_count_for_clustering.max(2),
            cluster_position: self.cluster_position,
        }
    }
}
