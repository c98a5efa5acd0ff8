//! Clustering engine contract
//!
//! The coordinator only talks to an engine through [`ClusteringEngine`]. Engines own the
//! full point set. A background recluster runs on a clone of the engine, so mutations on
//! the interactive thread never wait for it; clones should be cheap snapshots.

use crate::{ClusterConfig, Point, PresentableItem, ViewportRegion};

/// Source of clustered items for a viewport
pub trait ClusteringEngine: Clone + Send + Sync {
    /// Replace the configuration; applies from the next [`ClusteringEngine::recluster`]
    fn configure(&mut self, config: ClusterConfig);

    fn config(&self) -> &ClusterConfig;

    /// Bulk insert
    fn add(&mut self, points: Vec<Point>);

    /// Bulk clear; a no-op on an empty engine
    fn remove_all(&mut self);

    /// Number of stored points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items visible in `viewport` at `zoom_level`
    ///
    /// Never fails: an empty engine, a zero-span viewport or a viewport without points
    /// all produce an empty (or degenerate) result.
    fn recluster(&self, viewport: &ViewportRegion, zoom_level: f64) -> Vec<PresentableItem>;
}

/// Optional customization points an engine consults while clustering
///
/// Every method has a default, so implementors override only what they need.
pub trait ClusterHooks: Send + Sync {
    /// Cell size in screen points for a zoom level, or `None` for the engine default
    fn cell_size(&self, _zoom_level: f64) -> Option<f64> {
        None
    }

    /// Whether a point may be merged into a cluster; `false` keeps it a singleton
    fn should_cluster(&self, _point: &Point) -> bool {
        true
    }
}

/// Hooks that keep every default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ClusterHooks for NoHooks {}
