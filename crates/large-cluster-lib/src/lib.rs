//! Large Cluster Library - Viewport-Driven Point Clustering Presentation
//!
//! This library coordinates how very large point collections (hundreds of thousands of
//! items) are presented on a pannable, zoomable map. Points are aggregated into clusters
//! by a clustering engine, and the coordinator keeps the set of on-screen visuals in sync
//! with the latest clustering result as the viewport changes.
//!
//! # Architecture
//!
//! - **[`Point`]** / **[`PresentableItem`]**: Data model shared with the clustering engine
//! - **[`ClusteringEngine`]**: Collaborator trait; [`GridClusterer`] is the bundled implementation
//! - **[`VisualPool`]**: Recycles [`VisualElement`]s per [`ReuseClass`]
//! - **[`presentation`]**: Maps `(item, DisplayMode)` to a reuse class and visual content
//! - **[`Coordinator`]**: Reload orchestration, reconciliation and selection zoom
//!
//! # Concurrency
//!
//! Reclustering is the only long-running step. It is packaged as a [`ReclusterTask`] that
//! can run on any thread; its [`ReclusterOutcome`] is applied back on the interactive
//! thread, where outcomes older than the newest applied one are discarded.

mod config;
mod coordinator;
mod engine;
mod grid;
mod item;
mod point;
mod pool;
pub mod presentation;
mod region;
pub mod selection;
pub mod synthetic;
pub mod utils;

// Public API exports
pub use config::{ClusterConfig, ClusterPosition};
pub use coordinator::{
    Completion, Coordinator, ENTRANCE_DURATION, HostSurface, ReclusterOutcome, ReclusterTask,
    ReloadState,
};
pub use engine::{ClusterHooks, ClusteringEngine, NoHooks};
pub use grid::GridClusterer;
pub use item::{Cluster, ItemKey, PresentableItem};
pub use point::{Coordinate, Point, PointId};
pub use pool::{ElementId, PoolStats, VisualElement, VisualPool};
pub use presentation::{DisplayMode, ImageRef, ReuseClass, Tint, VisualContent};
pub use region::{BoundingBox, ViewportRegion};

/// Error types for the clustering library
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Invalid display mode index: {0}")]
    InvalidDisplayMode(usize),

    #[error("Recluster task failed: {0}")]
    ReclusterTask(String),

    #[error("Cluster has no members")]
    EmptyCluster,

    #[error("{0} is still displayed")]
    ElementDisplayed(ElementId),
}

pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(ClusterConfig) -> GridClusterer = GridClusterer::new;
        let _: fn() -> ClusterConfig = ClusterConfig::default;
        let _: fn() -> VisualPool = VisualPool::new;
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClusterError::InvalidDisplayMode(7).to_string(),
            "Invalid display mode index: 7"
        );
        assert_eq!(ClusterError::EmptyCluster.to_string(), "Cluster has no members");
    }
}
