//! Grid clustering engine
//!
//! Visible points are projected to Web Mercator and bucketed into square cells whose
//! size is fixed in screen points, so the on-screen density of clusters stays roughly
//! constant across zoom levels. A cell with enough members becomes one cluster; every
//! other point is shown on its own.

use crate::{
    Cluster, ClusterConfig, ClusterHooks, ClusterPosition, ClusteringEngine, Coordinate,
    NoHooks, Point, PresentableItem, ViewportRegion, utils,
};
use geo::Point as GeoPoint;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cell size in screen points for a zoom level
pub(crate) fn default_cell_size(zoom_level: f64) -> f64 {
    match zoom_level.floor() as i64 {
        13..=15 => 64.0,
        16..=17 => 32.0,
        z if z >= 18 => 16.0,
        _ => 88.0,
    }
}

/// Grid cell index (row, column) in Web Mercator space
type CellKey = (i64, i64);

/// Reference [`ClusteringEngine`] bucketing points into a screen-space grid
///
/// Points are stored as shared, immutable batches: cloning the engine only bumps
/// reference counts, so a clone is a cheap snapshot for a background recluster.
#[derive(Debug)]
pub struct GridClusterer<H: ClusterHooks = NoHooks> {
    /// Added batches, in insertion order
    batches: Vec<Arc<[Point]>>,
    len: usize,
    config: ClusterConfig,
    hooks: Arc<H>,
}

impl<H: ClusterHooks> Clone for GridClusterer<H> {
    fn clone(&self) -> Self {
        Self {
            batches: self.batches.clone(),
            len: self.len,
            config: self.config.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl GridClusterer {
    /// Create an empty engine with default hooks
    pub fn new(config: ClusterConfig) -> Self {
        Self::with_hooks(config, NoHooks)
    }
}

impl Default for GridClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<H: ClusterHooks> GridClusterer<H> {
    /// Create an empty engine with custom hooks
    pub fn with_hooks(config: ClusterConfig, hooks: H) -> Self {
        Self {
            batches: Vec::new(),
            len: 0,
            config: config.normalized(),
            hooks: Arc::new(hooks),
        }
    }

    /// All stored points, in insertion order
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.batches.iter().flat_map(|batch| batch.iter())
    }

    /// Cell side in Web Mercator meters at a zoom level
    fn cell_size_meters(&self, zoom_level: f64) -> f64 {
        let points = self
            .hooks
            .cell_size(zoom_level)
            .unwrap_or_else(|| default_cell_size(zoom_level));
        points * utils::meters_per_point(zoom_level)
    }

    /// Representative coordinate for the members of one cell
    fn cluster_coordinate(
        &self,
        cell: CellKey,
        cell_size: f64,
        members: &[(GeoPoint<f64>, &Point)],
    ) -> Coordinate {
        let (row, col) = cell;
        let cell_center = GeoPoint::new(
            (col as f64 + 0.5) * cell_size,
            (row as f64 + 0.5) * cell_size,
        );

        match self.config.cluster_position {
            ClusterPosition::Average => {
                let count = members.len() as f64;
                let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), (_, p)| {
                    let c = p.coordinate();
                    (lat + c.latitude, lon + c.longitude)
                });
                Coordinate::new(lat_sum / count, lon_sum / count)
            }
            ClusterPosition::Center => Coordinate::from_mercator(cell_center),
            ClusterPosition::NearCenter => {
                let distance = |m: &GeoPoint<f64>| {
                    let dx = m.x() - cell_center.x();
                    let dy = m.y() - cell_center.y();
                    dx * dx + dy * dy
                };
                members
                    .iter()
                    .min_by(|(a, _), (b, _)| distance(a).total_cmp(&distance(b)))
                    .map(|(_, p)| p.coordinate())
                    .unwrap_or_else(|| Coordinate::from_mercator(cell_center))
            }
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<H: ClusterHooks> ClusteringEngine for GridClusterer<H> {
    fn configure(&mut self, config: ClusterConfig) {
        self.config = config.normalized();
    }

    fn config(&self) -> &ClusterConfig {
        &self.config
    }

    fn add(&mut self, points: Vec<Point>) {
        if points.is_empty() {
            return;
        }
        self.len += points.len();
        self.batches.push(Arc::from(points));
    }

    fn remove_all(&mut self) {
        self.batches.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn recluster(&self, viewport: &ViewportRegion, zoom_level: f64) -> Vec<PresentableItem> {
        #[cfg(feature = "profiling")]
        profiling::scope!("grid::recluster");

        if self.len == 0 {
            return Vec::new();
        }

        let visible: Vec<&Point> = self
            .batches
            .par_iter()
            .flat_map(|batch| batch.par_iter())
            .filter(|p| viewport.contains(p.coordinate()))
            .collect();

        let cell_size = self.cell_size_meters(zoom_level);
        let clustering_enabled = zoom_level < self.config.max_zoom_level as f64
            && cell_size.is_finite()
            && cell_size > 0.0;

        if !clustering_enabled {
            return visible
                .into_iter()
                .map(|p| PresentableItem::Singleton(p.clone()))
                .collect();
        }

        // Projection is the expensive part; do it in parallel, bucket sequentially
        let projected: Vec<(CellKey, GeoPoint<f64>, &Point, bool)> = visible
            .par_iter()
            .map(|&p| {
                let m = p.coordinate().to_mercator();
                let cell = (
                    (m.y() / cell_size).floor() as i64,
                    (m.x() / cell_size).floor() as i64,
                );
                (cell, m, p, self.hooks.should_cluster(p))
            })
            .collect();

        let mut items = Vec::new();
        let mut cells: BTreeMap<CellKey, Vec<(GeoPoint<f64>, &Point)>> = BTreeMap::new();
        for (cell, mercator, point, clusterable) in projected {
            if clusterable {
                cells.entry(cell).or_default().push((mercator, point));
            } else {
                items.push(PresentableItem::Singleton(point.clone()));
            }
        }

        for (cell, mut members) in cells {
            if members.len() < self.config.min_count_for_clustering {
                items.extend(
                    members
                        .into_iter()
                        .map(|(_, p)| PresentableItem::Singleton(p.clone())),
                );
                continue;
            }

            members.sort_by_key(|(_, p)| p.id());
            let coordinate = self.cluster_coordinate(cell, cell_size, &members);
            let member_points = members.into_iter().map(|(_, p)| p.clone()).collect();
            // Cells in the map always hold at least one member
            if let Ok(cluster) = Cluster::new(coordinate, member_points) {
                items.push(PresentableItem::Cluster(cluster));
            }
        }

        tracing::trace!(
            "Reclustered {} visible of {} points into {} items at zoom {:.2}",
            visible.len(),
            self.len,
            items.len(),
            zoom_level
        );

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(lat: f64, lon: f64, delta: f64) -> ViewportRegion {
        ViewportRegion::new(Coordinate::new(lat, lon), delta, delta)
    }

    fn point(lat: f64, lon: f64) -> Point {
        Point::new(Coordinate::new(lat, lon))
    }

    /// Three points a few meters apart, well inside a single cell at zoom 10
    fn tight_group() -> Vec<Point> {
        vec![
            point(0.05, 0.05),
            point(0.0501, 0.0502),
            point(0.0499, 0.0503),
        ]
    }

    #[test]
    fn test_default_cell_size() {
        assert_eq!(default_cell_size(3.0), 88.0);
        assert_eq!(default_cell_size(13.5), 64.0);
        assert_eq!(default_cell_size(17.0), 32.0);
        assert_eq!(default_cell_size(21.0), 16.0);
    }

    #[test]
    fn test_empty_engine_returns_nothing() {
        let engine = GridClusterer::default();
        assert!(engine.recluster(&region(0.0, 0.0, 1.0), 10.0).is_empty());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_remove_all_is_idempotent() {
        let mut engine = GridClusterer::default();
        engine.remove_all();
        engine.add(tight_group());
        assert_eq!(engine.len(), 3);
        engine.remove_all();
        engine.remove_all();
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_group_becomes_one_cluster() {
        let mut engine = GridClusterer::new(ClusterConfig {
            min_count_for_clustering: 3,
            ..Default::default()
        });
        engine.add(tight_group());

        let items = engine.recluster(&region(0.05, 0.05, 0.1), 10.0);
        assert_eq!(items.len(), 1);
        match &items[0] {
            PresentableItem::Cluster(cluster) => assert_eq!(cluster.len(), 3),
            other => panic!("expected a cluster, got {other:?}"),
        }
    }

    #[test]
    fn test_below_min_count_stays_singletons() {
        let mut engine = GridClusterer::new(ClusterConfig {
            min_count_for_clustering: 4,
            ..Default::default()
        });
        engine.add(tight_group());

        let items = engine.recluster(&region(0.05, 0.05, 0.1), 10.0);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.is_cluster()));
    }

    #[test]
    fn test_max_zoom_disables_clustering() {
        let mut engine = GridClusterer::new(ClusterConfig {
            max_zoom_level: 11,
            min_count_for_clustering: 2,
            ..Default::default()
        });
        engine.add(tight_group());

        assert_eq!(engine.recluster(&region(0.05, 0.05, 0.1), 10.0).len(), 1);
        let items = engine.recluster(&region(0.05, 0.05, 0.1), 11.0);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.is_cluster()));
    }

    #[test]
    fn test_points_outside_viewport_are_skipped() {
        let mut engine = GridClusterer::default();
        engine.add(tight_group());
        engine.add(vec![point(40.0, 40.0)]);

        let items = engine.recluster(&region(40.0, 40.0, 0.1), 10.0);
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_cluster());
    }

    #[test]
    fn test_zero_span_viewport_is_not_an_error() {
        let mut engine = GridClusterer::default();
        engine.add(tight_group());
        assert!(engine.recluster(&region(10.0, 10.0, 0.0), 10.0).is_empty());

        let exact = engine.recluster(&region(0.05, 0.05, 0.0), 10.0);
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_cluster_position_policies() {
        let members = tight_group();

        let mut average = GridClusterer::new(ClusterConfig {
            cluster_position: ClusterPosition::Average,
            ..Default::default()
        });
        average.add(members.clone());
        let items = average.recluster(&region(0.05, 0.05, 0.1), 10.0);
        let coordinate = items[0].coordinate();
        assert!((coordinate.latitude - 0.05).abs() < 1e-9);
        assert!((coordinate.longitude - 0.050_166_666).abs() < 1e-6);

        let mut near = GridClusterer::new(ClusterConfig {
            cluster_position: ClusterPosition::NearCenter,
            ..Default::default()
        });
        near.add(members.clone());
        let items = near.recluster(&region(0.05, 0.05, 0.1), 10.0);
        let chosen = items[0].coordinate();
        assert!(members.iter().any(|p| p.coordinate() == chosen));

        let mut center = GridClusterer::new(ClusterConfig {
            cluster_position: ClusterPosition::Center,
            ..Default::default()
        });
        center.add(members.clone());
        let first = center.recluster(&region(0.05, 0.05, 0.1), 10.0)[0].coordinate();
        let second = center.recluster(&region(0.05, 0.05, 0.1), 10.0)[0].coordinate();
        assert_eq!(first, second);
        assert!(members.iter().all(|p| p.coordinate() != first));
    }

    #[test]
    fn test_members_ordered_by_id() {
        let mut engine = GridClusterer::default();
        let mut group = tight_group();
        group.reverse();
        engine.add(group);

        let items = engine.recluster(&region(0.05, 0.05, 0.1), 10.0);
        let PresentableItem::Cluster(cluster) = &items[0] else {
            panic!("expected a cluster");
        };
        let ids: Vec<_> = cluster.members().iter().map(Point::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    struct NeverCluster;

    impl ClusterHooks for NeverCluster {
        fn should_cluster(&self, _point: &Point) -> bool {
            false
        }
    }

    struct HugeCells;

    impl ClusterHooks for HugeCells {
        fn cell_size(&self, _zoom_level: f64) -> Option<f64> {
            Some(1.0e6)
        }
    }

    #[test]
    fn test_should_cluster_hook() {
        let mut engine = GridClusterer::with_hooks(ClusterConfig::default(), NeverCluster);
        engine.add(tight_group());
        let items = engine.recluster(&region(0.05, 0.05, 0.1), 10.0);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_cell_size_hook() {
        let mut engine = GridClusterer::with_hooks(ClusterConfig::default(), HugeCells);
        engine.add(vec![point(0.01, 0.01), point(0.09, 0.09)]);
        let items = engine.recluster(&region(0.05, 0.05, 0.1), 15.0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].point_count(), 2);
    }

    #[test]
    fn test_configure_applies_to_next_call() {
        let mut engine = GridClusterer::default();
        engine.add(tight_group());
        assert_eq!(engine.recluster(&region(0.05, 0.05, 0.1), 10.0).len(), 1);

        engine.configure(ClusterConfig {
            max_zoom_level: 5,
            ..Default::default()
        });
        assert_eq!(engine.config().max_zoom_level, 5);
        assert_eq!(engine.recluster(&region(0.05, 0.05, 0.1), 10.0).len(), 3);
    }

    #[test]
    fn test_clone_is_an_independent_snapshot() {
        let mut engine = GridClusterer::default();
        engine.add(tight_group());
        let snapshot = engine.clone();

        engine.add(vec![point(0.06, 0.06)]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(engine.len(), 4);
        assert_eq!(engine.points().count(), 4);

        engine.remove_all();
        let items = snapshot.recluster(&region(0.05, 0.05, 0.1), 19.0);
        assert_eq!(items.len(), 3);
    }
}
