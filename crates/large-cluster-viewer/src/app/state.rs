//! Application state management
//!
//! This module owns the coordinator and the dataset, and turns map feedback into
//! coordinator calls.

use crate::app::host::MapHost;
use crate::app::settings::Settings;
use large_cluster_lib::synthetic::uniform_points;
use large_cluster_lib::{
    ClusteringEngine, Completion, Coordinator, DisplayMode, GridClusterer, PresentableItem,
    ReloadState, ViewportRegion, utils,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long the view must stay still before it counts as settled
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Main application state
pub struct AppState {
    pub coordinator: Coordinator<GridClusterer, MapHost>,

    /// Current UI settings
    pub ui_settings: UiSettings,

    /// Detects when the user stops moving the map
    pub settle: SettleTracker,

    /// Statistics about the data and the last reload
    pub stats: Arc<Mutex<Stats>>,

    /// Area random points are generated in
    data_region: ViewportRegion,

    /// Points per "Add" batch
    batch_size: usize,

    rng: StdRng,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone)]
pub struct UiSettings {
    /// Whether sidebar is open
    pub sidebar_open: bool,

    /// Display mode selected in the sidebar
    pub display_mode: DisplayMode,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            display_mode: DisplayMode::default(),
        }
    }
}

/// Statistics shown in the sidebar
#[derive(Clone, Debug, Default)]
pub struct Stats {
    pub total_points: usize,
    pub reloads_applied: usize,
    pub last_reload_changed: bool,
}

impl Stats {
    /// Format point count with thousands separators
    pub fn format_points(&self) -> String {
        utils::format_count(self.total_points)
    }
}

/// Reports a viewport once it has stopped changing for [`SETTLE_DELAY`]
#[derive(Debug, Default)]
pub struct SettleTracker {
    /// Last observed view and when it was first seen
    observed: Option<(ViewportRegion, f64, instant::Instant)>,
    /// Last view reported as settled
    reported: Option<(ViewportRegion, f64)>,
}

impl SettleTracker {
    /// Feed the view of the current frame; returns it once it has settled
    pub fn observe(
        &mut self,
        viewport: ViewportRegion,
        zoom_level: f64,
        now: instant::Instant,
    ) -> Option<(ViewportRegion, f64)> {
        match self.observed {
            Some((v, z, _)) if v == viewport && z == zoom_level => {}
            _ => {
                self.observed = Some((viewport, zoom_level, now));
                return None;
            }
        }

        let (_, _, since) = self.observed?;
        let current = (viewport, zoom_level);
        if now.saturating_duration_since(since) < SETTLE_DELAY || self.reported == Some(current) {
            return None;
        }
        self.reported = Some(current);
        Some(current)
    }

    /// Whether the view is still waiting to be reported
    pub fn is_pending(&self) -> bool {
        match self.observed {
            Some((v, z, _)) => self.reported != Some((v, z)),
            None => false,
        }
    }
}

impl AppState {
    /// Create the state and load the initial dataset
    pub fn new(settings: &Settings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let engine = GridClusterer::new(settings.cluster_config());
        let mut coordinator = Coordinator::new(engine, MapHost::default());
        coordinator.set_display_mode(settings.mode);

        let mut state = Self {
            coordinator,
            ui_settings: UiSettings {
                display_mode: settings.mode,
                ..Default::default()
            },
            settle: SettleTracker::default(),
            stats: Arc::new(Mutex::new(Stats::default())),
            data_region: settings.data_region(),
            batch_size: settings.points,
            rng,
        };
        state.add_batch();
        state
    }

    /// Map region that frames the dataset
    pub fn data_region(&self) -> ViewportRegion {
        self.data_region
    }

    /// Add another batch of random points
    pub fn add_batch(&mut self) {
        profiling::scope!("add_batch");

        let points = uniform_points(self.batch_size, &self.data_region, &mut self.rng);
        let callback = self.completion();
        if let Some(task) = self.coordinator.add_points(points, Some(callback)) {
            self.coordinator.spawn(task);
        }
        self.update_stats();
    }

    /// Remove every point
    pub fn remove_all(&mut self) {
        let callback = self.completion();
        if let Some(task) = self.coordinator.remove_all(Some(callback)) {
            self.coordinator.spawn(task);
        }
        self.update_stats();
    }

    /// Switch display mode and reload the dataset
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode == self.coordinator.display_mode() {
            return;
        }
        self.coordinator.set_display_mode(mode);
        self.ui_settings.display_mode = mode;

        let count = self.stats.lock().map(|s| s.total_points).unwrap_or_default();
        self.remove_all();
        if count > 0 {
            self.add_batch_of(count);
        }
    }

    fn add_batch_of(&mut self, count: usize) {
        let batch = std::mem::replace(&mut self.batch_size, count);
        self.add_batch();
        self.batch_size = batch;
    }

    /// Report the map's current view
    pub fn observe_viewport(&mut self, viewport: ViewportRegion, zoom_level: f64) {
        let now = instant::Instant::now();
        if let Some((viewport, zoom_level)) = self.settle.observe(viewport, zoom_level, now) {
            tracing::debug!(
                "Viewport settled at ({:.4}, {:.4}), zoom {:.2}",
                viewport.center().latitude,
                viewport.center().longitude,
                zoom_level
            );
            let task = self.coordinator.on_viewport_settled(viewport, zoom_level);
            self.coordinator.spawn(task);
        }
    }

    /// Handle a click on a displayed item
    pub fn select(&mut self, item: &PresentableItem) {
        if self.coordinator.on_item_selected(item).is_none() {
            tracing::debug!("Selected a single point at {:?}", item.coordinate());
        }
    }

    /// Per-frame upkeep; returns whether another frame is needed soon
    pub fn tick(&mut self) -> bool {
        self.coordinator.poll_completions();
        self.coordinator.host_mut().prune_fades();
        self.coordinator.state() != ReloadState::Idle
            || self.coordinator.host().is_animating()
            || self.settle.is_pending()
    }

    fn update_stats(&mut self) {
        let total = self.coordinator.engine().len();
        if let Ok(mut stats) = self.stats.lock() {
            stats.total_points = total;
        }
    }

    /// Callback recording a finished reload into the statistics
    fn completion(&self) -> Completion {
        let stats = self.stats.clone();
        Box::new(move |changed| {
            if let Ok(mut stats) = stats.lock() {
                stats.reloads_applied += 1;
                stats.last_reload_changed = changed;
            }
        })
    }
}
