//! Reload orchestration
//!
//! The [`Coordinator`] owns the set of displayed visuals and keeps it in sync with the
//! clustering engine. Every reload is tagged with a sequence number; the clustering
//! itself runs as a [`ReclusterTask`] that may execute on any thread, and its
//! [`ReclusterOutcome`] is applied back on the interactive thread. An outcome older than
//! the newest applied one is discarded, so a slow stale result can never overwrite a
//! fresher display.
//!
//! # Example
//! ```
//! use large_cluster_lib::*;
//! # struct Host;
//! # impl HostSurface for Host {
//! #     fn display_element(&mut self, _: &VisualElement) {}
//! #     fn remove_element(&mut self, _: ElementId) {}
//! #     fn animate_opacity(&mut self, _: &[ElementId], _: f32, _: std::time::Duration) {}
//! #     fn request_viewport(&mut self, _: ViewportRegion, _: bool) {}
//! # }
//! let mut coordinator = Coordinator::new(GridClusterer::default(), Host);
//! let viewport = ViewportRegion::new(Coordinate::new(0.0, 0.0), 1.0, 1.0);
//! let task = coordinator.on_viewport_settled(viewport, 10.0);
//! // Typically run on a worker: `coordinator.spawn(task)`
//! let outcome = task.run();
//! assert!(coordinator.apply(outcome));
//! assert_eq!(coordinator.state(), ReloadState::Idle);
//! ```

use crate::{
    ClusterConfig, ClusterError, ClusteringEngine, DisplayMode, ElementId, ItemKey, Point,
    PoolStats, PresentableItem, Result, ViewportRegion, VisualElement, VisualPool, presentation,
    selection,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Fade-in time for newly displayed visuals
pub const ENTRANCE_DURATION: Duration = Duration::from_millis(350);

/// Callback told whether a reload changed what is on screen
pub type Completion = Box<dyn FnOnce(bool) + Send>;

/// Capabilities the coordinator needs from the rendering surface
pub trait HostSurface {
    /// Start drawing an element, at the element's current opacity
    fn display_element(&mut self, element: &VisualElement);

    /// Stop drawing an element immediately
    fn remove_element(&mut self, id: ElementId);

    /// Animate the opacity of the given elements to `to`
    fn animate_opacity(&mut self, ids: &[ElementId], to: f32, duration: Duration);

    /// Move the map to `region`
    fn request_viewport(&mut self, region: ViewportRegion, animated: bool);

    /// Elements that just appeared; runs the entrance fade by default
    fn on_visuals_added(&mut self, ids: &[ElementId]) {
        self.animate_opacity(ids, 1.0, ENTRANCE_DURATION);
    }
}

/// Lifecycle of the coordinator's reload pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadState {
    /// No request newer than the displayed result is outstanding
    Idle,
    /// A request newer than the displayed result is being computed
    Reclustering,
    /// A result is being merged into the display
    Reconciling,
}

/// One recluster computation, detached from the coordinator
///
/// The task holds a snapshot of the engine taken when it was issued, so it can run on
/// any thread while the coordinator keeps mutating its own copy.
pub struct ReclusterTask<E> {
    sequence: u64,
    engine: Arc<E>,
    viewport: ViewportRegion,
    zoom_level: f64,
}

impl<E: ClusteringEngine> ReclusterTask<E> {
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn viewport(&self) -> ViewportRegion {
        self.viewport
    }

    /// Run the clustering engine
    pub fn run(self) -> ReclusterOutcome {
        profiling::scope!("ReclusterTask::run");

        let items = self.engine.recluster(&self.viewport, self.zoom_level);
        ReclusterOutcome {
            sequence: self.sequence,
            items,
        }
    }
}

/// Result of a [`ReclusterTask`]
#[derive(Debug, Clone)]
pub struct ReclusterOutcome {
    pub sequence: u64,
    pub items: Vec<PresentableItem>,
}

/// Message from a background task back to the interactive thread
enum Delivery {
    Done(ReclusterOutcome),
    Failed { sequence: u64, error: ClusterError },
}

/// Keeps the displayed visuals in sync with the clustering engine
pub struct Coordinator<E, H> {
    /// Latest engine state; tasks hold older snapshots of it
    engine: Arc<E>,
    host: H,
    pool: VisualPool,
    /// Visuals on screen, keyed by the value of the item they show
    displayed: HashMap<ItemKey, VisualElement>,
    /// Reverse index of `displayed`
    displayed_ids: HashMap<ElementId, ItemKey>,
    mode: DisplayMode,
    viewport: Option<ViewportRegion>,
    zoom_level: f64,
    state: ReloadState,
    /// Last sequence number handed out
    issued_sequence: u64,
    /// Sequence number of the result currently on screen
    applied_sequence: u64,
    /// Requests whose outcome has not been seen yet
    in_flight: BTreeSet<u64>,
    callbacks: BTreeMap<u64, Completion>,
    completions_tx: mpsc::UnboundedSender<Delivery>,
    completions_rx: mpsc::UnboundedReceiver<Delivery>,
}

impl<E: ClusteringEngine + 'static, H: HostSurface> Coordinator<E, H> {
    /// Create a coordinator owning `engine`
    pub fn new(engine: E, host: H) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            engine: Arc::new(engine),
            host,
            pool: VisualPool::new(),
            displayed: HashMap::new(),
            displayed_ids: HashMap::new(),
            mode: DisplayMode::default(),
            viewport: None,
            zoom_level: 0.0,
            state: ReloadState::Idle,
            issued_sequence: 0,
            applied_sequence: 0,
            in_flight: BTreeSet::new(),
            callbacks: BTreeMap::new(),
            completions_tx,
            completions_rx,
        }
    }

    // === Accessors ===

    /// Current engine state, including mutations not yet reclustered
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Last settled viewport and its zoom level
    pub fn viewport(&self) -> Option<(ViewportRegion, f64)> {
        self.viewport.map(|v| (v, self.zoom_level))
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed.len()
    }

    /// Visuals currently on screen, in no particular order
    pub fn displayed(&self) -> impl Iterator<Item = &VisualElement> {
        self.displayed.values()
    }

    /// Find a displayed visual by id
    pub fn element(&self, id: ElementId) -> Option<&VisualElement> {
        self.displayed.get(self.displayed_ids.get(&id)?)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Sequence number of the result on screen (0 before the first reload)
    pub fn applied_sequence(&self) -> u64 {
        self.applied_sequence
    }

    /// Sequence number of the newest request
    pub fn latest_sequence(&self) -> u64 {
        self.issued_sequence
    }

    // === Engine mutation ===

    /// Reconfigure the engine; takes effect with the next reload
    pub fn configure(&mut self, config: ClusterConfig) {
        self.write_engine(|engine| engine.configure(config));
    }

    /// Add points and reload against the last settled viewport
    pub fn add_points(
        &mut self,
        points: Vec<Point>,
        on_complete: Option<Completion>,
    ) -> Option<ReclusterTask<E>> {
        let count = points.len();
        let total = self.write_engine(|engine| {
            engine.add(points);
            engine.len()
        });
        tracing::info!("Added {} points ({} total)", count, total);
        self.reload(on_complete)
    }

    /// Remove every point and reload against the last settled viewport
    pub fn remove_all(&mut self, on_complete: Option<Completion>) -> Option<ReclusterTask<E>> {
        self.write_engine(|engine| engine.remove_all());
        tracing::info!("Removed all points");
        self.reload(on_complete)
    }

    /// Mutate the engine without waiting for running tasks
    ///
    /// While a task still holds the current snapshot, the engine is cloned first.
    fn write_engine<R>(&mut self, f: impl FnOnce(&mut E) -> R) -> R {
        f(Arc::make_mut(&mut self.engine))
    }

    // === Host notifications ===

    /// The host finished a pan, zoom or programmatic move
    pub fn on_viewport_settled(
        &mut self,
        viewport: ViewportRegion,
        zoom_level: f64,
    ) -> ReclusterTask<E> {
        self.viewport = Some(viewport);
        self.zoom_level = zoom_level;
        self.issue(viewport, zoom_level, None)
    }

    /// The user selected an item; clusters zoom to fit their members
    pub fn on_item_selected(&mut self, item: &PresentableItem) -> Option<ViewportRegion> {
        let region = selection::zoom_region(item)?;
        tracing::debug!(
            "Zooming to cluster of {} points: {:?}",
            item.point_count(),
            region
        );
        self.host.request_viewport(region, true);
        Some(region)
    }

    // === Reloading ===

    /// Request a reload of the last settled viewport
    ///
    /// Returns `None` (dropping `on_complete`) when no viewport has settled yet.
    pub fn reload(&mut self, on_complete: Option<Completion>) -> Option<ReclusterTask<E>> {
        let viewport = self.viewport?;
        Some(self.issue(viewport, self.zoom_level, on_complete))
    }

    fn issue(
        &mut self,
        viewport: ViewportRegion,
        zoom_level: f64,
        on_complete: Option<Completion>,
    ) -> ReclusterTask<E> {
        self.issued_sequence += 1;
        let sequence = self.issued_sequence;
        self.in_flight.insert(sequence);
        if let Some(callback) = on_complete {
            self.callbacks.insert(sequence, callback);
        }
        self.state = ReloadState::Reclustering;

        tracing::debug!(
            "Recluster #{} requested at zoom {:.2} ({} in flight)",
            sequence,
            zoom_level,
            self.in_flight.len()
        );

        ReclusterTask {
            sequence,
            engine: self.engine.clone(),
            viewport,
            zoom_level,
        }
    }

    /// Run `task` off the interactive thread
    ///
    /// The outcome is queued and applied by the next [`Coordinator::poll_completions`].
    /// Outside a tokio runtime the task runs inline and is still delivered through the queue.
    pub fn spawn(&self, task: ReclusterTask<E>) {
        let tx = self.completions_tx.clone();
        let sequence = task.sequence();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let _ = tx.send(Delivery::Done(task.run()));
            return;
        };

        let handle = runtime.spawn_blocking(move || task.run());
        runtime.spawn(async move {
            let delivery = match handle.await {
                Ok(outcome) => Delivery::Done(outcome),
                Err(err) => Delivery::Failed {
                    sequence,
                    error: ClusterError::ReclusterTask(err.to_string()),
                },
            };
            // The coordinator may be gone already; nothing left to update then
            let _ = tx.send(delivery);
        });
    }

    /// Convenience for `reload` followed by `spawn`
    pub fn spawn_reload(&mut self, on_complete: Option<Completion>) -> bool {
        match self.reload(on_complete) {
            Some(task) => {
                self.spawn(task);
                true
            }
            None => false,
        }
    }

    /// Apply every queued background outcome; returns how many were applied
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.completions_rx.try_recv() {
            if self.deliver(delivery) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for spawned work until no newer request is outstanding
    ///
    /// Only outcomes of [`Coordinator::spawn`]ed tasks arrive here; a task run by the
    /// caller must be passed to [`Coordinator::apply`] instead.
    pub async fn settle(&mut self) {
        while self.state != ReloadState::Idle {
            match self.completions_rx.recv().await {
                Some(delivery) => {
                    self.deliver(delivery);
                }
                None => break,
            }
        }
    }

    fn deliver(&mut self, delivery: Delivery) -> bool {
        match delivery {
            Delivery::Done(outcome) => self.apply(outcome),
            Delivery::Failed { sequence, error } => {
                self.fail(sequence, error);
                false
            }
        }
    }

    /// Apply a finished recluster; returns `false` when it was superseded
    pub fn apply(&mut self, outcome: ReclusterOutcome) -> bool {
        let sequence = outcome.sequence;
        self.in_flight.remove(&sequence);

        if sequence <= self.applied_sequence {
            tracing::debug!(
                "Discarding recluster #{} (#{} already applied)",
                sequence,
                self.applied_sequence
            );
            self.callbacks.remove(&sequence);
            self.refresh_state();
            return false;
        }

        self.state = ReloadState::Reconciling;
        let changed = self.reconcile(outcome.items);
        self.applied_sequence = sequence;

        // Older requests can only be discarded from now on
        self.in_flight = self.in_flight.split_off(&sequence);
        let mut pending = self.callbacks.split_off(&sequence);
        let callback = pending.remove(&sequence);
        self.callbacks = pending;

        tracing::debug!(
            "Applied recluster #{} ({} visuals, changed: {})",
            sequence,
            self.displayed.len(),
            changed
        );

        self.refresh_state();
        if let Some(callback) = callback {
            callback(changed);
        }
        true
    }

    /// Record a recluster that produced no result; the display stays as it is
    fn fail(&mut self, sequence: u64, error: ClusterError) {
        tracing::warn!("Recluster #{} failed: {}", sequence, error);
        self.in_flight.remove(&sequence);
        self.callbacks.remove(&sequence);
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        let newer_pending = self
            .in_flight
            .last()
            .is_some_and(|&latest| latest > self.applied_sequence);
        self.state = if newer_pending {
            ReloadState::Reclustering
        } else {
            ReloadState::Idle
        };
    }

    // === Reconciliation ===

    /// Diff `items` against the displayed set; returns whether anything changed
    fn reconcile(&mut self, items: Vec<PresentableItem>) -> bool {
        profiling::scope!("Coordinator::reconcile");

        let mut incoming_keys: HashSet<ItemKey> = HashSet::with_capacity(items.len());
        let mut incoming = Vec::with_capacity(items.len());
        for item in items {
            let key = item.key();
            if incoming_keys.insert(key.clone()) {
                incoming.push((key, item));
            } else {
                tracing::warn!("Engine returned a duplicate item; ignoring it");
            }
        }

        let stale: Vec<ItemKey> = self
            .displayed
            .keys()
            .filter(|key| !incoming_keys.contains(*key))
            .cloned()
            .collect();
        let removed = stale.len();
        for key in stale {
            if let Some(element) = self.hide(&key) {
                self.pool.release(element);
            }
        }

        let mut added = Vec::new();
        for (key, item) in incoming {
            if self.displayed.contains_key(&key) {
                continue;
            }
            let element = self.present(item);
            added.push(element.id());
            self.show(key, element);
        }

        self.fade_in(&added);
        removed > 0 || !added.is_empty()
    }

    /// Acquire and populate a visual, then put it on screen at zero opacity
    fn present(&mut self, item: PresentableItem) -> VisualElement {
        let mut element = self.build_visual(item);
        element.opacity = 0.0;
        self.host.display_element(&element);
        element
    }

    /// Track an element as displayed under `key`
    fn show(&mut self, key: ItemKey, element: VisualElement) {
        self.displayed_ids.insert(element.id(), key.clone());
        self.displayed.insert(key, element);
    }

    /// Take the element displayed under `key` off the screen
    fn hide(&mut self, key: &ItemKey) -> Option<VisualElement> {
        let element = self.displayed.remove(key)?;
        self.displayed_ids.remove(&element.id());
        self.host.remove_element(element.id());
        Some(element)
    }

    fn fade_in(&mut self, added: &[ElementId]) {
        if added.is_empty() {
            return;
        }
        self.host.on_visuals_added(added);
        for id in added {
            let Some(key) = self.displayed_ids.get(id) else {
                continue;
            };
            if let Some(element) = self.displayed.get_mut(key) {
                element.opacity = 1.0;
            }
        }
    }

    fn build_visual(&mut self, item: PresentableItem) -> VisualElement {
        let class = presentation::reuse_class(&item, self.mode);
        let mut element = self.pool.acquire(class);
        presentation::populate(&mut element, item, self.mode);
        element
    }

    /// A visual for `item` under the active display mode
    ///
    /// The element is not tracked as displayed; hand it back with
    /// [`Coordinator::release_visual`] when done.
    pub fn provide_visual(&mut self, item: &PresentableItem) -> VisualElement {
        self.build_visual(item.clone())
    }

    /// Return a visual obtained from [`Coordinator::provide_visual`]
    ///
    /// An element whose id is on screen is refused and dropped, so the pool never
    /// holds an id that is still displayed.
    pub fn release_visual(&mut self, element: VisualElement) -> Result<()> {
        let id = element.id();
        if self.displayed_ids.contains_key(&id) {
            tracing::warn!("Refusing to release {}: it is displayed", id);
            return Err(ClusterError::ElementDisplayed(id));
        }
        self.pool.release(element);
        Ok(())
    }

    /// Switch the display mode, re-presenting every displayed cluster
    ///
    /// Singletons do not depend on the mode and stay untouched. Returns whether
    /// anything was re-presented.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        if mode == self.mode {
            return false;
        }
        self.mode = mode;

        let cluster_keys: Vec<ItemKey> = self
            .displayed
            .iter()
            .filter(|(_, element)| element.reuse_class().is_cluster())
            .map(|(key, _)| key.clone())
            .collect();

        let mut added = Vec::with_capacity(cluster_keys.len());
        for key in cluster_keys {
            let Some(mut old) = self.hide(&key) else {
                continue;
            };
            let item = old.take_item();
            self.pool.release(old);

            if let Some(item) = item {
                let element = self.present(item);
                added.push(element.id());
                self.show(key, element);
            }
        }

        tracing::debug!(
            "Display mode set to {} ({} clusters re-presented)",
            mode.name(),
            added.len()
        );
        self.fade_in(&added);
        !added.is_empty()
    }

    /// Drop pooled visuals that are not on screen
    pub fn trim_pool(&mut self) -> usize {
        self.pool.evict_free()
    }
}
