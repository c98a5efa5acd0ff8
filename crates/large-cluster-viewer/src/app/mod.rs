//! Application module
//!
//! Full-screen map with the clustered dataset and a toggleable sidebar.

mod camera;
mod host;
mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::camera::{CameraFlight, CameraPose};
use crate::app::plugin::{ClusterPlugin, MapFeedback, Marker};
use crate::app::settings::Settings;
use crate::app::state::AppState;
use eframe::egui;
use large_cluster_lib::{DisplayMode, ViewportRegion, utils};
use std::sync::{Arc, Mutex};
use walkers::{HttpTiles, Map, MapMemory, sources::OpenStreetMap};

/// Zoom used when a region has no extent
const POINT_ZOOM: f64 = 16.0;

/// Persisted settings (lightweight, no point data)
#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    sidebar_open: bool,
    display_mode: usize,
}

/// Main application structure
pub struct LargeClusterViewerApp {
    /// Application state (coordinator, dataset, UI settings)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Where the map starts before the user moves it
    home: ViewportRegion,

    /// Shared feedback written by the plugin each frame
    feedback: Arc<Mutex<MapFeedback>>,

    /// Last view reported by the plugin and its zoom
    last_view: Option<(ViewportRegion, f64)>,

    /// Animated camera move in progress
    camera: Option<CameraFlight>,
}

impl LargeClusterViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let cli_args = Settings::from_cli();
        let mut state = AppState::new(&cli_args);

        if !cli_args.ignore_persisted {
            if let Some(settings) = cc.storage.and_then(Self::load_persisted_settings) {
                state.ui_settings.sidebar_open = settings.sidebar_open;
                if let Ok(mode) = DisplayMode::from_index(settings.display_mode) {
                    state.set_display_mode(mode);
                }
            }
        } else {
            tracing::info!("Ignoring persisted state (--ignore-persisted flag)");
        }

        let home = state.data_region();
        let mut map_memory = MapMemory::default();
        Self::place_camera(&mut map_memory, Self::pose_for(home));

        tracing::info!(
            "Initialized with {} points in {:?}",
            utils::format_count(cli_args.points),
            home
        );

        Self {
            state,
            tiles: HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone()),
            map_memory,
            home,
            feedback: Arc::new(Mutex::new(MapFeedback::default())),
            last_view: None,
            camera: None,
        }
    }

    fn load_persisted_settings(storage: &dyn eframe::Storage) -> Option<PersistedSettings> {
        let json = storage.get_string("persisted_settings")?;
        serde_json::from_str(&json).ok()
    }

    /// Camera pose centered on `region` at the zoom that fits its span
    fn pose_for(region: ViewportRegion) -> CameraPose {
        let span = region.latitude_delta().max(region.longitude_delta());
        CameraPose {
            center: region.center(),
            zoom: utils::zoom_for_span(span).unwrap_or(POINT_ZOOM),
        }
    }

    fn place_camera(map_memory: &mut MapMemory, pose: CameraPose) {
        let center = pose.center;
        map_memory.center_at(walkers::lat_lon(center.latitude, center.longitude));
        if let Err(e) = map_memory.set_zoom(pose.zoom) {
            tracing::warn!("Cannot zoom to {:.1}: {:?}", pose.zoom, e);
        }
    }

    /// Move the camera to `region`, flying there when `animated` and the current view
    /// is known
    fn fit_region(&mut self, region: ViewportRegion, animated: bool) {
        let target = Self::pose_for(region);
        match self.last_view.filter(|_| animated) {
            Some((view, zoom)) => {
                let from = CameraPose {
                    center: view.center(),
                    zoom,
                };
                self.camera = Some(CameraFlight::new(from, target, instant::Instant::now()));
            }
            None => {
                self.camera = None;
                Self::place_camera(&mut self.map_memory, target);
            }
        }
        tracing::trace!("Fitting map to {:?} (animated: {})", region, animated);
    }

    /// Advance the running camera flight; returns whether it needs more frames
    fn step_camera(&mut self) -> bool {
        let Some(flight) = self.camera else {
            return false;
        };
        let (pose, landed) = flight.pose_at(instant::Instant::now());
        Self::place_camera(&mut self.map_memory, pose);
        if landed {
            self.camera = None;
        }
        !landed
    }

    /// Snapshot of the displayed visuals for this frame's plugin
    fn markers(&self) -> Vec<Marker> {
        let coordinator = &self.state.coordinator;
        let host = coordinator.host();
        coordinator
            .displayed()
            .filter_map(|element| Some(Marker::new(element, host.alpha(element.id())?)))
            .collect()
    }

    /// Act on what the plugin saw during the last frame
    fn process_feedback(&mut self) {
        let (view, clicked) = match self.feedback.lock() {
            Ok(mut feedback) => (feedback.view, feedback.clicked.take()),
            Err(_) => return,
        };

        if let Some(id) = clicked {
            let item = self
                .state
                .coordinator
                .element(id)
                .and_then(|element| element.item())
                .cloned();
            if let Some(item) = item {
                self.state.select(&item);
            }
        }

        if let Some((viewport, zoom)) = view {
            self.last_view = Some((viewport, zoom));
            self.state.observe_viewport(viewport, zoom);
        }
    }
}

#[profiling::all_functions]
impl eframe::App for LargeClusterViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let busy = self.state.tick();

        // Selection zoom requested by the coordinator
        if let Some((region, animated)) = self.state.coordinator.host_mut().take_viewport_request()
        {
            self.fit_region(region, animated);
        }
        let flying = self.step_camera();

        ui_panels::render_sidebar(ctx, &mut self.state);

        let markers = self.markers();
        let feedback = self.feedback.clone();
        let home = self.home.center();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.map_memory,
                    walkers::lat_lon(home.latitude, home.longitude),
                )
                .with_plugin(ClusterPlugin::new(markers, feedback));
                ui.add(map);

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    "© OpenStreetMap contributors",
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });

        self.process_feedback();

        if busy || flying {
            ctx.request_repaint();
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            sidebar_open: self.state.ui_settings.sidebar_open,
            display_mode: self.state.ui_settings.display_mode.index(),
        };

        if let Ok(json) = serde_json::to_string(&settings) {
            storage.set_string("persisted_settings", json);
            tracing::debug!("Saved settings on exit");
        }
    }
}
