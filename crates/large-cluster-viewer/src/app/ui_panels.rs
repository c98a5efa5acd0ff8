//! UI panels for the application
//!
//! Sidebar with the display-mode selector, dataset actions and statistics.

use crate::app::state::AppState;
use egui::{Color32, RichText, Ui};
use large_cluster_lib::{DisplayMode, ReloadState};

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());
    if response.clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if state.ui_settings.sidebar_open {
        "✕"
    } else {
        "☰"
    };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the main sidebar
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    egui::SidePanel::right("main_sidebar")
        .default_width(280.0)
        .min_width(240.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| render_sidebar_content(ui, state));
        });
}

fn render_sidebar_content(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🗺 Display").strong());
    ui.add_space(4.0);

    // Segmented display-mode selector
    let mut selected = state.ui_settings.display_mode;
    ui.horizontal(|ui| {
        for &mode in DisplayMode::all() {
            ui.selectable_value(&mut selected, mode, mode.name());
        }
    });
    if selected != state.ui_settings.display_mode {
        state.set_display_mode(selected);
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui.button("➕ Add").clicked() {
            state.add_batch();
        }
        if ui.button("🗑 Remove all").clicked() {
            state.remove_all();
        }
    });

    ui.separator();
    render_stats_section(ui, state);
}

fn render_stats_section(ui: &mut Ui, state: &AppState) {
    ui.label(RichText::new("📊 Statistics").strong());
    ui.add_space(4.0);

    let stats = state.stats.lock().map(|s| s.clone()).unwrap_or_default();
    let coordinator = &state.coordinator;
    let pool = coordinator.pool_stats();

    egui::Grid::new("stats_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Total Points:");
            ui.label(RichText::new(stats.format_points()).strong());
            ui.end_row();

            ui.label("Visuals:");
            ui.label(RichText::new(format!("{}", coordinator.displayed_count())).strong());
            ui.end_row();

            ui.label("Pool:");
            ui.label(format!("{} created, {} free", pool.created, pool.free));
            ui.end_row();

            ui.label("Reloads:");
            ui.label(format!(
                "{} applied (#{} of #{})",
                stats.reloads_applied,
                coordinator.applied_sequence(),
                coordinator.latest_sequence()
            ));
            ui.end_row();

            ui.label("State:");
            let (text, color) = match coordinator.state() {
                ReloadState::Idle => ("Idle", Color32::GREEN),
                ReloadState::Reclustering => ("Reclustering", Color32::YELLOW),
                ReloadState::Reconciling => ("Reconciling", Color32::YELLOW),
            };
            ui.label(RichText::new(text).color(color));
            ui.end_row();

            if let Some((_, zoom)) = coordinator.viewport() {
                ui.label("Zoom:");
                ui.label(format!("{zoom:.2}"));
                ui.end_row();
            }
        });
}
