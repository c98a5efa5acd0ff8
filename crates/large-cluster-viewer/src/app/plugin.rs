//! Walkers plugin drawing the coordinator's visuals on the map
//!
//! The plugin gets an owned snapshot of the displayed visuals each frame, paints them
//! according to their reuse class and content, and reports the visible region and clicks
//! back through a shared [`MapFeedback`].

use egui::{Color32, Pos2, Stroke};
use large_cluster_lib::{
    Coordinate, ElementId, ImageRef, ReuseClass, Tint, ViewportRegion, VisualContent,
    VisualElement,
};
use std::sync::{Arc, Mutex};
use walkers::{MapMemory, Plugin, Projector};

const ACCENT: Color32 = Color32::from_rgb(70, 130, 220);
const PIN_RADIUS: f32 = 6.0;

/// One visual, ready to paint
#[derive(Clone, Debug)]
pub struct Marker {
    pub id: ElementId,
    pub coordinate: Coordinate,
    pub class: ReuseClass,
    pub content: VisualContent,
    pub alpha: f32,
}

impl Marker {
    pub fn new(element: &VisualElement, alpha: f32) -> Self {
        Self {
            id: element.id(),
            coordinate: element.coordinate(),
            class: element.reuse_class(),
            content: element.content().clone(),
            alpha,
        }
    }

    /// Screen radius used for both drawing and hit testing
    fn radius(&self) -> f32 {
        match self.class {
            ReuseClass::Pin => PIN_RADIUS,
            ReuseClass::Cluster(_) => badge_radius(self.content.count_label.as_deref()),
        }
    }
}

/// What the map reported during the last frame
#[derive(Debug, Default)]
pub struct MapFeedback {
    /// Visible region and zoom level
    pub view: Option<(ViewportRegion, f64)>,
    /// Visual under the last click
    pub clicked: Option<ElementId>,
}

/// Plugin for rendering clustered points on the map
pub struct ClusterPlugin {
    markers: Vec<Marker>,
    feedback: Arc<Mutex<MapFeedback>>,
}

impl ClusterPlugin {
    pub fn new(markers: Vec<Marker>, feedback: Arc<Mutex<MapFeedback>>) -> Self {
        Self { markers, feedback }
    }

    fn paint(&self, marker: &Marker, pos: Pos2, painter: &egui::Painter) {
        let alpha = marker.alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let content = &marker.content;
        let radius = marker.radius();

        if marker.class == ReuseClass::Pin {
            let fill = content.pin_tint.map_or(ACCENT, tint_color);
            painter.circle(
                pos,
                radius,
                fill.gamma_multiply(alpha),
                Stroke::new(1.5, Color32::WHITE.gamma_multiply(alpha)),
            );
            return;
        }

        if let Some(image) = content.image {
            paint_image(painter, pos, image, radius, alpha);
        }
        if let Some(background) = content.label_background {
            painter.circle(
                pos,
                radius,
                tint_color(background).gamma_multiply(alpha),
                Stroke::new(2.0, Color32::WHITE.gamma_multiply(alpha)),
            );
        }
        if let Some(label) = &content.count_label {
            let color = content.label_text.map_or(Color32::WHITE, tint_color);
            painter.text(
                pos,
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(12.0),
                color.gamma_multiply(alpha),
            );
        }
    }
}

impl Plugin for ClusterPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        map_memory: &MapMemory,
    ) {
        profiling::scope!("ClusterPlugin::run");

        let painter = ui.painter();
        let rect = response.rect;

        let top_left = projector.unproject(egui::Vec2::new(rect.min.x, rect.min.y));
        let bottom_right = projector.unproject(egui::Vec2::new(rect.max.x, rect.max.y));
        let view = region_from_corners(
            Coordinate::new(top_left.y(), top_left.x()),
            Coordinate::new(bottom_right.y(), bottom_right.x()),
        );

        let projected: Vec<(usize, Pos2)> = {
            profiling::scope!("project_markers");
            self.markers
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let position = walkers::lat_lon(m.coordinate.latitude, m.coordinate.longitude);
                    let v = projector.project(position);
                    (i, Pos2::new(v.x, v.y))
                })
                .filter(|(_, p)| rect.expand(32.0).contains(*p))
                .collect()
        };

        {
            profiling::scope!("paint_markers");
            // Pins first so clusters stay on top
            for (i, pos) in &projected {
                let marker = &self.markers[*i];
                if marker.class == ReuseClass::Pin {
                    self.paint(marker, *pos, painter);
                }
            }
            for (i, pos) in &projected {
                let marker = &self.markers[*i];
                if marker.class != ReuseClass::Pin {
                    self.paint(marker, *pos, painter);
                }
            }
        }

        let clicked = if response.clicked() {
            response
                .interact_pointer_pos()
                .and_then(|click| hit_test(&self.markers, &projected, click))
        } else {
            None
        };

        if let Ok(mut feedback) = self.feedback.lock() {
            feedback.view = Some((view, map_memory.zoom()));
            if clicked.is_some() {
                feedback.clicked = clicked;
            }
        }
    }
}

/// Region spanned by two opposite screen corners
pub fn region_from_corners(a: Coordinate, b: Coordinate) -> ViewportRegion {
    let center = Coordinate::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    );
    ViewportRegion::new(
        center,
        (a.latitude - b.latitude).abs(),
        (a.longitude - b.longitude).abs(),
    )
}

/// Badge radius grows with the number of digits
fn badge_radius(label: Option<&str>) -> f32 {
    let digits = label.map_or(1, str::len) as f32;
    10.0 + 3.0 * digits
}

/// Topmost marker under `click`; clusters win over pins
fn hit_test(markers: &[Marker], projected: &[(usize, Pos2)], click: Pos2) -> Option<ElementId> {
    projected
        .iter()
        .rev()
        .map(|&(i, pos)| (&markers[i], pos))
        .filter(|(m, pos)| pos.distance(click) <= m.radius())
        .min_by(|(a, pa), (b, pb)| {
            let rank = |m: &Marker| u8::from(m.class == ReuseClass::Pin);
            rank(a)
                .cmp(&rank(b))
                .then(pa.distance(click).total_cmp(&pb.distance(click)))
        })
        .map(|(m, _)| m.id)
}

fn tint_color(tint: Tint) -> Color32 {
    match tint {
        Tint::Accent => ACCENT,
        Tint::White => Color32::WHITE,
    }
}

fn paint_image(painter: &egui::Painter, pos: Pos2, image: ImageRef, radius: f32, alpha: f32) {
    match image {
        ImageRef::Marker => {
            painter.circle(
                pos,
                radius,
                Color32::from_rgb(220, 90, 70).gamma_multiply(alpha),
                Stroke::new(2.0, Color32::WHITE.gamma_multiply(alpha)),
            );
            painter.circle_filled(pos, radius * 0.35, Color32::WHITE.gamma_multiply(alpha));
        }
        ImageRef::MarkerAlt => {
            let rect = egui::Rect::from_center_size(pos, egui::Vec2::splat(radius * 2.0));
            painter.rect(
                rect,
                radius * 0.4,
                Color32::WHITE.gamma_multiply(alpha),
                Stroke::new(2.0, ACCENT.gamma_multiply(alpha)),
                egui::StrokeKind::Inside,
            );
        }
    }
}
