//! Map-side implementation of the coordinator's host surface
//!
//! The coordinator tells the host what to show; the host remembers it as opacity fades
//! and viewport requests, and the map plugin reads them back every frame.

use large_cluster_lib::{ElementId, HostSurface, ViewportRegion, VisualElement};
use std::collections::HashMap;
use std::time::Duration;

/// A running opacity animation
#[derive(Clone, Copy, Debug)]
struct Fade {
    from: f32,
    to: f32,
    started_at: instant::Instant,
    duration: Duration,
}

impl Fade {
    fn alpha_at(&self, now: instant::Instant) -> f32 {
        let total = self.duration.as_secs_f32();
        if total <= 0.0 {
            return self.to;
        }
        let t = (now.saturating_duration_since(self.started_at).as_secs_f32() / total).min(1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_finished_at(&self, now: instant::Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }
}

/// Host surface backing the walkers map
#[derive(Default)]
pub struct MapHost {
    /// Opacity of each shown element when it is not fading
    resting: HashMap<ElementId, f32>,
    fades: HashMap<ElementId, Fade>,
    pending_viewport: Option<(ViewportRegion, bool)>,
}

impl MapHost {
    /// Current opacity of a shown element, or `None` if it is not shown
    pub fn alpha(&self, id: ElementId) -> Option<f32> {
        self.alpha_at(id, instant::Instant::now())
    }

    fn alpha_at(&self, id: ElementId, now: instant::Instant) -> Option<f32> {
        let resting = *self.resting.get(&id)?;
        Some(self.fades.get(&id).map_or(resting, |fade| fade.alpha_at(now)))
    }

    /// Whether any fade still needs frames
    pub fn is_animating(&self) -> bool {
        !self.fades.is_empty()
    }

    /// Drop finished fades, keeping their final opacity
    pub fn prune_fades(&mut self) {
        let now = instant::Instant::now();
        let resting = &mut self.resting;
        self.fades.retain(|id, fade| {
            if fade.is_finished_at(now) {
                if let Some(opacity) = resting.get_mut(id) {
                    *opacity = fade.to;
                }
                false
            } else {
                true
            }
        });
    }

    /// Viewport requested since the last call
    pub fn take_viewport_request(&mut self) -> Option<(ViewportRegion, bool)> {
        self.pending_viewport.take()
    }

    pub fn shown_count(&self) -> usize {
        self.resting.len()
    }
}

impl HostSurface for MapHost {
    fn display_element(&mut self, element: &VisualElement) {
        self.resting.insert(element.id(), element.opacity());
    }

    fn remove_element(&mut self, id: ElementId) {
        self.resting.remove(&id);
        self.fades.remove(&id);
    }

    fn animate_opacity(&mut self, ids: &[ElementId], to: f32, duration: Duration) {
        let now = instant::Instant::now();
        for &id in ids {
            let Some(from) = self.alpha_at(id, now) else {
                continue;
            };
            self.fades.insert(
                id,
                Fade {
                    from,
                    to,
                    started_at: now,
                    duration,
                },
            );
        }
    }

    fn request_viewport(&mut self, region: ViewportRegion, animated: bool) {
        self.pending_viewport = Some((region, animated));
    }
}
