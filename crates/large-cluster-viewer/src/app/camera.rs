//! Animated camera moves
//!
//! A move requested with animation is played back frame by frame, from where the camera
//! was to where it should end up.

use large_cluster_lib::Coordinate;
use std::time::Duration;

/// Length of an animated camera move
pub const FLIGHT_DURATION: Duration = Duration::from_millis(450);

/// Where the camera looks and how close
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub center: Coordinate,
    pub zoom: f64,
}

/// A camera move in progress
#[derive(Clone, Copy, Debug)]
pub struct CameraFlight {
    from: CameraPose,
    to: CameraPose,
    started_at: instant::Instant,
    duration: Duration,
}

impl CameraFlight {
    pub fn new(from: CameraPose, to: CameraPose, started_at: instant::Instant) -> Self {
        Self {
            from,
            to,
            started_at,
            duration: FLIGHT_DURATION,
        }
    }

    /// Pose at `now`, and whether the flight has landed
    pub fn pose_at(&self, now: instant::Instant) -> (CameraPose, bool) {
        let total = self.duration.as_secs_f64();
        let t = if total <= 0.0 {
            1.0
        } else {
            (now.saturating_duration_since(self.started_at).as_secs_f64() / total).min(1.0)
        };
        if t >= 1.0 {
            return (self.to, true);
        }

        // Ease out: fast start, gentle landing
        let s = 1.0 - (1.0 - t).powi(3);
        let lerp = |a: f64, b: f64| a + (b - a) * s;
        let pose = CameraPose {
            center: Coordinate::new(
                lerp(self.from.center.latitude, self.to.center.latitude),
                lerp(self.from.center.longitude, self.to.center.longitude),
            ),
            zoom: lerp(self.from.zoom, self.to.zoom),
        };
        (pose, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: CameraPose = CameraPose {
        center: Coordinate {
            latitude: 12.0,
            longitude: 24.0,
        },
        zoom: 14.0,
    };

    fn flight(started_at: instant::Instant) -> CameraFlight {
        let from = CameraPose {
            center: Coordinate::new(10.0, 20.0),
            zoom: 8.0,
        };
        CameraFlight::new(from, TARGET, started_at)
    }

    #[test]
    fn test_flight_starts_at_origin() {
        let start = instant::Instant::now();
        let (pose, landed) = flight(start).pose_at(start);
        assert!(!landed);
        assert_eq!(pose.center, Coordinate::new(10.0, 20.0));
        assert_eq!(pose.zoom, 8.0);
    }

    #[test]
    fn test_flight_lands_exactly_on_target() {
        let start = instant::Instant::now();
        let flight = flight(start);
        let (pose, landed) = flight.pose_at(start + FLIGHT_DURATION);
        assert!(landed);
        assert_eq!(pose, TARGET);

        let (late, landed) = flight.pose_at(start + FLIGHT_DURATION * 3);
        assert!(landed);
        assert_eq!(late, TARGET);
    }

    #[test]
    fn test_flight_moves_steadily_toward_target() {
        let start = instant::Instant::now();
        let flight = flight(start);
        let mut last_zoom = 8.0;
        for step in 1..10 {
            let (pose, landed) = flight.pose_at(start + FLIGHT_DURATION * step / 10);
            assert!(!landed);
            assert!(pose.zoom > last_zoom);
            assert!(pose.zoom < 14.0);
            assert!((10.0..12.0).contains(&pose.center.latitude));
            last_zoom = pose.zoom;
        }
        // Eased: more than half way at the half-time mark
        let (half, _) = flight.pose_at(start + FLIGHT_DURATION / 2);
        assert!(half.zoom > 11.0);
    }
}
