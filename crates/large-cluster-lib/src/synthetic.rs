//! Synthetic point generation for demos, tests and benchmarks

use crate::{Coordinate, Point, ViewportRegion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `count` points uniformly distributed over `region`
pub fn uniform_points<R: Rng + ?Sized>(
    count: usize,
    region: &ViewportRegion,
    rng: &mut R,
) -> Vec<Point> {
    (0..count)
        .map(|_| {
            let latitude = sample(rng, region.min_latitude(), region.max_latitude());
            let longitude = sample(rng, region.min_longitude(), region.max_longitude());
            Point::new(Coordinate::new(latitude, longitude))
        })
        .collect()
}

/// Reproducible variant of [`uniform_points`]
pub fn seeded_points(count: usize, region: &ViewportRegion, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    uniform_points(count, region, &mut rng)
}

fn sample<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_stay_inside_region() {
        let region = ViewportRegion::new(Coordinate::new(37.787994, -122.407437), 0.1, 0.1);
        let points = seeded_points(10_000, &region, 7);
        assert_eq!(points.len(), 10_000);
        assert!(points.iter().all(|p| region.contains(p.coordinate())));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let region = ViewportRegion::new(Coordinate::new(0.0, 0.0), 1.0, 1.0);
        let a: Vec<_> = seeded_points(20, &region, 42)
            .iter()
            .map(Point::coordinate)
            .collect();
        let b: Vec<_> = seeded_points(20, &region, 42)
            .iter()
            .map(Point::coordinate)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_span_region_collapses_to_center() {
        let center = Coordinate::new(5.0, 5.0);
        let region = ViewportRegion::new(center, 0.0, 0.0);
        let points = uniform_points(3, &region, &mut rand::rng());
        assert!(points.iter().all(|p| p.coordinate() == center));
    }
}
