use clap::Parser;
use large_cluster_lib::{ClusterConfig, ClusterPosition, Coordinate, DisplayMode, ViewportRegion};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Large Cluster Viewer - Interactive map presenting hundreds of thousands of clustered points
pub struct Settings {
    /// Random points added on startup and by each "Add" click
    #[clap(short, long, default_value = "100000")]
    pub points: usize,

    /// Latitude of the area points are generated in
    #[clap(long, default_value = "37.787994", allow_negative_numbers = true)]
    pub center_lat: f64,

    /// Longitude of the area points are generated in
    #[clap(long, default_value = "-122.407437", allow_negative_numbers = true)]
    pub center_lon: f64,

    /// Latitude and longitude span of the area, in degrees
    #[clap(short, long, default_value = "0.1")]
    pub delta: f64,

    /// Zoom level at and above which clustering is disabled
    #[clap(long, default_value = "17")]
    pub max_zoom_level: u32,

    /// Minimum number of points that form a cluster
    #[clap(long, default_value = "3")]
    pub min_count: usize,

    /// Cluster placement: average, center or near-center
    #[clap(long, default_value = "near-center", value_parser = parse_position)]
    pub cluster_position: ClusterPosition,

    /// Initial display mode: count, image-count or image
    #[clap(short, long, default_value = "count", value_parser = parse_mode)]
    pub mode: DisplayMode,

    /// Seed for the random points (random when omitted)
    #[clap(long)]
    pub seed: Option<u64>,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

fn parse_position(value: &str) -> Result<ClusterPosition, String> {
    ClusterPosition::all()
        .iter()
        .copied()
        .find(|p| p.name() == value)
        .ok_or_else(|| format!("unknown cluster position '{value}'"))
}

fn parse_mode(value: &str) -> Result<DisplayMode, String> {
    match value {
        "count" => Ok(DisplayMode::Count),
        "image-count" => Ok(DisplayMode::ImageCount),
        "image" => Ok(DisplayMode::Image),
        _ => Err(format!("unknown display mode '{value}'")),
    }
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Area random points are generated in
    pub fn data_region(&self) -> ViewportRegion {
        ViewportRegion::new(
            Coordinate::new(self.center_lat, self.center_lon),
            self.delta,
            self.delta,
        )
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            max_zoom_level: self.max_zoom_level,
            min_count_for_clustering: self.min_count,
            cluster_position: self.cluster_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["large-cluster-viewer"]);
        assert_eq!(settings.points, 100_000);
        assert_eq!(settings.data_region().center(), Coordinate::new(37.787994, -122.407437));
        assert_eq!(settings.data_region().latitude_delta(), 0.1);

        let config = settings.cluster_config();
        assert_eq!(config.max_zoom_level, 17);
        assert_eq!(config.min_count_for_clustering, 3);
        assert_eq!(config.cluster_position, ClusterPosition::NearCenter);
        assert_eq!(settings.mode, DisplayMode::Count);
    }

    #[test]
    fn test_named_values() {
        let settings = Settings::parse_from([
            "large-cluster-viewer",
            "--mode",
            "image",
            "--cluster-position",
            "average",
            "--center-lon",
            "-3.7",
        ]);
        assert_eq!(settings.mode, DisplayMode::Image);
        assert_eq!(settings.cluster_position, ClusterPosition::Average);
        assert_eq!(settings.center_lon, -3.7);

        assert!(Settings::try_parse_from(["large-cluster-viewer", "--mode", "pie"]).is_err());
    }
}
