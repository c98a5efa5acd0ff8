//! Large Cluster Viewer - Application Library
//!
//! Demo host for `large-cluster-lib`: a full-screen map showing a large random point
//! set, clustered as the view changes.

mod app;

pub use app::LargeClusterViewerApp;

/// Errors that stop the viewer from starting
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to run the UI: {0}")]
    Ui(#[from] eframe::Error),
}

/// Initialize logging with sensible defaults; `RUST_LOG` overrides them
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,eframe=warn,walkers=warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .try_init();
}

/// Run the native application; blocks until the window closes
pub fn run_native() -> Result<(), ViewerError> {
    setup_logging();

    // Reclustering runs on this runtime's blocking pool
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Large Cluster Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Large Cluster Viewer",
        native_options,
        Box::new(|cc| Ok(Box::new(LargeClusterViewerApp::new(cc)))),
    )?;
    Ok(())
}
