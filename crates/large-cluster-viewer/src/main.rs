#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// The binary uses the library, not duplicate modules
fn main() -> Result<(), large_cluster_viewer::ViewerError> {
    large_cluster_viewer::run_native()
}
