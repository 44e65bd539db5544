#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod display;
mod gui;
mod overlay;

use anyhow::{Context, Result};
use lumascreen::color::Color;
use lumascreen::config::{SnapshotRequest, APP_NAME};
use lumascreen::{logger, raster, CompositeMode, LaunchConfig, Parameters, SurfaceBounds};
use tracing::{info, warn};

const ICON_SIZE: u32 = 64;

fn main() -> Result<()> {
    let result = run_app();
    logger::finalize_logs();
    result
}

fn run_app() -> Result<()> {
    let config = LaunchConfig::from_args(std::env::args().skip(1)).context("Invalid command line")?;

    // the light must come up even when the log directory is unusable
    match logger::init_logging(&config.logging, APP_NAME) {
        Ok(log_path) => info!("Log file: {}", log_path.display()),
        Err(e) => eprintln!("Logging disabled: {:#}", e),
    }
    if config.logging.stream_to_stdout {
        info!("Streaming logs to stdout via --stream-logs");
    }

    if let Some(snapshot) = &config.snapshot {
        return write_snapshot(&config, snapshot);
    }

    info!("=== LumaScreen Starting ===");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("LumaScreen")
            .with_inner_size([520.0, 420.0])
            .with_resizable(false)
            .with_decorations(false)
            .with_icon(load_window_icon()),
        ..Default::default()
    };

    eframe::run_native(
        "LumaScreen",
        native_options,
        Box::new(move |_cc| Ok(Box::new(gui::ControlPanel::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("Control panel failed: {}", e))?;

    info!("Control panel closed - exiting");
    Ok(())
}

/// Renders a single frame with the profile defaults and saves it as PNG.
fn write_snapshot(config: &LaunchConfig, snapshot: &SnapshotRequest) -> Result<()> {
    let params = Parameters::for_profile(config.profile);
    let mode = config.mode();
    let canvas = raster::render(&params, snapshot.bounds, mode)
        .with_context(|| format!("Failed to render {} snapshot", mode))?;

    let image = image::RgbaImage::from_raw(canvas.width(), canvas.height(), canvas.to_rgba8())
        .ok_or_else(|| anyhow::anyhow!("Snapshot buffer does not match {}x{}", canvas.width(), canvas.height()))?;
    image
        .save(&snapshot.path)
        .with_context(|| format!("Failed to write snapshot to {}", snapshot.path.display()))?;

    info!(
        "Snapshot written to {} ({}x{}, {})",
        snapshot.path.display(),
        canvas.width(),
        canvas.height(),
        mode
    );
    Ok(())
}

fn load_window_icon() -> egui::IconData {
    let icon_path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .map(|p| p.join("icon.ico"));

    if let Some(path) = icon_path {
        if path.exists() {
            match image::open(&path) {
                Ok(image) => {
                    let rgba = image.to_rgba8();
                    let (width, height) = rgba.dimensions();
                    return egui::IconData {
                        rgba: rgba.into_raw(),
                        width,
                        height,
                    };
                }
                Err(e) => warn!("Failed to load icon from {:?}: {}. Using fallback.", path, e),
            }
        }
    }

    fallback_icon()
}

/// A small green ring drawn with the same compositor as the overlay.
fn fallback_icon() -> egui::IconData {
    let params = Parameters {
        thickness: 8,
        brightness: 1.0,
        color: Color::rgb(76, 175, 80),
    };
    let bounds = SurfaceBounds::sized(ICON_SIZE as i32, ICON_SIZE as i32);

    match raster::render(&params, bounds, CompositeMode::RoundedFrame) {
        Ok(canvas) => egui::IconData {
            rgba: canvas.to_rgba8(),
            width: canvas.width(),
            height: canvas.height(),
        },
        Err(e) => {
            warn!("Failed to draw fallback icon: {}", e);
            egui::IconData {
                rgba: [76, 175, 80, 255].repeat((ICON_SIZE * ICON_SIZE) as usize),
                width: ICON_SIZE,
                height: ICON_SIZE,
            }
        }
    }
}
