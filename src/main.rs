// src/main.rs
mod annotate;
mod app;
mod config;
mod detector;
mod error;
mod export;
mod landmarks;
mod renderer;
mod session;
mod topology;
mod ui;
mod video;

use anyhow::{anyhow, Context};
use eframe::egui;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::detector::{LandmarkSource, SimulatedSource, SubprocessSource};
use crate::session::Session;
use crate::video::VideoSource;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = AppConfig::default();
    config.validate().context("invalid configuration")?;

    let camera = VideoSource::new_camera(&config.camera)
        .with_context(|| format!("failed to open camera {}", config.camera.index))?;

    let (detector, detector_name): (Box<dyn LandmarkSource>, &'static str) =
        match SubprocessSource::spawn(&config.detector) {
            Ok(source) => (Box::new(source), "hand landmarker"),
            Err(e) => {
                warn!("Hand landmarker unavailable ({}), falling back to simulation mode", e);
                warn!(
                    "To detect real hands, run from the crate root after `python3 -m pip install mediapipe numpy`"
                );
                (
                    Box::new(SimulatedSource::new(config.detector.max_num_hands)),
                    "simulation",
                )
            }
        };

    info!("Starting hand world coordinates detection...");
    for (key, action) in app::CONTROLS {
        info!("Press '{}' to {}", key, action);
    }

    let session = Session::new(camera, detector, &config);

    // Set up GUI options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([900.0, 500.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        app::WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(create_visuals());
            Box::new(app::HandViewerApp::new(session, detector_name))
        }),
    )
    .map_err(|e| anyhow!("error running application: {}", e))?;

    info!("Application closed");
    Ok(())
}

fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(45, 45, 52);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 130, 240);
    visuals.window_rounding = egui::Rounding::same(8.0);

    visuals
}
