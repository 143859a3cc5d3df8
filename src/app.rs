// src/app.rs
use crate::detector::LandmarkSource;
use crate::session::{Command, Notice, Session, Step};
use crate::ui::{self, Theme, VideoWidget, DRAG_SENSITIVITY};
use crate::video::VideoSource;

use chrono::{DateTime, Local};
use eframe::egui;

pub const WINDOW_TITLE: &str = "Hand World Coordinates Detection";

pub const CONTROLS: [(char, &str); 3] = [
    ('q', "quit"),
    ('r', "reset 3D view"),
    ('s', "save world coordinates"),
];

pub struct HandViewerApp {
    session: Session<VideoSource, Box<dyn LandmarkSource>>,
    theme: Theme,
    video: VideoWidget,
    detector_name: &'static str,
    status: Option<(DateTime<Local>, String, bool)>,
}

impl HandViewerApp {
    pub fn new(
        session: Session<VideoSource, Box<dyn LandmarkSource>>,
        detector_name: &'static str,
    ) -> Self {
        Self {
            session,
            theme: Theme::default(),
            video: VideoWidget::new(),
            detector_name,
            status: None,
        }
    }

    fn render_video_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Camera");
        let hands = self.session.hands().hand_count();
        ui.label(
            egui::RichText::new(format!("{} hand(s) detected", hands)).color(if hands > 0 {
                self.theme.success
            } else {
                self.theme.text_secondary
            }),
        );
        ui.add_space(6.0);
        self.video.show(ui);
    }

    fn render_plot_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("3D Skeleton");
        let view = self.session.renderer().view();
        ui.label(
            egui::RichText::new(format!(
                "elev {:.0}°  azim {:.0}°  (drag to rotate)",
                view.elevation, view.azimuth
            ))
            .color(self.theme.text_secondary),
        );
        ui.add_space(6.0);

        let response = ui::show_plot(ui, &self.theme, self.session.renderer().plot(), view);
        if response.dragged() {
            let delta = response.drag_delta();
            self.session.renderer_mut().rotate_view(
                -(delta.x as f64) * DRAG_SENSITIVITY,
                delta.y as f64 * DRAG_SENSITIVITY,
            );
        }
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                for (key, action) in CONTROLS {
                    ui.label(
                        egui::RichText::new(format!("[{}]", key.to_ascii_uppercase()))
                            .strong()
                            .color(self.theme.primary),
                    );
                    ui.label(action);
                    ui.separator();
                }
                ui.label(
                    egui::RichText::new(format!("Landmarks: {}", self.detector_name))
                        .color(self.theme.text_secondary),
                );
                let failures = self.session.detector_failures();
                if failures > 0 {
                    ui.label(
                        egui::RichText::new(format!("detection failing ({} frames)", failures))
                            .color(self.theme.error),
                    );
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some((at, message, failed)) = &self.status {
                        ui.label(
                            egui::RichText::new(format!("{}  {}", at.format("%H:%M:%S"), message))
                                .color(if *failed {
                                    self.theme.error
                                } else {
                                    self.theme.text_primary
                                }),
                        );
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.session.shutdown();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

/// The first of `q`, `r`, `s` pressed since the last repaint.
pub fn poll_command(pressed: impl Fn(egui::Key) -> bool) -> Option<Command> {
    [(egui::Key::Q, 'q'), (egui::Key::R, 'r'), (egui::Key::S, 's')]
        .into_iter()
        .find(|(key, _)| pressed(*key))
        .and_then(|(_, c)| Command::from_key(c))
}

pub fn describe(notice: &Notice) -> String {
    match notice {
        Notice::Saved(paths) => {
            let names: Vec<String> = paths
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            format!("Saved {}", names.join(", "))
        }
        Notice::NothingToSave => "No hands detected to save coordinates".to_string(),
        Notice::SaveFailed(e) => format!("Save failed: {}", e),
        Notice::ViewReset => "3D view reset".to_string(),
    }
}

impl eframe::App for HandViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.is_closed() {
            return;
        }

        let command = ctx.input(|i| poll_command(|key| i.key_pressed(key)));
        if self.session.step(command) == Step::Stop {
            self.close(ctx);
            return;
        }

        if let Some(notice) = self.session.take_notice() {
            let failed = matches!(notice, Notice::SaveFailed(_));
            self.status = Some((Local::now(), describe(&notice), failed));
        }
        if let Some(frame) = self.session.frame() {
            self.video.update_frame(ctx, frame);
        }

        self.render_status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                self.render_video_panel(&mut columns[0]);
                self.render_plot_panel(&mut columns[1]);
            });
        });

        // Request repaint for continuous capture
        ctx.request_repaint();
    }
}
