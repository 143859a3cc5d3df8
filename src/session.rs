// src/session.rs - Capture, detect, annotate and render loop
use image::imageops::flip_horizontal_in_place;
use image::RgbImage;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::annotate::FrameAnnotator;
use crate::config::AppConfig;
use crate::detector::LandmarkSource;
use crate::export::{Snapshot, SnapshotExporter};
use crate::landmarks::HandFrame;
use crate::renderer::SkeletonRenderer;
use crate::video::FrameSource;

/// User commands, one per iteration at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ResetView,
    Save,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' => Some(Command::Quit),
            'r' => Some(Command::ResetView),
            's' => Some(Command::Save),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Outcome of the last user command worth showing in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved(Vec<PathBuf>),
    NothingToSave,
    SaveFailed(String),
    ViewReset,
}

pub struct Session<S: FrameSource, D: LandmarkSource> {
    source: S,
    detector: D,
    annotator: FrameAnnotator,
    renderer: SkeletonRenderer,
    exporter: SnapshotExporter,
    render_every: u64,
    frame_count: u64,
    frame: Option<RgbImage>,
    hands: HandFrame,
    notice: Option<Notice>,
    detector_failures: u64,
    closed: bool,
}

impl<S: FrameSource, D: LandmarkSource> Session<S, D> {
    pub fn new(source: S, detector: D, config: &AppConfig) -> Self {
        let mut renderer = SkeletonRenderer::new(config.viewer.max_hands);
        renderer.start();

        Self {
            source,
            detector,
            annotator: FrameAnnotator::new(config.viewer.max_hands),
            renderer,
            exporter: SnapshotExporter::new(&config.export.dir),
            render_every: config.viewer.render_every.max(1),
            frame_count: 0,
            frame: None,
            hands: HandFrame::default(),
            notice: None,
            detector_failures: 0,
            closed: false,
        }
    }

    /// Runs one iteration: capture, mirror, detect, annotate, render every `render_every`
    /// frames, then apply `command`.
    pub fn step(&mut self, command: Option<Command>) -> Step {
        if self.closed {
            return Step::Stop;
        }

        let mut frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to capture frame from camera: {}", e);
                return Step::Stop;
            }
        };

        flip_horizontal_in_place(&mut frame);

        self.hands = match self.detector.detect(&frame) {
            Ok(hands) => {
                if self.detector_failures > 0 {
                    info!(
                        "Hand detection recovered after {} failed frame(s)",
                        self.detector_failures
                    );
                    self.detector_failures = 0;
                }
                hands
            }
            Err(e) => {
                // Warn once per run of failures.
                if self.detector_failures == 0 {
                    warn!("Hand detection failed, showing no hands until it recovers: {}", e);
                } else {
                    debug!("Hand detection failed again: {}", e);
                }
                self.detector_failures += 1;
                HandFrame::default()
            }
        };
        if !self.hands.is_empty() {
            debug!("{} hand(s) detected", self.hands.hand_count());
        }

        self.annotator.draw_skeleton(&mut frame, &self.hands.normalized);
        self.annotator.draw_world_readout(&mut frame, &self.hands.world);
        self.annotator.draw_fps(&mut frame, self.source.fps());
        self.frame = Some(frame);

        self.frame_count += 1;
        if self.frame_count % self.render_every == 0 {
            self.renderer.update(&self.hands.world);
        }

        match command {
            Some(Command::Quit) => {
                info!("Quit requested");
                return Step::Stop;
            }
            Some(Command::ResetView) => {
                debug!("Resetting 3D view");
                self.renderer.reset_view();
                self.notice = Some(Notice::ViewReset);
            }
            Some(Command::Save) => self.save(),
            None => {}
        }

        Step::Continue
    }

    fn save(&mut self) {
        self.notice = Some(match self.exporter.export(&self.hands.world) {
            Ok(Snapshot::NoData) => {
                info!("No hands detected to save coordinates");
                Notice::NothingToSave
            }
            Ok(Snapshot::Written(paths)) => Notice::Saved(paths),
            Err(e) => {
                error!("Failed to save world coordinates: {}", e);
                Notice::SaveFailed(e.to_string())
            }
        });
    }

    /// Stops the renderer and releases the frame source. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        info!("Shutting down session after {} frame(s)", self.frame_count);
        self.renderer.stop();
        self.source.release();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The latest annotated frame.
    pub fn frame(&self) -> Option<&RgbImage> {
        self.frame.as_ref()
    }

    pub fn hands(&self) -> &HandFrame {
        &self.hands
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn renderer(&self) -> &SkeletonRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SkeletonRenderer {
        &mut self.renderer
    }

    /// Consecutive frames on which the landmark source failed.
    pub fn detector_failures(&self) -> u64 {
        self.detector_failures
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

impl<S: FrameSource, D: LandmarkSource> Drop for Session<S, D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::landmarks::{Hand, JOINT_COUNT};
    use image::Rgb;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeCamera {
        frames_left: usize,
        released: Rc<Cell<bool>>,
    }

    impl FakeCamera {
        fn new(frames: usize) -> (Self, Rc<Cell<bool>>) {
            let released = Rc::new(Cell::new(false));
            let camera = Self {
                frames_left: frames,
                released: released.clone(),
            };
            (camera, released)
        }
    }

    impl FrameSource for FakeCamera {
        fn read_frame(&mut self) -> Result<RgbImage> {
            if self.released.get() || self.frames_left == 0 {
                return Err(Error::Camera("no frame".to_string()));
            }
            self.frames_left -= 1;
            let mut frame = RgbImage::new(300, 100);
            frame.put_pixel(0, 99, Rgb([255, 255, 255]));
            Ok(frame)
        }

        fn fps(&self) -> f64 {
            30.0
        }

        fn release(&mut self) {
            self.released.set(true);
        }
    }

    /// Reports `hands` world hands every frame and remembers what it saw.
    struct FakeDetector {
        hands: usize,
        saw_mirrored: Rc<Cell<bool>>,
    }

    impl FakeDetector {
        fn new(hands: usize) -> Self {
            Self {
                hands,
                saw_mirrored: Rc::new(Cell::new(false)),
            }
        }
    }

    impl LandmarkSource for FakeDetector {
        fn detect(&mut self, frame: &RgbImage) -> Result<HandFrame> {
            self.saw_mirrored
                .set(frame.get_pixel(frame.width() - 1, 99).0 == [255, 255, 255]);
            let rows: Vec<[f64; 3]> = (0..JOINT_COUNT)
                .map(|i| [0.001 * i as f64, 0.002 * i as f64, 0.003])
                .collect();
            Ok(HandFrame {
                world: (0..self.hands).map(|slot| Hand::from_rows(slot, &rows)).collect(),
                normalized: Vec::new(),
            })
        }
    }

    struct FailingDetector;

    impl LandmarkSource for FailingDetector {
        fn detect(&mut self, _frame: &RgbImage) -> Result<HandFrame> {
            Err(Error::Detector("model unavailable".to_string()))
        }
    }

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.export.dir = dir.to_path_buf();
        config
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('r'), Some(Command::ResetView));
        assert_eq!(Command::from_key('s'), Some(Command::Save));
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn frames_are_mirrored_before_detection() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(1);
        let detector = FakeDetector::new(0);
        let saw_mirrored = detector.saw_mirrored.clone();
        let mut session = Session::new(camera, detector, &config_in(dir.path()));

        assert_eq!(session.step(None), Step::Continue);
        assert!(saw_mirrored.get());
        assert_eq!(session.frame().unwrap().get_pixel(299, 99).0, [255, 255, 255]);
        assert_eq!(session.frame().unwrap().get_pixel(0, 99).0, [0, 0, 0]);
    }

    #[test]
    fn renderer_updates_every_second_frame() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut session = Session::new(camera, FakeDetector::new(1), &config_in(dir.path()));

        session.step(None);
        assert_eq!(session.renderer().plot().unwrap().revision(), 0);
        session.step(None);
        assert_eq!(session.renderer().plot().unwrap().revision(), 1);
        session.step(None);
        session.step(None);
        session.step(None);
        assert_eq!(session.renderer().plot().unwrap().revision(), 2);
        assert_eq!(session.renderer().plot().unwrap().hands, 1);
        assert_eq!(session.frame_count(), 5);
    }

    #[test]
    fn render_ratio_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut config = config_in(dir.path());
        config.viewer.render_every = 3;
        let mut session = Session::new(camera, FakeDetector::new(1), &config);

        for _ in 0..6 {
            session.step(None);
        }
        assert_eq!(session.renderer().plot().unwrap().revision(), 2);
    }

    #[test]
    fn quit_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, released) = FakeCamera::new(10);
        let mut session = Session::new(camera, FakeDetector::new(1), &config_in(dir.path()));

        assert_eq!(session.step(Some(Command::Quit)), Step::Stop);
        session.shutdown();
        assert!(released.get());
        assert!(!session.renderer().is_running());
        assert_eq!(session.step(None), Step::Stop);
    }

    #[test]
    fn capture_failure_stops_and_cleanup_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, released) = FakeCamera::new(1);
        {
            let mut session = Session::new(camera, FakeDetector::new(1), &config_in(dir.path()));
            assert_eq!(session.step(None), Step::Continue);
            assert_eq!(session.step(None), Step::Stop);
            assert!(!released.get());
        }
        assert!(released.get());
    }

    #[test]
    fn reset_command_restores_default_view() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut session = Session::new(camera, FakeDetector::new(1), &config_in(dir.path()));

        session.renderer_mut().rotate_view(90.0, 30.0);
        session.step(Some(Command::ResetView));

        assert_eq!(session.renderer().view().elevation, 20.0);
        assert_eq!(session.renderer().view().azimuth, 45.0);
        assert_eq!(session.take_notice(), Some(Notice::ViewReset));
    }

    #[test]
    fn save_without_hands_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut session = Session::new(camera, FakeDetector::new(0), &config_in(dir.path()));

        assert_eq!(session.step(Some(Command::Save)), Step::Continue);

        assert_eq!(session.take_notice(), Some(Notice::NothingToSave));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn save_exports_current_world_hands() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut session = Session::new(camera, FakeDetector::new(2), &config_in(dir.path()));

        session.step(Some(Command::Save));

        match session.take_notice() {
            Some(Notice::Saved(paths)) => assert_eq!(paths.len(), 4),
            other => panic!("unexpected notice: {other:?}"),
        }
        assert!(dir.path().join("hand_1_world_coordinates.txt").exists());
    }

    #[test]
    fn detector_errors_count_as_no_hands() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let mut session = Session::new(camera, FailingDetector, &config_in(dir.path()));

        assert_eq!(session.step(None), Step::Continue);
        assert_eq!(session.step(None), Step::Continue);
        assert!(session.hands().is_empty());
        assert_eq!(session.renderer().plot().unwrap().hands, 0);
        assert_eq!(session.detector_failures(), 2);
    }

    /// Fails on the frames listed in `failing`, counting from zero.
    struct FlakyDetector {
        frame: usize,
        failing: Vec<usize>,
    }

    impl LandmarkSource for FlakyDetector {
        fn detect(&mut self, _frame: &RgbImage) -> Result<HandFrame> {
            let frame = self.frame;
            self.frame += 1;
            if self.failing.contains(&frame) {
                Err(Error::Detector("landmarker process closed its output".to_string()))
            } else {
                Ok(HandFrame::default())
            }
        }
    }

    #[test]
    fn failure_count_resets_once_detection_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let (camera, _) = FakeCamera::new(10);
        let detector = FlakyDetector {
            frame: 0,
            failing: vec![0, 1, 2],
        };
        let mut session = Session::new(camera, detector, &config_in(dir.path()));

        for _ in 0..3 {
            session.step(None);
        }
        assert_eq!(session.detector_failures(), 3);

        session.step(None);
        assert_eq!(session.detector_failures(), 0);
    }
}
