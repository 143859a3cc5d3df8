// src/renderer.rs - Live 3D hand skeleton plot
use nalgebra::Vector3;
use tracing::{debug, info};

use crate::landmarks::Hand;
use crate::topology::{color_of, drawable_bones, BoneColor};

pub const AXIS_LIMIT: f64 = 0.15;
pub const DEFAULT_ELEVATION: f64 = 20.0;
pub const DEFAULT_AZIMUTH: f64 = 45.0;

const LABEL_LIFT: f64 = 0.02;

/// Camera orientation of the plot, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    pub elevation: f64,
    pub azimuth: f64,
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self {
            elevation: DEFAULT_ELEVATION,
            azimuth: DEFAULT_AZIMUTH,
        }
    }
}

/// Axis styling, reasserted on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct AxesConfig {
    pub title: &'static str,
    pub labels: [&'static str; 3],
    pub limits: [(f64, f64); 3],
    pub grid_alpha: f32,
    pub fill_panes: bool,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            title: "Hand Skeleton 3D Visualization",
            labels: ["X (m)", "Y (m)", "Z (m)"],
            limits: [(-AXIS_LIMIT, AXIS_LIMIT); 3],
            grid_alpha: 0.3,
            fill_panes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Vector3<f64>,
    pub color: [u8; 3],
    pub size: f32,
    pub alpha: f32,
    pub shape: MarkerShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
    pub color: BoneColor,
    pub width: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Vector3<f64>,
    pub text: String,
}

/// Everything currently drawn in the 3D plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plot3d {
    pub axes: AxesConfig,
    pub markers: Vec<Marker>,
    pub segments: Vec<Segment>,
    pub labels: Vec<Label>,
    pub hands: usize,
    revision: u64,
}

impl Plot3d {
    /// Drops all geometry and restores the axis configuration.
    fn clear(&mut self) {
        self.axes = AxesConfig::default();
        self.markers.clear();
        self.segments.clear();
        self.labels.clear();
        self.hands = 0;
    }

    fn plot_hand(&mut self, hand: &Hand) {
        for joint in &hand.joints {
            self.markers.push(Marker {
                position: *joint,
                color: [255, 0, 0],
                size: 50.0,
                alpha: 0.8,
                shape: MarkerShape::Circle,
            });
        }

        for bone in drawable_bones(hand.len()) {
            self.segments.push(Segment {
                start: hand.joints[bone.0],
                end: hand.joints[bone.1],
                color: color_of(bone),
                width: 3.0,
                alpha: 0.7,
            });
        }

        if let Some(wrist) = hand.wrist() {
            self.labels.push(Label {
                position: wrist + Vector3::new(0.0, 0.0, LABEL_LIFT),
                text: format!("Hand {}", hand.slot + 1),
            });
        }

        self.hands += 1;
    }

    fn plot_origin(&mut self) {
        self.markers.push(Marker {
            position: Vector3::zeros(),
            color: [0, 0, 0],
            size: 100.0,
            alpha: 0.5,
            shape: MarkerShape::Cross,
        });
    }

    /// Incremented each time a new scene is committed.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Stopped,
    Running,
}

pub struct SkeletonRenderer {
    max_hands: usize,
    state: RenderState,
    view: ViewAngles,
    plot: Option<Plot3d>,
}

impl SkeletonRenderer {
    pub fn new(max_hands: usize) -> Self {
        Self {
            max_hands,
            state: RenderState::Stopped,
            view: ViewAngles::default(),
            plot: None,
        }
    }

    pub fn start(&mut self) {
        if self.state == RenderState::Running {
            return;
        }
        info!("Starting 3D skeleton view");
        self.plot = Some(Plot3d::default());
        self.view = ViewAngles::default();
        self.state = RenderState::Running;
    }

    /// Redraws the plot from scratch with the given world-space hands.
    ///
    /// Does nothing unless running. Hands past `max_hands` are ignored. Returns the number of
    /// hands plotted.
    pub fn update(&mut self, hands: &[Hand]) -> usize {
        if self.state != RenderState::Running {
            return 0;
        }
        let Some(plot) = self.plot.as_mut() else {
            return 0;
        };

        plot.clear();
        for hand in hands.iter().take(self.max_hands) {
            plot.plot_hand(hand);
        }
        plot.plot_origin();
        plot.revision += 1;

        debug!("3D plot updated with {} hand(s)", plot.hands);
        plot.hands
    }

    pub fn reset_view(&mut self) {
        if self.plot.is_some() {
            self.view = ViewAngles::default();
        }
    }

    /// Orbits the camera, as when dragging the plot with the mouse.
    pub fn rotate_view(&mut self, d_azimuth: f64, d_elevation: f64) {
        if self.plot.is_none() {
            return;
        }
        self.view.azimuth = (self.view.azimuth + d_azimuth).rem_euclid(360.0);
        self.view.elevation = (self.view.elevation + d_elevation).clamp(-90.0, 90.0);
    }

    pub fn stop(&mut self) {
        if self.state == RenderState::Stopped {
            return;
        }
        info!("Stopping 3D skeleton view");
        self.state = RenderState::Stopped;
        self.plot = None;
    }

    pub fn is_running(&self) -> bool {
        self.state == RenderState::Running
    }

    pub fn view(&self) -> ViewAngles {
        self.view
    }

    pub fn plot(&self) -> Option<&Plot3d> {
        self.plot.as_ref()
    }
}
