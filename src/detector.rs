// src/detector.rs - Hand landmark sources
use image::RgbImage;
use nalgebra::Vector3;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::landmarks::*;

/// Anything that can turn a camera frame into hand landmarks.
pub trait LandmarkSource {
    fn detect(&mut self, frame: &RgbImage) -> Result<HandFrame>;
}

impl<T: LandmarkSource + ?Sized> LandmarkSource for Box<T> {
    fn detect(&mut self, frame: &RgbImage) -> Result<HandFrame> {
        (**self).detect(frame)
    }
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    landmarks: Vec<LandmarkJson>,
    world_landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResponse {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

fn to_joints(landmarks: &[LandmarkJson]) -> Vec<Vector3<f64>> {
    landmarks
        .iter()
        .map(|lm| Vector3::new(lm.x, lm.y, lm.z))
        .collect()
}

/// Parses one response line of the landmarker process, keeping at most `max_hands` hands.
fn parse_response(line: &str, max_hands: usize) -> Result<HandFrame> {
    let response: DetectionResponse = serde_json::from_str(line.trim())?;

    if let Some(error) = response.error {
        warn!("Landmarker reported an error: {}", error);
        return Ok(HandFrame::default());
    }

    let mut frame = HandFrame::default();
    for (slot, hand) in response.hands.iter().take(max_hands).enumerate() {
        let world = Hand::new(slot, to_joints(&hand.world_landmarks));
        if !world.is_complete() {
            debug!(
                "Hand {} has {} world landmarks, expected {}",
                slot,
                world.len(),
                JOINT_COUNT
            );
        }
        frame.world.push(world);
        frame.normalized.push(Hand::new(slot, to_joints(&hand.landmarks)));
    }
    Ok(frame)
}

/// Kills and reaps the landmarker process when dropped, unless released.
struct ProcessGuard {
    child: Option<Child>,
}

impl ProcessGuard {
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.child
            .as_mut()
            .ok_or_else(|| Error::Detector("landmarker process already released".to_string()))
    }

    fn release(mut self) -> Result<Child> {
        self.child
            .take()
            .ok_or_else(|| Error::Detector("landmarker process already released".to_string()))
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Waits up to `timeout` for the `READY` line, handing the reader back on success.
fn wait_for_ready(
    stdout: BufReader<ChildStdout>,
    timeout: Duration,
) -> Result<BufReader<ChildStdout>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdout = stdout;
        let mut line = String::new();
        let result = stdout.read_line(&mut line).map(|_| line);
        let _ = tx.send((stdout, result));
    });

    match rx.recv_timeout(timeout) {
        Ok((stdout, Ok(line))) if line.trim() == "READY" => Ok(stdout),
        Ok((_, Ok(line))) => Err(Error::Detector(format!(
            "landmarker did not signal ready, got: {:?}",
            line.trim()
        ))),
        Ok((_, Err(e))) => Err(e.into()),
        Err(_) => Err(Error::Detector(format!(
            "landmarker did not signal ready within {:?}",
            timeout
        ))),
    }
}

/// Runs the hand landmark model in an external process.
///
/// On startup the process receives the detector settings as a single JSON line and must answer
/// `READY`. Each frame is then sent as three little-endian `u32`s (width, height, channels)
/// followed by the BGR pixel data, and answered by one JSON line of the form
/// `{"hands": [{"landmarks": [..], "world_landmarks": [..]}], "error": null}`.
/// `scripts/hand_landmarker.py` implements this with MediaPipe Hands.
pub struct SubprocessSource {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    max_hands: usize,
}

impl SubprocessSource {
    pub fn spawn(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;

        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| Error::InvalidConfig("landmarker command is empty".to_string()))?;

        info!("Starting hand landmarker process: {}", config.command.join(" "));

        let process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Detector(format!("failed to start {}: {}", program, e)))?;
        let mut guard = ProcessGuard {
            child: Some(process),
        };

        let child = guard.child_mut()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Detector("landmarker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Detector("landmarker stdout unavailable".to_string()))?;

        let mut settings = serde_json::to_string(config)?;
        settings.push('\n');
        stdin
            .write_all(settings.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(|e| Error::Detector(format!("failed to send settings to landmarker: {}", e)))?;

        let stdout = wait_for_ready(BufReader::new(stdout), config.ready_timeout)?;

        info!("Hand landmarker ready");

        Ok(Self {
            process: guard.release()?,
            stdin,
            stdout,
            max_hands: config.max_num_hands,
        })
    }

    fn send_frame(&mut self, frame: &RgbImage) -> std::io::Result<()> {
        let (width, height) = frame.dimensions();

        // The model expects BGR channel order.
        let mut bgr = Vec::with_capacity(frame.as_raw().len());
        for pixel in frame.pixels() {
            bgr.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
        }

        self.stdin.write_all(&width.to_le_bytes())?;
        self.stdin.write_all(&height.to_le_bytes())?;
        self.stdin.write_all(&3u32.to_le_bytes())?;
        self.stdin.write_all(&bgr)?;
        self.stdin.flush()
    }
}

impl LandmarkSource for SubprocessSource {
    fn detect(&mut self, frame: &RgbImage) -> Result<HandFrame> {
        self.send_frame(frame)
            .map_err(|e| Error::Detector(format!("failed to send frame to landmarker: {}", e)))?;

        let mut response = String::new();
        let read = self
            .stdout
            .read_line(&mut response)
            .map_err(|e| Error::Detector(format!("failed to read landmarker output: {}", e)))?;
        if read == 0 {
            return Err(Error::Detector(
                "landmarker process closed its output".to_string(),
            ));
        }

        parse_response(&response, self.max_hands)
    }
}

impl Drop for SubprocessSource {
    fn drop(&mut self) {
        info!("Shutting down hand landmarker...");
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Animated synthetic hands, used when no landmarker is available.
pub struct SimulatedSource {
    max_hands: usize,
    sim_time: f64,
}

// Finger base offsets from the wrist (meters) and segment lengths, thumb first.
const FINGER_BASES: [[f64; 3]; 5] = [
    [-0.025, -0.020, 0.005],
    [-0.022, -0.070, 0.0],
    [0.0, -0.072, 0.0],
    [0.020, -0.066, 0.0],
    [0.036, -0.056, 0.0],
];
const FINGER_SEGMENTS: [[f64; 3]; 5] = [
    [0.030, 0.028, 0.025],
    [0.038, 0.024, 0.020],
    [0.042, 0.027, 0.022],
    [0.038, 0.025, 0.021],
    [0.030, 0.019, 0.018],
];
const FINGER_SPREAD: [f64; 5] = [-0.9, -0.15, 0.0, 0.12, 0.28];

impl SimulatedSource {
    pub fn new(max_hands: usize) -> Self {
        Self {
            max_hands,
            sim_time: 0.0,
        }
    }

    fn world_hand(&self, slot: usize) -> Vec<Vector3<f64>> {
        let t = self.sim_time + slot as f64 * 1.3;
        let mirror = if slot % 2 == 0 { 1.0 } else { -1.0 };

        let mut joints = vec![Vector3::new(0.0, 0.0, 0.0)];
        for finger in 0..5 {
            let curl = 0.35 * (1.0 + (t * 1.5 + finger as f64 * 0.4).sin());
            let spread = FINGER_SPREAD[finger];
            // The thumb starts at its CMC joint, the other fingers at their MCP joint.
            let mut joint = Vector3::from(FINGER_BASES[finger]);
            joints.push(joint);
            for (k, length) in FINGER_SEGMENTS[finger].iter().enumerate() {
                let bend = curl * (k + 1) as f64;
                let direction =
                    Vector3::new(spread.sin(), -bend.cos() * spread.cos(), -bend.sin())
                        .normalize();
                joint += direction * *length;
                joints.push(joint);
            }
        }

        // Landmarks are centered on the middle finger base.
        let center = joints[MIDDLE_MCP];
        for joint in &mut joints {
            *joint -= center;
            joint.x *= mirror;
        }
        joints
    }
}

impl LandmarkSource for SimulatedSource {
    fn detect(&mut self, _frame: &RgbImage) -> Result<HandFrame> {
        let mut frame = HandFrame::default();
        for slot in 0..self.max_hands {
            let world = self.world_hand(slot);
            let center_x = (slot as f64 + 1.0) / (self.max_hands as f64 + 1.0);
            let normalized = world
                .iter()
                .map(|p| Vector3::new(center_x + p.x * 2.5, 0.75 + p.y * 2.5, p.z))
                .collect();
            frame.world.push(Hand::new(slot, world));
            frame.normalized.push(Hand::new(slot, normalized));
        }
        self.sim_time += 0.033;
        Ok(frame)
    }
}
