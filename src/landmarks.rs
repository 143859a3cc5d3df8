// src/landmarks.rs - Hand landmark data model
use nalgebra::Vector3;
use ndarray::Array2;

/// Number of joints in a complete hand.
pub const JOINT_COUNT: usize = 21;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Joints shown in the on-screen coordinate readout, in display order.
pub const KEY_JOINTS: [(usize, &str); 6] = [
    (WRIST, "Wrist"),
    (THUMB_TIP, "Thumb tip"),
    (INDEX_TIP, "Index tip"),
    (MIDDLE_TIP, "Middle tip"),
    (RING_TIP, "Ring tip"),
    (PINKY_TIP, "Pinky tip"),
];

/// One detected hand.
///
/// `slot` is the hand's position in the detector's result for the current frame. It is not a
/// persistent identity: slot 0 may refer to a different physical hand in the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub slot: usize,
    pub joints: Vec<Vector3<f64>>,
}

impl Hand {
    pub fn new(slot: usize, joints: Vec<Vector3<f64>>) -> Self {
        Self { slot, joints }
    }

    #[cfg(test)]
    pub fn from_rows(slot: usize, rows: &[[f64; 3]]) -> Self {
        Self {
            slot,
            joints: rows.iter().map(|r| Vector3::new(r[0], r[1], r[2])).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_complete(&self) -> bool {
        self.joints.len() == JOINT_COUNT
    }

    pub fn joint(&self, index: usize) -> Option<&Vector3<f64>> {
        self.joints.get(index)
    }

    pub fn wrist(&self) -> Option<&Vector3<f64>> {
        self.joint(WRIST)
    }

    /// Joint positions as an `n x 3` row-major array.
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::zeros((self.joints.len(), 3));
        for (mut row, joint) in array.rows_mut().into_iter().zip(&self.joints) {
            row[0] = joint.x;
            row[1] = joint.y;
            row[2] = joint.z;
        }
        array
    }
}

/// Landmarks produced for a single camera frame. Both lists may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    /// Wrist-relative positions in meters.
    pub world: Vec<Hand>,
    /// Image-relative positions in `[0, 1]`.
    pub normalized: Vec<Hand>,
}

impl HandFrame {
    pub fn is_empty(&self) -> bool {
        self.world.is_empty() && self.normalized.is_empty()
    }

    pub fn hand_count(&self) -> usize {
        self.world.len().max(self.normalized.len())
    }
}
