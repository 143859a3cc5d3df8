// src/topology.rs - Hand skeleton connections and per-finger colors
use std::ops::RangeInclusive;

use crate::landmarks::*;

/// A pair of anatomically adjacent joint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bone(pub usize, pub usize);

impl Bone {
    /// Whether both endpoints exist in a hand with `joint_count` joints.
    pub fn is_drawable(&self, joint_count: usize) -> bool {
        self.0 < joint_count && self.1 < joint_count
    }
}

/// The standard 21-point hand skeleton.
pub const HAND_CONNECTIONS: [Bone; 21] = [
    // Palm
    Bone(WRIST, THUMB_CMC),
    Bone(WRIST, INDEX_MCP),
    Bone(INDEX_MCP, MIDDLE_MCP),
    Bone(MIDDLE_MCP, RING_MCP),
    Bone(RING_MCP, PINKY_MCP),
    Bone(WRIST, PINKY_MCP),
    // Thumb
    Bone(THUMB_CMC, THUMB_MCP),
    Bone(THUMB_MCP, THUMB_IP),
    Bone(THUMB_IP, THUMB_TIP),
    // Index
    Bone(INDEX_MCP, INDEX_PIP),
    Bone(INDEX_PIP, INDEX_DIP),
    Bone(INDEX_DIP, INDEX_TIP),
    // Middle
    Bone(MIDDLE_MCP, MIDDLE_PIP),
    Bone(MIDDLE_PIP, MIDDLE_DIP),
    Bone(MIDDLE_DIP, MIDDLE_TIP),
    // Ring
    Bone(RING_MCP, RING_PIP),
    Bone(RING_PIP, RING_DIP),
    Bone(RING_DIP, RING_TIP),
    // Pinky
    Bone(PINKY_MCP, PINKY_PIP),
    Bone(PINKY_PIP, PINKY_DIP),
    Bone(PINKY_DIP, PINKY_TIP),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digit {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Digit {
    /// Checked in this order; the first digit whose range contains either endpoint wins.
    pub const ALL: [Digit; 5] = [
        Digit::Thumb,
        Digit::Index,
        Digit::Middle,
        Digit::Ring,
        Digit::Pinky,
    ];

    pub fn joints(&self) -> RangeInclusive<usize> {
        match self {
            Digit::Thumb => WRIST..=THUMB_TIP,
            Digit::Index => INDEX_MCP..=INDEX_TIP,
            Digit::Middle => MIDDLE_MCP..=MIDDLE_TIP,
            Digit::Ring => RING_MCP..=RING_TIP,
            Digit::Pinky => PINKY_MCP..=PINKY_TIP,
        }
    }

    pub fn color(&self) -> BoneColor {
        match self {
            Digit::Thumb => BoneColor::Red,
            Digit::Index => BoneColor::Orange,
            Digit::Middle => BoneColor::Yellow,
            Digit::Ring => BoneColor::Green,
            Digit::Pinky => BoneColor::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoneColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    /// Only reachable for bones outside the standard 21 joints.
    Gray,
}

impl BoneColor {
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            BoneColor::Red => [255, 0, 0],
            BoneColor::Orange => [255, 165, 0],
            BoneColor::Yellow => [255, 255, 0],
            BoneColor::Green => [0, 128, 0],
            BoneColor::Blue => [0, 0, 255],
            BoneColor::Gray => [128, 128, 128],
        }
    }
}

pub fn digit_of(bone: Bone) -> Option<Digit> {
    let Bone(a, b) = bone;
    Digit::ALL.into_iter().find(|digit| {
        let range = digit.joints();
        range.contains(&a) || range.contains(&b)
    })
}

pub fn color_of(bone: Bone) -> BoneColor {
    digit_of(bone).map_or(BoneColor::Gray, |digit| digit.color())
}

/// Bones of the standard skeleton whose endpoints both exist in a hand of `joint_count` joints.
pub fn drawable_bones(joint_count: usize) -> impl Iterator<Item = Bone> {
    HAND_CONNECTIONS
        .into_iter()
        .filter(move |bone| bone.is_drawable(joint_count))
}
