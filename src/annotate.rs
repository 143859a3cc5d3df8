// src/annotate.rs - 2D overlays drawn onto camera frames
use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_7X13, FONT_9X15_BOLD},
        MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder},
    text::Text,
};
use image::{Rgb, RgbImage};

use crate::landmarks::{Hand, KEY_JOINTS};
use crate::topology::{color_of, drawable_bones};

const READOUT_TOP: i32 = 30;
const HEADER_X: i32 = 10;
const JOINT_X: i32 = 20;
const HEADER_SPACING: i32 = 25;
const LINE_SPACING: i32 = 20;
const BLOCK_SPACING: i32 = 10;

const FPS_MARGIN: i32 = 100;
const FPS_Y: i32 = 30;

const JOINT_DIAMETER: u32 = 9;
const BONE_WIDTH: u32 = 2;

const HEADER_COLOR: Rgb888 = Rgb888::new(0, 255, 0);
const TEXT_COLOR: Rgb888 = Rgb888::new(255, 255, 255);
const FPS_COLOR: Rgb888 = Rgb888::new(255, 0, 0);
const JOINT_FILL: Rgb888 = Rgb888::new(255, 0, 0);
const JOINT_RING: Rgb888 = Rgb888::new(255, 255, 255);

/// `DrawTarget` over an `RgbImage`; pixels outside the image are dropped.
struct Canvas<'a>(&'a mut RgbImage);

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < width && y < height {
                self.0.put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
            }
        }
        Ok(())
    }
}

fn paint<D>(frame: &mut RgbImage, drawable: &D)
where
    D: Drawable<Color = Rgb888>,
{
    match drawable.draw(&mut Canvas(frame)) {
        Ok(_) => {}
        Err(infallible) => match infallible {},
    }
}

fn rgb888(rgb: [u8; 3]) -> Rgb888 {
    Rgb888::new(rgb[0], rgb[1], rgb[2])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Joint,
}

/// One line of the world coordinate readout, anchored at its text baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadoutLine {
    pub kind: LineKind,
    pub text: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadoutLayout {
    pub lines: Vec<ReadoutLine>,
    /// Vertical offset where the next block would start.
    pub end_y: i32,
}

impl ReadoutLayout {
    /// Lays out the readout for `hands`. Offsets restart at the top on every call.
    pub fn for_hands(hands: &[Hand]) -> Self {
        let mut lines = Vec::new();
        let mut y = READOUT_TOP;

        for (i, hand) in hands.iter().enumerate() {
            lines.push(ReadoutLine {
                kind: LineKind::Header,
                text: format!("Hand {} World Coordinates (meters):", i + 1),
                x: HEADER_X,
                y,
            });
            y += HEADER_SPACING;

            for (index, name) in KEY_JOINTS {
                if let Some(joint) = hand.joint(index) {
                    lines.push(ReadoutLine {
                        kind: LineKind::Joint,
                        text: format!(
                            "{}: X={:.3}, Y={:.3}, Z={:.3}",
                            name, joint.x, joint.y, joint.z
                        ),
                        x: JOINT_X,
                        y,
                    });
                    y += LINE_SPACING;
                }
            }

            y += BLOCK_SPACING;
        }

        Self { lines, end_y: y }
    }
}

pub struct FrameAnnotator {
    max_hands: usize,
}

impl FrameAnnotator {
    pub fn new(max_hands: usize) -> Self {
        Self { max_hands }
    }

    /// Draws joints and bones of each normalized hand in image pixel space.
    ///
    /// Returns the number of hands drawn.
    pub fn draw_skeleton(&self, frame: &mut RgbImage, hands: &[Hand]) -> usize {
        let (width, height) = (frame.width() as f64, frame.height() as f64);
        let to_pixel = |hand: &Hand, index: usize| {
            let joint = &hand.joints[index];
            Point::new(
                (joint.x * width).round() as i32,
                (joint.y * height).round() as i32,
            )
        };

        let mut drawn = 0;
        for hand in hands.iter().take(self.max_hands) {
            for bone in drawable_bones(hand.len()) {
                let line = Line::new(to_pixel(hand, bone.0), to_pixel(hand, bone.1)).into_styled(
                    PrimitiveStyle::with_stroke(rgb888(color_of(bone).rgb()), BONE_WIDTH),
                );
                paint(frame, &line);
            }

            let joint_style = PrimitiveStyleBuilder::new()
                .fill_color(JOINT_FILL)
                .stroke_color(JOINT_RING)
                .stroke_width(1)
                .build();
            for index in 0..hand.len() {
                let dot = Circle::with_center(to_pixel(hand, index), JOINT_DIAMETER)
                    .into_styled(joint_style);
                paint(frame, &dot);
            }
            drawn += 1;
        }
        drawn
    }

    /// Writes the key joint coordinates of each world hand, one block per hand.
    pub fn draw_world_readout(&self, frame: &mut RgbImage, hands: &[Hand]) -> ReadoutLayout {
        let layout = ReadoutLayout::for_hands(hands);

        let header_style = MonoTextStyle::new(&FONT_9X15_BOLD, HEADER_COLOR);
        let text_style = MonoTextStyle::new(&FONT_7X13, TEXT_COLOR);
        for line in &layout.lines {
            let style = match line.kind {
                LineKind::Header => header_style,
                LineKind::Joint => text_style,
            };
            paint(frame, &Text::new(&line.text, Point::new(line.x, line.y), style));
        }
        layout
    }

    pub fn draw_fps(&self, frame: &mut RgbImage, fps: f64) {
        let text = format!("FPS: {:.1}", fps);
        let anchor = Point::new(frame.width() as i32 - FPS_MARGIN, FPS_Y);
        let style = MonoTextStyle::new(&FONT_9X15_BOLD, FPS_COLOR);
        paint(frame, &Text::new(&text, anchor, style));
    }
}
