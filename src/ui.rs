// src/ui.rs - Video panel and 3D plot painting
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use image::RgbImage;
use nalgebra::Vector3;

use crate::renderer::{MarkerShape, Plot3d, ViewAngles};

/// Degrees of rotation per dragged point.
pub const DRAG_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub error: Color32,
    pub success: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub plot_background: Color32,
    pub plot_ink: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            error: Color32::from_rgb(244, 67, 54),
            success: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
            plot_background: Color32::WHITE,
            plot_ink: Color32::BLACK,
        }
    }
}

fn with_alpha(rgb: [u8; 3], alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

/// Orthographic projection for the given view angles, with z pointing up.
///
/// Returns the horizontal and vertical screen offsets (in world units, y up) and the depth
/// towards the viewer.
pub fn project(point: &Vector3<f64>, view: ViewAngles) -> (f64, f64, f64) {
    let (sin_e, cos_e) = view.elevation.to_radians().sin_cos();
    let (sin_a, cos_a) = view.azimuth.to_radians().sin_cos();

    let eye = Vector3::new(cos_e * cos_a, cos_e * sin_a, sin_e);
    let right = Vector3::new(-sin_a, cos_a, 0.0);
    let up = Vector3::new(-sin_e * cos_a, -sin_e * sin_a, cos_e);

    (point.dot(&right), point.dot(&up), point.dot(&eye))
}

struct Projector {
    center: Pos2,
    scale: f32,
    view: ViewAngles,
}

impl Projector {
    fn new(rect: Rect, half_extent: f64, view: ViewAngles) -> Self {
        // The cube's projected half-diagonal never exceeds sqrt(3) times its half-extent.
        let scale = 0.5 * rect.width().min(rect.height()) / (half_extent * 3f64.sqrt()) as f32;
        Self {
            center: rect.center(),
            scale,
            view,
        }
    }

    fn to_screen(&self, point: &Vector3<f64>) -> (Pos2, f64) {
        let (x, y, depth) = project(point, self.view);
        (
            Pos2::new(
                self.center.x + x as f32 * self.scale,
                self.center.y - y as f32 * self.scale,
            ),
            depth,
        )
    }
}

enum Primitive {
    Line {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    Dot {
        at: Pos2,
        radius: f32,
        color: Color32,
        shape: MarkerShape,
    },
}

/// Paints the 3D plot into the available space. Dragging the returned response orbits the view.
pub fn show_plot(
    ui: &mut egui::Ui,
    theme: &Theme,
    plot: Option<&Plot3d>,
    view: ViewAngles,
) -> egui::Response {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
    let rect = response.rect;
    painter.rect_filled(rect, 4.0, theme.plot_background);

    let Some(plot) = plot else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "3D view stopped",
            egui::FontId::proportional(16.0),
            theme.plot_ink,
        );
        return response;
    };

    painter.text(
        Pos2::new(rect.center().x, rect.top() + 16.0),
        egui::Align2::CENTER_CENTER,
        plot.axes.title,
        egui::FontId::proportional(18.0),
        theme.plot_ink,
    );

    let [(x0, x1), (y0, y1), (z0, z1)] = plot.axes.limits;
    let half_extent = [x1 - x0, y1 - y0, z1 - z0]
        .into_iter()
        .fold(0.0, f64::max)
        / 2.0;
    let plot_rect = rect.shrink2(Vec2::new(24.0, 40.0));
    let projector = Projector::new(plot_rect, half_extent, view);

    // Grid on the floor pane
    let grid = with_alpha([128, 128, 128], plot.axes.grid_alpha);
    let steps = 6;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = x0 + (x1 - x0) * t;
        let y = y0 + (y1 - y0) * t;
        let (a, _) = projector.to_screen(&Vector3::new(x, y0, z0));
        let (b, _) = projector.to_screen(&Vector3::new(x, y1, z0));
        painter.line_segment([a, b], Stroke::new(1.0, grid));
        let (a, _) = projector.to_screen(&Vector3::new(x0, y, z0));
        let (b, _) = projector.to_screen(&Vector3::new(x1, y, z0));
        painter.line_segment([a, b], Stroke::new(1.0, grid));
    }

    if plot.axes.fill_panes {
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
            .map(|(x, y)| projector.to_screen(&Vector3::new(x, y, z0)).0);
        painter.add(egui::Shape::convex_polygon(
            corners.to_vec(),
            with_alpha([230, 230, 230], 0.5),
            Stroke::NONE,
        ));
    }

    // Bounding cube
    let corner = |i: usize| {
        Vector3::new(
            if i & 1 == 0 { x0 } else { x1 },
            if i & 2 == 0 { y0 } else { y1 },
            if i & 4 == 0 { z0 } else { z1 },
        )
    };
    let edge_stroke = Stroke::new(1.0, with_alpha([90, 90, 90], 0.6));
    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                let (a, _) = projector.to_screen(&corner(i));
                let (b, _) = projector.to_screen(&corner(i | bit));
                painter.line_segment([a, b], edge_stroke);
            }
        }
    }

    let axis_font = egui::FontId::proportional(13.0);
    let label_anchors = [
        Vector3::new((x0 + x1) / 2.0, y0, z0),
        Vector3::new(x1, (y0 + y1) / 2.0, z0),
        Vector3::new(x0, y1, (z0 + z1) / 2.0),
    ];
    for (text, anchor) in plot.axes.labels.iter().zip(label_anchors) {
        let (pos, _) = projector.to_screen(&anchor);
        painter.text(
            pos,
            egui::Align2::CENTER_CENTER,
            *text,
            axis_font.clone(),
            theme.plot_ink,
        );
    }

    // Scene, painted back to front
    let mut primitives: Vec<(f64, Primitive)> = Vec::new();
    for segment in &plot.segments {
        let (from, d0) = projector.to_screen(&segment.start);
        let (to, d1) = projector.to_screen(&segment.end);
        primitives.push((
            (d0 + d1) / 2.0,
            Primitive::Line {
                from,
                to,
                stroke: Stroke::new(segment.width, with_alpha(segment.color.rgb(), segment.alpha)),
            },
        ));
    }
    for marker in &plot.markers {
        let (at, depth) = projector.to_screen(&marker.position);
        primitives.push((
            depth,
            Primitive::Dot {
                at,
                // Marker sizes are areas, as in scatter plots.
                radius: marker.size.sqrt() / 2.0,
                color: with_alpha(marker.color, marker.alpha),
                shape: marker.shape,
            },
        ));
    }
    primitives.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, primitive) in primitives {
        match primitive {
            Primitive::Line { from, to, stroke } => painter.line_segment([from, to], stroke),
            Primitive::Dot {
                at,
                radius,
                color,
                shape: MarkerShape::Circle,
            } => painter.circle_filled(at, radius, color),
            Primitive::Dot {
                at,
                radius,
                color,
                shape: MarkerShape::Cross,
            } => {
                let stroke = Stroke::new(2.0, color);
                painter.line_segment([at - Vec2::splat(radius), at + Vec2::splat(radius)], stroke);
                painter.line_segment(
                    [
                        at + Vec2::new(-radius, radius),
                        at + Vec2::new(radius, -radius),
                    ],
                    stroke,
                );
            }
        }
    }

    for label in &plot.labels {
        let (pos, _) = projector.to_screen(&label.position);
        painter.text(
            pos,
            egui::Align2::LEFT_BOTTOM,
            &label.text,
            egui::FontId::proportional(13.0),
            theme.plot_ink,
        );
    }

    response
}

// Custom widget for video display
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    aspect_ratio: f32,
}

impl VideoWidget {
    pub fn new() -> Self {
        Self {
            texture: None,
            aspect_ratio: 16.0 / 9.0,
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &RgbImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());
        if frame.height() > 0 {
            self.aspect_ratio = frame.width() as f32 / frame.height() as f32;
        }

        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()))
            }
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let available_size = ui.available_size();
        let widget_width = available_size.x.min(available_size.y * self.aspect_ratio);
        let widget_height = widget_width / self.aspect_ratio;

        let size = Vec2::new(widget_width, widget_height);
        let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        } else {
            ui.painter().rect_filled(rect, 4.0, Color32::from_rgb(50, 50, 55));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No Video Signal",
                egui::FontId::proportional(16.0),
                Color32::from_rgb(150, 150, 155),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn origin_projects_to_center() {
        let (x, y, depth) = project(&Vector3::zeros(), ViewAngles::default());
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(depth, 0.0);
    }

    #[test]
    fn z_axis_points_up_on_screen() {
        let (x, y, _) = project(&Vector3::new(0.0, 0.0, 0.1), ViewAngles::default());
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.1 * 20f64.to_radians().cos(), epsilon = 1e-12);
    }

    #[test]
    fn side_view_shows_y_to_the_right() {
        let view = ViewAngles {
            elevation: 0.0,
            azimuth: 0.0,
        };
        let (x, y, depth) = project(&Vector3::new(0.0, 0.1, 0.0), view);
        assert_relative_eq!(x, 0.1);
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(depth, 0.0);

        // Points along +x face the viewer
        let (_, _, depth) = project(&Vector3::new(0.1, 0.0, 0.0), view);
        assert_relative_eq!(depth, 0.1);
    }

    #[test]
    fn projection_preserves_lengths() {
        let view = ViewAngles {
            elevation: 35.0,
            azimuth: -120.0,
        };
        let point = Vector3::new(0.03, -0.07, 0.11);
        let (x, y, depth) = project(&point, view);
        assert_relative_eq!((x * x + y * y + depth * depth).sqrt(), point.norm(), epsilon = 1e-12);
    }
}
