//! Opaque backdrop painted behind the logo.
//!
//! The rounded shape is built as a path (four edges, four quarter arcs,
//! clockwise from the top edge), flattened to a polygon and filled by sampling
//! pixel centers. There is no anti-aliasing, so the output only depends on the
//! geometry.

use std::f64::consts::{FRAC_PI_2, PI};

use image::{Rgba, RgbaImage};

use crate::layout::{round_px, LayoutResult, Rect};

/// Backdrop fill, always fully opaque so no QR module shows through.
pub const BACKDROP_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Corner radius as a fraction of the backdrop side.
pub const CORNER_RADIUS_RATIO: f64 = 0.12;

// Maximum distance between an arc and its chords, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.125;

/// A drawing command in canvas coordinates (y grows downwards).
///
/// Arc angles are in radians; increasing angles sweep clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc { cx: f64, cy: f64, radius: f64, start: f64, end: f64 },
    Close,
}

/// Corner radius for a `width`×`height` backdrop, never more than half the shorter side.
pub fn corner_radius(width: u32, height: u32) -> u32 {
    let radius = round_px(f64::from(width) * CORNER_RADIUS_RATIO).max(0) as u32;
    radius.min(width.min(height) / 2)
}

/// Builds the outline of `rect` with corners rounded by `radius`.
///
/// The radius is clamped again here so callers cannot produce a
/// self-intersecting outline. A zero radius yields a plain rectangle.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> Vec<PathCommand> {
    let x0 = rect.x as f64;
    let y0 = rect.y as f64;
    let x1 = rect.right() as f64;
    let y1 = rect.bottom() as f64;

    let max_radius = f64::from(rect.width.min(rect.height)) / 2.0;
    let r = radius.clamp(0.0, max_radius);

    if r == 0.0 {
        return vec![
            PathCommand::MoveTo { x: x0, y: y0 },
            PathCommand::LineTo { x: x1, y: y0 },
            PathCommand::LineTo { x: x1, y: y1 },
            PathCommand::LineTo { x: x0, y: y1 },
            PathCommand::Close,
        ];
    }

    vec![
        PathCommand::MoveTo { x: x0 + r, y: y0 },
        // top edge, then top-right corner
        PathCommand::LineTo { x: x1 - r, y: y0 },
        PathCommand::Arc { cx: x1 - r, cy: y0 + r, radius: r, start: -FRAC_PI_2, end: 0.0 },
        PathCommand::LineTo { x: x1, y: y1 - r },
        PathCommand::Arc { cx: x1 - r, cy: y1 - r, radius: r, start: 0.0, end: FRAC_PI_2 },
        PathCommand::LineTo { x: x0 + r, y: y1 },
        PathCommand::Arc { cx: x0 + r, cy: y1 - r, radius: r, start: FRAC_PI_2, end: PI },
        PathCommand::LineTo { x: x0, y: y0 + r },
        PathCommand::Arc { cx: x0 + r, cy: y0 + r, radius: r, start: PI, end: PI + FRAC_PI_2 },
        PathCommand::Close,
    ]
}

/// Converts a path into a closed polygon, approximating arcs with chords.
pub fn flatten(path: &[PathCommand]) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for command in path {
        match *command {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => points.push((x, y)),
            PathCommand::Arc { cx, cy, radius, start, end } => {
                let sweep = end - start;
                let step = 2.0 * (radius / (radius + FLATTEN_TOLERANCE)).acos();
                let segments = (sweep.abs() / step).ceil().max(1.0) as usize;
                for i in 1..=segments {
                    let angle = start + sweep * (i as f64) / (segments as f64);
                    points.push((cx + radius * angle.cos(), cy + radius * angle.sin()));
                }
            }
            PathCommand::Close => {}
        }
    }
    points
}

/// Fills `polygon` with `color` using the non-zero winding rule.
///
/// A pixel is painted when its center lies inside the polygon.
pub fn fill_polygon(canvas: &mut RgbaImage, polygon: &[(f64, f64)], color: Rgba<u8>) {
    if polygon.len() < 3 {
        return;
    }

    let min_y = polygon.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = polygon.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let first_row = (min_y.floor().max(0.0)) as u32;
    let last_row = (max_y.ceil().min(f64::from(canvas.height()))) as u32;

    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for row in first_row..last_row {
        let yc = f64::from(row) + 0.5;
        crossings.clear();

        for (i, &(ax, ay)) in polygon.iter().enumerate() {
            let (bx, by) = polygon[(i + 1) % polygon.len()];
            let direction = if ay <= yc && by > yc {
                1
            } else if by <= yc && ay > yc {
                -1
            } else {
                continue;
            };
            let x = ax + (yc - ay) * (bx - ax) / (by - ay);
            crossings.push((x, direction));
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        let mut span_start = 0.0;
        for &(x, direction) in &crossings {
            let was_inside = winding != 0;
            winding += direction;
            if !was_inside && winding != 0 {
                span_start = x;
            } else if was_inside && winding == 0 {
                fill_span(canvas, row, span_start, x, color);
            }
        }
    }
}

// Paints the pixels of `row` whose centers fall in [from, to).
fn fill_span(canvas: &mut RgbaImage, row: u32, from: f64, to: f64, color: Rgba<u8>) {
    let width = f64::from(canvas.width());
    let first = (from - 0.5).ceil().clamp(0.0, width) as u32;
    let end = (to - 0.5).ceil().clamp(0.0, width) as u32;
    for x in first..end {
        canvas.put_pixel(x, row, color);
    }
}

/// Fills `rect` with `color`, clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let x0 = rect.x.clamp(0, i64::from(canvas.width())) as u32;
    let y0 = rect.y.clamp(0, i64::from(canvas.height())) as u32;
    let x1 = rect.right().clamp(0, i64::from(canvas.width())) as u32;
    let y1 = rect.bottom().clamp(0, i64::from(canvas.height())) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Paints the backdrop described by `layout` onto `canvas`.
pub fn paint_backdrop(canvas: &mut RgbaImage, layout: &LayoutResult) {
    if layout.corner_radius == 0 {
        fill_rect(canvas, layout.backdrop, BACKDROP_COLOR);
        return;
    }
    let path = rounded_rect_path(layout.backdrop, f64::from(layout.corner_radius));
    fill_polygon(canvas, &flatten(&path), BACKDROP_COLOR);
}
