// src/raster.rs

//! Software rasterisation of drawing primitives into a sprite surface.
//!
//! All public operations take internal surface coordinates: "OS units"
//! at twice pixel resolution with the origin at the bottom-left. The
//! unit-to-pixel mapping is `column = ux / 2`, `row = height - uy / 2`,
//! chosen so the session's game-pixel transform round-trips exactly.
//! Everything honours an optional clip rectangle and the surface bounds;
//! out-of-range output is dropped, never an error.

use crate::sprite::SpriteArea;

/// An inclusive clip rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelClip {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelClip {
    fn allows(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Maps an OS-unit point to a pixel column and row.
pub fn unit_to_pixel(height: i32, ux: i32, uy: i32) -> (i32, i32) {
    (ux >> 1, height - (uy >> 1))
}

/// The inverse mapping, used for hit-testing.
pub fn pixel_to_unit(height: i32, px: i32, py: i32) -> (i32, i32) {
    (2 * px, 2 * (height - py))
}

fn put_pixel(surface: &mut SpriteArea, clip: Option<PixelClip>, x: i32, y: i32, colour: u8) {
    if let Some(clip) = clip {
        if !clip.allows(x, y) {
            return;
        }
    }
    surface.set_pixel(x, y, colour);
}

fn fill_span(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    y: i32,
    mut x0: i32,
    mut x1: i32,
    colour: u8,
) {
    if let Some(clip) = clip {
        if y < clip.y0 || y > clip.y1 {
            return;
        }
        x0 = x0.max(clip.x0);
        x1 = x1.min(clip.x1);
    }
    surface.fill_span(y, x0, x1, colour);
}

/// Plots a single point.
pub fn plot_point(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    ux: i32,
    uy: i32,
    colour: u8,
) {
    let (x, y) = unit_to_pixel(surface.height(), ux, uy);
    put_pixel(surface, clip, x, y, colour);
}

/// Draws a straight line between two unit points (Bresenham).
pub fn draw_line(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    from: (i32, i32),
    to: (i32, i32),
    colour: u8,
) {
    let height = surface.height();
    let (mut x0, mut y0) = unit_to_pixel(height, from.0, from.1);
    let (x1, y1) = unit_to_pixel(height, to.0, to.1);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(surface, clip, x0, y0, colour);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Fills the axis-aligned rectangle with the two unit points as
/// opposite corners (inclusive).
pub fn fill_rect(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    a: (i32, i32),
    b: (i32, i32),
    colour: u8,
) {
    let height = surface.height();
    let (ax, ay) = unit_to_pixel(height, a.0, a.1);
    let (bx, by) = unit_to_pixel(height, b.0, b.1);

    let (x0, x1) = (ax.min(bx), ax.max(bx));
    let (y0, y1) = (ay.min(by), ay.max(by));

    for y in y0..=y1 {
        fill_span(surface, clip, y, x0, x1, colour);
    }
}

/// Fills a circle given its centre and a point on its circumference.
pub fn fill_circle(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    centre: (i32, i32),
    edge: (i32, i32),
    colour: u8,
) {
    let height = surface.height();
    let (cx, cy) = unit_to_pixel(height, centre.0, centre.1);
    let (ex, ey) = unit_to_pixel(height, edge.0, edge.1);
    let radius = (((ex - cx).pow(2) + (ey - cy).pow(2)) as f64).sqrt().round() as i32;

    for dy in -radius..=radius {
        let dx = (((radius * radius - dy * dy) as f64).sqrt()) as i32;
        fill_span(surface, clip, cy + dy, cx - dx, cx + dx, colour);
    }
}

/// Draws a circle outline given its centre and a point on its
/// circumference (midpoint algorithm).
pub fn outline_circle(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    centre: (i32, i32),
    edge: (i32, i32),
    colour: u8,
) {
    let height = surface.height();
    let (cx, cy) = unit_to_pixel(height, centre.0, centre.1);
    let (ex, ey) = unit_to_pixel(height, edge.0, edge.1);
    let radius = (((ex - cx).pow(2) + (ey - cy).pow(2)) as f64).sqrt().round() as i32;

    if radius <= 0 {
        put_pixel(surface, clip, cx, cy, colour);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx - x, cy + y),
            (cx + x, cy - y),
            (cx - x, cy - y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx + y, cy - x),
            (cx - y, cy - x),
        ] {
            put_pixel(surface, clip, px, py, colour);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Fills a set of closed contours using the non-zero winding rule.
/// Contours are unit-space point lists; each is closed implicitly.
pub fn fill_contours(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    contours: &[Vec<(i32, i32)>],
    colour: u8,
) {
    let height = surface.height();
    let pixel_contours: Vec<Vec<(i32, i32)>> = contours
        .iter()
        .map(|points| {
            points
                .iter()
                .map(|&(ux, uy)| unit_to_pixel(height, ux, uy))
                .collect()
        })
        .collect();

    let mut y_min = i32::MAX;
    let mut y_max = i32::MIN;
    for contour in &pixel_contours {
        for &(_, y) in contour {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if y_min > y_max {
        return;
    }

    // Crossings per scanline: (column, winding direction).
    let mut crossings: Vec<(i32, i32)> = Vec::new();

    for y in y_min..=y_max {
        crossings.clear();

        for contour in &pixel_contours {
            if contour.len() < 2 {
                continue;
            }
            for i in 0..contour.len() {
                let a = contour[i];
                let b = contour[(i + 1) % contour.len()];
                if a.1 == b.1 {
                    continue;
                }

                let (top, bottom, dir) = if a.1 < b.1 { (a, b, 1) } else { (b, a, -1) };

                // Half-open rule: a scanline at the shared vertex of two
                // edges crosses exactly one of them.
                if y >= top.1 && y < bottom.1 {
                    let x = top.0 as i64
                        + (y - top.1) as i64 * (bottom.0 - top.0) as i64
                            / (bottom.1 - top.1) as i64;
                    crossings.push((x as i32, dir));
                }
            }
        }

        crossings.sort_unstable();

        let mut winding = 0;
        let mut span_start = None;
        for &(x, dir) in &crossings {
            let was_inside = winding != 0;
            winding += dir;
            if !was_inside && winding != 0 {
                span_start = Some(x);
            } else if was_inside && winding == 0 {
                if let Some(start) = span_start.take() {
                    fill_span(surface, clip, y, start, x, colour);
                }
            }
        }
    }
}

/// Strokes a polyline with a given width in OS units. Segments thicker
/// than one pixel become filled quads with square caps; one-pixel
/// strokes fall back to plain lines.
pub fn stroke_polyline(
    surface: &mut SpriteArea,
    clip: Option<PixelClip>,
    points: &[(i32, i32)],
    closed: bool,
    width_units: i32,
    colour: u8,
) {
    if points.len() < 2 {
        if let Some(&point) = points.first() {
            plot_point(surface, clip, point.0, point.1, colour);
        }
        return;
    }

    let segments = segment_pairs(points, closed);
    let half_width = (width_units.max(0) as f64) / 2.0;

    // Strokes of a pixel or less get the plain line rasteriser.
    if width_units <= 2 {
        for (a, b) in segments {
            draw_line(surface, clip, a, b, colour);
        }
        return;
    }

    for (a, b) in segments {
        let dx = (b.0 - a.0) as f64;
        let dy = (b.1 - a.1) as f64;
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            continue;
        }

        // Unit direction and perpendicular, with square caps extending
        // each end by half the width.
        let (ux, uy) = (dx / length, dy / length);
        let (px, py) = (-uy * half_width, ux * half_width);
        let (ex, ey) = (ux * half_width, uy * half_width);

        let quad = vec![
            (
                (a.0 as f64 - ex + px).round() as i32,
                (a.1 as f64 - ey + py).round() as i32,
            ),
            (
                (b.0 as f64 + ex + px).round() as i32,
                (b.1 as f64 + ey + py).round() as i32,
            ),
            (
                (b.0 as f64 + ex - px).round() as i32,
                (b.1 as f64 + ey - py).round() as i32,
            ),
            (
                (a.0 as f64 - ex - px).round() as i32,
                (a.1 as f64 - ey - py).round() as i32,
            ),
        ];

        fill_contours(surface, clip, &[quad], colour);
    }
}

fn segment_pairs(points: &[(i32, i32)], closed: bool) -> Vec<((i32, i32), (i32, i32))> {
    let mut segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && points.len() > 2 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                segments.push((last, first));
            }
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: i32, height: i32) -> SpriteArea {
        SpriteArea::new(width, height, false).unwrap()
    }

    // Convenience: transform a game pixel to units the way a session does.
    fn units(height: i32, x: i32, y: i32) -> (i32, i32) {
        (2 * x, 2 * (height - y))
    }

    #[test]
    fn test_unit_pixel_round_trip() {
        // Contract: the forward transform followed by the inverse
        // recovers the original game pixel.
        let height = 64;
        for (x, y) in [(0, 0), (10, 20), (63, 63), (31, 0)] {
            let (ux, uy) = units(height, x, y);
            let (px, py) = unit_to_pixel(height, ux, uy);
            assert_eq!((px, py), (x, y));
            assert_eq!(pixel_to_unit(height, px, py), (ux, uy));
        }
    }

    #[test]
    fn test_plot_point_lands_on_game_pixel() {
        let mut surf = surface(16, 16);
        let (ux, uy) = units(16, 3, 5);
        plot_point(&mut surf, None, ux, uy, 9);
        assert_eq!(surf.pixel(3, 5), 9);
    }

    #[test]
    fn test_fill_rect_inclusive_corners() {
        let mut surf = surface(16, 16);
        fill_rect(&mut surf, None, units(16, 2, 2), units(16, 5, 4), 1);

        for y in 2..=4 {
            for x in 2..=5 {
                assert_eq!(surf.pixel(x, y), 1, "pixel {},{}", x, y);
            }
        }
        assert_eq!(surf.pixel(1, 2), 0);
        assert_eq!(surf.pixel(6, 2), 0);
        assert_eq!(surf.pixel(2, 5), 0);
    }

    #[test]
    fn test_clip_masks_fill() {
        let mut surf = surface(16, 16);
        let clip = PixelClip { x0: 4, y0: 4, x1: 7, y1: 7 };
        fill_rect(&mut surf, Some(clip), units(16, 0, 0), units(16, 15, 15), 2);

        assert_eq!(surf.pixel(4, 4), 2);
        assert_eq!(surf.pixel(7, 7), 2);
        assert_eq!(surf.pixel(3, 4), 0);
        assert_eq!(surf.pixel(8, 7), 0);
        assert_eq!(surf.pixel(4, 3), 0);
    }

    #[test]
    fn test_horizontal_line() {
        let mut surf = surface(16, 16);
        draw_line(&mut surf, None, units(16, 1, 8), units(16, 10, 8), 3);
        for x in 1..=10 {
            assert_eq!(surf.pixel(x, 8), 3);
        }
        assert_eq!(surf.pixel(0, 8), 0);
        assert_eq!(surf.pixel(11, 8), 0);
    }

    #[test]
    fn test_diagonal_line_endpoints() {
        let mut surf = surface(16, 16);
        draw_line(&mut surf, None, units(16, 2, 3), units(16, 9, 12), 4);
        assert_eq!(surf.pixel(2, 3), 4);
        assert_eq!(surf.pixel(9, 12), 4);
    }

    #[test]
    fn test_fill_contours_square() {
        let mut surf = surface(16, 16);
        let square = vec![
            units(16, 2, 2),
            units(16, 10, 2),
            units(16, 10, 10),
            units(16, 2, 10),
        ];
        fill_contours(&mut surf, None, &[square], 5);

        // Interior filled.
        assert_eq!(surf.pixel(5, 5), 5);
        assert_eq!(surf.pixel(2, 2), 5);
        // Well outside stays clear.
        assert_eq!(surf.pixel(12, 12), 0);
        assert_eq!(surf.pixel(1, 5), 0);
    }

    #[test]
    fn test_fill_circle_centre_and_extent() {
        let mut surf = surface(32, 32);
        fill_circle(&mut surf, None, units(32, 16, 16), units(32, 21, 16), 6);

        assert_eq!(surf.pixel(16, 16), 6);
        assert_eq!(surf.pixel(20, 16), 6);
        assert_eq!(surf.pixel(16, 20), 6);
        assert_eq!(surf.pixel(26, 16), 0);
    }

    #[test]
    fn test_outline_circle_leaves_centre_clear() {
        let mut surf = surface(32, 32);
        outline_circle(&mut surf, None, units(32, 16, 16), units(32, 22, 16), 7);

        assert_eq!(surf.pixel(16, 16), 0);
        assert_eq!(surf.pixel(22, 16), 7);
        assert_eq!(surf.pixel(10, 16), 7);
    }

    #[test]
    fn test_thick_stroke_covers_width() {
        let mut surf = surface(32, 32);
        // A horizontal stroke 8 units (4 pixels) wide through row 16.
        stroke_polyline(
            &mut surf,
            None,
            &[units(32, 4, 16), units(32, 27, 16)],
            false,
            8,
            8,
        );

        assert_eq!(surf.pixel(15, 16), 8);
        assert_eq!(surf.pixel(15, 15), 8);
        assert_eq!(surf.pixel(15, 17), 8);
        assert_eq!(surf.pixel(15, 25), 0);
    }
}
