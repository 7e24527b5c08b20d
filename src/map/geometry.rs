use crate::braille::BrailleCanvas;

/// Bresenham line between two dot positions
pub fn draw_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32)) {
    let (x1, y1) = to;
    let dx = (x1 - from.0).abs();
    let dy = -(y1 - from.1).abs();
    let sx = if from.0 < x1 { 1 } else { -1 };
    let sy = if from.1 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = from;

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Dotted variant: every `stride`-th dot of each segment
pub fn draw_dashed_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32), stride: usize) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    for i in (0..=steps).step_by(stride.max(1)) {
        let t = i as f64 / steps as f64;
        let x = from.0 as f64 + (to.0 - from.0) as f64 * t;
        let y = from.1 as f64 + (to.1 - from.1) as f64 * t;
        canvas.set_pixel_signed(x.round() as i32, y.round() as i32);
    }
}

/// Connect consecutive points, skipping segments longer than `max_jump`
/// (a wrap across the map edge) and segments clearly off screen.
pub fn draw_polyline<F>(canvas: &mut BrailleCanvas, points: &[(i32, i32)], max_jump: i32, visible: F, dashed: bool)
where
    F: Fn((i32, i32), (i32, i32)) -> bool,
{
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let jump = (a.0 - b.0).abs() + (a.1 - b.1).abs();
        if jump >= max_jump || !visible(a, b) {
            continue;
        }
        if dashed {
            draw_dashed_line(canvas, a, b, 3);
        } else {
            draw_line(canvas, a, b);
        }
    }
}
