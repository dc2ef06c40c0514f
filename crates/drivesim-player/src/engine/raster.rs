//! Software rasterizer — turns a [`DrawList`] into framebuffer pixels.
//!
//! Framebuffer pixels are 0xAARRGGBB with the alpha byte ignored on output.
//! Source colors with alpha below 0xFF are blended over what is already
//! there.

use crate::game::draw::{DrawCmd, DrawList, TextAlign};

use super::font;

/// Mutable view of a framebuffer
pub struct Canvas<'a> {
    buf: &'a mut [u32],
    width: i32,
    height: i32,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut [u32], width: usize, height: usize) -> Self {
        debug_assert!(buf.len() >= width * height);
        Self {
            buf,
            width: width as i32,
            height: height as i32,
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color | 0xFF000000);
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize;
        let a = color >> 24;
        if a >= 0xFF {
            self.buf[idx] = color;
        } else if a > 0 {
            self.buf[idx] = blend(self.buf[idx], color, a);
        }
    }

    fn hspan(&mut self, x0: i32, x1: i32, y: i32, color: u32) {
        if y < 0 || y >= self.height {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width - 1);
        for x in x0..=x1 {
            self.put_pixel(x, y, color);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for yy in y.max(0)..(y + h).min(self.height) {
            self.hspan(x, x + w - 1, yy, color);
        }
    }

    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.hspan(x, x + w - 1, y, color);
        self.hspan(x, x + w - 1, y + h - 1, color);
        for yy in (y + 1)..(y + h - 1) {
            self.put_pixel(x, yy, color);
            self.put_pixel(x + w - 1, yy, color);
        }
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        for dy in -r..=r {
            let dx = ((r * r - dy * dy) as f32).sqrt() as i32;
            self.hspan(cx - dx, cx + dx, cy + dy, color);
        }
    }

    /// Midpoint circle
    pub fn stroke_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        let (mut x, mut y, mut err) = (r, 0, 1 - r);
        while x >= y {
            for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
                self.put_pixel(cx + px, cy + py, color);
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

    /// Bresenham
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x, y, color);
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

    /// Even-odd scanline fill, sampling at pixel centers
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: u32) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f32::MAX, f32::min).floor().max(0.0) as i32;
        let max_y = points
            .iter()
            .map(|p| p.1)
            .fold(f32::MIN, f32::max)
            .ceil()
            .min(self.height as f32) as i32;

        let mut xs: Vec<f32> = Vec::with_capacity(points.len());
        for y in min_y..max_y {
            let sy = y as f32 + 0.5;
            xs.clear();
            for i in 0..points.len() {
                let (ax, ay) = points[i];
                let (bx, by) = points[(i + 1) % points.len()];
                if (ay <= sy && by > sy) || (by <= sy && ay > sy) {
                    xs.push(ax + (sy - ay) / (by - ay) * (bx - ax));
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.chunks_exact(2) {
                let x0 = (pair[0] - 0.5).ceil() as i32;
                let x1 = (pair[1] - 0.5).floor() as i32;
                if x1 >= x0 {
                    self.hspan(x0, x1, y, color);
                }
            }
        }
    }

    /// Rasterize a whole list in order
    pub fn draw(&mut self, list: &DrawList) {
        for cmd in list.cmds() {
            match cmd {
                DrawCmd::FillRect { x, y, w, h, color } => {
                    self.fill_rect(round(*x), round(*y), round(*w), round(*h), *color)
                }
                DrawCmd::StrokeRect { x, y, w, h, color } => {
                    self.stroke_rect(round(*x), round(*y), round(*w), round(*h), *color)
                }
                DrawCmd::FillCircle { cx, cy, r, color } => {
                    self.fill_circle(round(*cx), round(*cy), round(*r), *color)
                }
                DrawCmd::StrokeCircle { cx, cy, r, color } => {
                    self.stroke_circle(round(*cx), round(*cy), round(*r), *color)
                }
                DrawCmd::FillPolygon { points, color } => self.fill_polygon(points, *color),
                DrawCmd::Line { x0, y0, x1, y1, color } => {
                    self.line(round(*x0), round(*y0), round(*x1), round(*y1), *color)
                }
                DrawCmd::Text { x, y, text, color, align, scale } => {
                    let scale = (*scale).max(1) as i32;
                    let x = match align {
                        TextAlign::Left => round(*x),
                        TextAlign::Center => round(*x) - font::text_width_scaled(text, scale) / 2,
                    };
                    font::draw_text_scaled(self, x, round(*y), text, *color, scale);
                }
            }
        }
    }
}

#[inline]
fn round(v: f32) -> i32 {
    v.round() as i32
}

/// Blend `src` over `dst` with alpha `a` (0..=255)
fn blend(dst: u32, src: u32, a: u32) -> u32 {
    let inv_a = 255 - a;
    let channel = |shift: u32| {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        ((s * a + d * inv_a) / 255) << shift
    };
    0xFF000000 | channel(16) | channel(8) | channel(0)
}
