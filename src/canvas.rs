use crate::font::{self, ADVANCE, GLYPH_WIDTH};
use image::{Rgba, RgbaImage};

/// Check / cross marks used in the attendance lists
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mark {
    Check,
    Cross,
}

/// Clipping pixel operations over an `RgbaImage`. All coordinates are signed
/// so shapes may hang off the edges
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Canvas {
            image: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(i64::from(self.width()));
        let y1 = (y + height).min(i64::from(self.height()));

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px as u32, py as u32, color);
            }
        }
    }

    /// Horizontal rule of `thickness` pixels centred on `y`
    pub fn hline(&mut self, x0: i64, x1: i64, y: i64, thickness: u32, color: Rgba<u8>) {
        let t = i64::from(thickness);
        self.fill_rect(x0, y - t / 2, x1 - x0, t, color);
    }

    /// Vertical rule of `thickness` pixels centred on `x`
    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, thickness: u32, color: Rgba<u8>) {
        let t = i64::from(thickness);
        self.fill_rect(x - t / 2, y0, t, y1 - y0, color);
    }

    /// Outline with square corners; the stroke is centred on the edges
    pub fn stroke_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, thickness: u32, color: Rgba<u8>) {
        let t = i64::from(thickness);
        let (left, right) = (x0 - t / 2, x1 + t - t / 2);
        let (top, bottom) = (y0 - t / 2, y1 + t - t / 2);

        self.hline(left, right, y0, thickness, color);
        self.hline(left, right, y1, thickness, color);
        self.vline(x0, top, bottom, thickness, color);
        self.vline(x1, top, bottom, thickness, color);
    }

    /// Bresenham line stamped with a square brush
    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), thickness: u32, color: Rgba<u8>) {
        let t = i64::from(thickness.max(1));
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.fill_rect(x - t / 2, y - t / 2, t, t, color);
            if (x, y) == to {
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

    /// Draws `mark` inside the `size` x `size` box at (x, y)
    pub fn mark(&mut self, mark: Mark, x: i64, y: i64, size: u32, color: Rgba<u8>) {
        let s = i64::from(size);
        let thickness = (size / 5).max(1);
        let at = |fx: i64, fy: i64| (x + s * fx / 6, y + s * fy / 6);

        match mark {
            Mark::Check => {
                self.line(at(1, 3), at(2, 5), thickness, color);
                self.line(at(2, 5), at(5, 1), thickness, color);
            }
            Mark::Cross => {
                self.line(at(1, 1), at(5, 5), thickness, color);
                self.line(at(5, 1), at(1, 5), thickness, color);
            }
        }
    }

    /// Draws `text` with its top-left corner at (x, y)
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgba<u8>) {
        let s = i64::from(scale);
        let mut cursor = x;

        for ch in text.chars() {
            for (row, &bits) in font::glyph(ch).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1u8 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(cursor + i64::from(col) * s, y + row as i64 * s, s, s, color);
                    }
                }
            }
            cursor += i64::from(ADVANCE) * s;
        }
    }

    /// `text` with its right edge at `right`
    pub fn text_right(&mut self, right: i64, y: i64, text: &str, scale: u32, color: Rgba<u8>) {
        let width = i64::from(font::text_width(text, scale));
        self.text(right - width, y, text, scale, color);
    }

    /// `text` horizontally centred on `center`
    pub fn text_centered(&mut self, center: i64, y: i64, text: &str, scale: u32, color: Rgba<u8>) {
        let width = i64::from(font::text_width(text, scale));
        self.text(center - width / 2, y, text, scale, color);
    }
}
