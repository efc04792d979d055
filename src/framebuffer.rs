// PulseWatch - 1-bit Frame Buffer
//
// In-memory copy of the SSD1306 GDDRAM: 4 pages of 128 columns, one byte per
// column per page, LSB at the top.  Frames are drawn here with
// embedded-graphics and the OLED driver pushes the raw bytes out.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::config::*;

pub struct FrameBuffer {
    buf: [u8; DISPLAY_BUFFER_SIZE],
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    pub fn as_bytes(&self) -> &[u8; DISPLAY_BUFFER_SIZE] {
        &self.buf
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        let (idx, bit) = Self::locate(x, y)?;
        Some(self.buf[idx] & bit != 0)
    }

    /// Number of lit pixels inside the given rectangle.
    pub fn lit_in(&self, x0: u32, y0: u32, width: u32, height: u32) -> usize {
        (y0..y0 + height)
            .flat_map(|y| (x0..x0 + width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) == Some(true))
            .count()
    }

    fn locate(x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        let idx = x as usize + (y as usize / 8) * SCREEN_WIDTH as usize;
        Some((idx, 1 << (y % 8)))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            if let Some((idx, bit)) = Self::locate(point.x as u32, point.y as u32) {
                match color {
                    BinaryColor::On => self.buf[idx] |= bit,
                    BinaryColor::Off => self.buf[idx] &= !bit,
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        self.buf.fill(fill);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_map_to_page_bits() {
        let mut fb = FrameBuffer::new();
        fb.draw_iter([
            Pixel(Point::new(0, 0), BinaryColor::On),
            Pixel(Point::new(5, 9), BinaryColor::On),
            Pixel(Point::new(127, 31), BinaryColor::On),
        ])
        .unwrap();

        let bytes = fb.as_bytes();
        assert_eq!(bytes[0], 0b0000_0001);
        assert_eq!(bytes[128 + 5], 0b0000_0010);
        assert_eq!(bytes[3 * 128 + 127], 0b1000_0000);
        assert_eq!(fb.lit_in(0, 0, 128, 32), 3);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new();
        fb.draw_iter([
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(128, 0), BinaryColor::On),
            Pixel(Point::new(0, 32), BinaryColor::On),
        ])
        .unwrap();
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(fb.pixel(128, 0), None);
    }

    #[test]
    fn clear_fills_every_byte() {
        let mut fb = FrameBuffer::new();
        fb.clear(BinaryColor::On).unwrap();
        assert!(fb.as_bytes().iter().all(|&b| b == 0xFF));
        fb.clear(BinaryColor::Off).unwrap();
        assert_eq!(fb.lit_in(0, 0, 128, 32), 0);
    }
}
