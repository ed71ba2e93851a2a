// Demo pattern - Stand-in shade producer for the window frontend
//
// Generates diagonal shade bands that scroll one pixel per frame, plus a
// block that toggles between shade 3 and shade 0 every few frames so the
// ghosting is easy to see.

use super::error::DisplayError;
use super::shade::{ShadeBuffer, ShadeMatrix, ShadeSource};

/// Width of one diagonal band in pixels
const BAND_WIDTH: usize = 8;

/// Frames between block toggles
const BLINK_PERIOD: u64 = 15;

/// Side length of the blinking block
const BLOCK_SIZE: usize = 24;

/// Scrolling test pattern
#[derive(Debug, Clone)]
pub struct PatternSource {
    shades: ShadeBuffer,
    frame: u64,
}

impl PatternSource {
    pub fn new(width: usize, height: usize) -> Self {
        let mut source = Self {
            shades: ShadeBuffer::new(width, height),
            frame: 0,
        };
        source.draw();
        source
    }

    /// Frames generated since creation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance to the next frame
    pub fn step(&mut self) {
        self.frame += 1;
        self.draw();
    }

    fn draw(&mut self) {
        let (width, height) = (self.shades.width(), self.shades.height());
        let shift = self.frame as usize;

        for y in 0..height {
            for x in 0..width {
                let band = (x + y + shift) / BAND_WIDTH;
                self.shades.set(x, y, (band % 4) as u8);
            }
        }

        let lit = (self.frame / BLINK_PERIOD) % 2 == 0;
        let block_w = BLOCK_SIZE.min(width);
        let block_h = BLOCK_SIZE.min(height);
        let x0 = (width - block_w) / 2;
        let y0 = (height - block_h) / 2;
        for y in y0..y0 + block_h {
            for x in x0..x0 + block_w {
                self.shades.set(x, y, if lit { 3 } else { 0 });
            }
        }
    }
}

impl ShadeSource for PatternSource {
    fn with_shades<R>(&self, f: impl FnOnce(ShadeMatrix<'_>) -> R) -> Result<R, DisplayError> {
        self.shades.with_shades(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_valid() {
        let mut source = PatternSource::new(40, 30);
        for _ in 0..40 {
            source.with_shades(|m| assert!(m.validate().is_ok())).unwrap();
            source.step();
        }
        assert_eq!(source.frame(), 40);
    }

    #[test]
    fn test_block_blinks() {
        let mut source = PatternSource::new(40, 40);
        assert_eq!(source.with_shades(|m| m.get(20, 20)), Ok(3));

        for _ in 0..BLINK_PERIOD {
            source.step();
        }
        assert_eq!(source.with_shades(|m| m.get(20, 20)), Ok(0));
    }

    #[test]
    fn test_bands_scroll() {
        let mut source = PatternSource::new(40, 40);
        let before = source.with_shades(|m| m.get(0, 0)).unwrap();
        for _ in 0..BAND_WIDTH {
            source.step();
        }
        let after = source.with_shades(|m| m.get(0, 0)).unwrap();
        assert_eq!(after, (before + 1) % 4);
    }

    #[test]
    fn test_tiny_display() {
        let source = PatternSource::new(3, 2);
        assert_eq!(source.with_shades(|m| m.codes().to_vec()), Ok(vec![3; 6]));
    }
}
