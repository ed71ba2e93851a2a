// LCD Palette - Base color and shade-to-alpha quantization
//
// The display is drawn as a single base color whose alpha channel carries
// the brightness. Shade codes 0-3 are quantized linearly into 8-bit alpha,
// so shade 3 is fully opaque base color and shade 0 is fully transparent.

use super::error::DisplayError;

/// Highest shade code a producer may emit
pub const MAX_SHADE: u8 = 3;

/// Number of distinct shade levels
pub const SHADE_LEVELS: usize = MAX_SHADE as usize + 1;

/// Base color of the original DMG panel (dark green, 0x0F380F)
pub const DMG_BASE_COLOR: [u8; 3] = [0x0F, 0x38, 0x0F];

/// Alpha added per shade level (255 / 3)
pub const DMG_ALPHA_STEP: u8 = 85;

/// Default palette used by [`FrameCompositor::new`](super::FrameCompositor::new)
pub const DMG_PALETTE: LcdPalette = LcdPalette {
    base: DMG_BASE_COLOR,
    alpha_step: DMG_ALPHA_STEP,
};

/// Fixed base color plus the linear shade multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdPalette {
    base: [u8; 3],
    alpha_step: u8,
}

impl LcdPalette {
    /// Create a palette
    ///
    /// Fails with [`DisplayError::InvalidPalette`] if `alpha_step * 3` does
    /// not fit in a byte.
    pub fn new(base: [u8; 3], alpha_step: u8) -> Result<Self, DisplayError> {
        if alpha_step as u16 * MAX_SHADE as u16 > u8::MAX as u16 {
            return Err(DisplayError::InvalidPalette { alpha_step });
        }
        Ok(Self { base, alpha_step })
    }

    /// Base RGB written into every raster pixel
    pub fn base(&self) -> [u8; 3] {
        self.base
    }

    /// Alpha contributed by each shade level
    pub fn alpha_step(&self) -> u8 {
        self.alpha_step
    }

    /// Alpha for a shade code
    ///
    /// Callers validate `shade <= MAX_SHADE` first; the product cannot
    /// overflow for validated shades because of the check in [`LcdPalette::new`].
    #[inline]
    pub fn alpha_for(&self, shade: u8) -> u8 {
        debug_assert!(shade <= MAX_SHADE, "shade {} out of range", shade);
        shade * self.alpha_step
    }

    /// Alpha for every shade level, indexed by shade code
    pub fn alpha_table(&self) -> [u8; SHADE_LEVELS] {
        [
            self.alpha_for(0),
            self.alpha_for(1),
            self.alpha_for(2),
            self.alpha_for(3),
        ]
    }
}

impl Default for LcdPalette {
    fn default() -> Self {
        DMG_PALETTE
    }
}
