// Frame compositor - Shade codes to alpha, with optional LCD ghosting
//
// The compositor owns two buffers sized once at construction:
// - the output raster (base color, alpha rewritten every frame)
// - the previous-alpha buffer (last blended frame's unblended targets)
//
// Blending is a 2-tap filter over targets: each output alpha is the floor
// average of this frame's target and the previous blended frame's target.
// The non-blend path never touches the previous-alpha buffer, so switching
// blending on mid-session averages against whatever was stored the last time
// blending ran (zero if it never did).

use super::error::DisplayError;
use super::palette::{LcdPalette, SHADE_LEVELS};
use super::raster::RgbaRaster;
use super::shade::ShadeMatrix;

/// Converts shade matrices into the alpha channel of an RGBA raster
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    width: usize,
    height: usize,
    palette: LcdPalette,
    /// Alpha for each shade code, precomputed from the palette
    alpha_table: [u8; SHADE_LEVELS],
    previous_alpha: Vec<u8>,
    raster: RgbaRaster,
}

impl FrameCompositor {
    /// Create a compositor with the default DMG palette
    ///
    /// Fails with [`DisplayError::InvalidDimensions`] if either side is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, DisplayError> {
        Self::with_palette(width, height, LcdPalette::default())
    }

    /// Create a compositor with an explicit palette
    pub fn with_palette(
        width: usize,
        height: usize,
        palette: LcdPalette,
    ) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidDimensions {
                width,
                height,
                len: 0,
            });
        }

        Ok(Self {
            width,
            height,
            palette,
            alpha_table: palette.alpha_table(),
            previous_alpha: vec![0; width * height],
            raster: RgbaRaster::new(width, height, palette.base()),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn palette(&self) -> &LcdPalette {
        &self.palette
    }

    /// The output raster, lent for blitting
    pub fn raster(&self) -> &RgbaRaster {
        &self.raster
    }

    /// Unblended targets stored by the last blended render
    pub fn previous_alpha(&self) -> &[u8] {
        &self.previous_alpha
    }

    /// Render one frame into the output raster
    ///
    /// Fails without writing anything if the matrix size differs from the
    /// compositor's, or if any shade code is above 3.
    pub fn render(&mut self, shades: &ShadeMatrix<'_>, blend: bool) -> Result<(), DisplayError> {
        if shades.width() != self.width || shades.height() != self.height {
            return Err(DisplayError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                found_width: shades.width(),
                found_height: shades.height(),
            });
        }
        shades.validate()?;

        let table = &self.alpha_table;
        let codes = shades.codes();

        if blend {
            for ((out, prev), &shade) in self
                .raster
                .alphas_mut()
                .zip(self.previous_alpha.iter_mut())
                .zip(codes)
            {
                let target = table[shade as usize];
                *out = ((*prev as u16 + target as u16) >> 1) as u8;
                *prev = target;
            }
        } else {
            for (out, &shade) in self.raster.alphas_mut().zip(codes) {
                *out = table[shade as usize];
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::palette::DMG_BASE_COLOR;

    fn matrix(codes: &[u8], width: usize) -> ShadeMatrix<'_> {
        ShadeMatrix::new(width, codes.len() / width, codes).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let compositor = FrameCompositor::new(4, 2).unwrap();
        assert!(compositor.previous_alpha().iter().all(|&a| a == 0));
        assert_eq!(compositor.raster().pixel_count(), 8);
        assert_eq!(compositor.raster().pixel(0, 0), [15, 56, 15, 0]);
    }

    #[test]
    fn test_direct_render_maps_shades() {
        let mut compositor = FrameCompositor::new(4, 1).unwrap();
        let codes = [0, 1, 2, 3];
        compositor.render(&matrix(&codes, 4), false).unwrap();

        let alphas: Vec<u8> = compositor.raster().alphas().collect();
        assert_eq!(alphas, vec![0, 85, 170, 255]);
        for x in 0..4 {
            assert_eq!(compositor.raster().pixel(x, 0)[..3], DMG_BASE_COLOR);
        }
    }

    #[test]
    fn test_direct_render_leaves_previous_alpha() {
        let mut compositor = FrameCompositor::new(2, 1).unwrap();
        compositor.render(&matrix(&[3, 3], 2), false).unwrap();
        assert_eq!(compositor.previous_alpha(), &[0, 0]);
    }

    #[test]
    fn test_blend_sequence() {
        let mut compositor = FrameCompositor::new(1, 1).unwrap();

        compositor.render(&matrix(&[3], 1), true).unwrap();
        assert_eq!(compositor.raster().alpha(0), 127);
        assert_eq!(compositor.previous_alpha(), &[255]);

        compositor.render(&matrix(&[0], 1), true).unwrap();
        assert_eq!(compositor.raster().alpha(0), 127);
        assert_eq!(compositor.previous_alpha(), &[0]);
    }

    #[test]
    fn test_blend_is_not_cumulative() {
        let mut compositor = FrameCompositor::new(1, 1).unwrap();
        for _ in 0..3 {
            compositor.render(&matrix(&[2], 1), true).unwrap();
        }
        // Steady input converges after one frame: (170 + 170) >> 1
        assert_eq!(compositor.raster().alpha(0), 170);
    }

    #[test]
    fn test_blend_after_direct_uses_stale_previous() {
        let mut compositor = FrameCompositor::new(1, 1).unwrap();
        compositor.render(&matrix(&[3], 1), false).unwrap();
        compositor.render(&matrix(&[3], 1), true).unwrap();
        assert_eq!(compositor.raster().alpha(0), 127);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut compositor = FrameCompositor::new(2, 2).unwrap();
        let codes = [1, 1, 1, 1];
        let err = compositor.render(&matrix(&codes, 4), false).unwrap_err();
        assert_eq!(
            err,
            DisplayError::DimensionMismatch {
                expected_width: 2,
                expected_height: 2,
                found_width: 4,
                found_height: 1,
            }
        );
        assert!(compositor.raster().alphas().all(|a| a == 0));
    }

    #[test]
    fn test_invalid_shade_writes_nothing() {
        let mut compositor = FrameCompositor::new(3, 1).unwrap();
        compositor.render(&matrix(&[1, 2, 3], 3), true).unwrap();
        let before = compositor.clone();

        let err = compositor.render(&matrix(&[3, 3, 5], 3), true).unwrap_err();
        assert_eq!(err, DisplayError::InvalidShadeCode { index: 2, code: 5 });
        assert_eq!(compositor.raster(), before.raster());
        assert_eq!(compositor.previous_alpha(), before.previous_alpha());
    }

    #[test]
    fn test_custom_palette() {
        let palette = LcdPalette::new([200, 10, 10], 50).unwrap();
        let mut compositor = FrameCompositor::with_palette(2, 1, palette).unwrap();
        assert_eq!(compositor.palette().alpha_step(), 50);
        compositor.render(&matrix(&[1, 3], 2), false).unwrap();
        assert_eq!(compositor.raster().pixel(0, 0), [200, 10, 10, 50]);
        assert_eq!(compositor.raster().pixel(1, 0), [200, 10, 10, 150]);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(
            FrameCompositor::new(0, 10).unwrap_err(),
            DisplayError::InvalidDimensions {
                width: 0,
                height: 10,
                len: 0
            }
        );
        assert!(FrameCompositor::new(10, 0).is_err());
    }
}
