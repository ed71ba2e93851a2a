// Render surfaces - Blit targets for the compositor's raster
//
// A surface accepts an RGBA raster at a fixed offset. Blits are synchronous
// and cannot fail; parts of the raster falling outside the surface are
// clipped.

use super::raster::BYTES_PER_PIXEL;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Sink that receives finished RGBA frames
pub trait RenderSurface {
    /// Copy a `width x height` RGBA raster with its top-left at
    /// (`offset_x`, `offset_y`)
    fn blit(&mut self, rgba: &[u8], width: usize, height: usize, offset_x: usize, offset_y: usize);

    /// Whether a blit issued now would land
    ///
    /// Checked before a frame is rendered, so a busy surface costs the frame
    /// instead of leaving the compositor one frame ahead of the screen.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: RenderSurface> RenderSurface for Rc<RefCell<T>> {
    fn blit(&mut self, rgba: &[u8], width: usize, height: usize, offset_x: usize, offset_y: usize) {
        match self.try_borrow_mut() {
            Ok(mut surface) => surface.blit(rgba, width, height, offset_x, offset_y),
            Err(_) => debug!("surface borrowed elsewhere, dropping blit"),
        }
    }

    fn is_available(&self) -> bool {
        self.try_borrow_mut()
            .is_ok_and(|surface| surface.is_available())
    }
}

/// Copy `src` into `dst` pixel by pixel through `map`, clipping at the edges
///
/// `dst` is a `dst_width x dst_height` RGBA buffer.
#[allow(clippy::too_many_arguments)]
pub(crate) fn blit_mapped(
    dst: &mut [u8],
    dst_width: usize,
    dst_height: usize,
    src: &[u8],
    width: usize,
    height: usize,
    offset_x: usize,
    offset_y: usize,
    mut map: impl FnMut([u8; 4]) -> [u8; 4],
) {
    debug_assert_eq!(src.len(), width * height * BYTES_PER_PIXEL);

    if offset_x >= dst_width || offset_y >= dst_height {
        return;
    }
    let visible_w = width.min(dst_width - offset_x);
    let visible_h = height.min(dst_height - offset_y);

    for y in 0..visible_h {
        let src_row = &src[y * width * BYTES_PER_PIXEL..][..visible_w * BYTES_PER_PIXEL];
        let dst_start = ((offset_y + y) * dst_width + offset_x) * BYTES_PER_PIXEL;
        let dst_row = &mut dst[dst_start..][..visible_w * BYTES_PER_PIXEL];

        for (d, s) in dst_row
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(src_row.chunks_exact(BYTES_PER_PIXEL))
        {
            d.copy_from_slice(&map([s[0], s[1], s[2], s[3]]));
        }
    }
}

/// Headless surface that stores blitted pixels verbatim
///
/// Blits replace the covered pixels, alpha included, like writing raw image
/// data into a canvas.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: usize,
    height: usize,
    data: Vec<u8>,
    blit_count: usize,
}

impl MemorySurface {
    /// Create a fully transparent black surface
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * BYTES_PER_PIXEL],
            blit_count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of blits received so far
    pub fn blit_count(&self) -> usize {
        self.blit_count
    }

    /// RGBA of the pixel at (x, y)
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        let offset = (y * self.width + x) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl RenderSurface for MemorySurface {
    fn blit(&mut self, rgba: &[u8], width: usize, height: usize, offset_x: usize, offset_y: usize) {
        blit_mapped(
            &mut self.data,
            self.width,
            self.height,
            rgba,
            width,
            height,
            offset_x,
            offset_y,
            |pixel| pixel,
        );
        self.blit_count += 1;
    }
}
