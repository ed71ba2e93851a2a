// RGBA raster - The compositor's output image
//
// Every pixel carries the palette's base color. Only the alpha byte of each
// pixel changes after construction; brightness is expressed as opacity of
// the base color over whatever backdrop the surface provides.

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

const ALPHA_OFFSET: usize = 3;

/// Fixed-size RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaRaster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaRaster {
    /// Allocate a raster with every pixel set to `base` and alpha 0
    pub fn new(width: usize, height: usize, base: [u8; 3]) -> Self {
        let mut data = vec![0; width * height * BYTES_PER_PIXEL];
        for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel[..3].copy_from_slice(&base);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels (`width * height`)
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// RGBA bytes of the pixel at (x, y)
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

    /// Alpha of pixel `index` in row-major order
    #[inline]
    pub fn alpha(&self, index: usize) -> u8 {
        self.data[index * BYTES_PER_PIXEL + ALPHA_OFFSET]
    }

    /// Iterate over alpha bytes in row-major order
    pub fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|pixel| pixel[ALPHA_OFFSET])
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable alpha byte of every pixel, paired with its index
    ///
    /// This is the only write path into the raster; RGB stays untouched.
    pub(crate) fn alphas_mut(&mut self) -> impl Iterator<Item = &mut u8> + '_ {
        self.data
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .map(|pixel| &mut pixel[ALPHA_OFFSET])
    }
}

/// Composite one RGBA pixel over an opaque backdrop
///
/// Returns an opaque pixel: `base * a + backdrop * (255 - a)`, scaled back to
/// 0-255 with rounding.
#[inline]
pub fn flatten_over(pixel: [u8; 4], backdrop: [u8; 3]) -> [u8; 4] {
    let a = pixel[3] as u32;
    let mix = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
    [
        mix(pixel[0], backdrop[0]),
        mix(pixel[1], backdrop[1]),
        mix(pixel[2], backdrop[2]),
        0xFF,
    ]
}
