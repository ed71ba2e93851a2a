// Shade matrix - Read-only view of an emulation core's pixel output
//
// A shade matrix is a row-major grid of 2-bit intensity codes (0-3).
// The producer owns the storage; the compositor only borrows it for the
// duration of one render call.

use super::error::DisplayError;
use super::palette::MAX_SHADE;
use std::cell::RefCell;
use std::rc::Rc;

/// Borrowed row-major view of shade codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadeMatrix<'a> {
    width: usize,
    height: usize,
    codes: &'a [u8],
}

impl<'a> ShadeMatrix<'a> {
    /// Wrap a flat buffer of `width * height` shade codes
    pub fn new(width: usize, height: usize, codes: &'a [u8]) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 || codes.len() != width * height {
            return Err(DisplayError::InvalidDimensions {
                width,
                height,
                len: codes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            codes,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels (`width * height`)
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Raw shade codes in row-major order
    pub fn codes(&self) -> &'a [u8] {
        self.codes
    }

    /// Shade code at (x, y)
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.codes[y * self.width + x]
    }

    /// Find the first code outside 0-3
    pub fn validate(&self) -> Result<(), DisplayError> {
        match self.codes.iter().position(|&code| code > MAX_SHADE) {
            Some(index) => Err(DisplayError::InvalidShadeCode {
                index,
                code: self.codes[index],
            }),
            None => Ok(()),
        }
    }
}

/// Owned shade buffer, the usual backing store on the producer side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadeBuffer {
    width: usize,
    height: usize,
    codes: Vec<u8>,
}

impl ShadeBuffer {
    /// Create a buffer filled with shade 0
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            codes: vec![0; width * height],
        }
    }

    /// Take ownership of existing codes
    pub fn from_codes(width: usize, height: usize, codes: Vec<u8>) -> Result<Self, DisplayError> {
        ShadeMatrix::new(width, height, &codes)?;
        Ok(Self {
            width,
            height,
            codes,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Set a shade code at the given coordinates
    ///
    /// Codes are masked to two bits, as the LCD only has four levels.
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, shade: u8) {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.codes[y * self.width + x] = shade & MAX_SHADE;
    }

    /// Fill every pixel with one shade (masked to two bits)
    pub fn fill(&mut self, shade: u8) {
        self.codes.fill(shade & MAX_SHADE);
    }

    /// Mutable access to the raw codes
    ///
    /// Unlike [`ShadeBuffer::set`], nothing is masked here; out-of-range codes
    /// written through this slice are rejected at render time.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.codes
    }

    /// Borrow as a matrix view
    pub fn as_matrix(&self) -> ShadeMatrix<'_> {
        ShadeMatrix {
            width: self.width,
            height: self.height,
            codes: &self.codes,
        }
    }
}

/// Producer of the current frame's shades
///
/// The producer lends a view for the duration of `f`; nothing is copied.
/// A producer that cannot lend its frame right now returns
/// [`DisplayError::SourceBusy`] and `f` is not called.
pub trait ShadeSource {
    fn with_shades<R>(&self, f: impl FnOnce(ShadeMatrix<'_>) -> R) -> Result<R, DisplayError>;
}

impl ShadeSource for ShadeBuffer {
    fn with_shades<R>(&self, f: impl FnOnce(ShadeMatrix<'_>) -> R) -> Result<R, DisplayError> {
        Ok(f(self.as_matrix()))
    }
}

impl<S: ShadeSource> ShadeSource for Rc<RefCell<S>> {
    fn with_shades<R>(&self, f: impl FnOnce(ShadeMatrix<'_>) -> R) -> Result<R, DisplayError> {
        // The core may still be writing its frame (e.g. dispatching from its own step)
        let source = self.try_borrow().map_err(|_| DisplayError::SourceBusy)?;
        source.with_shades(f)
    }
}
