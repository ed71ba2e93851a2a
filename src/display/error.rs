// Display errors
//
// Every error here is detected before the compositor writes a single byte,
// so a failed frame leaves the output raster exactly as it was.

use thiserror::Error;

/// Errors produced by the compositor and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// Shade matrix size disagrees with the compositor's allocated buffers
    #[error("dimension mismatch: expected {expected_width}x{expected_height}, found {found_width}x{found_height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        found_width: usize,
        found_height: usize,
    },

    /// Producer handed over a shade code outside 0-3
    #[error("invalid shade code {code} at pixel {index}")]
    InvalidShadeCode { index: usize, code: u8 },

    /// Palette whose alpha step overflows an 8-bit channel at shade 3
    #[error("invalid palette: alpha step {alpha_step} overflows at shade 3")]
    InvalidPalette { alpha_step: u8 },

    /// Zero-sized display, or a flat buffer whose length is not width*height
    #[error("invalid dimensions {width}x{height} for {len} codes")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    /// `render_now` called from inside a render (e.g. by the producer or surface)
    #[error("render already in progress")]
    RenderInProgress,

    /// Shared producer was mutably borrowed when a frame was requested
    #[error("shade source is busy")]
    SourceBusy,

    /// Shared surface was borrowed when a frame was about to be blitted
    #[error("render surface is busy")]
    SurfaceBusy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DisplayError::DimensionMismatch {
            expected_width: 160,
            expected_height: 144,
            found_width: 10,
            found_height: 10,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: expected 160x144, found 10x10"
        );
    }

    #[test]
    fn test_invalid_shade_message() {
        let err = DisplayError::InvalidShadeCode { index: 7, code: 9 };
        assert_eq!(err.to_string(), "invalid shade code 9 at pixel 7");
    }

    #[test]
    fn test_busy_messages() {
        assert_eq!(DisplayError::SourceBusy.to_string(), "shade source is busy");
        assert_eq!(DisplayError::SurfaceBusy.to_string(), "render surface is busy");
    }
}
