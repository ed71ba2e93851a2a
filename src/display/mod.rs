// Display module - Temporal pixel compositor for four-shade LCDs
//
// This module provides:
// - Shade matrices (2-bit intensity codes from an emulation core)
// - The frame compositor (shade -> alpha, optional ghosting blend)
// - Render surfaces (headless memory surface, pixels window surface)
// - A repaint signal and the scheduler that renders on each notification
// - A winit + pixels demo window driven by a scrolling test pattern

pub mod compositor;
pub mod error;
pub mod palette;
pub mod pattern;
pub mod raster;
pub mod scheduler;
pub mod shade;
pub mod signal;
pub mod surface;
pub mod window;

pub use compositor::FrameCompositor;
pub use error::DisplayError;
pub use palette::{LcdPalette, DMG_PALETTE, MAX_SHADE};
pub use pattern::PatternSource;
pub use raster::{flatten_over, RgbaRaster};
pub use scheduler::{RepaintScheduler, Subscription};
pub use shade::{ShadeBuffer, ShadeMatrix, ShadeSource};
pub use signal::{ListenerId, Signal};
pub use surface::{MemorySurface, RenderSurface};
pub use window::{run_display, LcdWindow, PixelsSurface, WindowConfig, PADDING};
