// LCD Compositor Library
// Temporal pixel compositor for four-shade retro LCD emulation

// Public modules
pub mod config;
pub mod display;

// Re-export main types for convenience
pub use config::{ConfigError, DisplayConfig, LcdConfig, VideoConfig};
pub use display::{
    DisplayError, FrameCompositor, LcdPalette, MemorySurface, RenderSurface, RepaintScheduler,
    RgbaRaster, ShadeBuffer, ShadeMatrix, ShadeSource, Signal, Subscription, WindowConfig,
};
