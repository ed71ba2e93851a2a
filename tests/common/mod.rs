// Common test utilities for compositor integration tests
//
// Shared producers and fixtures for the compositor and scheduler suites.

#![allow(dead_code)]

use lcd_compositor::{FrameCompositor, MemorySurface, RepaintScheduler, ShadeBuffer};
use std::cell::RefCell;
use std::rc::Rc;

/// Game Boy LCD width
pub const LCD_WIDTH: usize = 160;

/// Game Boy LCD height
pub const LCD_HEIGHT: usize = 144;

pub type SharedShades = Rc<RefCell<ShadeBuffer>>;
pub type SharedSurface = Rc<RefCell<MemorySurface>>;

/// Scheduler wired to shared shades and a padded memory surface
pub struct Fixture {
    pub scheduler: RepaintScheduler<SharedShades, SharedSurface>,
    pub shades: SharedShades,
    pub surface: SharedSurface,
}

/// Build a fixture with a one-pixel border around the LCD
pub fn fixture(width: usize, height: usize, blend: bool) -> Fixture {
    let shades = Rc::new(RefCell::new(ShadeBuffer::new(width, height)));
    let surface = Rc::new(RefCell::new(MemorySurface::new(width + 2, height + 2)));
    let scheduler = RepaintScheduler::new(
        FrameCompositor::new(width, height).expect("non-zero LCD size"),
        Rc::clone(&shades),
        Rc::clone(&surface),
    )
    .with_blend(blend)
    .with_offset(1, 1);

    Fixture {
        scheduler,
        shades,
        surface,
    }
}

/// Deterministic pseudo-random shade codes (xorshift32)
pub fn noise_shades(width: usize, height: usize, seed: u32) -> ShadeBuffer {
    let mut state = seed.max(1);
    let codes = (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0x3) as u8
        })
        .collect();
    ShadeBuffer::from_codes(width, height, codes).expect("valid noise buffer")
}
