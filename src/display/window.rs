// Window module - Presents the compositor's raster in a desktop window
//
// The window owns a pixels surface one PADDING wider than the LCD on every
// side. The raster is blitted at (PADDING, PADDING) and flattened over a
// white backdrop, since the swap chain does not blend translucent pixels.

use super::compositor::FrameCompositor;
use super::error::DisplayError;
use super::pattern::PatternSource;
use super::raster::{flatten_over, BYTES_PER_PIXEL};
use super::scheduler::{RepaintScheduler, Subscription};
use super::signal::Signal;
use super::surface::{blit_mapped, RenderSurface};
use crate::config::{DisplayConfig, VideoConfig};
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Border around the LCD, in LCD pixels
pub const PADDING: usize = 1;

/// Page color the translucent raster is drawn over
pub const BACKDROP: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Window configuration
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Scale factor (1x, 2x, 3x, 4x, etc.)
    pub scale: u32,
    /// Target frame rate in Hz
    pub target_fps: u32,
    /// Whether to enable VSync
    pub vsync: bool,
}

impl WindowConfig {
    /// Default: 3x scale, 60 FPS, VSync enabled
    pub fn new() -> Self {
        Self {
            scale: 3,
            target_fps: 60,
            vsync: true,
        }
    }

    /// Set the scale factor
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.clamp(1, 8);
        self
    }

    /// Set the target frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    /// Set VSync enabled or disabled
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Get the frame duration for the target FPS
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps as u64)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VideoConfig> for WindowConfig {
    fn from(video: VideoConfig) -> Self {
        WindowConfig::new()
            .with_scale(video.scale)
            .with_fps(video.fps)
            .with_vsync(video.vsync)
    }
}

/// Padded surface backed by a pixels frame
///
/// Blits are ignored until a pixels buffer is installed.
pub struct PixelsSurface {
    pixels: Option<Pixels<'static>>,
    width: usize,
    height: usize,
    backdrop: [u8; 3],
}

impl PixelsSurface {
    /// Surface for an LCD of `lcd_width x lcd_height`
    pub fn new(lcd_width: usize, lcd_height: usize) -> Self {
        Self {
            pixels: None,
            width: lcd_width + PADDING * 2,
            height: lcd_height + PADDING * 2,
            backdrop: BACKDROP,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Install the pixels buffer and paint the backdrop
    pub fn install(&mut self, pixels: Pixels<'static>) {
        self.pixels = Some(pixels);
        self.clear();
    }

    /// Fill the whole frame with the opaque backdrop
    pub fn clear(&mut self) {
        let [r, g, b] = self.backdrop;
        if let Some(pixels) = &mut self.pixels {
            for pixel in pixels.frame_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&[r, g, b, 0xFF]);
            }
        }
    }

    /// Push the frame to the screen
    pub fn present(&self) -> Result<(), pixels::Error> {
        match &self.pixels {
            Some(pixels) => pixels.render(),
            None => Ok(()),
        }
    }
}

impl RenderSurface for PixelsSurface {
    fn blit(&mut self, rgba: &[u8], width: usize, height: usize, offset_x: usize, offset_y: usize) {
        let backdrop = self.backdrop;
        if let Some(pixels) = &mut self.pixels {
            blit_mapped(
                pixels.frame_mut(),
                self.width,
                self.height,
                rgba,
                width,
                height,
                offset_x,
                offset_y,
                |pixel| flatten_over(pixel, backdrop),
            );
        }
    }
}

type SharedSource = Rc<RefCell<PatternSource>>;
type SharedSurface = Rc<RefCell<PixelsSurface>>;

/// Demo window: pattern producer -> signal -> scheduler -> pixels
pub struct LcdWindow {
    window: Option<Arc<Window>>,
    config: WindowConfig,
    source: SharedSource,
    surface: SharedSurface,
    signal: Signal,
    subscription: Option<Subscription>,
    scheduler: RepaintScheduler<SharedSource, SharedSurface>,
    last_frame_time: Instant,
}

impl LcdWindow {
    /// Create the window state (the OS window is created when the event loop starts)
    pub fn new(display: &DisplayConfig, config: WindowConfig) -> Result<Self, DisplayError> {
        let lcd = display.lcd;
        let source = Rc::new(RefCell::new(PatternSource::new(lcd.width, lcd.height)));
        let surface = Rc::new(RefCell::new(PixelsSurface::new(lcd.width, lcd.height)));
        let scheduler = RepaintScheduler::new(
            FrameCompositor::new(lcd.width, lcd.height)?,
            Rc::clone(&source),
            Rc::clone(&surface),
        )
        .with_blend(lcd.blend)
        .with_offset(PADDING, PADDING);

        Ok(Self {
            window: None,
            config,
            source,
            surface,
            signal: Signal::new(),
            subscription: None,
            scheduler,
            last_frame_time: Instant::now(),
        })
    }

    fn surface_size(&self) -> (u32, u32) {
        let surface = self.surface.borrow();
        (surface.width() as u32, surface.height() as u32)
    }

    /// Advance the producer and notify the scheduler
    fn step_and_present(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.source.borrow_mut().step();
        self.signal.dispatch();

        if let Some(err) = self.scheduler.take_error() {
            return Err(err.into());
        }
        self.surface.borrow().present()?;
        Ok(())
    }

    /// Check if enough time has passed for the next frame
    fn should_render_frame(&mut self) -> bool {
        let elapsed = self.last_frame_time.elapsed();

        if elapsed >= self.config.frame_duration() {
            self.last_frame_time = Instant::now();
            true
        } else {
            false
        }
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = self.surface_size();
        let scale = self.config.scale;

        let window_attributes = Window::default_attributes()
            .with_title(format!("LCD Compositor - {}x{}", width * scale, height * scale))
            .with_inner_size(LogicalSize::new(width * scale, height * scale))
            .with_resizable(false);

        // Wrap window in Arc for shared ownership with the surface texture
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let window_size = window.inner_size();

        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, window.clone());
        let pixels = Pixels::new(width, height, surface_texture)?;

        self.surface.borrow_mut().install(pixels);
        self.window = Some(window);
        Ok(())
    }

    /// First frame, then hand control to the signal
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.scheduler.render_now()?;
        self.surface.borrow().present()?;
        self.subscription = Some(self.scheduler.attach(&self.signal));
        Ok(())
    }
}

impl ApplicationHandler for LcdWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let result = self
            .create_surface(event_loop)
            .and_then(|()| self.start());
        if let Err(err) = result {
            error!("failed to start display: {}", err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, exiting");
                if let Some(subscription) = self.subscription.take() {
                    subscription.detach();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if self.should_render_frame() {
                    if let Err(err) = self.step_and_present() {
                        error!("render error: {}", err);
                        event_loop.exit();
                    }
                }

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Create and run the demo display window
pub fn run_display(display: &DisplayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = WindowConfig::from(display.video);
    let event_loop = EventLoop::new()?;

    // Set control flow based on VSync setting
    if config.vsync {
        event_loop.set_control_flow(ControlFlow::Wait);
    } else {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    let mut window = LcdWindow::new(display, config)?;

    info!(
        "starting display: {}x{} LCD, scale {}x, {} FPS, vsync {}, blend {}",
        display.lcd.width,
        display.lcd.height,
        config.scale,
        config.target_fps,
        config.vsync,
        display.lcd.blend
    );

    event_loop.run_app(&mut window)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_config_defaults() {
        let config = WindowConfig::new();
        assert_eq!(config.scale, 3);
        assert_eq!(config.target_fps, 60);
        assert!(config.vsync);
    }

    #[test]
    fn test_window_config_from_video() {
        let config = WindowConfig::from(VideoConfig {
            scale: 100,
            fps: 0,
            vsync: false,
        });
        assert_eq!(config.scale, 8);
        assert_eq!(config.target_fps, 1);
        assert!(!config.vsync);
    }

    #[test]
    fn test_frame_duration() {
        let config = WindowConfig::new().with_fps(60);
        assert_eq!(config.frame_duration().as_micros(), 16666);
    }

    #[test]
    fn test_surface_is_padded() {
        let surface = PixelsSurface::new(160, 144);
        assert_eq!(surface.width(), 162);
        assert_eq!(surface.height(), 146);
    }

    #[test]
    fn test_uninstalled_surface_ignores_blits() {
        let mut surface = PixelsSurface::new(1, 1);
        surface.blit(&[0, 0, 0, 255], 1, 1, PADDING, PADDING);
        assert!(surface.present().is_ok());
    }
}
