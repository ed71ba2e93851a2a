// Repaint scheduler - Signal-driven render + blit cycles
//
// The scheduler owns the compositor, the shade producer and the surface.
// Each notification from the attached signal pulls the current shades,
// renders them and blits the raster at a fixed offset.
//
// Render cycles never overlap: a notification delivered while a cycle is
// running (the producer or surface dispatching the signal again) is dropped.

use super::compositor::FrameCompositor;
use super::error::DisplayError;
use super::shade::ShadeSource;
use super::signal::{ListenerId, Signal, WeakSignal};
use super::surface::RenderSurface;
use log::{debug, error};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Everything a render cycle borrows mutably
struct Engine<S, R> {
    compositor: FrameCompositor,
    source: S,
    surface: R,
}

impl<S: ShadeSource, R: RenderSurface> Engine<S, R> {
    /// One render + blit; nothing is rendered or blitted on failure
    fn cycle(&mut self, blend: bool, offset: (usize, usize)) -> Result<(), DisplayError> {
        let Engine {
            compositor,
            source,
            surface,
        } = self;

        if !surface.is_available() {
            return Err(DisplayError::SurfaceBusy);
        }
        source.with_shades(|shades| compositor.render(&shades, blend))??;

        let raster = compositor.raster();
        surface.blit(
            raster.as_bytes(),
            raster.width(),
            raster.height(),
            offset.0,
            offset.1,
        );
        Ok(())
    }
}

/// Current registration, if any
struct Attachment {
    signal: WeakSignal,
    listener: ListenerId,
    generation: u64,
}

#[derive(Default)]
struct AttachmentSlot {
    current: RefCell<Option<Attachment>>,
    generation: Cell<u64>,
}

impl AttachmentSlot {
    fn is_current(&self, generation: u64) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|a| a.generation == generation)
    }

    /// Drop the registration (only if it is still `generation`, when given)
    fn release(&self, generation: Option<u64>) {
        let attachment = {
            let mut current = self.current.borrow_mut();
            match (current.as_ref(), generation) {
                (Some(a), Some(g)) if a.generation != g => None,
                _ => current.take(),
            }
        };

        if let Some(attachment) = attachment {
            attachment.signal.remove(attachment.listener);
            debug!("repaint scheduler detached (generation {})", attachment.generation);
        }
    }
}

struct Shared<S, R> {
    engine: RefCell<Engine<S, R>>,
    // Kept outside the engine so they stay readable mid-cycle
    blend: Cell<bool>,
    offset: Cell<(usize, usize)>,
    frames: Cell<u64>,
    slot: Rc<AttachmentSlot>,
    last_error: RefCell<Option<DisplayError>>,
}

impl<S: ShadeSource, R: RenderSurface> Shared<S, R> {
    fn run_cycle(&self) -> Result<(), DisplayError> {
        let mut engine = self
            .engine
            .try_borrow_mut()
            .map_err(|_| DisplayError::RenderInProgress)?;
        engine.cycle(self.blend.get(), self.offset.get())?;
        self.frames.set(self.frames.get() + 1);
        Ok(())
    }

    fn on_signal(&self, generation: u64) {
        if !self.slot.is_current(generation) {
            return;
        }

        match self.run_cycle() {
            Ok(()) => {}
            Err(DisplayError::RenderInProgress) => {
                debug!("render in progress, dropping repaint notification");
            }
            Err(err) => {
                error!("repaint failed: {}", err);
                *self.last_error.borrow_mut() = Some(err);
            }
        }
    }
}

/// Drives a [`FrameCompositor`] from a [`Signal`]
///
/// At most one signal is attached at a time. Dropping the scheduler detaches
/// it.
///
/// # Example
///
/// ```
/// use lcd_compositor::display::{FrameCompositor, MemorySurface, RepaintScheduler, ShadeBuffer, Signal};
///
/// # fn main() -> Result<(), lcd_compositor::DisplayError> {
/// let signal = Signal::new();
/// let scheduler = RepaintScheduler::new(
///     FrameCompositor::new(160, 144)?,
///     ShadeBuffer::new(160, 144),
///     MemorySurface::new(162, 146),
/// )
/// .with_blend(true)
/// .with_offset(1, 1);
///
/// scheduler.render_now()?;
/// let subscription = scheduler.attach(&signal);
/// signal.dispatch();
/// subscription.detach();
/// assert_eq!(scheduler.frame_count(), 2);
/// # Ok(())
/// # }
/// ```
pub struct RepaintScheduler<S, R> {
    shared: Rc<Shared<S, R>>,
}

impl<S, R> RepaintScheduler<S, R>
where
    S: ShadeSource + 'static,
    R: RenderSurface + 'static,
{
    /// Create a detached scheduler (no blending, offset 0,0)
    pub fn new(compositor: FrameCompositor, source: S, surface: R) -> Self {
        Self {
            shared: Rc::new(Shared {
                engine: RefCell::new(Engine {
                    compositor,
                    source,
                    surface,
                }),
                blend: Cell::new(false),
                offset: Cell::new((0, 0)),
                frames: Cell::new(0),
                slot: Rc::new(AttachmentSlot::default()),
                last_error: RefCell::new(None),
            }),
        }
    }

    /// Enable or disable temporal blending
    pub fn with_blend(self, blend: bool) -> Self {
        self.shared.blend.set(blend);
        self
    }

    /// Surface position of the raster's top-left pixel
    pub fn with_offset(self, offset_x: usize, offset_y: usize) -> Self {
        self.shared.offset.set((offset_x, offset_y));
        self
    }

    /// Subscribe to `signal`
    ///
    /// Replaces any previous registration, on this or another signal. The
    /// returned guard detaches when dropped.
    pub fn attach(&self, signal: &Signal) -> Subscription {
        let slot = &self.shared.slot;
        if slot.current.borrow().is_some() {
            debug!("repaint scheduler re-attached, replacing previous registration");
            slot.release(None);
        }

        let generation = slot.generation.get() + 1;
        slot.generation.set(generation);

        let weak: Weak<Shared<S, R>> = Rc::downgrade(&self.shared);
        let listener = signal.add(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_signal(generation);
            }
        });

        *slot.current.borrow_mut() = Some(Attachment {
            signal: signal.downgrade(),
            listener,
            generation,
        });
        debug!("repaint scheduler attached (generation {})", generation);

        Subscription {
            slot: Rc::downgrade(slot),
            generation,
            released: false,
        }
    }

    /// Unsubscribe with a token from this scheduler's [`attach`](Self::attach)
    ///
    /// A token issued by another scheduler is handed back untouched, so the
    /// caller can still return it to its owner.
    pub fn detach(&self, subscription: Subscription) -> Result<(), Subscription> {
        if !subscription.slot.ptr_eq(&Rc::downgrade(&self.shared.slot)) {
            debug!("subscription belongs to another scheduler, ignoring detach");
            return Err(subscription);
        }
        subscription.detach();
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.shared.slot.current.borrow().is_some()
    }

    /// Render and blit one frame immediately, attached or not
    pub fn render_now(&self) -> Result<(), DisplayError> {
        self.shared.run_cycle()
    }

    /// Error from the most recent failed signal-driven render, if any
    pub fn take_error(&self) -> Option<DisplayError> {
        self.shared.last_error.borrow_mut().take()
    }

    /// Frames rendered and blitted so far
    pub fn frame_count(&self) -> u64 {
        self.shared.frames.get()
    }

    pub fn blend(&self) -> bool {
        self.shared.blend.get()
    }

    /// Inspect the compositor between frames
    ///
    /// # Panics
    /// Panics if called from inside a render cycle
    pub fn with_compositor<T>(&self, f: impl FnOnce(&FrameCompositor) -> T) -> T {
        f(&self.shared.engine.borrow().compositor)
    }
}

impl<S, R> Drop for RepaintScheduler<S, R> {
    fn drop(&mut self) {
        self.shared.slot.release(None);
    }
}

/// Registration guard returned by [`RepaintScheduler::attach`]
///
/// Detaches on drop. A subscription replaced by a later `attach` is inert.
#[derive(Debug)]
#[must_use = "dropping the subscription detaches the scheduler immediately"]
pub struct Subscription {
    slot: Weak<AttachmentSlot>,
    generation: u64,
    released: bool,
}

impl Subscription {
    /// Unregister the scheduler's listener
    pub fn detach(mut self) {
        self.release();
    }

    /// Whether this subscription is still the scheduler's live registration
    pub fn is_active(&self) -> bool {
        !self.released
            && self
                .slot
                .upgrade()
                .is_some_and(|slot| slot.is_current(self.generation))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(slot) = self.slot.upgrade() {
            slot.release(Some(self.generation));
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
