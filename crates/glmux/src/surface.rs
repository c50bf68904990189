use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::SurfaceError;

/// Where a virtual context's frames end up: the stand-in for a page's canvas element.
///
/// Identity is the `Rc` allocation: asking the virtualizer twice for a context on the same
/// `Rc<dyn DestinationSurface>` returns the same virtual context.
pub trait DestinationSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Receives a finished frame: `width * height` RGBA8 pixels, rows top-down.
    fn present_rgba8(&self, width: u32, height: u32, rgba8: &[u8]) -> Result<(), SurfaceError>;
}

pub type SurfaceRef = Rc<dyn DestinationSurface>;

/// Address of the surface allocation, used to memoize one virtual context per surface.
pub(crate) fn surface_key(surface: &SurfaceRef) -> usize {
    Rc::as_ptr(surface) as *const u8 as usize
}

/// An in-memory destination surface that keeps the last presented frame.
///
/// Failures can be injected with [`MemorySurface::push_outcome`]; queued outcomes are
/// consumed one per present, and an empty queue means success.
#[derive(Debug, Default)]
pub struct MemorySurface {
    size: Cell<(u32, u32)>,
    frame: RefCell<Vec<u8>>,
    frame_size: Cell<(u32, u32)>,
    outcomes: RefCell<VecDeque<Result<(), SurfaceError>>>,
    presents: Cell<u64>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            ..Default::default()
        }
    }

    /// Changes the surface size. The virtual context picks it up on its next call.
    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn push_outcome(&self, outcome: Result<(), SurfaceError>) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    /// Number of frames accepted so far.
    pub fn presents(&self) -> u64 {
        self.presents.get()
    }

    /// The last accepted frame, rows top-down.
    pub fn frame(&self) -> Vec<u8> {
        self.frame.borrow().clone()
    }

    /// Pixel of the last accepted frame; `(0, 0)` is the top-left corner.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let (w, h) = self.frame_size.get();
        if x >= w || y >= h {
            return None;
        }
        let i = (y as usize * w as usize + x as usize) * 4;
        let frame = self.frame.borrow();
        frame.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

impl DestinationSurface for MemorySurface {
    fn width(&self) -> u32 {
        self.size.get().0
    }

    fn height(&self) -> u32 {
        self.size.get().1
    }

    fn present_rgba8(&self, width: u32, height: u32, rgba8: &[u8]) -> Result<(), SurfaceError> {
        let expected = width as usize * height as usize * 4;
        if rgba8.len() != expected {
            return Err(SurfaceError::SizeMismatch {
                expected,
                got: rgba8.len(),
            });
        }
        if let Some(outcome) = self.outcomes.borrow_mut().pop_front() {
            outcome?;
        }
        *self.frame.borrow_mut() = rgba8.to_vec();
        self.frame_size.set((width, height));
        self.presents.set(self.presents.get() + 1);
        Ok(())
    }
}
