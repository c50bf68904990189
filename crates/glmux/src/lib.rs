//! `glmux` multiplexes many WebGL contexts onto one physical GL context.
//!
//! Currently this crate provides:
//! - Virtual contexts with full state isolation (see [`VirtualContext`] and [`state::Snapshot`]).
//! - Lazy context switching and deferred compositing (see [`Virtualizer`]).
//! - Pluggable compositors that copy offscreen pixels to a [`DestinationSurface`]
//!   (see [`ReadbackCompositor`]).
//! - Emulation of the WebGL 1 extensions that are core in ES 3.0 (see [`Extension`]).
//! - A frame-callback driver that flushes after every callback (see [`FrameDriver`]).

mod context;
mod error;
mod frame;
mod virtualizer;

pub mod compositor;
pub mod config;
pub mod dispatch;
pub mod extensions;
pub mod save_restore;
pub mod state;
pub mod stats;
pub mod surface;

pub use compositor::{Compositor, CompositorFactory, OffscreenTarget, ReadbackCompositor};
pub use config::{ContextAttributes, ContextOptions, SetupOptions};
pub use context::{ContextId, ContextKind, VirtualContext};
pub use error::{CompositeError, Result, SurfaceError, VirtualGlError};
pub use extensions::{Extension, ExtensionId};
pub use frame::{FrameDriver, FrameRequestId};
pub use stats::{VirtualizerStats, VirtualizerStatsSnapshot};
pub use surface::{DestinationSurface, MemorySurface, SurfaceRef};
pub use virtualizer::{ContextHandle, FlushReport, FlushScheduler, Virtualizer};

pub use glmux_gl;
