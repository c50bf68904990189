//! The physical graphics API boundary used by `glmux`.
//!
//! [`PhysicalGl`] is the OpenGL ES 3.0 surface the virtualization engine drives, with typed
//! object handles from [`handles`]. [`SoftGl`] is a deterministic in-memory implementation used
//! as the physical context in tests and headless runs.

pub mod handles;
pub mod physical;
pub mod soft;
pub mod webgl;

pub use handles::{
    BufferId, FramebufferId, ProgramId, RenderbufferId, SamplerId, ShaderId, TextureId,
    TransformFeedbackId, UniformLocation, VertexArrayId,
};
pub use physical::{PhysicalGl, VertexAttribValue};
pub use soft::{SoftGl, SoftLimits};

/// Re-export of the GL enum table so callers do not need a direct `glow` dependency.
pub use glow;
