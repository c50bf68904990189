use crate::context::ContextKind;

/// Errors returned by virtual context operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirtualGlError {
    #[error("tried to call {op} on disposed context")]
    Disposed { op: &'static str },
    #[error("{op} is not available on {kind} contexts")]
    NotAvailable {
        op: &'static str,
        kind: ContextKind,
    },
    #[error("physical context could not allocate {what}")]
    Allocation { what: &'static str },
}

/// Failure to present a frame on a destination surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("frame is {got} bytes, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("surface rejected frame: {0}")]
    Rejected(String),
}

/// Failure to copy a virtual context's offscreen target to its destination surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("readback framebuffer incomplete (status 0x{0:04x})")]
    IncompleteFramebuffer(u32),
    #[error("physical context could not allocate {what}")]
    Allocation { what: &'static str },
}

pub type Result<T, E = VirtualGlError> = std::result::Result<T, E>;
