use std::fmt;
use std::num::NonZeroU32;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Physical buffer object name.
    BufferId,
    "buffer"
);
define_handle!(
    /// Physical texture object name.
    TextureId,
    "texture"
);
define_handle!(
    /// Physical framebuffer object name.
    FramebufferId,
    "framebuffer"
);
define_handle!(
    /// Physical renderbuffer object name.
    RenderbufferId,
    "renderbuffer"
);
define_handle!(
    /// Physical vertex array object name.
    VertexArrayId,
    "vertex_array"
);
define_handle!(ProgramId, "program");
define_handle!(ShaderId, "shader");
define_handle!(SamplerId, "sampler");
define_handle!(TransformFeedbackId, "transform_feedback");

/// Location of an active uniform inside a linked program.
///
/// Locations are only meaningful for the program they were queried from; passing one to
/// another program is a GL `INVALID_OPERATION`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub index: u32,
}

/// Raw integer name used by `get_parameter_i32` for object bindings (`0` means "none").
pub fn raw_name<H: Into<u32>>(handle: Option<H>) -> i32 {
    handle.map_or(0, |h| h.into() as i32)
}

macro_rules! into_raw {
    ($($name:ident),*) => {
        $(
            impl From<$name> for u32 {
                fn from(handle: $name) -> u32 {
                    handle.get()
                }
            }
        )*
    };
}

into_raw!(
    BufferId,
    TextureId,
    FramebufferId,
    RenderbufferId,
    VertexArrayId,
    ProgramId,
    ShaderId,
    SamplerId,
    TransformFeedbackId
);
