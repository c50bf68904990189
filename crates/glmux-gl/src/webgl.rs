//! WebGL enum values missing from `glow`'s core-profile table.

pub const UNPACK_FLIP_Y_WEBGL: u32 = 0x9240;
pub const UNPACK_PREMULTIPLY_ALPHA_WEBGL: u32 = 0x9241;
pub const CONTEXT_LOST_WEBGL: u32 = 0x9242;
pub const UNPACK_COLORSPACE_CONVERSION_WEBGL: u32 = 0x9243;
pub const BROWSER_DEFAULT_WEBGL: u32 = 0x9244;

// ES 2.0 leftovers that WebGL keeps but desktop core profiles dropped.
pub const LUMINANCE: u32 = 0x1909;
pub const LUMINANCE_ALPHA: u32 = 0x190A;
pub const GENERATE_MIPMAP_HINT: u32 = 0x8192;

// Extension enums. These alias core ES 3.0 values, which is what lets the WebGL 1 extensions be
// emulated on the core API.
pub const VERTEX_ARRAY_BINDING_OES: u32 = 0x85B5;
pub const MAX_DRAW_BUFFERS_WEBGL: u32 = 0x8824;
pub const DRAW_BUFFER0_WEBGL: u32 = 0x8825;
pub const COLOR_ATTACHMENT0_WEBGL: u32 = 0x8CE0;
pub const VERTEX_ATTRIB_ARRAY_DIVISOR_ANGLE: u32 = 0x88FE;

/// Extension names emulated by the virtualization engine for WebGL 1 contexts.
pub const OES_VERTEX_ARRAY_OBJECT: &str = "OES_vertex_array_object";
pub const ANGLE_INSTANCED_ARRAYS: &str = "ANGLE_instanced_arrays";
pub const WEBGL_DRAW_BUFFERS: &str = "WEBGL_draw_buffers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_enums_alias_core_values() {
        assert_eq!(VERTEX_ARRAY_BINDING_OES, glow::VERTEX_ARRAY_BINDING);
        assert_eq!(DRAW_BUFFER0_WEBGL, glow::DRAW_BUFFER0);
        assert_eq!(MAX_DRAW_BUFFERS_WEBGL, glow::MAX_DRAW_BUFFERS);
        assert_eq!(COLOR_ATTACHMENT0_WEBGL, glow::COLOR_ATTACHMENT0);
        assert_eq!(VERTEX_ATTRIB_ARRAY_DIVISOR_ANGLE, glow::VERTEX_ATTRIB_ARRAY_DIVISOR);
    }
}
