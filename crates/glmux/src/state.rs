//! The context-state snapshot that is swapped in and out of the physical context.

use glmux_gl::glow;
use glmux_gl::webgl;
use glmux_gl::{
    BufferId, FramebufferId, PhysicalGl, ProgramId, RenderbufferId, SamplerId, TextureId,
    TransformFeedbackId, VertexArrayId, VertexAttribValue,
};

bitflags::bitflags! {
    /// Capabilities toggled with `enable`/`disable`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EnableFlags: u16 {
        const BLEND = 1 << 0;
        const CULL_FACE = 1 << 1;
        const DEPTH_TEST = 1 << 2;
        const DITHER = 1 << 3;
        const POLYGON_OFFSET_FILL = 1 << 4;
        const RASTERIZER_DISCARD = 1 << 5;
        const SAMPLE_ALPHA_TO_COVERAGE = 1 << 6;
        const SAMPLE_COVERAGE = 1 << 7;
        const SCISSOR_TEST = 1 << 8;
        const STENCIL_TEST = 1 << 9;
    }
}

impl EnableFlags {
    /// Each flag paired with its GL capability enum.
    pub const CAPABILITIES: [(EnableFlags, u32); 10] = [
        (EnableFlags::BLEND, glow::BLEND),
        (EnableFlags::CULL_FACE, glow::CULL_FACE),
        (EnableFlags::DEPTH_TEST, glow::DEPTH_TEST),
        (EnableFlags::DITHER, glow::DITHER),
        (EnableFlags::POLYGON_OFFSET_FILL, glow::POLYGON_OFFSET_FILL),
        (EnableFlags::RASTERIZER_DISCARD, glow::RASTERIZER_DISCARD),
        (EnableFlags::SAMPLE_ALPHA_TO_COVERAGE, glow::SAMPLE_ALPHA_TO_COVERAGE),
        (EnableFlags::SAMPLE_COVERAGE, glow::SAMPLE_COVERAGE),
        (EnableFlags::SCISSOR_TEST, glow::SCISSOR_TEST),
        (EnableFlags::STENCIL_TEST, glow::STENCIL_TEST),
    ];

    pub fn from_capability(cap: u32) -> Option<EnableFlags> {
        Self::CAPABILITIES
            .iter()
            .find(|(_, c)| *c == cap)
            .map(|(flag, _)| *flag)
    }
}

/// Implementation limits of the physical context, queried once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub texture_units: u32,
    pub uniform_buffer_bindings: u32,
    pub vertex_attribs: u32,
    pub draw_buffers: u32,
}

impl Limits {
    pub fn query<G: PhysicalGl + ?Sized>(gl: &mut G) -> Self {
        let mut get = |pname| gl.get_parameter_i32(pname).max(0) as u32;
        Self {
            texture_units: get(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            uniform_buffer_bindings: get(glow::MAX_UNIFORM_BUFFER_BINDINGS),
            vertex_attribs: get(glow::MAX_VERTEX_ATTRIBS),
            draw_buffers: get(glow::MAX_DRAW_BUFFERS).max(1),
        }
    }
}

/// Texture bindings of one texture unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureUnitBindings {
    pub texture_2d: Option<TextureId>,
    pub cube_map: Option<TextureId>,
    pub texture_2d_array: Option<TextureId>,
    pub texture_3d: Option<TextureId>,
}

/// Generic (non-indexed) buffer bindings. `ELEMENT_ARRAY_BUFFER` belongs to the vertex
/// array object and is not part of this set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferBindings {
    pub array: Option<BufferId>,
    pub copy_read: Option<BufferId>,
    pub copy_write: Option<BufferId>,
    pub pixel_pack: Option<BufferId>,
    pub pixel_unpack: Option<BufferId>,
    pub transform_feedback: Option<BufferId>,
    pub uniform: Option<BufferId>,
}

/// One `UNIFORM_BUFFER` indexed binding. `offset == 0 && size == 0` means a whole-buffer
/// (`bind_buffer_base`) binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexedBufferBinding {
    pub buffer: Option<BufferId>,
    pub offset: i64,
    pub size: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelStore {
    pub pack_alignment: i32,
    pub unpack_alignment: i32,
    pub pack_row_length: i32,
    pub pack_skip_pixels: i32,
    pub pack_skip_rows: i32,
    pub unpack_row_length: i32,
    pub unpack_image_height: i32,
    pub unpack_skip_pixels: i32,
    pub unpack_skip_rows: i32,
    pub unpack_skip_images: i32,
    pub unpack_flip_y: bool,
    pub unpack_premultiply_alpha: bool,
    pub unpack_colorspace_conversion: u32,
}

impl Default for PixelStore {
    fn default() -> Self {
        Self {
            pack_alignment: 4,
            unpack_alignment: 4,
            pack_row_length: 0,
            pack_skip_pixels: 0,
            pack_skip_rows: 0,
            unpack_row_length: 0,
            unpack_image_height: 0,
            unpack_skip_pixels: 0,
            unpack_skip_rows: 0,
            unpack_skip_images: 0,
            unpack_flip_y: false,
            unpack_premultiply_alpha: false,
            unpack_colorspace_conversion: webgl::BROWSER_DEFAULT_WEBGL,
        }
    }
}

impl PixelStore {
    /// Integer-valued parameters as `(pname, value)` pairs.
    pub(crate) fn integer_params(&self) -> [(u32, i32); 10] {
        [
            (glow::PACK_ALIGNMENT, self.pack_alignment),
            (glow::UNPACK_ALIGNMENT, self.unpack_alignment),
            (glow::PACK_ROW_LENGTH, self.pack_row_length),
            (glow::PACK_SKIP_PIXELS, self.pack_skip_pixels),
            (glow::PACK_SKIP_ROWS, self.pack_skip_rows),
            (glow::UNPACK_ROW_LENGTH, self.unpack_row_length),
            (glow::UNPACK_IMAGE_HEIGHT, self.unpack_image_height),
            (glow::UNPACK_SKIP_PIXELS, self.unpack_skip_pixels),
            (glow::UNPACK_SKIP_ROWS, self.unpack_skip_rows),
            (glow::UNPACK_SKIP_IMAGES, self.unpack_skip_images),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendState {
    pub src_rgb: u32,
    pub dst_rgb: u32,
    pub src_alpha: u32,
    pub dst_alpha: u32,
    pub equation_rgb: u32,
    pub equation_alpha: u32,
    pub color: [f32; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            src_rgb: glow::ONE,
            dst_rgb: glow::ZERO,
            src_alpha: glow::ONE,
            dst_alpha: glow::ZERO,
            equation_rgb: glow::FUNC_ADD,
            equation_alpha: glow::FUNC_ADD,
            color: [0.0; 4],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: i32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0; 4],
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthState {
    pub func: u32,
    pub mask: bool,
    pub range: [f32; 2],
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            func: glow::LESS,
            mask: true,
            range: [0.0, 1.0],
        }
    }
}

/// Rasterization state that is not covered by an enable flag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterState {
    pub cull_face_mode: u32,
    pub front_face: u32,
    pub line_width: f32,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
    pub sample_coverage_value: f32,
    pub sample_coverage_invert: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_face_mode: glow::BACK,
            front_face: glow::CCW,
            line_width: 1.0,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            sample_coverage_value: 1.0,
            sample_coverage_invert: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hints {
    pub generate_mipmap: u32,
    pub fragment_shader_derivative: u32,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            generate_mipmap: glow::DONT_CARE,
            fragment_shader_derivative: glow::DONT_CARE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StencilFaceState {
    pub func: u32,
    pub reference: i32,
    pub value_mask: u32,
    pub write_mask: u32,
    pub fail: u32,
    pub depth_fail: u32,
    pub depth_pass: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            func: glow::ALWAYS,
            reference: 0,
            value_mask: u32::MAX,
            write_mask: u32::MAX,
            fail: glow::KEEP,
            depth_fail: glow::KEEP,
            depth_pass: glow::KEEP,
        }
    }
}

/// State owned by extension hooks. A `None` entry has never been captured and is not
/// restored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionState {
    pub draw_buffers: Option<Vec<u32>>,
}

/// Everything the virtualizer saves and restores when the physical context changes owner.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub buffers: BufferBindings,
    pub uniform_buffers: Vec<IndexedBufferBinding>,
    pub read_framebuffer: Option<FramebufferId>,
    pub draw_framebuffer: Option<FramebufferId>,
    pub renderbuffer: Option<RenderbufferId>,
    pub read_buffer: u32,
    /// `TEXTURE0 + unit`.
    pub active_texture: u32,
    pub texture_units: Vec<TextureUnitBindings>,
    pub samplers: Vec<Option<SamplerId>>,
    pub vertex_array: Option<VertexArrayId>,
    pub transform_feedback: Option<TransformFeedbackId>,
    pub program: Option<ProgramId>,
    pub enabled: EnableFlags,
    pub pixel_store: PixelStore,
    pub viewport: [i32; 4],
    pub scissor: [i32; 4],
    pub blend: BlendState,
    pub clear: ClearValues,
    pub color_mask: [bool; 4],
    pub depth: DepthState,
    pub raster: RasterState,
    pub hints: Hints,
    pub stencil_front: StencilFaceState,
    pub stencil_back: StencilFaceState,
    pub vertex_attribs: Vec<VertexAttribValue>,
    pub extensions: ExtensionState,
}

impl Snapshot {
    /// Fresh-context defaults for a context whose logical default framebuffer is
    /// `framebuffer` (`None` for the physical default framebuffer) and whose surface is
    /// `width` x `height`.
    pub fn new(
        limits: &Limits,
        framebuffer: Option<FramebufferId>,
        vertex_array: Option<VertexArrayId>,
        width: u32,
        height: u32,
    ) -> Self {
        let full = [0, 0, gl_size(width), gl_size(height)];
        Self {
            buffers: BufferBindings::default(),
            uniform_buffers: vec![
                IndexedBufferBinding::default();
                limits.uniform_buffer_bindings as usize
            ],
            read_framebuffer: framebuffer,
            draw_framebuffer: framebuffer,
            renderbuffer: None,
            read_buffer: match framebuffer {
                Some(_) => glow::COLOR_ATTACHMENT0,
                None => glow::BACK,
            },
            active_texture: glow::TEXTURE0,
            texture_units: vec![TextureUnitBindings::default(); limits.texture_units as usize],
            samplers: vec![None; limits.texture_units as usize],
            vertex_array,
            transform_feedback: None,
            program: None,
            enabled: EnableFlags::DITHER,
            pixel_store: PixelStore::default(),
            viewport: full,
            scissor: full,
            blend: BlendState::default(),
            clear: ClearValues::default(),
            color_mask: [true; 4],
            depth: DepthState::default(),
            raster: RasterState::default(),
            hints: Hints::default(),
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            vertex_attribs: vec![VertexAttribValue::default(); limits.vertex_attribs as usize],
            extensions: ExtensionState::default(),
        }
    }
}

/// Converts a surface dimension to a GL size. Oversized values saturate so the physical
/// context rejects them instead of seeing a negative size.
pub(crate) fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
