use std::collections::{BTreeMap, BTreeSet};

use crate::handles::{
    BufferId, FramebufferId, ProgramId, RenderbufferId, SamplerId, TextureId,
    TransformFeedbackId, VertexArrayId,
};
use crate::physical::VertexAttribValue;
use crate::webgl;

use super::raster::Image;
use super::shader::LinkedProgram;
use super::SoftLimits;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AttribPointer {
    pub enabled: bool,
    pub size: i32,
    pub data_type: u32,
    pub normalized: bool,
    pub integer: bool,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<BufferId>,
    pub divisor: u32,
}

impl Default for AttribPointer {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 4,
            data_type: glow::FLOAT,
            normalized: false,
            integer: false,
            stride: 0,
            offset: 0,
            buffer: None,
            divisor: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct VertexArrayState {
    pub attribs: Vec<AttribPointer>,
    pub element_array: Option<BufferId>,
}

impl VertexArrayState {
    pub fn new(max_attribs: u32) -> Self {
        Self {
            attribs: vec![AttribPointer::default(); max_attribs as usize],
            element_array: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TextureObject {
    /// Bind target fixed by the first `bind_texture`.
    pub target: Option<u32>,
    /// Level-0 images keyed by image target (`TEXTURE_2D` or a cube face).
    pub images: BTreeMap<u32, Image>,
    pub internal_format: u32,
    pub params: BTreeMap<u32, i32>,
    pub immutable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attachment {
    Texture {
        texture: TextureId,
        image_target: u32,
        level: i32,
    },
    Renderbuffer(RenderbufferId),
}

#[derive(Clone, Debug)]
pub(crate) struct FramebufferObject {
    pub attachments: BTreeMap<u32, Attachment>,
    pub draw_buffers: Vec<u32>,
    pub read_buffer: u32,
}

impl FramebufferObject {
    pub fn new(max_draw_buffers: u32) -> Self {
        let mut draw_buffers = vec![glow::NONE; max_draw_buffers.max(1) as usize];
        draw_buffers[0] = glow::COLOR_ATTACHMENT0;
        Self {
            attachments: BTreeMap::new(),
            draw_buffers,
            read_buffer: glow::COLOR_ATTACHMENT0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RenderbufferObject {
    pub internal_format: u32,
    pub image: Image,
}

#[derive(Clone, Debug)]
pub(crate) struct ShaderObject {
    pub shader_type: u32,
    pub source: String,
    pub compiled: bool,
    pub info_log: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UniformValue {
    Int(i32),
    Floats(Vec<f32>),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ProgramObject {
    pub shaders: Vec<crate::handles::ShaderId>,
    pub attrib_bindings: BTreeMap<String, u32>,
    pub linked: Option<LinkedProgram>,
    pub info_log: String,
    pub uniform_values: BTreeMap<u32, UniformValue>,
    pub block_bindings: BTreeMap<u32, u32>,
    pub delete_pending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StencilFace {
    pub func: u32,
    pub reference: i32,
    pub value_mask: u32,
    pub write_mask: u32,
    pub fail: u32,
    pub depth_fail: u32,
    pub depth_pass: u32,
}

impl Default for StencilFace {
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

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextureUnit {
    pub tex_2d: Option<TextureId>,
    pub cube_map: Option<TextureId>,
    pub array_2d: Option<TextureId>,
    pub tex_3d: Option<TextureId>,
    pub sampler: Option<SamplerId>,
}

impl TextureUnit {
    pub fn slot(&mut self, target: u32) -> Option<&mut Option<TextureId>> {
        match target {
            glow::TEXTURE_2D => Some(&mut self.tex_2d),
            glow::TEXTURE_CUBE_MAP => Some(&mut self.cube_map),
            glow::TEXTURE_2D_ARRAY => Some(&mut self.array_2d),
            glow::TEXTURE_3D => Some(&mut self.tex_3d),
            _ => None,
        }
    }

    pub fn get(&self, target: u32) -> Option<Option<TextureId>> {
        match target {
            glow::TEXTURE_2D => Some(self.tex_2d),
            glow::TEXTURE_CUBE_MAP => Some(self.cube_map),
            glow::TEXTURE_2D_ARRAY => Some(self.array_2d),
            glow::TEXTURE_3D => Some(self.tex_3d),
            _ => None,
        }
    }

    pub fn unbind(&mut self, texture: TextureId) {
        for slot in [
            &mut self.tex_2d,
            &mut self.cube_map,
            &mut self.array_2d,
            &mut self.tex_3d,
        ] {
            if *slot == Some(texture) {
                *slot = None;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct IndexedBinding {
    pub buffer: Option<BufferId>,
    pub offset: i64,
    pub size: i64,
}

pub(crate) const CAPABILITIES: [u32; 10] = [
    glow::BLEND,
    glow::CULL_FACE,
    glow::DEPTH_TEST,
    glow::DITHER,
    glow::POLYGON_OFFSET_FILL,
    glow::RASTERIZER_DISCARD,
    glow::SAMPLE_ALPHA_TO_COVERAGE,
    glow::SAMPLE_COVERAGE,
    glow::SCISSOR_TEST,
    glow::STENCIL_TEST,
];

/// Context-wide (non-object) state.
#[derive(Clone, Debug)]
pub(crate) struct State {
    pub array_buffer: Option<BufferId>,
    pub copy_read_buffer: Option<BufferId>,
    pub copy_write_buffer: Option<BufferId>,
    pub pixel_pack_buffer: Option<BufferId>,
    pub pixel_unpack_buffer: Option<BufferId>,
    pub transform_feedback_buffer: Option<BufferId>,
    pub uniform_buffer: Option<BufferId>,
    pub uniform_bindings: Vec<IndexedBinding>,

    pub draw_framebuffer: Option<FramebufferId>,
    pub read_framebuffer: Option<FramebufferId>,
    pub renderbuffer: Option<RenderbufferId>,
    pub vertex_array: Option<VertexArrayId>,
    pub default_vertex_array: VertexArrayState,
    pub transform_feedback: Option<TransformFeedbackId>,

    pub active_unit: u32,
    pub units: Vec<TextureUnit>,
    pub program: Option<ProgramId>,

    pub enabled: BTreeSet<u32>,
    pub pixel_store: BTreeMap<u32, i32>,
    pub viewport: [i32; 4],
    pub scissor: [i32; 4],
    pub blend_func: [u32; 4],
    pub blend_equation: [u32; 2],
    pub blend_color: [f32; 4],
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: i32,
    pub color_mask: [bool; 4],
    pub cull_face_mode: u32,
    pub front_face: u32,
    pub depth_func: u32,
    pub depth_mask: bool,
    pub depth_range: [f32; 2],
    pub stencil_front: StencilFace,
    pub stencil_back: StencilFace,
    pub line_width: f32,
    pub polygon_offset: [f32; 2],
    pub sample_coverage_value: f32,
    pub sample_coverage_invert: bool,
    pub hints: BTreeMap<u32, u32>,
    pub current_attribs: Vec<VertexAttribValue>,
}

pub(crate) fn default_pixel_store() -> BTreeMap<u32, i32> {
    [
        (glow::PACK_ALIGNMENT, 4),
        (glow::UNPACK_ALIGNMENT, 4),
        (glow::PACK_ROW_LENGTH, 0),
        (glow::PACK_SKIP_PIXELS, 0),
        (glow::PACK_SKIP_ROWS, 0),
        (glow::UNPACK_ROW_LENGTH, 0),
        (glow::UNPACK_IMAGE_HEIGHT, 0),
        (glow::UNPACK_SKIP_PIXELS, 0),
        (glow::UNPACK_SKIP_ROWS, 0),
        (glow::UNPACK_SKIP_IMAGES, 0),
        (webgl::UNPACK_FLIP_Y_WEBGL, 0),
        (webgl::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 0),
        (
            webgl::UNPACK_COLORSPACE_CONVERSION_WEBGL,
            webgl::BROWSER_DEFAULT_WEBGL as i32,
        ),
    ]
    .into_iter()
    .collect()
}

impl State {
    pub fn new(limits: &SoftLimits, width: u32, height: u32) -> Self {
        let full = [0, 0, width as i32, height as i32];
        Self {
            array_buffer: None,
            copy_read_buffer: None,
            copy_write_buffer: None,
            pixel_pack_buffer: None,
            pixel_unpack_buffer: None,
            transform_feedback_buffer: None,
            uniform_buffer: None,
            uniform_bindings: vec![IndexedBinding::default(); limits.uniform_buffer_bindings as usize],
            draw_framebuffer: None,
            read_framebuffer: None,
            renderbuffer: None,
            vertex_array: None,
            default_vertex_array: VertexArrayState::new(limits.vertex_attribs),
            transform_feedback: None,
            active_unit: 0,
            units: vec![TextureUnit::default(); limits.texture_units as usize],
            program: None,
            enabled: [glow::DITHER].into_iter().collect(),
            pixel_store: default_pixel_store(),
            viewport: full,
            scissor: full,
            blend_func: [glow::ONE, glow::ZERO, glow::ONE, glow::ZERO],
            blend_equation: [glow::FUNC_ADD, glow::FUNC_ADD],
            blend_color: [0.0; 4],
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            color_mask: [true; 4],
            cull_face_mode: glow::BACK,
            front_face: glow::CCW,
            depth_func: glow::LESS,
            depth_mask: true,
            depth_range: [0.0, 1.0],
            stencil_front: StencilFace::default(),
            stencil_back: StencilFace::default(),
            line_width: 1.0,
            polygon_offset: [0.0, 0.0],
            sample_coverage_value: 1.0,
            sample_coverage_invert: false,
            hints: [
                (webgl::GENERATE_MIPMAP_HINT, glow::DONT_CARE),
                (glow::FRAGMENT_SHADER_DERIVATIVE_HINT, glow::DONT_CARE),
            ]
            .into_iter()
            .collect(),
            current_attribs: vec![VertexAttribValue::default(); limits.vertex_attribs as usize],
        }
    }
}
