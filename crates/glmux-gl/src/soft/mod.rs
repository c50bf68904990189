//! `SoftGl`: a deterministic, in-memory [`PhysicalGl`].
//!
//! Tracks every object, binding and piece of fixed-function state an ES 3.0 context exposes,
//! records GL errors (first error wins until `get_error`), and keeps RGBA8 colour storage for
//! its default framebuffer, textures and renderbuffers. Only `POINTS` are rasterized; see the
//! `shader` module for the fragment model.

mod draw;
mod objects;
mod raster;
mod shader;

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use crate::handles::{
    BufferId, FramebufferId, ProgramId, RenderbufferId, SamplerId, ShaderId, TextureId,
    TransformFeedbackId, UniformLocation, VertexArrayId, raw_name,
};
use crate::physical::{PhysicalGl, VertexAttribValue};
use crate::webgl;

use draw::Vertices;
use objects::{
    Attachment, CAPABILITIES, FramebufferObject, IndexedBinding, ProgramObject,
    RenderbufferObject, ShaderObject, State, StencilFace, TextureObject, UniformValue,
    VertexArrayState,
};
use raster::{Image, Pack, Rect, Unpack};

/// Implementation limits reported through `MAX_*` queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftLimits {
    pub texture_units: u32,
    pub uniform_buffer_bindings: u32,
    pub vertex_attribs: u32,
    pub draw_buffers: u32,
    pub max_texture_size: u32,
}

impl Default for SoftLimits {
    fn default() -> Self {
        Self {
            texture_units: 16,
            uniform_buffer_bindings: 24,
            vertex_attribs: 16,
            draw_buffers: 4,
            max_texture_size: 4096,
        }
    }
}

const DEFAULT_EXTENSIONS: [&str; 4] = [
    "EXT_color_buffer_float",
    "EXT_texture_filter_anisotropic",
    "OES_texture_float_linear",
    "WEBGL_lose_context",
];

const CUBE_FACES: [u32; 6] = [
    glow::TEXTURE_CUBE_MAP_POSITIVE_X,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

fn fill<T: Copy>(out: &mut [T], values: &[T]) {
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
}

/// Software ES 3.0 context with a `width` x `height` default framebuffer.
#[derive(Debug)]
pub struct SoftGl {
    limits: SoftLimits,
    error: u32,
    next_name: u32,

    buffers: HashMap<BufferId, Vec<u8>>,
    textures: HashMap<TextureId, TextureObject>,
    framebuffers: HashMap<FramebufferId, FramebufferObject>,
    renderbuffers: HashMap<RenderbufferId, RenderbufferObject>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayState>,
    samplers: HashMap<SamplerId, BTreeMap<u32, i32>>,
    transform_feedbacks: HashSet<TransformFeedbackId>,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,

    state: State,
    default_color: Image,
    default_draw_buffer: u32,
    default_read_buffer: u32,

    extensions: Vec<String>,
    enabled_extensions: HashSet<String>,
    draw_calls: u64,
}

impl SoftGl {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_limits(width, height, SoftLimits::default())
    }

    pub fn with_limits(width: u32, height: u32, limits: SoftLimits) -> Self {
        Self {
            limits,
            error: glow::NO_ERROR,
            next_name: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            renderbuffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            samplers: HashMap::new(),
            transform_feedbacks: HashSet::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            state: State::new(&limits, width, height),
            default_color: Image::new(width, height),
            default_draw_buffer: glow::BACK,
            default_read_buffer: glow::BACK,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            enabled_extensions: HashSet::new(),
            draw_calls: 0,
        }
    }

    pub fn limits(&self) -> SoftLimits {
        self.limits
    }

    /// Replaces the list reported by `supported_extensions`.
    pub fn set_supported_extensions<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = names.into_iter().map(Into::into).collect();
    }

    pub fn enabled_extensions(&self) -> impl Iterator<Item = &str> {
        self.enabled_extensions.iter().map(String::as_str)
    }

    pub fn default_framebuffer_size(&self) -> (u32, u32) {
        (self.default_color.width, self.default_color.height)
    }

    /// Resizes the default framebuffer, discarding its contents.
    pub fn resize_default_framebuffer(&mut self, width: u32, height: u32) {
        self.default_color = Image::new(width, height);
    }

    pub fn default_framebuffer_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.default_color.get(x as i32, y as i32)
    }

    /// Level-0 texel of a 2D texture.
    pub fn texture_pixel(&self, texture: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        self.textures
            .get(&texture)?
            .images
            .get(&glow::TEXTURE_2D)?
            .get(x as i32, y as i32)
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        let image = self.textures.get(&texture)?.images.get(&glow::TEXTURE_2D)?;
        Some((image.width, image.height))
    }

    pub fn texture_internal_format(&self, texture: TextureId) -> Option<u32> {
        self.textures.get(&texture).map(|t| t.internal_format)
    }

    pub fn texture_parameter(&self, texture: TextureId, pname: u32) -> Option<i32> {
        self.textures.get(&texture)?.params.get(&pname).copied()
    }

    /// `(internal_format, width, height)` of a renderbuffer's storage.
    pub fn renderbuffer_storage_info(&self, renderbuffer: RenderbufferId) -> Option<(u32, u32, u32)> {
        self.renderbuffers
            .get(&renderbuffer)
            .map(|rb| (rb.internal_format, rb.image.width, rb.image.height))
    }

    /// Number of live textures, framebuffers, renderbuffers, vertex arrays and buffers.
    pub fn live_objects(&self) -> usize {
        self.textures.len()
            + self.framebuffers.len()
            + self.renderbuffers.len()
            + self.vertex_arrays.len()
            + self.buffers.len()
    }

    /// Draw calls that passed validation.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    fn record(&mut self, error: u32) {
        trace!(error, "soft gl error");
        if self.error == glow::NO_ERROR {
            self.error = error;
        }
    }

    fn alloc_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn unpack_options(&self) -> Unpack {
        let get = |pname| self.state.pixel_store.get(&pname).copied().unwrap_or(0);
        Unpack {
            alignment: get(glow::UNPACK_ALIGNMENT).max(1) as usize,
            flip_y: get(webgl::UNPACK_FLIP_Y_WEBGL) != 0,
            premultiply_alpha: get(webgl::UNPACK_PREMULTIPLY_ALPHA_WEBGL) != 0,
        }
    }

    fn pack_options(&self) -> Pack {
        let get = |pname: u32| self.state.pixel_store.get(&pname).copied().unwrap_or(0).max(0) as usize;
        Pack {
            alignment: get(glow::PACK_ALIGNMENT).max(1),
            row_length: get(glow::PACK_ROW_LENGTH),
            skip_pixels: get(glow::PACK_SKIP_PIXELS),
            skip_rows: get(glow::PACK_SKIP_ROWS),
        }
    }

    // --- binding lookups -----------------------------------------------------------------

    fn buffer_slot(&mut self, target: u32) -> Option<&mut Option<BufferId>> {
        if target == glow::ELEMENT_ARRAY_BUFFER {
            return Some(&mut self.vao_mut().element_array);
        }
        let s = &mut self.state;
        Some(match target {
            glow::ARRAY_BUFFER => &mut s.array_buffer,
            glow::COPY_READ_BUFFER => &mut s.copy_read_buffer,
            glow::COPY_WRITE_BUFFER => &mut s.copy_write_buffer,
            glow::PIXEL_PACK_BUFFER => &mut s.pixel_pack_buffer,
            glow::PIXEL_UNPACK_BUFFER => &mut s.pixel_unpack_buffer,
            glow::TRANSFORM_FEEDBACK_BUFFER => &mut s.transform_feedback_buffer,
            glow::UNIFORM_BUFFER => &mut s.uniform_buffer,
            _ => return None,
        })
    }

    fn bound_buffer(&mut self, target: u32) -> Result<BufferId, u32> {
        match self.buffer_slot(target) {
            None => Err(glow::INVALID_ENUM),
            Some(None) => Err(glow::INVALID_OPERATION),
            Some(Some(buffer)) => Ok(*buffer),
        }
    }

    fn buffer_binding(&self, pname: u32) -> Option<Option<BufferId>> {
        let s = &self.state;
        Some(match pname {
            glow::ARRAY_BUFFER_BINDING => s.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER_BINDING => self.vao().element_array,
            glow::COPY_READ_BUFFER => s.copy_read_buffer,
            glow::COPY_WRITE_BUFFER => s.copy_write_buffer,
            glow::PIXEL_PACK_BUFFER_BINDING => s.pixel_pack_buffer,
            glow::PIXEL_UNPACK_BUFFER_BINDING => s.pixel_unpack_buffer,
            glow::TRANSFORM_FEEDBACK_BUFFER_BINDING => s.transform_feedback_buffer,
            glow::UNIFORM_BUFFER_BINDING => s.uniform_buffer,
            _ => return None,
        })
    }

    fn texture_binding(&self, pname: u32) -> Option<Option<TextureId>> {
        let unit = self.state.units.get(self.state.active_unit as usize)?;
        Some(match pname {
            glow::TEXTURE_BINDING_2D => unit.tex_2d,
            glow::TEXTURE_BINDING_CUBE_MAP => unit.cube_map,
            glow::TEXTURE_BINDING_2D_ARRAY => unit.array_2d,
            glow::TEXTURE_BINDING_3D => unit.tex_3d,
            _ => return None,
        })
    }

    fn framebuffer_binding(&self, pname: u32) -> Option<Option<FramebufferId>> {
        match pname {
            glow::DRAW_FRAMEBUFFER_BINDING => Some(self.state.draw_framebuffer),
            glow::READ_FRAMEBUFFER_BINDING => Some(self.state.read_framebuffer),
            _ => None,
        }
    }

    fn framebuffer_for_target(&self, target: u32) -> Result<Option<FramebufferId>, u32> {
        match target {
            glow::FRAMEBUFFER | glow::DRAW_FRAMEBUFFER => Ok(self.state.draw_framebuffer),
            glow::READ_FRAMEBUFFER => Ok(self.state.read_framebuffer),
            _ => Err(glow::INVALID_ENUM),
        }
    }

    /// The texture bound to the active unit for a bind target.
    fn texture_for_bind_target(&self, target: u32) -> Result<TextureId, u32> {
        let unit = self
            .state
            .units
            .get(self.state.active_unit as usize)
            .ok_or(glow::INVALID_OPERATION)?;
        unit.get(target)
            .ok_or(glow::INVALID_ENUM)?
            .ok_or(glow::INVALID_OPERATION)
    }

    /// The texture receiving an image upload to `target` (`TEXTURE_2D` or a cube face).
    fn texture_for_image_target(&self, target: u32) -> Result<TextureId, u32> {
        if target == glow::TEXTURE_2D {
            self.texture_for_bind_target(glow::TEXTURE_2D)
        } else if CUBE_FACES.contains(&target) {
            self.texture_for_bind_target(glow::TEXTURE_CUBE_MAP)
        } else {
            Err(glow::INVALID_ENUM)
        }
    }

    fn integer_state(&self, pname: u32) -> Option<i32> {
        let s = &self.state;
        let l = &self.limits;
        let v = match pname {
            glow::ACTIVE_TEXTURE => (glow::TEXTURE0 + s.active_unit) as i32,
            glow::BLEND_SRC_RGB => s.blend_func[0] as i32,
            glow::BLEND_DST_RGB => s.blend_func[1] as i32,
            glow::BLEND_SRC_ALPHA => s.blend_func[2] as i32,
            glow::BLEND_DST_ALPHA => s.blend_func[3] as i32,
            glow::BLEND_EQUATION_RGB => s.blend_equation[0] as i32,
            glow::BLEND_EQUATION_ALPHA => s.blend_equation[1] as i32,
            glow::CULL_FACE_MODE => s.cull_face_mode as i32,
            glow::FRONT_FACE => s.front_face as i32,
            glow::DEPTH_FUNC => s.depth_func as i32,
            glow::STENCIL_CLEAR_VALUE => s.clear_stencil,
            glow::STENCIL_FUNC => s.stencil_front.func as i32,
            glow::STENCIL_REF => s.stencil_front.reference,
            glow::STENCIL_VALUE_MASK => s.stencil_front.value_mask as i32,
            glow::STENCIL_WRITEMASK => s.stencil_front.write_mask as i32,
            glow::STENCIL_FAIL => s.stencil_front.fail as i32,
            glow::STENCIL_PASS_DEPTH_FAIL => s.stencil_front.depth_fail as i32,
            glow::STENCIL_PASS_DEPTH_PASS => s.stencil_front.depth_pass as i32,
            glow::STENCIL_BACK_FUNC => s.stencil_back.func as i32,
            glow::STENCIL_BACK_REF => s.stencil_back.reference,
            glow::STENCIL_BACK_VALUE_MASK => s.stencil_back.value_mask as i32,
            glow::STENCIL_BACK_WRITEMASK => s.stencil_back.write_mask as i32,
            glow::STENCIL_BACK_FAIL => s.stencil_back.fail as i32,
            glow::STENCIL_BACK_PASS_DEPTH_FAIL => s.stencil_back.depth_fail as i32,
            glow::STENCIL_BACK_PASS_DEPTH_PASS => s.stencil_back.depth_pass as i32,
            glow::READ_BUFFER => match s.read_framebuffer {
                None => self.default_read_buffer as i32,
                Some(id) => self.framebuffers.get(&id).map_or(0, |fb| fb.read_buffer as i32),
            },
            p if (glow::DRAW_BUFFER0..glow::DRAW_BUFFER0 + l.draw_buffers).contains(&p) => {
                let i = (p - glow::DRAW_BUFFER0) as usize;
                match s.draw_framebuffer {
                    None if i == 0 => self.default_draw_buffer as i32,
                    None => glow::NONE as i32,
                    Some(id) => self
                        .framebuffers
                        .get(&id)
                        .and_then(|fb| fb.draw_buffers.get(i))
                        .map_or(glow::NONE as i32, |b| *b as i32),
                }
            }
            p if s.pixel_store.contains_key(&p) => s.pixel_store[&p],
            p if s.hints.contains_key(&p) => s.hints[&p] as i32,
            glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS | glow::MAX_TEXTURE_IMAGE_UNITS => {
                l.texture_units as i32
            }
            glow::MAX_UNIFORM_BUFFER_BINDINGS => l.uniform_buffer_bindings as i32,
            glow::MAX_VERTEX_ATTRIBS => l.vertex_attribs as i32,
            glow::MAX_DRAW_BUFFERS | glow::MAX_COLOR_ATTACHMENTS => l.draw_buffers as i32,
            glow::MAX_TEXTURE_SIZE | glow::MAX_RENDERBUFFER_SIZE | glow::MAX_CUBE_MAP_TEXTURE_SIZE => {
                l.max_texture_size as i32
            }
            glow::SAMPLES | glow::SAMPLE_BUFFERS => 0,
            glow::IMPLEMENTATION_COLOR_READ_FORMAT => glow::RGBA as i32,
            glow::IMPLEMENTATION_COLOR_READ_TYPE => glow::UNSIGNED_BYTE as i32,
            glow::VIEWPORT => s.viewport[0],
            glow::SCISSOR_BOX => s.scissor[0],
            _ => return None,
        };
        Some(v)
    }

    fn float_state(&self, pname: u32) -> Option<f32> {
        let s = &self.state;
        Some(match pname {
            glow::DEPTH_CLEAR_VALUE => s.clear_depth,
            glow::LINE_WIDTH => s.line_width,
            glow::POLYGON_OFFSET_FACTOR => s.polygon_offset[0],
            glow::POLYGON_OFFSET_UNITS => s.polygon_offset[1],
            glow::SAMPLE_COVERAGE_VALUE => s.sample_coverage_value,
            _ => return None,
        })
    }

    fn set_stencil(&mut self, face: u32, update: impl Fn(&mut StencilFace)) {
        let s = &mut self.state;
        match face {
            glow::FRONT => update(&mut s.stencil_front),
            glow::BACK => update(&mut s.stencil_back),
            glow::FRONT_AND_BACK => {
                update(&mut s.stencil_front);
                update(&mut s.stencil_back);
            }
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn check_attrib_index(&mut self, index: u32) -> bool {
        if index >= self.limits.vertex_attribs {
            self.record(glow::INVALID_VALUE);
            return false;
        }
        true
    }

    fn set_current_attrib(&mut self, index: u32, value: VertexAttribValue) {
        if self.check_attrib_index(index) {
            self.state.current_attribs[index as usize] = value;
        }
    }

    fn set_uniform(&mut self, location: Option<&UniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        if self.state.program != Some(location.program) {
            self.record(glow::INVALID_OPERATION);
            return;
        }
        let Some(program) = self.programs.get_mut(&location.program) else {
            self.record(glow::INVALID_OPERATION);
            return;
        };
        let valid = program
            .linked
            .as_ref()
            .is_some_and(|l| (location.index as usize) < l.uniforms.len());
        if !valid {
            self.record(glow::INVALID_OPERATION);
            return;
        }
        program.uniform_values.insert(location.index, value);
    }

    fn attach_to_framebuffer(&mut self, target: u32, attachment: u32, value: Option<Attachment>) {
        let fb = match self.framebuffer_for_target(target) {
            Ok(Some(fb)) => fb,
            Ok(None) => return self.record(glow::INVALID_OPERATION),
            Err(err) => return self.record(err),
        };
        let color_range = glow::COLOR_ATTACHMENT0..glow::COLOR_ATTACHMENT0 + self.limits.draw_buffers;
        let valid = color_range.contains(&attachment)
            || matches!(
                attachment,
                glow::DEPTH_ATTACHMENT | glow::STENCIL_ATTACHMENT | glow::DEPTH_STENCIL_ATTACHMENT
            );
        if !valid {
            return self.record(glow::INVALID_ENUM);
        }
        if let Some(fb) = self.framebuffers.get_mut(&fb) {
            match value {
                Some(a) => {
                    fb.attachments.insert(attachment, a);
                }
                None => {
                    fb.attachments.remove(&attachment);
                }
            }
        }
    }

    fn detach_everywhere(&mut self, matches: impl Fn(&Attachment) -> bool) {
        // GL only detaches from the currently bound framebuffers.
        let bound = [self.state.draw_framebuffer, self.state.read_framebuffer];
        for fb in bound.into_iter().flatten() {
            if let Some(fb) = self.framebuffers.get_mut(&fb) {
                fb.attachments.retain(|_, a| !matches(&*a));
            }
        }
    }
}

impl PhysicalGl for SoftGl {
    fn get_error(&mut self) -> u32 {
        std::mem::replace(&mut self.error, glow::NO_ERROR)
    }

    fn get_parameter_i32(&mut self, pname: u32) -> i32 {
        if let Some(b) = self.buffer_binding(pname) {
            return raw_name(b);
        }
        if let Some(t) = self.texture_binding(pname) {
            return raw_name(t);
        }
        if let Some(f) = self.framebuffer_binding(pname) {
            return raw_name(f);
        }
        match pname {
            glow::RENDERBUFFER_BINDING => return raw_name(self.state.renderbuffer),
            glow::VERTEX_ARRAY_BINDING => return raw_name(self.state.vertex_array),
            glow::CURRENT_PROGRAM => return raw_name(self.state.program),
            glow::TRANSFORM_FEEDBACK_BINDING => return raw_name(self.state.transform_feedback),
            glow::SAMPLER_BINDING => {
                let unit = self.state.units.get(self.state.active_unit as usize);
                return raw_name(unit.and_then(|u| u.sampler));
            }
            _ => {}
        }
        if CAPABILITIES.contains(&pname) {
            return i32::from(self.state.enabled.contains(&pname));
        }
        if let Some(v) = self.integer_state(pname) {
            return v;
        }
        if let Some(v) = self.float_state(pname) {
            return v as i32;
        }
        self.record(glow::INVALID_ENUM);
        0
    }

    fn get_parameter_f32(&mut self, pname: u32) -> f32 {
        match self.float_state(pname) {
            Some(v) => v,
            None => self.get_parameter_i32(pname) as f32,
        }
    }

    fn get_parameter_bool(&mut self, pname: u32) -> bool {
        match pname {
            glow::DEPTH_WRITEMASK => self.state.depth_mask,
            glow::SAMPLE_COVERAGE_INVERT => self.state.sample_coverage_invert,
            _ => self.get_parameter_i32(pname) != 0,
        }
    }

    fn get_parameter_i32_slice(&mut self, pname: u32, out: &mut [i32]) {
        match pname {
            glow::VIEWPORT => fill(out, &self.state.viewport),
            glow::SCISSOR_BOX => fill(out, &self.state.scissor),
            glow::MAX_VIEWPORT_DIMS => {
                let max = self.limits.max_texture_size as i32;
                fill(out, &[max, max]);
            }
            _ => {
                let v = self.get_parameter_i32(pname);
                fill(out, &[v]);
            }
        }
    }

    fn get_parameter_f32_slice(&mut self, pname: u32, out: &mut [f32]) {
        match pname {
            glow::BLEND_COLOR => fill(out, &self.state.blend_color),
            glow::COLOR_CLEAR_VALUE => fill(out, &self.state.clear_color),
            glow::DEPTH_RANGE => fill(out, &self.state.depth_range),
            glow::ALIASED_LINE_WIDTH_RANGE => fill(out, &[1.0, 1.0]),
            _ => {
                let v = self.get_parameter_f32(pname);
                fill(out, &[v]);
            }
        }
    }

    fn get_parameter_bool_slice(&mut self, pname: u32, out: &mut [bool]) {
        match pname {
            glow::COLOR_WRITEMASK => fill(out, &self.state.color_mask),
            _ => {
                let v = self.get_parameter_bool(pname);
                fill(out, &[v]);
            }
        }
    }

    fn get_parameter_string(&mut self, pname: u32) -> String {
        match pname {
            glow::VENDOR => "glmux".to_string(),
            glow::RENDERER => "SoftGl".to_string(),
            glow::VERSION => "OpenGL ES 3.0 (SoftGl)".to_string(),
            glow::SHADING_LANGUAGE_VERSION => "OpenGL ES GLSL ES 3.00 (SoftGl)".to_string(),
            _ => {
                self.record(glow::INVALID_ENUM);
                String::new()
            }
        }
    }

    fn get_parameter_buffer(&mut self, pname: u32) -> Option<BufferId> {
        self.buffer_binding(pname).unwrap_or_else(|| {
            self.record(glow::INVALID_ENUM);
            None
        })
    }

    fn get_parameter_texture(&mut self, pname: u32) -> Option<TextureId> {
        self.texture_binding(pname).unwrap_or_else(|| {
            self.record(glow::INVALID_ENUM);
            None
        })
    }

    fn get_parameter_framebuffer(&mut self, pname: u32) -> Option<FramebufferId> {
        self.framebuffer_binding(pname).unwrap_or_else(|| {
            self.record(glow::INVALID_ENUM);
            None
        })
    }

    fn get_parameter_renderbuffer(&mut self, pname: u32) -> Option<RenderbufferId> {
        if pname != glow::RENDERBUFFER_BINDING {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        self.state.renderbuffer
    }

    fn get_parameter_vertex_array(&mut self, pname: u32) -> Option<VertexArrayId> {
        if pname != glow::VERTEX_ARRAY_BINDING {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        self.state.vertex_array
    }

    fn get_parameter_program(&mut self, pname: u32) -> Option<ProgramId> {
        if pname != glow::CURRENT_PROGRAM {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        self.state.program
    }

    fn get_parameter_sampler(&mut self, pname: u32) -> Option<SamplerId> {
        if pname != glow::SAMPLER_BINDING {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        self.state
            .units
            .get(self.state.active_unit as usize)
            .and_then(|u| u.sampler)
    }

    fn get_parameter_transform_feedback(&mut self, pname: u32) -> Option<TransformFeedbackId> {
        if pname != glow::TRANSFORM_FEEDBACK_BINDING {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        self.state.transform_feedback
    }

    fn get_parameter_indexed_buffer(&mut self, pname: u32, index: u32) -> Option<BufferId> {
        if pname != glow::UNIFORM_BUFFER_BINDING {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        match self.state.uniform_bindings.get(index as usize) {
            Some(binding) => binding.buffer,
            None => {
                self.record(glow::INVALID_VALUE);
                None
            }
        }
    }

    fn get_parameter_indexed_i64(&mut self, pname: u32, index: u32) -> i64 {
        let Some(binding) = self.state.uniform_bindings.get(index as usize).copied() else {
            self.record(glow::INVALID_VALUE);
            return 0;
        };
        match pname {
            glow::UNIFORM_BUFFER_START => binding.offset,
            glow::UNIFORM_BUFFER_SIZE => binding.size,
            glow::UNIFORM_BUFFER_BINDING => i64::from(raw_name(binding.buffer)),
            _ => {
                self.record(glow::INVALID_ENUM);
                0
            }
        }
    }

    fn is_enabled(&mut self, cap: u32) -> bool {
        if !CAPABILITIES.contains(&cap) {
            self.record(glow::INVALID_ENUM);
            return false;
        }
        self.state.enabled.contains(&cap)
    }

    fn supported_extensions(&mut self) -> Vec<String> {
        self.extensions.clone()
    }

    fn enable_extension(&mut self, name: &str) -> bool {
        if !self.extensions.iter().any(|e| e == name) {
            return false;
        }
        self.enabled_extensions.insert(name.to_string());
        true
    }

    // --- buffers -------------------------------------------------------------------------

    fn create_buffer(&mut self) -> Option<BufferId> {
        let id = BufferId::new(self.alloc_name())?;
        self.buffers.insert(id, Vec::new());
        Some(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            return;
        }
        let s = &mut self.state;
        for slot in [
            &mut s.array_buffer,
            &mut s.copy_read_buffer,
            &mut s.copy_write_buffer,
            &mut s.pixel_pack_buffer,
            &mut s.pixel_unpack_buffer,
            &mut s.transform_feedback_buffer,
            &mut s.uniform_buffer,
        ] {
            if *slot == Some(buffer) {
                *slot = None;
            }
        }
        for binding in &mut s.uniform_bindings {
            if binding.buffer == Some(buffer) {
                *binding = IndexedBinding::default();
            }
        }
        let vao = self.vao_mut();
        if vao.element_array == Some(buffer) {
            vao.element_array = None;
        }
        for attrib in &mut vao.attribs {
            if attrib.buffer == Some(buffer) {
                attrib.buffer = None;
            }
        }
    }

    fn is_buffer(&mut self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<BufferId>) {
        if buffer.is_some_and(|b| !self.buffers.contains_key(&b)) {
            return self.record(glow::INVALID_OPERATION);
        }
        match self.buffer_slot(target) {
            Some(slot) => *slot = buffer,
            None => self.record(glow::INVALID_ENUM),
        }
    }

    fn bind_buffer_base(&mut self, target: u32, index: u32, buffer: Option<BufferId>) {
        self.bind_buffer_range(target, index, buffer, 0, 0);
    }

    fn bind_buffer_range(
        &mut self,
        target: u32,
        index: u32,
        buffer: Option<BufferId>,
        offset: i64,
        size: i64,
    ) {
        if buffer.is_some_and(|b| !self.buffers.contains_key(&b)) {
            return self.record(glow::INVALID_OPERATION);
        }
        if offset < 0 || size < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        match target {
            glow::UNIFORM_BUFFER => {
                let Some(binding) = self.state.uniform_bindings.get_mut(index as usize) else {
                    return self.record(glow::INVALID_VALUE);
                };
                *binding = IndexedBinding {
                    buffer,
                    offset,
                    size,
                };
                self.state.uniform_buffer = buffer;
            }
            glow::TRANSFORM_FEEDBACK_BUFFER => self.state.transform_feedback_buffer = buffer,
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn buffer_data_size(&mut self, target: u32, size: i64, _usage: u32) {
        if size < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        match self.bound_buffer(target) {
            Ok(buffer) => {
                self.buffers.insert(buffer, vec![0; size as usize]);
            }
            Err(err) => self.record(err),
        }
    }

    fn buffer_data(&mut self, target: u32, data: &[u8], _usage: u32) {
        match self.bound_buffer(target) {
            Ok(buffer) => {
                self.buffers.insert(buffer, data.to_vec());
            }
            Err(err) => self.record(err),
        }
    }

    fn buffer_sub_data(&mut self, target: u32, offset: i64, data: &[u8]) {
        let buffer = match self.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(err) => return self.record(err),
        };
        let range = offset.max(0) as usize..offset.max(0) as usize + data.len();
        match self.buffers.get_mut(&buffer).and_then(|b| b.get_mut(range)) {
            Some(dst) if offset >= 0 => dst.copy_from_slice(data),
            _ => self.record(glow::INVALID_VALUE),
        }
    }

    fn get_buffer_sub_data(&mut self, target: u32, offset: i64, out: &mut [u8]) {
        let buffer = match self.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(err) => return self.record(err),
        };
        let range = offset.max(0) as usize..offset.max(0) as usize + out.len();
        match self.buffers.get(&buffer).and_then(|b| b.get(range)) {
            Some(src) if offset >= 0 => out.copy_from_slice(src),
            _ => self.record(glow::INVALID_VALUE),
        }
    }

    fn copy_buffer_sub_data(
        &mut self,
        read_target: u32,
        write_target: u32,
        read_offset: i64,
        write_offset: i64,
        size: i64,
    ) {
        let (src, dst) = match (self.bound_buffer(read_target), self.bound_buffer(write_target)) {
            (Ok(src), Ok(dst)) => (src, dst),
            (Err(err), _) | (_, Err(err)) => return self.record(err),
        };
        if read_offset < 0 || write_offset < 0 || size < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        let (ro, wo, n) = (read_offset as usize, write_offset as usize, size as usize);
        let Some(bytes) = self.buffers.get(&src).and_then(|b| b.get(ro..ro + n)).map(<[u8]>::to_vec)
        else {
            return self.record(glow::INVALID_VALUE);
        };
        match self.buffers.get_mut(&dst).and_then(|b| b.get_mut(wo..wo + n)) {
            Some(slot) => slot.copy_from_slice(&bytes),
            None => self.record(glow::INVALID_VALUE),
        }
    }

    // --- textures & samplers -------------------------------------------------------------

    fn create_texture(&mut self) -> Option<TextureId> {
        let id = TextureId::new(self.alloc_name())?;
        self.textures.insert(id, TextureObject::default());
        Some(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            return;
        }
        for unit in &mut self.state.units {
            unit.unbind(texture);
        }
        self.detach_everywhere(|a| matches!(a, Attachment::Texture { texture: t, .. } if *t == texture));
    }

    fn is_texture(&mut self, texture: TextureId) -> bool {
        self.textures
            .get(&texture)
            .is_some_and(|t| t.target.is_some())
    }

    fn active_texture(&mut self, unit: u32) {
        match unit.checked_sub(glow::TEXTURE0) {
            Some(index) if index < self.limits.texture_units => self.state.active_unit = index,
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn bind_texture(&mut self, target: u32, texture: Option<TextureId>) {
        if let Some(id) = texture {
            let Some(object) = self.textures.get_mut(&id) else {
                return self.record(glow::INVALID_OPERATION);
            };
            match object.target {
                Some(t) if t != target => return self.record(glow::INVALID_OPERATION),
                _ => {}
            }
            if !matches!(
                target,
                glow::TEXTURE_2D | glow::TEXTURE_CUBE_MAP | glow::TEXTURE_2D_ARRAY | glow::TEXTURE_3D
            ) {
                return self.record(glow::INVALID_ENUM);
            }
            object.target = Some(target);
        }
        let active = self.state.active_unit as usize;
        match self.state.units[active].slot(target) {
            Some(slot) => *slot = texture,
            None => self.record(glow::INVALID_ENUM),
        }
    }

    fn tex_parameter_i32(&mut self, target: u32, pname: u32, param: i32) {
        match self.texture_for_bind_target(target) {
            Ok(id) => {
                if let Some(t) = self.textures.get_mut(&id) {
                    t.params.insert(pname, param);
                }
            }
            Err(err) => self.record(err),
        }
    }

    fn tex_parameter_f32(&mut self, target: u32, pname: u32, param: f32) {
        self.tex_parameter_i32(target, pname, param as i32);
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    ) {
        let id = match self.texture_for_image_target(target) {
            Ok(id) => id,
            Err(err) => return self.record(err),
        };
        let max = self.limits.max_texture_size as i32;
        if level < 0 || width < 0 || height < 0 || width > max || height > max || border != 0 {
            return self.record(glow::INVALID_VALUE);
        }
        if raster::bytes_per_pixel(format, ty).is_none() {
            return self.record(glow::INVALID_ENUM);
        }
        if self.textures.get(&id).is_some_and(|t| t.immutable) {
            return self.record(glow::INVALID_OPERATION);
        }
        let (w, h) = (width as u32, height as u32);
        let source = match (self.state.pixel_unpack_buffer, pixels) {
            (Some(_), Some(_)) => return self.record(glow::INVALID_OPERATION),
            (Some(buffer), None) => Some(self.buffers.get(&buffer).cloned().unwrap_or_default()),
            (None, Some(pixels)) => Some(pixels.to_vec()),
            (None, None) => None,
        };
        let texels = match source {
            Some(bytes) => match raster::unpack_texels(format, ty, w, h, &bytes, self.unpack_options()) {
                Some(texels) => texels,
                None => return self.record(glow::INVALID_OPERATION),
            },
            None => vec![[0; 4]; w as usize * h as usize],
        };
        if level != 0 {
            return;
        }
        if let Some(texture) = self.textures.get_mut(&id) {
            texture.internal_format = internal_format as u32;
            texture.images.insert(
                target,
                Image {
                    width: w,
                    height: h,
                    texels,
                },
            );
        }
    }

    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        let id = match self.texture_for_image_target(target) {
            Ok(id) => id,
            Err(err) => return self.record(err),
        };
        if self.state.pixel_unpack_buffer.is_some() {
            return self.record(glow::INVALID_OPERATION);
        }
        if width < 0 || height < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        let unpack = self.unpack_options();
        let Some(texels) = raster::unpack_texels(format, ty, width as u32, height as u32, pixels, unpack)
        else {
            return self.record(glow::INVALID_OPERATION);
        };
        if level != 0 {
            return;
        }
        let Some(image) = self.textures.get_mut(&id).and_then(|t| t.images.get_mut(&target)) else {
            return self.record(glow::INVALID_OPERATION);
        };
        let fits = x_offset >= 0
            && y_offset >= 0
            && (x_offset + width) as u32 <= image.width
            && (y_offset + height) as u32 <= image.height;
        if !fits {
            return self.record(glow::INVALID_VALUE);
        }
        for row in 0..height {
            for col in 0..width {
                let texel = texels[(row * width + col) as usize];
                image.put(x_offset + col, y_offset + row, texel, [true; 4]);
            }
        }
    }

    fn tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        let id = match self.texture_for_bind_target(target) {
            Ok(id) => id,
            Err(err) => return self.record(err),
        };
        if levels < 1 || width < 1 || height < 1 {
            return self.record(glow::INVALID_VALUE);
        }
        let Some(texture) = self.textures.get_mut(&id) else {
            return;
        };
        if texture.immutable {
            return self.record(glow::INVALID_OPERATION);
        }
        let faces: &[u32] = if target == glow::TEXTURE_CUBE_MAP {
            &CUBE_FACES
        } else {
            &[glow::TEXTURE_2D]
        };
        for face in faces {
            texture
                .images
                .insert(*face, Image::new(width as u32, height as u32));
        }
        texture.internal_format = internal_format;
        texture.immutable = true;
    }

    fn copy_tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let id = match self.texture_for_image_target(target) {
            Ok(id) => id,
            Err(err) => return self.record(err),
        };
        if width < 0 || height < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        if let Err(err) = self.read_rgba8(Rect::from_xywh(x, y, width, height), &mut pixels, Pack::TIGHT) {
            return self.record(err);
        }
        if level != 0 {
            return;
        }
        let Some(image) = self.textures.get_mut(&id).and_then(|t| t.images.get_mut(&target)) else {
            return self.record(glow::INVALID_OPERATION);
        };
        for row in 0..height {
            for col in 0..width {
                let at = ((row * width + col) * 4) as usize;
                let texel = [pixels[at], pixels[at + 1], pixels[at + 2], pixels[at + 3]];
                image.put(x_offset + col, y_offset + row, texel, [true; 4]);
            }
        }
    }

    fn generate_mipmap(&mut self, target: u32) {
        if let Err(err) = self.texture_for_bind_target(target) {
            self.record(err);
        }
    }

    fn create_sampler(&mut self) -> Option<SamplerId> {
        let id = SamplerId::new(self.alloc_name())?;
        self.samplers.insert(id, BTreeMap::new());
        Some(id)
    }

    fn delete_sampler(&mut self, sampler: SamplerId) {
        if self.samplers.remove(&sampler).is_some() {
            for unit in &mut self.state.units {
                if unit.sampler == Some(sampler) {
                    unit.sampler = None;
                }
            }
        }
    }

    fn is_sampler(&mut self, sampler: SamplerId) -> bool {
        self.samplers.contains_key(&sampler)
    }

    fn bind_sampler(&mut self, unit: u32, sampler: Option<SamplerId>) {
        if sampler.is_some_and(|s| !self.samplers.contains_key(&s)) {
            return self.record(glow::INVALID_OPERATION);
        }
        match self.state.units.get_mut(unit as usize) {
            Some(u) => u.sampler = sampler,
            None => self.record(glow::INVALID_VALUE),
        }
    }

    fn sampler_parameter_i32(&mut self, sampler: SamplerId, pname: u32, param: i32) {
        match self.samplers.get_mut(&sampler) {
            Some(params) => {
                params.insert(pname, param);
            }
            None => self.record(glow::INVALID_OPERATION),
        }
    }

    // --- framebuffers & renderbuffers ----------------------------------------------------

    fn create_framebuffer(&mut self) -> Option<FramebufferId> {
        let id = FramebufferId::new(self.alloc_name())?;
        self.framebuffers
            .insert(id, FramebufferObject::new(self.limits.draw_buffers));
        Some(id)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.framebuffers.remove(&framebuffer).is_none() {
            return;
        }
        if self.state.draw_framebuffer == Some(framebuffer) {
            self.state.draw_framebuffer = None;
        }
        if self.state.read_framebuffer == Some(framebuffer) {
            self.state.read_framebuffer = None;
        }
    }

    fn is_framebuffer(&mut self, framebuffer: FramebufferId) -> bool {
        self.framebuffers.contains_key(&framebuffer)
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<FramebufferId>) {
        if framebuffer.is_some_and(|f| !self.framebuffers.contains_key(&f)) {
            return self.record(glow::INVALID_OPERATION);
        }
        match target {
            glow::FRAMEBUFFER => {
                self.state.draw_framebuffer = framebuffer;
                self.state.read_framebuffer = framebuffer;
            }
            glow::DRAW_FRAMEBUFFER => self.state.draw_framebuffer = framebuffer,
            glow::READ_FRAMEBUFFER => self.state.read_framebuffer = framebuffer,
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        tex_target: u32,
        texture: Option<TextureId>,
        level: i32,
    ) {
        let value = match texture {
            None => None,
            Some(id) if self.textures.contains_key(&id) => Some(Attachment::Texture {
                texture: id,
                image_target: tex_target,
                level,
            }),
            Some(_) => return self.record(glow::INVALID_OPERATION),
        };
        self.attach_to_framebuffer(target, attachment, value);
    }

    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Option<RenderbufferId>,
    ) {
        if renderbuffer_target != glow::RENDERBUFFER {
            return self.record(glow::INVALID_ENUM);
        }
        let value = match renderbuffer {
            None => None,
            Some(id) if self.renderbuffers.contains_key(&id) => Some(Attachment::Renderbuffer(id)),
            Some(_) => return self.record(glow::INVALID_OPERATION),
        };
        self.attach_to_framebuffer(target, attachment, value);
    }

    fn check_framebuffer_status(&mut self, target: u32) -> u32 {
        match self.framebuffer_for_target(target) {
            Ok(fb) => self.framebuffer_status(fb),
            Err(err) => {
                self.record(err);
                0
            }
        }
    }

    fn get_framebuffer_attachment_parameter_i32(
        &mut self,
        target: u32,
        attachment: u32,
        pname: u32,
    ) -> i32 {
        let fb = match self.framebuffer_for_target(target) {
            Ok(fb) => fb,
            Err(err) => {
                self.record(err);
                return 0;
            }
        };
        let Some(fb) = fb else {
            if !matches!(attachment, glow::BACK | glow::DEPTH | glow::STENCIL) {
                self.record(glow::INVALID_OPERATION);
                return 0;
            }
            return match pname {
                glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE => glow::FRAMEBUFFER_DEFAULT as i32,
                _ => 0,
            };
        };
        let attached = self
            .framebuffers
            .get(&fb)
            .and_then(|f| f.attachments.get(&attachment))
            .copied();
        match (pname, attached) {
            (glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, None) => glow::NONE as i32,
            (glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, Some(Attachment::Texture { .. })) => {
                glow::TEXTURE as i32
            }
            (glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, Some(Attachment::Renderbuffer(_))) => {
                glow::RENDERBUFFER as i32
            }
            (glow::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME, Some(Attachment::Texture { texture, .. })) => {
                texture.get() as i32
            }
            (glow::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME, Some(Attachment::Renderbuffer(rb))) => {
                rb.get() as i32
            }
            (glow::FRAMEBUFFER_ATTACHMENT_TEXTURE_LEVEL, Some(Attachment::Texture { level, .. })) => {
                level
            }
            _ => 0,
        }
    }

    fn draw_buffers(&mut self, buffers: &[u32]) {
        if buffers.len() > self.limits.draw_buffers as usize {
            return self.record(glow::INVALID_VALUE);
        }
        match self.state.draw_framebuffer {
            None => match buffers {
                [b] if *b == glow::BACK || *b == glow::NONE => self.default_draw_buffer = *b,
                _ => self.record(glow::INVALID_OPERATION),
            },
            Some(id) => {
                let valid = buffers
                    .iter()
                    .enumerate()
                    .all(|(i, b)| *b == glow::NONE || *b == glow::COLOR_ATTACHMENT0 + i as u32);
                if !valid {
                    return self.record(glow::INVALID_OPERATION);
                }
                let max = self.limits.draw_buffers as usize;
                if let Some(fb) = self.framebuffers.get_mut(&id) {
                    fb.draw_buffers = buffers.to_vec();
                    fb.draw_buffers.resize(max, glow::NONE);
                }
            }
        }
    }

    fn read_buffer(&mut self, src: u32) {
        match self.state.read_framebuffer {
            None => match src {
                glow::BACK | glow::NONE => self.default_read_buffer = src,
                _ => self.record(glow::INVALID_OPERATION),
            },
            Some(id) => {
                let colors = glow::COLOR_ATTACHMENT0..glow::COLOR_ATTACHMENT0 + self.limits.draw_buffers;
                if src != glow::NONE && !colors.contains(&src) {
                    return self.record(glow::INVALID_OPERATION);
                }
                if let Some(fb) = self.framebuffers.get_mut(&id) {
                    fb.read_buffer = src;
                }
            }
        }
    }

    fn blit_framebuffer(
        &mut self,
        src_x0: i32,
        src_y0: i32,
        src_x1: i32,
        src_y1: i32,
        dst_x0: i32,
        dst_y0: i32,
        dst_x1: i32,
        dst_y1: i32,
        mask: u32,
        filter: u32,
    ) {
        if filter != glow::NEAREST && filter != glow::LINEAR {
            return self.record(glow::INVALID_ENUM);
        }
        if self.framebuffer_status(self.state.draw_framebuffer) != glow::FRAMEBUFFER_COMPLETE {
            return self.record(glow::INVALID_FRAMEBUFFER_OPERATION);
        }
        if mask & glow::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let src = Rect {
            x0: src_x0,
            y0: src_y0,
            x1: src_x1,
            y1: src_y1,
        };
        let dst = Rect {
            x0: dst_x0,
            y0: dst_y0,
            x1: dst_x1,
            y1: dst_y1,
        };
        if let Err(err) = self.blit_color(src, dst) {
            self.record(err);
        }
    }

    fn invalidate_framebuffer(&mut self, target: u32, _attachments: &[u32]) {
        if let Err(err) = self.framebuffer_for_target(target) {
            self.record(err);
        }
    }

    fn create_renderbuffer(&mut self) -> Option<RenderbufferId> {
        let id = RenderbufferId::new(self.alloc_name())?;
        self.renderbuffers.insert(id, RenderbufferObject::default());
        Some(id)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        if self.renderbuffers.remove(&renderbuffer).is_none() {
            return;
        }
        if self.state.renderbuffer == Some(renderbuffer) {
            self.state.renderbuffer = None;
        }
        self.detach_everywhere(|a| *a == Attachment::Renderbuffer(renderbuffer));
    }

    fn is_renderbuffer(&mut self, renderbuffer: RenderbufferId) -> bool {
        self.renderbuffers.contains_key(&renderbuffer)
    }

    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: Option<RenderbufferId>) {
        if target != glow::RENDERBUFFER {
            return self.record(glow::INVALID_ENUM);
        }
        if renderbuffer.is_some_and(|r| !self.renderbuffers.contains_key(&r)) {
            return self.record(glow::INVALID_OPERATION);
        }
        self.state.renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage(&mut self, target: u32, internal_format: u32, width: i32, height: i32) {
        if target != glow::RENDERBUFFER {
            return self.record(glow::INVALID_ENUM);
        }
        let max = self.limits.max_texture_size as i32;
        if width < 0 || height < 0 || width > max || height > max {
            return self.record(glow::INVALID_VALUE);
        }
        let Some(rb) = self
            .state
            .renderbuffer
            .and_then(|id| self.renderbuffers.get_mut(&id))
        else {
            return self.record(glow::INVALID_OPERATION);
        };
        rb.internal_format = internal_format;
        rb.image = Image::new(width as u32, height as u32);
    }

    // --- vertex arrays & transform feedback ----------------------------------------------

    fn create_vertex_array(&mut self) -> Option<VertexArrayId> {
        let id = VertexArrayId::new(self.alloc_name())?;
        self.vertex_arrays
            .insert(id, VertexArrayState::new(self.limits.vertex_attribs));
        Some(id)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.vertex_arrays.remove(&vertex_array).is_some()
            && self.state.vertex_array == Some(vertex_array)
        {
            self.state.vertex_array = None;
        }
    }

    fn is_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool {
        self.vertex_arrays.contains_key(&vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        if vertex_array.is_some_and(|v| !self.vertex_arrays.contains_key(&v)) {
            return self.record(glow::INVALID_OPERATION);
        }
        self.state.vertex_array = vertex_array;
    }

    fn create_transform_feedback(&mut self) -> Option<TransformFeedbackId> {
        let id = TransformFeedbackId::new(self.alloc_name())?;
        self.transform_feedbacks.insert(id);
        Some(id)
    }

    fn delete_transform_feedback(&mut self, transform_feedback: TransformFeedbackId) {
        if self.transform_feedbacks.remove(&transform_feedback)
            && self.state.transform_feedback == Some(transform_feedback)
        {
            self.state.transform_feedback = None;
        }
    }

    fn bind_transform_feedback(&mut self, target: u32, transform_feedback: Option<TransformFeedbackId>) {
        if target != glow::TRANSFORM_FEEDBACK {
            return self.record(glow::INVALID_ENUM);
        }
        if transform_feedback.is_some_and(|t| !self.transform_feedbacks.contains(&t)) {
            return self.record(glow::INVALID_OPERATION);
        }
        self.state.transform_feedback = transform_feedback;
    }

    // --- shaders & programs --------------------------------------------------------------

    fn create_shader(&mut self, shader_type: u32) -> Option<ShaderId> {
        if shader_type != glow::VERTEX_SHADER && shader_type != glow::FRAGMENT_SHADER {
            self.record(glow::INVALID_ENUM);
            return None;
        }
        let id = ShaderId::new(self.alloc_name())?;
        self.shaders.insert(
            id,
            ShaderObject {
                shader_type,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        Some(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        match self.shaders.get_mut(&shader) {
            Some(s) => s.source = source.to_string(),
            None => self.record(glow::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        let Some(s) = self.shaders.get_mut(&shader) else {
            return self.record(glow::INVALID_VALUE);
        };
        s.compiled = s.source.contains("main");
        s.info_log = if s.compiled {
            String::new()
        } else {
            "ERROR: 0:1: 'main' : function not defined".to_string()
        };
    }

    fn get_shader_compile_status(&mut self, shader: ShaderId) -> bool {
        self.shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&mut self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::new(self.alloc_name())?;
        self.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.state.program == Some(program) {
            if let Some(p) = self.programs.get_mut(&program) {
                p.delete_pending = true;
            }
        } else {
            self.programs.remove(&program);
        }
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if !self.shaders.contains_key(&shader) {
            return self.record(glow::INVALID_VALUE);
        }
        match self.programs.get_mut(&program) {
            Some(p) if p.shaders.contains(&shader) => self.record(glow::INVALID_OPERATION),
            Some(p) => p.shaders.push(shader),
            None => self.record(glow::INVALID_VALUE),
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        match self.programs.get_mut(&program) {
            Some(p) => p.shaders.retain(|s| *s != shader),
            None => self.record(glow::INVALID_VALUE),
        }
    }

    fn bind_attrib_location(&mut self, program: ProgramId, index: u32, name: &str) {
        if index >= self.limits.vertex_attribs {
            return self.record(glow::INVALID_VALUE);
        }
        match self.programs.get_mut(&program) {
            Some(p) => {
                p.attrib_bindings.insert(name.to_string(), index);
            }
            None => self.record(glow::INVALID_VALUE),
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        let Some(p) = self.programs.get(&program) else {
            return self.record(glow::INVALID_VALUE);
        };
        let stage = |ty: u32| {
            p.shaders
                .iter()
                .filter_map(|id| self.shaders.get(id))
                .find(|s| s.shader_type == ty)
        };
        let result = match (stage(glow::VERTEX_SHADER), stage(glow::FRAGMENT_SHADER)) {
            (Some(vs), Some(fs)) if vs.compiled && fs.compiled => Ok(shader::link(
                &shader::parse_interface(&vs.source, true),
                &shader::parse_interface(&fs.source, false),
                &p.attrib_bindings,
            )),
            (Some(_), Some(_)) => Err("attached shaders are not compiled"),
            _ => Err("program needs a vertex and a fragment shader"),
        };
        let Some(p) = self.programs.get_mut(&program) else {
            return;
        };
        p.uniform_values.clear();
        match result {
            Ok(linked) => {
                p.linked = Some(linked);
                p.info_log.clear();
            }
            Err(log) => {
                p.linked = None;
                p.info_log = log.to_string();
            }
        }
    }

    fn get_program_link_status(&mut self, program: ProgramId) -> bool {
        self.programs
            .get(&program)
            .is_some_and(|p| p.linked.is_some())
    }

    fn get_program_info_log(&mut self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        if let Some(id) = program {
            if !self.programs.get(&id).is_some_and(|p| p.linked.is_some()) {
                return self.record(glow::INVALID_OPERATION);
            }
        }
        let previous = std::mem::replace(&mut self.state.program, program);
        if let Some(prev) = previous.filter(|p| Some(*p) != program) {
            if self.programs.get(&prev).is_some_and(|p| p.delete_pending) {
                self.programs.remove(&prev);
            }
        }
    }

    fn get_attrib_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs
            .get(&program)?
            .linked
            .as_ref()?
            .attribute_location(name)
    }

    fn get_uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self
            .programs
            .get(&program)?
            .linked
            .as_ref()?
            .uniform_index(name)?;
        Some(UniformLocation { program, index })
    }

    fn uniform_1_i32(&mut self, location: Option<&UniformLocation>, x: i32) {
        self.set_uniform(location, UniformValue::Int(x));
    }

    fn uniform_1_f32(&mut self, location: Option<&UniformLocation>, x: f32) {
        self.set_uniform(location, UniformValue::Floats(vec![x]));
    }

    fn uniform_4_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(location, UniformValue::Floats(vec![x, y, z, w]));
    }

    fn uniform_4_f32_slice(&mut self, location: Option<&UniformLocation>, v: &[f32]) {
        self.set_uniform(location, UniformValue::Floats(v.to_vec()));
    }

    fn uniform_matrix_4_f32_slice(
        &mut self,
        location: Option<&UniformLocation>,
        transpose: bool,
        v: &[f32],
    ) {
        if transpose {
            return self.record(glow::INVALID_VALUE);
        }
        self.set_uniform(location, UniformValue::Floats(v.to_vec()));
    }

    fn get_uniform_block_index(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?;
        linked
            .blocks
            .iter()
            .position(|b| b == name)
            .map(|i| i as u32)
    }

    fn uniform_block_binding(&mut self, program: ProgramId, index: u32, binding: u32) {
        if binding >= self.limits.uniform_buffer_bindings {
            return self.record(glow::INVALID_VALUE);
        }
        let Some(p) = self.programs.get_mut(&program) else {
            return self.record(glow::INVALID_VALUE);
        };
        let blocks = p.linked.as_ref().map_or(0, |l| l.blocks.len());
        if index as usize >= blocks {
            return self.record(glow::INVALID_VALUE);
        }
        p.block_bindings.insert(index, binding);
    }

    // --- vertex attributes ---------------------------------------------------------------

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        if self.check_attrib_index(index) {
            self.vao_mut().attribs[index as usize].enabled = true;
        }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        if self.check_attrib_index(index) {
            self.vao_mut().attribs[index as usize].enabled = false;
        }
    }

    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        if !self.check_attrib_index(index) {
            return;
        }
        if !(1..=4).contains(&size) || !(0..=255).contains(&stride) || offset < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        let buffer = self.state.array_buffer;
        if buffer.is_none() && offset != 0 {
            return self.record(glow::INVALID_OPERATION);
        }
        let attrib = &mut self.vao_mut().attribs[index as usize];
        attrib.size = size;
        attrib.data_type = data_type;
        attrib.normalized = normalized;
        attrib.integer = false;
        attrib.stride = stride;
        attrib.offset = offset;
        attrib.buffer = buffer;
    }

    fn vertex_attrib_pointer_i32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    ) {
        self.vertex_attrib_pointer_f32(index, size, data_type, false, stride, offset);
        if index < self.limits.vertex_attribs {
            self.vao_mut().attribs[index as usize].integer = true;
        }
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        if self.check_attrib_index(index) {
            self.vao_mut().attribs[index as usize].divisor = divisor;
        }
    }

    fn vertex_attrib_4_f32(&mut self, index: u32, x: f32, y: f32, z: f32, w: f32) {
        self.set_current_attrib(index, VertexAttribValue::Float([x, y, z, w]));
    }

    fn vertex_attrib_i4_i32(&mut self, index: u32, x: i32, y: i32, z: i32, w: i32) {
        self.set_current_attrib(index, VertexAttribValue::Int([x, y, z, w]));
    }

    fn vertex_attrib_i4_u32(&mut self, index: u32, x: u32, y: u32, z: u32, w: u32) {
        self.set_current_attrib(index, VertexAttribValue::Uint([x, y, z, w]));
    }

    fn get_vertex_attrib_current(&mut self, index: u32) -> VertexAttribValue {
        if !self.check_attrib_index(index) {
            return VertexAttribValue::default();
        }
        self.state.current_attribs[index as usize]
    }

    fn get_vertex_attrib_i32(&mut self, index: u32, pname: u32) -> i32 {
        if !self.check_attrib_index(index) {
            return 0;
        }
        let a = self.vao().attribs[index as usize];
        match pname {
            glow::VERTEX_ATTRIB_ARRAY_ENABLED => i32::from(a.enabled),
            glow::VERTEX_ATTRIB_ARRAY_SIZE => a.size,
            glow::VERTEX_ATTRIB_ARRAY_STRIDE => a.stride,
            glow::VERTEX_ATTRIB_ARRAY_TYPE => a.data_type as i32,
            glow::VERTEX_ATTRIB_ARRAY_NORMALIZED => i32::from(a.normalized),
            glow::VERTEX_ATTRIB_ARRAY_INTEGER => i32::from(a.integer),
            glow::VERTEX_ATTRIB_ARRAY_DIVISOR => a.divisor as i32,
            glow::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => raw_name(a.buffer),
            _ => {
                self.record(glow::INVALID_ENUM);
                0
            }
        }
    }

    fn get_vertex_attrib_buffer(&mut self, index: u32) -> Option<BufferId> {
        if !self.check_attrib_index(index) {
            return None;
        }
        self.vao().attribs[index as usize].buffer
    }

    // --- fixed-function state ------------------------------------------------------------

    fn enable(&mut self, cap: u32) {
        if CAPABILITIES.contains(&cap) {
            self.state.enabled.insert(cap);
        } else {
            self.record(glow::INVALID_ENUM);
        }
    }

    fn disable(&mut self, cap: u32) {
        if CAPABILITIES.contains(&cap) {
            self.state.enabled.remove(&cap);
        } else {
            self.record(glow::INVALID_ENUM);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        self.state.viewport = [x, y, width, height];
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        self.state.scissor = [x, y, width, height];
    }

    fn blend_func(&mut self, src: u32, dst: u32) {
        self.state.blend_func = [src, dst, src, dst];
    }

    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.state.blend_func = [src_rgb, dst_rgb, src_alpha, dst_alpha];
    }

    fn blend_equation(&mut self, mode: u32) {
        self.state.blend_equation = [mode, mode];
    }

    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32) {
        self.state.blend_equation = [mode_rgb, mode_alpha];
    }

    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.state.blend_color = [r, g, b, a];
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.state.clear_color = [r, g, b, a];
    }

    fn clear_depth_f32(&mut self, depth: f32) {
        self.state.clear_depth = depth.clamp(0.0, 1.0);
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.state.clear_stencil = stencil;
    }

    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.state.color_mask = [r, g, b, a];
    }

    fn cull_face(&mut self, mode: u32) {
        match mode {
            glow::FRONT | glow::BACK | glow::FRONT_AND_BACK => self.state.cull_face_mode = mode,
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn front_face(&mut self, mode: u32) {
        match mode {
            glow::CW | glow::CCW => self.state.front_face = mode,
            _ => self.record(glow::INVALID_ENUM),
        }
    }

    fn depth_func(&mut self, func: u32) {
        self.state.depth_func = func;
    }

    fn depth_mask(&mut self, flag: bool) {
        self.state.depth_mask = flag;
    }

    fn depth_range_f32(&mut self, near: f32, far: f32) {
        self.state.depth_range = [near.clamp(0.0, 1.0), far.clamp(0.0, 1.0)];
    }

    fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) {
        self.stencil_func_separate(glow::FRONT_AND_BACK, func, reference, mask);
    }

    fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32) {
        self.set_stencil(face, |s| {
            s.func = func;
            s.reference = reference;
            s.value_mask = mask;
        });
    }

    fn stencil_op(&mut self, fail: u32, depth_fail: u32, depth_pass: u32) {
        self.stencil_op_separate(glow::FRONT_AND_BACK, fail, depth_fail, depth_pass);
    }

    fn stencil_op_separate(&mut self, face: u32, fail: u32, depth_fail: u32, depth_pass: u32) {
        self.set_stencil(face, |s| {
            s.fail = fail;
            s.depth_fail = depth_fail;
            s.depth_pass = depth_pass;
        });
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.stencil_mask_separate(glow::FRONT_AND_BACK, mask);
    }

    fn stencil_mask_separate(&mut self, face: u32, mask: u32) {
        self.set_stencil(face, |s| s.write_mask = mask);
    }

    fn line_width(&mut self, width: f32) {
        if width <= 0.0 {
            return self.record(glow::INVALID_VALUE);
        }
        self.state.line_width = width;
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.state.polygon_offset = [factor, units];
    }

    fn sample_coverage(&mut self, value: f32, invert: bool) {
        self.state.sample_coverage_value = value.clamp(0.0, 1.0);
        self.state.sample_coverage_invert = invert;
    }

    fn hint(&mut self, target: u32, mode: u32) {
        match self.state.hints.get_mut(&target) {
            Some(slot) => *slot = mode,
            None => self.record(glow::INVALID_ENUM),
        }
    }

    fn pixel_store_i32(&mut self, pname: u32, param: i32) {
        let alignment = matches!(pname, glow::PACK_ALIGNMENT | glow::UNPACK_ALIGNMENT);
        if alignment && !matches!(param, 1 | 2 | 4 | 8) {
            return self.record(glow::INVALID_VALUE);
        }
        match self.state.pixel_store.get_mut(&pname) {
            Some(slot) => *slot = param,
            None => self.record(glow::INVALID_ENUM),
        }
    }

    // --- drawing & readback --------------------------------------------------------------

    fn clear(&mut self, mask: u32) {
        let known = glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT;
        if mask & !known != 0 {
            return self.record(glow::INVALID_VALUE);
        }
        if self.framebuffer_status(self.state.draw_framebuffer) != glow::FRAMEBUFFER_COMPLETE {
            return self.record(glow::INVALID_FRAMEBUFFER_OPERATION);
        }
        if mask & glow::COLOR_BUFFER_BIT != 0 {
            self.clear_color_buffers();
        }
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        self.draw(mode, Vertices::Range { first, count }, 1);
    }

    fn draw_elements(&mut self, mode: u32, count: i32, element_type: u32, offset: i32) {
        self.draw(
            mode,
            Vertices::Elements {
                count,
                ty: element_type,
                offset,
            },
            1,
        );
    }

    fn draw_arrays_instanced(&mut self, mode: u32, first: i32, count: i32, instance_count: i32) {
        self.draw(mode, Vertices::Range { first, count }, instance_count);
    }

    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    ) {
        self.draw(
            mode,
            Vertices::Elements {
                count,
                ty: element_type,
                offset,
            },
            instance_count,
        );
    }

    fn draw_range_elements(
        &mut self,
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        element_type: u32,
        offset: i32,
    ) {
        if end < start {
            return self.record(glow::INVALID_VALUE);
        }
        self.draw_elements(mode, count, element_type, offset);
    }

    fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        out: &mut [u8],
    ) {
        if width < 0 || height < 0 {
            return self.record(glow::INVALID_VALUE);
        }
        if format != glow::RGBA || ty != glow::UNSIGNED_BYTE || self.state.pixel_pack_buffer.is_some() {
            return self.record(glow::INVALID_OPERATION);
        }
        let pack = self.pack_options();
        if out.len() < pack.required_len(width as usize, height as usize) {
            return self.record(glow::INVALID_OPERATION);
        }
        if let Err(err) = self.read_rgba8(Rect::from_xywh(x, y, width, height), out, pack) {
            self.record(err);
        }
    }

    fn finish(&mut self) {
        trace!("soft gl finish");
    }

    fn flush(&mut self) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VS: &str = "attribute vec4 position; void main() { gl_Position = position; gl_PointSize = 1.0; }";
    const FS: &str = "precision mediump float; uniform vec4 u_color; void main() { gl_FragColor = u_color; }";

    fn flat_program(gl: &mut SoftGl) -> ProgramId {
        let vs = gl.create_shader(glow::VERTEX_SHADER).unwrap();
        gl.shader_source(vs, VS);
        gl.compile_shader(vs);
        let fs = gl.create_shader(glow::FRAGMENT_SHADER).unwrap();
        gl.shader_source(fs, FS);
        gl.compile_shader(fs);
        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        assert!(gl.get_program_link_status(program));
        program
    }

    #[test]
    fn initial_state_matches_es3_defaults() {
        let mut gl = SoftGl::new(8, 4);
        assert!(gl.is_enabled(glow::DITHER));
        assert!(!gl.is_enabled(glow::SCISSOR_TEST));
        let mut scissor = [0; 4];
        gl.get_parameter_i32_slice(glow::SCISSOR_BOX, &mut scissor);
        assert_eq!(scissor, [0, 0, 8, 4]);
        assert_eq!(gl.get_parameter_i32(glow::STENCIL_WRITEMASK), -1);
        assert_eq!(gl.get_parameter_i32(glow::UNPACK_ALIGNMENT), 4);
        assert_eq!(gl.get_parameter_i32(glow::DRAW_BUFFER0), glow::BACK as i32);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }

    #[test]
    fn first_error_wins_until_queried() {
        let mut gl = SoftGl::new(1, 1);
        gl.enable(0xdead);
        gl.viewport(0, 0, -1, 1);
        assert_eq!(gl.get_error(), glow::INVALID_ENUM);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }

    #[test]
    fn clear_honours_scissor_and_color_mask() {
        let mut gl = SoftGl::new(2, 1);
        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        gl.enable(glow::SCISSOR_TEST);
        gl.scissor(1, 0, 1, 1);
        gl.color_mask(true, false, true, true);
        gl.clear(glow::COLOR_BUFFER_BIT);
        assert_eq!(gl.default_framebuffer_pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(gl.default_framebuffer_pixel(1, 0), Some([255, 0, 255, 255]));
    }

    #[test]
    fn points_land_in_their_viewport_pixel() {
        let mut gl = SoftGl::new(2, 2);
        let program = flat_program(&mut gl);
        gl.use_program(Some(program));
        let color = gl.get_uniform_location(program, "u_color");
        gl.uniform_4_f32(color.as_ref(), 0.0, 1.0, 0.0, 1.0);

        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        let position: Vec<u8> = [0.5f32, 0.5].iter().flat_map(|f| f.to_le_bytes()).collect();
        gl.buffer_data(glow::ARRAY_BUFFER, &position, glow::STATIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 0, 0);
        gl.draw_arrays(glow::POINTS, 0, 1);

        assert_eq!(gl.get_error(), glow::NO_ERROR);
        assert_eq!(gl.default_framebuffer_pixel(1, 1), Some([0, 255, 0, 255]));
        assert_eq!(gl.default_framebuffer_pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(gl.draw_calls(), 1);
    }

    #[test]
    fn framebuffer_texture_round_trip_through_read_pixels() {
        let mut gl = SoftGl::new(1, 1);
        let tex = gl.create_texture().unwrap();
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            1,
            1,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(&[10, 20, 30, 40]),
        );
        let fb = gl.create_framebuffer().unwrap();
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
        gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, Some(tex), 0);
        assert_eq!(gl.check_framebuffer_status(glow::FRAMEBUFFER), glow::FRAMEBUFFER_COMPLETE);

        let mut out = [0u8; 4];
        gl.read_pixels(0, 0, 1, 1, glow::RGBA, glow::UNSIGNED_BYTE, &mut out);
        assert_eq!(out, [10, 20, 30, 40]);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }

    #[test]
    fn read_pixels_follows_the_pack_layout() {
        let mut gl = SoftGl::new(1, 1);
        let tex = gl.create_texture().unwrap();
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            1,
            2,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(&[1, 2, 3, 4, 5, 6, 7, 8]),
        );
        let fb = gl.create_framebuffer().unwrap();
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
        gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, Some(tex), 0);
        gl.pixel_store_i32(glow::PACK_ROW_LENGTH, 2);
        gl.pixel_store_i32(glow::PACK_SKIP_ROWS, 1);
        gl.pixel_store_i32(glow::PACK_SKIP_PIXELS, 1);

        let mut short = [0u8; 8];
        gl.read_pixels(0, 0, 1, 2, glow::RGBA, glow::UNSIGNED_BYTE, &mut short);
        assert_eq!(gl.get_error(), glow::INVALID_OPERATION);

        let mut out = [0u8; 24];
        gl.read_pixels(0, 0, 1, 2, glow::RGBA, glow::UNSIGNED_BYTE, &mut out);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
        assert_eq!(&out[12..16], &[1, 2, 3, 4]);
        assert_eq!(&out[20..24], &[5, 6, 7, 8]);
        assert_eq!(&out[..12], &[0; 12]);
    }

    #[test]
    fn null_upload_with_unpack_buffer_reads_from_the_buffer() {
        let mut gl = SoftGl::new(1, 1);
        let tex = gl.create_texture().unwrap();
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        let pbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, Some(pbo));
        gl.tex_image_2d(glow::TEXTURE_2D, 0, glow::RGBA as i32, 4, 4, 0, glow::RGBA, glow::UNSIGNED_BYTE, None);
        assert_eq!(gl.get_error(), glow::INVALID_OPERATION);
        assert_eq!(gl.texture_size(tex), None);

        gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
        gl.tex_image_2d(glow::TEXTURE_2D, 0, glow::RGBA as i32, 4, 4, 0, glow::RGBA, glow::UNSIGNED_BYTE, None);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
        assert_eq!(gl.texture_size(tex), Some((4, 4)));
    }

    #[test]
    fn deleting_bound_objects_unbinds_them() {
        let mut gl = SoftGl::new(1, 1);
        let fb = gl.create_framebuffer().unwrap();
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
        gl.bind_vertex_array(Some(vao));
        gl.delete_framebuffer(fb);
        gl.delete_vertex_array(vao);
        assert_eq!(gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING), None);
        assert_eq!(gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING), None);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn indexed_uniform_binding_overwrites_generic_binding() {
        let mut gl = SoftGl::new(1, 1);
        let a = gl.create_buffer().unwrap();
        let b = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::UNIFORM_BUFFER, Some(a));
        gl.bind_buffer_range(glow::UNIFORM_BUFFER, 3, Some(b), 16, 64);
        assert_eq!(gl.get_parameter_buffer(glow::UNIFORM_BUFFER_BINDING), Some(b));
        assert_eq!(gl.get_parameter_indexed_buffer(glow::UNIFORM_BUFFER_BINDING, 3), Some(b));
        assert_eq!(gl.get_parameter_indexed_i64(glow::UNIFORM_BUFFER_START, 3), 16);
        assert_eq!(gl.get_parameter_indexed_i64(glow::UNIFORM_BUFFER_SIZE, 3), 64);
    }

    #[test]
    fn current_vertex_attribs_keep_their_entry_point() {
        let mut gl = SoftGl::new(1, 1);
        gl.vertex_attrib_i4_u32(2, 1, 2, 3, 4);
        assert_eq!(gl.get_vertex_attrib_current(2), VertexAttribValue::Uint([1, 2, 3, 4]));
        assert_eq!(gl.get_vertex_attrib_current(3), VertexAttribValue::default());
    }
}
