use crate::handles::{
    BufferId, FramebufferId, ProgramId, RenderbufferId, SamplerId, ShaderId, TextureId,
    TransformFeedbackId, UniformLocation, VertexArrayId,
};

/// Current value of a generic vertex attribute (`CURRENT_VERTEX_ATTRIB`).
///
/// GL remembers which entry point last wrote the value, so restoring it must go through the
/// matching `vertex_attrib_*` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VertexAttribValue {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}

impl Default for VertexAttribValue {
    fn default() -> Self {
        VertexAttribValue::Float([0.0, 0.0, 0.0, 1.0])
    }
}

/// The physical graphics context shared by every virtual context.
///
/// The surface mirrors an OpenGL ES 3.0 / WebGL 2 context in the shape of `glow::HasContext`:
/// enums are raw `u32` values, integer parameters are `i32`, object names are typed handles
/// and "no object" is `None`. Errors are reported exclusively through [`PhysicalGl::get_error`],
/// exactly like the real API; implementations never panic on invalid input.
pub trait PhysicalGl {
    // --- state queries -------------------------------------------------------------------

    fn get_error(&mut self) -> u32;
    fn get_parameter_i32(&mut self, pname: u32) -> i32;
    fn get_parameter_f32(&mut self, pname: u32) -> f32;
    fn get_parameter_bool(&mut self, pname: u32) -> bool;
    fn get_parameter_i32_slice(&mut self, pname: u32, out: &mut [i32]);
    fn get_parameter_f32_slice(&mut self, pname: u32, out: &mut [f32]);
    fn get_parameter_bool_slice(&mut self, pname: u32, out: &mut [bool]);
    fn get_parameter_string(&mut self, pname: u32) -> String;
    fn get_parameter_buffer(&mut self, pname: u32) -> Option<BufferId>;
    fn get_parameter_texture(&mut self, pname: u32) -> Option<TextureId>;
    fn get_parameter_framebuffer(&mut self, pname: u32) -> Option<FramebufferId>;
    fn get_parameter_renderbuffer(&mut self, pname: u32) -> Option<RenderbufferId>;
    fn get_parameter_vertex_array(&mut self, pname: u32) -> Option<VertexArrayId>;
    fn get_parameter_program(&mut self, pname: u32) -> Option<ProgramId>;
    fn get_parameter_sampler(&mut self, pname: u32) -> Option<SamplerId>;
    fn get_parameter_transform_feedback(&mut self, pname: u32) -> Option<TransformFeedbackId>;
    fn get_parameter_indexed_buffer(&mut self, pname: u32, index: u32) -> Option<BufferId>;
    fn get_parameter_indexed_i64(&mut self, pname: u32, index: u32) -> i64;
    fn is_enabled(&mut self, cap: u32) -> bool;

    fn supported_extensions(&mut self) -> Vec<String>;
    /// Enables `name` on the physical context. Returns `false` when unsupported.
    fn enable_extension(&mut self, name: &str) -> bool;

    // --- buffers -------------------------------------------------------------------------

    fn create_buffer(&mut self) -> Option<BufferId>;
    fn delete_buffer(&mut self, buffer: BufferId);
    fn is_buffer(&mut self, buffer: BufferId) -> bool;
    fn bind_buffer(&mut self, target: u32, buffer: Option<BufferId>);
    fn bind_buffer_base(&mut self, target: u32, index: u32, buffer: Option<BufferId>);
    fn bind_buffer_range(
        &mut self,
        target: u32,
        index: u32,
        buffer: Option<BufferId>,
        offset: i64,
        size: i64,
    );
    fn buffer_data_size(&mut self, target: u32, size: i64, usage: u32);
    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32);
    fn buffer_sub_data(&mut self, target: u32, offset: i64, data: &[u8]);
    fn get_buffer_sub_data(&mut self, target: u32, offset: i64, out: &mut [u8]);
    fn copy_buffer_sub_data(
        &mut self,
        read_target: u32,
        write_target: u32,
        read_offset: i64,
        write_offset: i64,
        size: i64,
    );

    // --- textures & samplers -------------------------------------------------------------

    fn create_texture(&mut self) -> Option<TextureId>;
    fn delete_texture(&mut self, texture: TextureId);
    fn is_texture(&mut self, texture: TextureId) -> bool;
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: u32, texture: Option<TextureId>);
    fn tex_parameter_i32(&mut self, target: u32, pname: u32, param: i32);
    fn tex_parameter_f32(&mut self, target: u32, pname: u32, param: f32);
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    fn tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    fn generate_mipmap(&mut self, target: u32);

    fn create_sampler(&mut self) -> Option<SamplerId>;
    fn delete_sampler(&mut self, sampler: SamplerId);
    fn is_sampler(&mut self, sampler: SamplerId) -> bool;
    fn bind_sampler(&mut self, unit: u32, sampler: Option<SamplerId>);
    fn sampler_parameter_i32(&mut self, sampler: SamplerId, pname: u32, param: i32);

    // --- framebuffers & renderbuffers ----------------------------------------------------

    fn create_framebuffer(&mut self) -> Option<FramebufferId>;
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);
    fn is_framebuffer(&mut self, framebuffer: FramebufferId) -> bool;
    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<FramebufferId>);
    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        tex_target: u32,
        texture: Option<TextureId>,
        level: i32,
    );
    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Option<RenderbufferId>,
    );
    fn check_framebuffer_status(&mut self, target: u32) -> u32;
    fn get_framebuffer_attachment_parameter_i32(
        &mut self,
        target: u32,
        attachment: u32,
        pname: u32,
    ) -> i32;
    fn draw_buffers(&mut self, buffers: &[u32]);
    fn read_buffer(&mut self, src: u32);
    #[allow(clippy::too_many_arguments)]
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
    );
    fn invalidate_framebuffer(&mut self, target: u32, attachments: &[u32]);

    fn create_renderbuffer(&mut self) -> Option<RenderbufferId>;
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);
    fn is_renderbuffer(&mut self, renderbuffer: RenderbufferId) -> bool;
    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: Option<RenderbufferId>);
    fn renderbuffer_storage(&mut self, target: u32, internal_format: u32, width: i32, height: i32);

    // --- vertex arrays & transform feedback ----------------------------------------------

    fn create_vertex_array(&mut self) -> Option<VertexArrayId>;
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
    fn is_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool;
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    fn create_transform_feedback(&mut self) -> Option<TransformFeedbackId>;
    fn delete_transform_feedback(&mut self, transform_feedback: TransformFeedbackId);
    fn bind_transform_feedback(&mut self, target: u32, transform_feedback: Option<TransformFeedbackId>);

    // --- shaders & programs --------------------------------------------------------------

    fn create_shader(&mut self, shader_type: u32) -> Option<ShaderId>;
    fn delete_shader(&mut self, shader: ShaderId);
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn get_shader_compile_status(&mut self, shader: ShaderId) -> bool;
    fn get_shader_info_log(&mut self, shader: ShaderId) -> String;

    fn create_program(&mut self) -> Option<ProgramId>;
    fn delete_program(&mut self, program: ProgramId);
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn bind_attrib_location(&mut self, program: ProgramId, index: u32, name: &str);
    fn link_program(&mut self, program: ProgramId);
    fn get_program_link_status(&mut self, program: ProgramId) -> bool;
    fn get_program_info_log(&mut self, program: ProgramId) -> String;
    fn use_program(&mut self, program: Option<ProgramId>);
    fn get_attrib_location(&mut self, program: ProgramId, name: &str) -> Option<u32>;
    fn get_uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn uniform_1_i32(&mut self, location: Option<&UniformLocation>, x: i32);
    fn uniform_1_f32(&mut self, location: Option<&UniformLocation>, x: f32);
    fn uniform_4_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32);
    fn uniform_4_f32_slice(&mut self, location: Option<&UniformLocation>, v: &[f32]);
    fn uniform_matrix_4_f32_slice(
        &mut self,
        location: Option<&UniformLocation>,
        transpose: bool,
        v: &[f32],
    );
    fn get_uniform_block_index(&mut self, program: ProgramId, name: &str) -> Option<u32>;
    fn uniform_block_binding(&mut self, program: ProgramId, index: u32, binding: u32);

    // --- vertex attributes ---------------------------------------------------------------

    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_pointer_i32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);
    fn vertex_attrib_4_f32(&mut self, index: u32, x: f32, y: f32, z: f32, w: f32);
    fn vertex_attrib_i4_i32(&mut self, index: u32, x: i32, y: i32, z: i32, w: i32);
    fn vertex_attrib_i4_u32(&mut self, index: u32, x: u32, y: u32, z: u32, w: u32);
    fn get_vertex_attrib_current(&mut self, index: u32) -> VertexAttribValue;
    fn get_vertex_attrib_i32(&mut self, index: u32, pname: u32) -> i32;
    fn get_vertex_attrib_buffer(&mut self, index: u32) -> Option<BufferId>;

    // --- fixed-function state ------------------------------------------------------------

    fn enable(&mut self, cap: u32);
    fn disable(&mut self, cap: u32);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn blend_func(&mut self, src: u32, dst: u32);
    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    fn blend_equation(&mut self, mode: u32);
    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32);
    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth_f32(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);
    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool);
    fn cull_face(&mut self, mode: u32);
    fn front_face(&mut self, mode: u32);
    fn depth_func(&mut self, func: u32);
    fn depth_mask(&mut self, flag: bool);
    fn depth_range_f32(&mut self, near: f32, far: f32);
    fn stencil_func(&mut self, func: u32, reference: i32, mask: u32);
    fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32);
    fn stencil_op(&mut self, fail: u32, depth_fail: u32, depth_pass: u32);
    fn stencil_op_separate(&mut self, face: u32, fail: u32, depth_fail: u32, depth_pass: u32);
    fn stencil_mask(&mut self, mask: u32);
    fn stencil_mask_separate(&mut self, face: u32, mask: u32);
    fn line_width(&mut self, width: f32);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn sample_coverage(&mut self, value: f32, invert: bool);
    fn hint(&mut self, target: u32, mode: u32);
    fn pixel_store_i32(&mut self, pname: u32, param: i32);

    // --- drawing & readback --------------------------------------------------------------

    fn clear(&mut self, mask: u32);
    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, element_type: u32, offset: i32);
    fn draw_arrays_instanced(&mut self, mode: u32, first: i32, count: i32, instance_count: i32);
    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    );
    fn draw_range_elements(
        &mut self,
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        element_type: u32,
        offset: i32,
    );
    #[allow(clippy::too_many_arguments)]
    fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        out: &mut [u8],
    );
    fn finish(&mut self);
    fn flush(&mut self);
}
