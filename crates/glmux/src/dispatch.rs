//! The client-visible method surface of [`VirtualContext`].
//!
//! Generic wrappers are generated from one table: `forward` entries activate the context and
//! pass the call through, `draw` entries also perform the owed clear and schedule a composite.
//! `bespoke` and `overrides` entries are written by hand elsewhere and only listed here so
//! [`METHOD_TABLE`] covers every operation.

use glmux_gl::{
    BufferId, FramebufferId, PhysicalGl, ProgramId, RenderbufferId, SamplerId, ShaderId, TextureId,
    TransformFeedbackId, UniformLocation, VertexArrayId, VertexAttribValue,
};

use crate::context::VirtualContext;
use crate::error::Result;

/// Which context kinds expose a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Both,
    WebGl2Only,
}

/// How a method is wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapKind {
    /// Activate, then forward unchanged.
    Forward,
    /// Activate, clear if owed, forward, then schedule a composite.
    Draw,
    /// Hand-written translation of arguments or results.
    Bespoke,
    /// Answered from the engine without touching the physical context.
    Override,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodEntry {
    pub name: &'static str,
    pub kind: WrapKind,
    pub availability: Availability,
}

macro_rules! virtual_methods {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };

    (
        forward {
            $( $favail:ident fn $fname:ident ( $( $farg:ident : $fty:ty ),* ) $( -> $fret:ty )? ; )*
        }
        draw {
            $( $davail:ident fn $dname:ident ( $( $darg:ident : $dty:ty ),* ) ; )*
        }
        bespoke {
            $( $bavail:ident $bname:ident ; )*
        }
        overrides {
            $( $oname:ident ; )*
        }
    ) => {
        impl<G: PhysicalGl> VirtualContext<G> {
            $(
                #[allow(clippy::too_many_arguments)]
                pub fn $fname(&self, $( $farg: $fty ),* ) -> Result<virtual_methods!(@ret $( $fret )?)> {
                    self.forward(stringify!($fname), Availability::$favail, |gl| {
                        gl.$fname($( $farg ),*)
                    })
                }
            )*

            $(
                #[allow(clippy::too_many_arguments)]
                pub fn $dname(&self, $( $darg: $dty ),* ) -> Result<()> {
                    self.draw(stringify!($dname), Availability::$davail, |gl| {
                        gl.$dname($( $darg ),*)
                    })
                }
            )*
        }

        /// Every client-visible operation of a virtual context.
        pub static METHOD_TABLE: &[MethodEntry] = &[
            $( MethodEntry { name: stringify!($fname), kind: WrapKind::Forward, availability: Availability::$favail }, )*
            $( MethodEntry { name: stringify!($dname), kind: WrapKind::Draw, availability: Availability::$davail }, )*
            $( MethodEntry { name: stringify!($bname), kind: WrapKind::Bespoke, availability: Availability::$bavail }, )*
            $( MethodEntry { name: stringify!($oname), kind: WrapKind::Override, availability: Availability::Both }, )*
        ];
    };
}

virtual_methods! {
    forward {
        Both fn get_error() -> u32;
        Both fn get_parameter_f32(pname: u32) -> f32;
        Both fn get_parameter_bool(pname: u32) -> bool;
        Both fn get_parameter_i32_slice(pname: u32, out: &mut [i32]);
        Both fn get_parameter_f32_slice(pname: u32, out: &mut [f32]);
        Both fn get_parameter_bool_slice(pname: u32, out: &mut [bool]);
        Both fn get_parameter_string(pname: u32) -> String;
        Both fn get_parameter_buffer(pname: u32) -> Option<BufferId>;
        Both fn get_parameter_texture(pname: u32) -> Option<TextureId>;
        Both fn get_parameter_renderbuffer(pname: u32) -> Option<RenderbufferId>;
        Both fn get_parameter_program(pname: u32) -> Option<ProgramId>;
        WebGl2Only fn get_parameter_sampler(pname: u32) -> Option<SamplerId>;
        WebGl2Only fn get_parameter_transform_feedback(pname: u32) -> Option<TransformFeedbackId>;
        WebGl2Only fn get_parameter_indexed_buffer(pname: u32, index: u32) -> Option<BufferId>;
        WebGl2Only fn get_parameter_indexed_i64(pname: u32, index: u32) -> i64;
        Both fn is_enabled(cap: u32) -> bool;

        Both fn create_buffer() -> Option<BufferId>;
        Both fn delete_buffer(buffer: BufferId);
        Both fn is_buffer(buffer: BufferId) -> bool;
        Both fn bind_buffer(target: u32, buffer: Option<BufferId>);
        WebGl2Only fn bind_buffer_base(target: u32, index: u32, buffer: Option<BufferId>);
        WebGl2Only fn bind_buffer_range(target: u32, index: u32, buffer: Option<BufferId>, offset: i64, size: i64);
        Both fn buffer_data_size(target: u32, size: i64, usage: u32);
        Both fn buffer_data(target: u32, data: &[u8], usage: u32);
        Both fn buffer_sub_data(target: u32, offset: i64, data: &[u8]);
        WebGl2Only fn get_buffer_sub_data(target: u32, offset: i64, out: &mut [u8]);
        WebGl2Only fn copy_buffer_sub_data(read_target: u32, write_target: u32, read_offset: i64, write_offset: i64, size: i64);

        Both fn create_texture() -> Option<TextureId>;
        Both fn delete_texture(texture: TextureId);
        Both fn is_texture(texture: TextureId) -> bool;
        Both fn active_texture(unit: u32);
        Both fn bind_texture(target: u32, texture: Option<TextureId>);
        Both fn tex_parameter_i32(target: u32, pname: u32, param: i32);
        Both fn tex_parameter_f32(target: u32, pname: u32, param: f32);
        Both fn tex_image_2d(target: u32, level: i32, internal_format: i32, width: i32, height: i32, border: i32, format: u32, ty: u32, pixels: Option<&[u8]>);
        Both fn tex_sub_image_2d(target: u32, level: i32, x_offset: i32, y_offset: i32, width: i32, height: i32, format: u32, ty: u32, pixels: &[u8]);
        WebGl2Only fn tex_storage_2d(target: u32, levels: i32, internal_format: u32, width: i32, height: i32);
        Both fn generate_mipmap(target: u32);

        WebGl2Only fn create_sampler() -> Option<SamplerId>;
        WebGl2Only fn delete_sampler(sampler: SamplerId);
        WebGl2Only fn is_sampler(sampler: SamplerId) -> bool;
        WebGl2Only fn bind_sampler(unit: u32, sampler: Option<SamplerId>);
        WebGl2Only fn sampler_parameter_i32(sampler: SamplerId, pname: u32, param: i32);

        Both fn create_framebuffer() -> Option<FramebufferId>;
        Both fn is_framebuffer(framebuffer: FramebufferId) -> bool;
        Both fn framebuffer_texture_2d(target: u32, attachment: u32, tex_target: u32, texture: Option<TextureId>, level: i32);
        Both fn framebuffer_renderbuffer(target: u32, attachment: u32, renderbuffer_target: u32, renderbuffer: Option<RenderbufferId>);
        Both fn check_framebuffer_status(target: u32) -> u32;
        WebGl2Only fn invalidate_framebuffer(target: u32, attachments: &[u32]);

        Both fn create_renderbuffer() -> Option<RenderbufferId>;
        Both fn delete_renderbuffer(renderbuffer: RenderbufferId);
        Both fn is_renderbuffer(renderbuffer: RenderbufferId) -> bool;
        Both fn bind_renderbuffer(target: u32, renderbuffer: Option<RenderbufferId>);
        Both fn renderbuffer_storage(target: u32, internal_format: u32, width: i32, height: i32);

        WebGl2Only fn create_vertex_array() -> Option<VertexArrayId>;
        WebGl2Only fn is_vertex_array(vertex_array: VertexArrayId) -> bool;

        WebGl2Only fn create_transform_feedback() -> Option<TransformFeedbackId>;
        WebGl2Only fn delete_transform_feedback(transform_feedback: TransformFeedbackId);
        WebGl2Only fn bind_transform_feedback(target: u32, transform_feedback: Option<TransformFeedbackId>);

        Both fn create_shader(shader_type: u32) -> Option<ShaderId>;
        Both fn delete_shader(shader: ShaderId);
        Both fn shader_source(shader: ShaderId, source: &str);
        Both fn compile_shader(shader: ShaderId);
        Both fn get_shader_compile_status(shader: ShaderId) -> bool;
        Both fn get_shader_info_log(shader: ShaderId) -> String;
        Both fn create_program() -> Option<ProgramId>;
        Both fn delete_program(program: ProgramId);
        Both fn attach_shader(program: ProgramId, shader: ShaderId);
        Both fn detach_shader(program: ProgramId, shader: ShaderId);
        Both fn bind_attrib_location(program: ProgramId, index: u32, name: &str);
        Both fn link_program(program: ProgramId);
        Both fn get_program_link_status(program: ProgramId) -> bool;
        Both fn get_program_info_log(program: ProgramId) -> String;
        Both fn use_program(program: Option<ProgramId>);
        Both fn get_attrib_location(program: ProgramId, name: &str) -> Option<u32>;
        Both fn get_uniform_location(program: ProgramId, name: &str) -> Option<UniformLocation>;
        Both fn uniform_1_i32(location: Option<&UniformLocation>, x: i32);
        Both fn uniform_1_f32(location: Option<&UniformLocation>, x: f32);
        Both fn uniform_4_f32(location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32);
        Both fn uniform_4_f32_slice(location: Option<&UniformLocation>, v: &[f32]);
        Both fn uniform_matrix_4_f32_slice(location: Option<&UniformLocation>, transpose: bool, v: &[f32]);
        WebGl2Only fn get_uniform_block_index(program: ProgramId, name: &str) -> Option<u32>;
        WebGl2Only fn uniform_block_binding(program: ProgramId, index: u32, binding: u32);

        Both fn enable_vertex_attrib_array(index: u32);
        Both fn disable_vertex_attrib_array(index: u32);
        Both fn vertex_attrib_pointer_f32(index: u32, size: i32, data_type: u32, normalized: bool, stride: i32, offset: i32);
        WebGl2Only fn vertex_attrib_pointer_i32(index: u32, size: i32, data_type: u32, stride: i32, offset: i32);
        WebGl2Only fn vertex_attrib_divisor(index: u32, divisor: u32);
        Both fn vertex_attrib_4_f32(index: u32, x: f32, y: f32, z: f32, w: f32);
        WebGl2Only fn vertex_attrib_i4_i32(index: u32, x: i32, y: i32, z: i32, w: i32);
        WebGl2Only fn vertex_attrib_i4_u32(index: u32, x: u32, y: u32, z: u32, w: u32);
        Both fn get_vertex_attrib_current(index: u32) -> VertexAttribValue;
        Both fn get_vertex_attrib_i32(index: u32, pname: u32) -> i32;
        Both fn get_vertex_attrib_buffer(index: u32) -> Option<BufferId>;

        Both fn enable(cap: u32);
        Both fn disable(cap: u32);
        Both fn viewport(x: i32, y: i32, width: i32, height: i32);
        Both fn scissor(x: i32, y: i32, width: i32, height: i32);
        Both fn blend_func(src: u32, dst: u32);
        Both fn blend_func_separate(src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
        Both fn blend_equation(mode: u32);
        Both fn blend_equation_separate(mode_rgb: u32, mode_alpha: u32);
        Both fn blend_color(r: f32, g: f32, b: f32, a: f32);
        Both fn clear_color(r: f32, g: f32, b: f32, a: f32);
        Both fn clear_depth_f32(depth: f32);
        Both fn clear_stencil(stencil: i32);
        Both fn color_mask(r: bool, g: bool, b: bool, a: bool);
        Both fn cull_face(mode: u32);
        Both fn front_face(mode: u32);
        Both fn depth_func(func: u32);
        Both fn depth_mask(flag: bool);
        Both fn depth_range_f32(near: f32, far: f32);
        Both fn stencil_func(func: u32, reference: i32, mask: u32);
        Both fn stencil_func_separate(face: u32, func: u32, reference: i32, mask: u32);
        Both fn stencil_op(fail: u32, depth_fail: u32, depth_pass: u32);
        Both fn stencil_op_separate(face: u32, fail: u32, depth_fail: u32, depth_pass: u32);
        Both fn stencil_mask(mask: u32);
        Both fn stencil_mask_separate(face: u32, mask: u32);
        Both fn line_width(width: f32);
        Both fn polygon_offset(factor: f32, units: f32);
        Both fn sample_coverage(value: f32, invert: bool);
        Both fn hint(target: u32, mode: u32);
        Both fn pixel_store_i32(pname: u32, param: i32);

        Both fn finish();
        Both fn flush();
    }
    draw {
        Both fn clear(mask: u32);
        Both fn draw_arrays(mode: u32, first: i32, count: i32);
        Both fn draw_elements(mode: u32, count: i32, element_type: u32, offset: i32);
        WebGl2Only fn draw_arrays_instanced(mode: u32, first: i32, count: i32, instance_count: i32);
        WebGl2Only fn draw_elements_instanced(mode: u32, count: i32, element_type: u32, offset: i32, instance_count: i32);
        WebGl2Only fn draw_range_elements(mode: u32, start: u32, end: u32, count: i32, element_type: u32, offset: i32);
        WebGl2Only fn blit_framebuffer(src_x0: i32, src_y0: i32, src_x1: i32, src_y1: i32, dst_x0: i32, dst_y0: i32, dst_x1: i32, dst_y1: i32, mask: u32, filter: u32);
    }
    bespoke {
        Both get_parameter_i32;
        Both get_parameter_framebuffer;
        Both get_parameter_vertex_array;
        Both bind_framebuffer;
        Both delete_framebuffer;
        WebGl2Only bind_vertex_array;
        WebGl2Only delete_vertex_array;
        WebGl2Only draw_buffers;
        WebGl2Only read_buffer;
        Both get_framebuffer_attachment_parameter_i32;
        Both read_pixels;
        Both copy_tex_sub_image_2d;
        Both get_extension;
        Both get_supported_extensions;
        Both dispose;
    }
    overrides {
        canvas;
        drawing_buffer_width;
        drawing_buffer_height;
        get_context_attributes;
        is_context_lost;
        kind;
    }
}

/// Looks up how `name` is wrapped.
pub fn lookup(name: &str) -> Option<&'static MethodEntry> {
    METHOD_TABLE.iter().find(|entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn table_has_no_duplicates() {
        let mut seen = HashSet::new();
        for entry in METHOD_TABLE {
            assert!(seen.insert(entry.name), "{} listed twice", entry.name);
        }
    }

    #[test]
    fn draw_calls_are_marked() {
        for name in ["clear", "draw_arrays", "draw_elements", "blit_framebuffer"] {
            assert_eq!(lookup(name).map(|e| e.kind), Some(WrapKind::Draw), "{name}");
        }
        assert_eq!(lookup("bind_framebuffer").map(|e| e.kind), Some(WrapKind::Bespoke));
        assert_eq!(lookup("canvas").map(|e| e.kind), Some(WrapKind::Override));
        assert_eq!(lookup("get_error").map(|e| e.kind), Some(WrapKind::Forward));
        assert_eq!(lookup("no_such_method"), None);
    }

    #[test]
    fn webgl2_entry_points_are_gated() {
        for name in ["tex_storage_2d", "bind_buffer_base", "draw_arrays_instanced", "bind_vertex_array"] {
            assert_eq!(lookup(name).map(|e| e.availability), Some(Availability::WebGl2Only), "{name}");
        }
        assert_eq!(lookup("draw_arrays").map(|e| e.availability), Some(Availability::Both));
    }
}
