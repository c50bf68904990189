//! Capturing and re-applying [`Snapshot`]s on the physical context.
//!
//! Restore order matters: texture units and samplers first, then object bindings (indexed
//! uniform-buffer bindings before the generic ones, since `bind_buffer_base` also rewrites
//! the generic `UNIFORM_BUFFER` binding), framebuffers before the read buffer that applies
//! to them, and extension hooks last so they see the restored framebuffer.

use glmux_gl::glow;
use glmux_gl::webgl;
use glmux_gl::{PhysicalGl, VertexAttribValue};

use crate::extensions::ExtensionHook;
use crate::state::{
    EnableFlags, IndexedBufferBinding, Limits, Snapshot, StencilFaceState, TextureUnitBindings,
};

/// Reads the live physical state into `snapshot`.
pub fn save<G: PhysicalGl + ?Sized>(
    gl: &mut G,
    limits: &Limits,
    hooks: &[ExtensionHook],
    snapshot: &mut Snapshot,
) {
    let s = snapshot;

    s.active_texture = gl.get_parameter_i32(glow::ACTIVE_TEXTURE) as u32;
    s.texture_units.resize(limits.texture_units as usize, TextureUnitBindings::default());
    s.samplers.resize(limits.texture_units as usize, None);
    for unit in 0..limits.texture_units {
        gl.active_texture(glow::TEXTURE0 + unit);
        s.texture_units[unit as usize] = TextureUnitBindings {
            texture_2d: gl.get_parameter_texture(glow::TEXTURE_BINDING_2D),
            cube_map: gl.get_parameter_texture(glow::TEXTURE_BINDING_CUBE_MAP),
            texture_2d_array: gl.get_parameter_texture(glow::TEXTURE_BINDING_2D_ARRAY),
            texture_3d: gl.get_parameter_texture(glow::TEXTURE_BINDING_3D),
        };
        s.samplers[unit as usize] = gl.get_parameter_sampler(glow::SAMPLER_BINDING);
    }
    gl.active_texture(s.active_texture);

    s.vertex_array = gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING);
    s.transform_feedback = gl.get_parameter_transform_feedback(glow::TRANSFORM_FEEDBACK_BINDING);

    s.uniform_buffers.clear();
    for index in 0..limits.uniform_buffer_bindings {
        s.uniform_buffers.push(IndexedBufferBinding {
            buffer: gl.get_parameter_indexed_buffer(glow::UNIFORM_BUFFER_BINDING, index),
            offset: gl.get_parameter_indexed_i64(glow::UNIFORM_BUFFER_START, index),
            size: gl.get_parameter_indexed_i64(glow::UNIFORM_BUFFER_SIZE, index),
        });
    }
    s.buffers.array = gl.get_parameter_buffer(glow::ARRAY_BUFFER_BINDING);
    s.buffers.copy_read = gl.get_parameter_buffer(glow::COPY_READ_BUFFER);
    s.buffers.copy_write = gl.get_parameter_buffer(glow::COPY_WRITE_BUFFER);
    s.buffers.pixel_pack = gl.get_parameter_buffer(glow::PIXEL_PACK_BUFFER_BINDING);
    s.buffers.pixel_unpack = gl.get_parameter_buffer(glow::PIXEL_UNPACK_BUFFER_BINDING);
    s.buffers.transform_feedback = gl.get_parameter_buffer(glow::TRANSFORM_FEEDBACK_BUFFER_BINDING);
    s.buffers.uniform = gl.get_parameter_buffer(glow::UNIFORM_BUFFER_BINDING);

    s.renderbuffer = gl.get_parameter_renderbuffer(glow::RENDERBUFFER_BINDING);
    s.read_framebuffer = gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING);
    s.draw_framebuffer = gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING);
    s.read_buffer = gl.get_parameter_i32(glow::READ_BUFFER) as u32;

    s.enabled = EnableFlags::empty();
    for (flag, cap) in EnableFlags::CAPABILITIES {
        if gl.is_enabled(cap) {
            s.enabled |= flag;
        }
    }

    let ps = &mut s.pixel_store;
    ps.pack_alignment = gl.get_parameter_i32(glow::PACK_ALIGNMENT);
    ps.unpack_alignment = gl.get_parameter_i32(glow::UNPACK_ALIGNMENT);
    ps.pack_row_length = gl.get_parameter_i32(glow::PACK_ROW_LENGTH);
    ps.pack_skip_pixels = gl.get_parameter_i32(glow::PACK_SKIP_PIXELS);
    ps.pack_skip_rows = gl.get_parameter_i32(glow::PACK_SKIP_ROWS);
    ps.unpack_row_length = gl.get_parameter_i32(glow::UNPACK_ROW_LENGTH);
    ps.unpack_image_height = gl.get_parameter_i32(glow::UNPACK_IMAGE_HEIGHT);
    ps.unpack_skip_pixels = gl.get_parameter_i32(glow::UNPACK_SKIP_PIXELS);
    ps.unpack_skip_rows = gl.get_parameter_i32(glow::UNPACK_SKIP_ROWS);
    ps.unpack_skip_images = gl.get_parameter_i32(glow::UNPACK_SKIP_IMAGES);
    ps.unpack_flip_y = gl.get_parameter_bool(webgl::UNPACK_FLIP_Y_WEBGL);
    ps.unpack_premultiply_alpha = gl.get_parameter_bool(webgl::UNPACK_PREMULTIPLY_ALPHA_WEBGL);
    ps.unpack_colorspace_conversion =
        gl.get_parameter_i32(webgl::UNPACK_COLORSPACE_CONVERSION_WEBGL) as u32;

    s.program = gl.get_parameter_program(glow::CURRENT_PROGRAM);

    gl.get_parameter_i32_slice(glow::VIEWPORT, &mut s.viewport);
    gl.get_parameter_i32_slice(glow::SCISSOR_BOX, &mut s.scissor);

    let blend = &mut s.blend;
    blend.src_rgb = gl.get_parameter_i32(glow::BLEND_SRC_RGB) as u32;
    blend.dst_rgb = gl.get_parameter_i32(glow::BLEND_DST_RGB) as u32;
    blend.src_alpha = gl.get_parameter_i32(glow::BLEND_SRC_ALPHA) as u32;
    blend.dst_alpha = gl.get_parameter_i32(glow::BLEND_DST_ALPHA) as u32;
    blend.equation_rgb = gl.get_parameter_i32(glow::BLEND_EQUATION_RGB) as u32;
    blend.equation_alpha = gl.get_parameter_i32(glow::BLEND_EQUATION_ALPHA) as u32;
    gl.get_parameter_f32_slice(glow::BLEND_COLOR, &mut blend.color);

    gl.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut s.clear.color);
    s.clear.depth = gl.get_parameter_f32(glow::DEPTH_CLEAR_VALUE);
    s.clear.stencil = gl.get_parameter_i32(glow::STENCIL_CLEAR_VALUE);
    gl.get_parameter_bool_slice(glow::COLOR_WRITEMASK, &mut s.color_mask);

    s.depth.func = gl.get_parameter_i32(glow::DEPTH_FUNC) as u32;
    s.depth.mask = gl.get_parameter_bool(glow::DEPTH_WRITEMASK);
    gl.get_parameter_f32_slice(glow::DEPTH_RANGE, &mut s.depth.range);

    let raster = &mut s.raster;
    raster.cull_face_mode = gl.get_parameter_i32(glow::CULL_FACE_MODE) as u32;
    raster.front_face = gl.get_parameter_i32(glow::FRONT_FACE) as u32;
    raster.line_width = gl.get_parameter_f32(glow::LINE_WIDTH);
    raster.polygon_offset_factor = gl.get_parameter_f32(glow::POLYGON_OFFSET_FACTOR);
    raster.polygon_offset_units = gl.get_parameter_f32(glow::POLYGON_OFFSET_UNITS);
    raster.sample_coverage_value = gl.get_parameter_f32(glow::SAMPLE_COVERAGE_VALUE);
    raster.sample_coverage_invert = gl.get_parameter_bool(glow::SAMPLE_COVERAGE_INVERT);

    s.hints.generate_mipmap = gl.get_parameter_i32(webgl::GENERATE_MIPMAP_HINT) as u32;
    s.hints.fragment_shader_derivative =
        gl.get_parameter_i32(glow::FRAGMENT_SHADER_DERIVATIVE_HINT) as u32;

    s.stencil_front = StencilFaceState {
        func: gl.get_parameter_i32(glow::STENCIL_FUNC) as u32,
        reference: gl.get_parameter_i32(glow::STENCIL_REF),
        value_mask: gl.get_parameter_i32(glow::STENCIL_VALUE_MASK) as u32,
        write_mask: gl.get_parameter_i32(glow::STENCIL_WRITEMASK) as u32,
        fail: gl.get_parameter_i32(glow::STENCIL_FAIL) as u32,
        depth_fail: gl.get_parameter_i32(glow::STENCIL_PASS_DEPTH_FAIL) as u32,
        depth_pass: gl.get_parameter_i32(glow::STENCIL_PASS_DEPTH_PASS) as u32,
    };
    s.stencil_back = StencilFaceState {
        func: gl.get_parameter_i32(glow::STENCIL_BACK_FUNC) as u32,
        reference: gl.get_parameter_i32(glow::STENCIL_BACK_REF),
        value_mask: gl.get_parameter_i32(glow::STENCIL_BACK_VALUE_MASK) as u32,
        write_mask: gl.get_parameter_i32(glow::STENCIL_BACK_WRITEMASK) as u32,
        fail: gl.get_parameter_i32(glow::STENCIL_BACK_FAIL) as u32,
        depth_fail: gl.get_parameter_i32(glow::STENCIL_BACK_PASS_DEPTH_FAIL) as u32,
        depth_pass: gl.get_parameter_i32(glow::STENCIL_BACK_PASS_DEPTH_PASS) as u32,
    };

    s.vertex_attribs.clear();
    for index in 0..limits.vertex_attribs {
        s.vertex_attribs.push(gl.get_vertex_attrib_current(index));
    }

    for hook in hooks {
        hook.save(gl, limits, s);
    }
}

/// Applies `snapshot` to the physical context.
pub fn restore<G: PhysicalGl + ?Sized>(gl: &mut G, hooks: &[ExtensionHook], snapshot: &Snapshot) {
    let s = snapshot;

    for (unit, bindings) in s.texture_units.iter().enumerate() {
        gl.active_texture(glow::TEXTURE0 + unit as u32);
        gl.bind_texture(glow::TEXTURE_2D, bindings.texture_2d);
        gl.bind_texture(glow::TEXTURE_CUBE_MAP, bindings.cube_map);
        gl.bind_texture(glow::TEXTURE_2D_ARRAY, bindings.texture_2d_array);
        gl.bind_texture(glow::TEXTURE_3D, bindings.texture_3d);
    }
    gl.active_texture(s.active_texture);

    for (unit, sampler) in s.samplers.iter().enumerate() {
        gl.bind_sampler(unit as u32, *sampler);
    }

    gl.bind_vertex_array(s.vertex_array);
    gl.bind_transform_feedback(glow::TRANSFORM_FEEDBACK, s.transform_feedback);

    for (index, binding) in s.uniform_buffers.iter().enumerate() {
        let index = index as u32;
        match binding.buffer {
            Some(_) if binding.offset != 0 || binding.size != 0 => gl.bind_buffer_range(
                glow::UNIFORM_BUFFER,
                index,
                binding.buffer,
                binding.offset,
                binding.size,
            ),
            buffer => gl.bind_buffer_base(glow::UNIFORM_BUFFER, index, buffer),
        }
    }
    let b = &s.buffers;
    gl.bind_buffer(glow::ARRAY_BUFFER, b.array);
    gl.bind_buffer(glow::COPY_READ_BUFFER, b.copy_read);
    gl.bind_buffer(glow::COPY_WRITE_BUFFER, b.copy_write);
    gl.bind_buffer(glow::PIXEL_PACK_BUFFER, b.pixel_pack);
    gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, b.pixel_unpack);
    gl.bind_buffer(glow::TRANSFORM_FEEDBACK_BUFFER, b.transform_feedback);
    gl.bind_buffer(glow::UNIFORM_BUFFER, b.uniform);

    gl.bind_renderbuffer(glow::RENDERBUFFER, s.renderbuffer);
    gl.bind_framebuffer(glow::READ_FRAMEBUFFER, s.read_framebuffer);
    gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, s.draw_framebuffer);
    gl.read_buffer(s.read_buffer);

    for (flag, cap) in EnableFlags::CAPABILITIES {
        if s.enabled.contains(flag) {
            gl.enable(cap);
        } else {
            gl.disable(cap);
        }
    }

    let ps = &s.pixel_store;
    for (pname, value) in ps.integer_params() {
        gl.pixel_store_i32(pname, value);
    }
    gl.pixel_store_i32(webgl::UNPACK_FLIP_Y_WEBGL, i32::from(ps.unpack_flip_y));
    gl.pixel_store_i32(
        webgl::UNPACK_PREMULTIPLY_ALPHA_WEBGL,
        i32::from(ps.unpack_premultiply_alpha),
    );
    gl.pixel_store_i32(
        webgl::UNPACK_COLORSPACE_CONVERSION_WEBGL,
        ps.unpack_colorspace_conversion as i32,
    );

    gl.use_program(s.program);

    let [x, y, w, h] = s.viewport;
    gl.viewport(x, y, w, h);
    let [x, y, w, h] = s.scissor;
    gl.scissor(x, y, w, h);

    let blend = &s.blend;
    gl.blend_func_separate(blend.src_rgb, blend.dst_rgb, blend.src_alpha, blend.dst_alpha);
    gl.blend_equation_separate(blend.equation_rgb, blend.equation_alpha);
    let [r, g, bl, a] = blend.color;
    gl.blend_color(r, g, bl, a);

    let [r, g, bl, a] = s.clear.color;
    gl.clear_color(r, g, bl, a);
    gl.clear_depth_f32(s.clear.depth);
    gl.clear_stencil(s.clear.stencil);
    let [r, g, bl, a] = s.color_mask;
    gl.color_mask(r, g, bl, a);

    gl.depth_func(s.depth.func);
    gl.depth_mask(s.depth.mask);
    gl.depth_range_f32(s.depth.range[0], s.depth.range[1]);

    let raster = &s.raster;
    gl.cull_face(raster.cull_face_mode);
    gl.front_face(raster.front_face);
    gl.line_width(raster.line_width);
    gl.polygon_offset(raster.polygon_offset_factor, raster.polygon_offset_units);
    gl.sample_coverage(raster.sample_coverage_value, raster.sample_coverage_invert);

    gl.hint(webgl::GENERATE_MIPMAP_HINT, s.hints.generate_mipmap);
    gl.hint(glow::FRAGMENT_SHADER_DERIVATIVE_HINT, s.hints.fragment_shader_derivative);

    restore_stencil_face(gl, glow::BACK, &s.stencil_back);
    restore_stencil_face(gl, glow::FRONT, &s.stencil_front);

    for (index, value) in s.vertex_attribs.iter().enumerate() {
        let index = index as u32;
        match *value {
            VertexAttribValue::Float([x, y, z, w]) => gl.vertex_attrib_4_f32(index, x, y, z, w),
            VertexAttribValue::Int([x, y, z, w]) => gl.vertex_attrib_i4_i32(index, x, y, z, w),
            VertexAttribValue::Uint([x, y, z, w]) => gl.vertex_attrib_i4_u32(index, x, y, z, w),
        }
    }

    for hook in hooks {
        hook.restore(gl, s);
    }
}

fn restore_stencil_face<G: PhysicalGl + ?Sized>(gl: &mut G, face: u32, state: &StencilFaceState) {
    gl.stencil_func_separate(face, state.func, state.reference, state.value_mask);
    gl.stencil_op_separate(face, state.fail, state.depth_fail, state.depth_pass);
    gl.stencil_mask_separate(face, state.write_mask);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glmux_gl::SoftGl;
    use pretty_assertions::assert_eq;

    fn fresh(gl: &mut SoftGl) -> (Limits, Snapshot) {
        let limits = Limits::query(gl);
        let mut snapshot = Snapshot::new(&limits, None, None, 0, 0);
        save(gl, &limits, &[], &mut snapshot);
        (limits, snapshot)
    }

    #[test]
    fn saving_a_fresh_context_matches_the_defaults() {
        let mut gl = SoftGl::new(64, 32);
        let (limits, saved) = fresh(&mut gl);
        assert_eq!(saved, Snapshot::new(&limits, None, None, 64, 32));
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }

    #[test]
    fn restore_round_trips_modified_state() {
        let mut gl = SoftGl::new(16, 16);
        let (limits, defaults) = fresh(&mut gl);

        let texture = gl.create_texture();
        let buffer = gl.create_buffer();
        gl.active_texture(glow::TEXTURE3);
        gl.bind_texture(glow::TEXTURE_2D, texture);
        gl.active_texture(glow::TEXTURE1);
        gl.bind_buffer(glow::ARRAY_BUFFER, buffer);
        gl.bind_buffer_base(glow::UNIFORM_BUFFER, 1, buffer);
        gl.enable(glow::BLEND);
        gl.disable(glow::DITHER);
        gl.blend_func_separate(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA, glow::ONE, glow::ZERO);
        gl.clear_color(0.25, 0.5, 0.75, 1.0);
        gl.pixel_store_i32(webgl::UNPACK_FLIP_Y_WEBGL, 1);
        gl.stencil_func_separate(glow::BACK, glow::EQUAL, 3, 0xff);
        gl.vertex_attrib_i4_i32(2, 1, 2, 3, 4);
        gl.viewport(1, 2, 3, 4);

        let mut modified = defaults.clone();
        save(&mut gl, &limits, &[], &mut modified);
        assert_eq!(modified.active_texture, glow::TEXTURE1);
        assert_eq!(modified.texture_units[3].texture_2d, texture);
        assert_eq!(modified.uniform_buffers[1].buffer, buffer);
        assert_eq!(modified.enabled, EnableFlags::BLEND);
        assert_eq!(modified.stencil_back.func, glow::EQUAL);
        assert_eq!(modified.vertex_attribs[2], VertexAttribValue::Int([1, 2, 3, 4]));

        restore(&mut gl, &[], &defaults);
        let mut after = defaults.clone();
        save(&mut gl, &limits, &[], &mut after);
        assert_eq!(after, defaults);

        restore(&mut gl, &[], &modified);
        save(&mut gl, &limits, &[], &mut after);
        assert_eq!(after, modified);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }
}
