mod common;

use common::*;
use glmux::{Extension, VirtualGlError};
use glmux_gl::glow;
use glmux_gl::webgl;
use pretty_assertions::assert_eq;

#[test]
fn extension_objects_are_memoized_per_context() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (_, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl");
    let b = context(&vz, &sb, "webgl");

    let first = a.get_extension(webgl::OES_VERTEX_ARRAY_OBJECT).unwrap().unwrap();
    let again = a.get_extension("oes_vertex_array_object").unwrap().unwrap();
    let other = b.get_extension(webgl::OES_VERTEX_ARRAY_OBJECT).unwrap().unwrap();
    assert_eq!(first, again);
    assert_ne!(first.id(), other.id());
    assert_eq!(first.name(), webgl::OES_VERTEX_ARRAY_OBJECT);
    assert!(first.as_vertex_array_object().is_some());

    assert!(a.get_extension("WEBGL_no_such_thing").unwrap().is_none());
}

#[test]
fn webgl1_extensions_are_core_on_webgl2() {
    let vz = virtualizer();
    let (_, s1) = surface(4, 4);
    let (_, s2) = surface(4, 4);
    let gl1 = context(&vz, &s1, "webgl");
    let gl2 = context(&vz, &s2, "webgl2");

    for name in [
        webgl::OES_VERTEX_ARRAY_OBJECT,
        webgl::ANGLE_INSTANCED_ARRAYS,
        webgl::WEBGL_DRAW_BUFFERS,
    ] {
        assert!(gl1.get_extension(name).unwrap().is_some(), "{name}");
        assert!(gl2.get_extension(name).unwrap().is_none(), "{name}");
    }

    let listed = gl1.get_supported_extensions().unwrap();
    assert!(listed.iter().any(|n| n == webgl::ANGLE_INSTANCED_ARRAYS));
    assert!(listed.iter().any(|n| n == "EXT_color_buffer_float"));
    let listed = gl2.get_supported_extensions().unwrap();
    assert!(!listed.iter().any(|n| n == webgl::ANGLE_INSTANCED_ARRAYS));
}

#[test]
fn physical_extensions_pass_through() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let ext = ctx.get_extension("EXT_color_buffer_float").unwrap().unwrap();
    let passthrough = ext.as_passthrough().unwrap();
    assert_eq!(passthrough.name(), "EXT_color_buffer_float");
    assert!(vz.inspect_physical(|gl| gl
        .enabled_extensions()
        .any(|name| name == "EXT_color_buffer_float")));
}

#[test]
fn vertex_array_extension_uses_the_default_array_for_none() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl");
    let ext = ctx.get_extension(webgl::OES_VERTEX_ARRAY_OBJECT).unwrap().unwrap();
    let Extension::VertexArrayObject(vao_ext) = &ext else {
        panic!("unexpected extension {ext:?}");
    };

    let vao = vao_ext.create_vertex_array_oes().unwrap().unwrap();
    assert!(vao_ext.is_vertex_array_oes(vao).unwrap());
    vao_ext.bind_vertex_array_oes(Some(vao)).unwrap();
    assert_eq!(
        ctx.get_parameter_vertex_array(webgl::VERTEX_ARRAY_BINDING_OES).unwrap(),
        Some(vao)
    );
    vao_ext.bind_vertex_array_oes(None).unwrap();
    assert_eq!(ctx.get_parameter_i32(webgl::VERTEX_ARRAY_BINDING_OES).unwrap(), 0);

    vao_ext.bind_vertex_array_oes(Some(vao)).unwrap();
    vao_ext.delete_vertex_array_oes(vao).unwrap();
    assert_eq!(ctx.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING).unwrap(), None);
    assert_eq!(ctx.get_error().unwrap(), glow::NO_ERROR);

    ctx.dispose().unwrap();
    assert_eq!(
        vao_ext.bind_vertex_array_oes(None).unwrap_err(),
        VirtualGlError::Disposed { op: "bind_vertex_array_oes" }
    );
}

#[test]
fn instanced_draws_schedule_composites() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl");
    let ext = ctx.get_extension(webgl::ANGLE_INSTANCED_ARRAYS).unwrap().unwrap();
    let angle = ext.as_instanced_arrays().unwrap();
    let flat = flat_program(&ctx);

    ctx.use_program(Some(flat.program)).unwrap();
    ctx.uniform_4_f32(Some(&flat.color), 0.0, 0.0, 1.0, 1.0).unwrap();
    angle.vertex_attrib_divisor_angle(0, 0).unwrap();
    angle.draw_arrays_instanced_angle(glow::POINTS, 0, 1, 2).unwrap();
    assert!(vz.is_flush_pending());
    vz.flush();
    assert_eq!(m.pixel(2, 1), Some(BLUE));
}

#[test]
fn draw_buffer_selection_survives_switches() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (_, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl");
    let b = context(&vz, &sb, "webgl2");
    let ext = a.get_extension(webgl::WEBGL_DRAW_BUFFERS).unwrap().unwrap();
    let draw_buffers = ext.as_draw_buffers().unwrap();

    draw_buffers.draw_buffers_webgl(&[glow::BACK]).unwrap();
    assert_eq!(a.get_parameter_i32(webgl::DRAW_BUFFER0_WEBGL).unwrap(), glow::BACK as i32);

    let fb = a.create_framebuffer().unwrap();
    a.bind_framebuffer(glow::FRAMEBUFFER, fb).unwrap();
    draw_buffers
        .draw_buffers_webgl(&[glow::NONE, glow::COLOR_ATTACHMENT1])
        .unwrap();

    b.draw_buffers(&[glow::BACK]).unwrap();
    assert_eq!(b.get_parameter_i32(glow::DRAW_BUFFER0).unwrap(), glow::BACK as i32);

    assert_eq!(a.get_parameter_i32(glow::DRAW_BUFFER0).unwrap(), glow::NONE as i32);
    assert_eq!(
        a.get_parameter_i32(glow::DRAW_BUFFER1).unwrap(),
        glow::COLOR_ATTACHMENT1 as i32
    );
    a.bind_framebuffer(glow::FRAMEBUFFER, None).unwrap();
    assert_eq!(a.get_parameter_i32(glow::DRAW_BUFFER0).unwrap(), glow::BACK as i32);
    assert_eq!(a.get_error().unwrap(), glow::NO_ERROR);

    vz.with_physical(|gl| {
        use glmux_gl::PhysicalGl;
        assert_eq!(gl.get_parameter_i32(glow::DRAW_BUFFER0), glow::BACK as i32);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    });
}

#[test]
fn registering_the_draw_buffers_hook_keeps_earlier_selections() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (_, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl");
    let b = context(&vz, &sb, "webgl2");

    let fb = b.create_framebuffer().unwrap();
    b.bind_framebuffer(glow::FRAMEBUFFER, fb).unwrap();
    b.draw_buffers(&[glow::NONE, glow::COLOR_ATTACHMENT1]).unwrap();

    assert!(a.get_extension(webgl::WEBGL_DRAW_BUFFERS).unwrap().is_some());

    assert_eq!(b.get_parameter_i32(glow::DRAW_BUFFER0).unwrap(), glow::NONE as i32);
    assert_eq!(
        b.get_parameter_i32(glow::DRAW_BUFFER1).unwrap(),
        glow::COLOR_ATTACHMENT1 as i32
    );
    a.get_error().unwrap();
    assert_eq!(
        b.get_parameter_i32(glow::DRAW_BUFFER1).unwrap(),
        glow::COLOR_ATTACHMENT1 as i32
    );
    assert_eq!(b.get_error().unwrap(), glow::NO_ERROR);
}
