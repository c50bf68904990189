mod common;

use common::*;
use glmux::{ContextKind, VirtualGlError};
use glmux_gl::glow;
use glmux_gl::{PhysicalGl, VertexAttribValue};
use pretty_assertions::assert_eq;

#[test]
fn interleaved_contexts_keep_their_own_state() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (_, sb) = surface(8, 2);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");

    a.clear_color(1.0, 0.0, 0.0, 1.0).unwrap();
    b.clear_color(0.0, 1.0, 0.0, 1.0).unwrap();
    a.enable(glow::BLEND).unwrap();
    b.depth_func(glow::GREATER).unwrap();
    a.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1).unwrap();

    let mut color = [0.0; 4];
    a.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color).unwrap();
    assert_eq!(color, [1.0, 0.0, 0.0, 1.0]);
    b.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color).unwrap();
    assert_eq!(color, [0.0, 1.0, 0.0, 1.0]);

    assert!(a.is_enabled(glow::BLEND).unwrap());
    assert!(!b.is_enabled(glow::BLEND).unwrap());
    assert_eq!(a.get_parameter_i32(glow::DEPTH_FUNC).unwrap(), glow::LESS as i32);
    assert_eq!(b.get_parameter_i32(glow::DEPTH_FUNC).unwrap(), glow::GREATER as i32);
    assert_eq!(a.get_parameter_i32(glow::UNPACK_ALIGNMENT).unwrap(), 1);
    assert_eq!(b.get_parameter_i32(glow::UNPACK_ALIGNMENT).unwrap(), 4);

    let mut viewport = [0; 4];
    a.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport).unwrap();
    assert_eq!(viewport, [0, 0, 4, 4]);
    b.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport).unwrap();
    assert_eq!(viewport, [0, 0, 8, 2]);
    assert_eq!(a.get_error().unwrap(), glow::NO_ERROR);
}

#[test]
fn objects_created_in_one_context_work_in_another() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");

    let texture = a.create_texture().unwrap().unwrap();
    a.bind_texture(glow::TEXTURE_2D, Some(texture)).unwrap();
    a.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA as i32,
        1,
        1,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        Some(&BLUE),
    )
    .unwrap();

    assert!(b.is_texture(texture).unwrap());
    assert_eq!(b.get_parameter_texture(glow::TEXTURE_BINDING_2D).unwrap(), None);
    let program = texture_program(&b);
    b.use_program(Some(program)).unwrap();
    b.bind_texture(glow::TEXTURE_2D, Some(texture)).unwrap();
    b.draw_arrays(glow::POINTS, 0, 1).unwrap();
    vz.flush();

    assert_eq!(mb.pixel(2, 1), Some(BLUE));
    assert_eq!(a.get_parameter_texture(glow::TEXTURE_BINDING_2D).unwrap(), Some(texture));
}

#[test]
fn fresh_context_reports_the_default_framebuffer() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");

    assert_eq!(ctx.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING).unwrap(), None);
    assert_eq!(ctx.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING).unwrap(), None);
    assert_eq!(ctx.get_parameter_i32(glow::DRAW_FRAMEBUFFER_BINDING).unwrap(), 0);
    assert_eq!(ctx.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING).unwrap(), None);
    assert_eq!(ctx.get_parameter_i32(glow::VERTEX_ARRAY_BINDING).unwrap(), 0);
    assert_eq!(ctx.get_parameter_i32(glow::READ_BUFFER).unwrap(), glow::BACK as i32);
    assert_eq!(ctx.get_parameter_i32(glow::DRAW_BUFFER0).unwrap(), glow::BACK as i32);
    assert_eq!(ctx.get_parameter_i32(glow::DRAW_BUFFER1).unwrap(), glow::NONE as i32);

    assert_eq!(
        ctx.get_framebuffer_attachment_parameter_i32(
            glow::FRAMEBUFFER,
            glow::BACK,
            glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE
        )
        .unwrap(),
        glow::FRAMEBUFFER_DEFAULT as i32
    );
    assert_eq!(
        ctx.get_framebuffer_attachment_parameter_i32(
            glow::FRAMEBUFFER,
            glow::DEPTH,
            glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE
        )
        .unwrap(),
        glow::FRAMEBUFFER_DEFAULT as i32
    );
    assert_eq!(
        ctx.get_framebuffer_attachment_parameter_i32(
            glow::FRAMEBUFFER,
            glow::STENCIL,
            glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE
        )
        .unwrap(),
        glow::NONE as i32
    );
    assert_eq!(ctx.get_error().unwrap(), glow::NO_ERROR);
}

#[test]
fn binding_none_and_deleting_the_bound_framebuffer_target_the_drawing_buffer() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);

    let fb = ctx.create_framebuffer().unwrap();
    ctx.bind_framebuffer(glow::FRAMEBUFFER, fb).unwrap();
    assert_eq!(ctx.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING).unwrap(), fb);
    ctx.bind_framebuffer(glow::FRAMEBUFFER, None).unwrap();
    assert_eq!(ctx.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING).unwrap(), None);

    ctx.bind_framebuffer(glow::FRAMEBUFFER, fb).unwrap();
    ctx.delete_framebuffer(fb.unwrap()).unwrap();
    assert_eq!(ctx.get_parameter_i32(glow::DRAW_FRAMEBUFFER_BINDING).unwrap(), 0);

    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    assert!(vz.is_flush_pending());
    vz.flush();
    assert_eq!(m.pixel(2, 1), Some(RED));
}

#[test]
fn vertex_arrays_hide_the_default_object() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");

    let vao = ctx.create_vertex_array().unwrap().unwrap();
    ctx.bind_vertex_array(Some(vao)).unwrap();
    assert_eq!(ctx.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING).unwrap(), Some(vao));
    ctx.delete_vertex_array(vao).unwrap();
    assert_eq!(ctx.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING).unwrap(), None);

    // Element array bindings live in the default vertex array.
    let indices = ctx.create_buffer().unwrap();
    ctx.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, indices).unwrap();
    assert_eq!(ctx.get_parameter_buffer(glow::ELEMENT_ARRAY_BUFFER_BINDING).unwrap(), indices);
    assert_eq!(ctx.get_error().unwrap(), glow::NO_ERROR);
}

#[test]
fn disposed_contexts_fail_naming_the_call() {
    let vz = virtualizer();
    let before = vz.inspect_physical(|gl| gl.live_objects());
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();
    ctx.clear_color(0.0, 0.0, 0.0, 1.0).unwrap();

    ctx.dispose().unwrap();
    assert!(ctx.is_disposed());
    assert_eq!(vz.context_count(), 0);
    assert_eq!(vz.current_context(), None);
    assert_eq!(vz.inspect_physical(|gl| gl.live_objects()), before);

    let err = ctx.clear(glow::COLOR_BUFFER_BIT).unwrap_err();
    assert_eq!(err, VirtualGlError::Disposed { op: "clear" });
    assert_eq!(err.to_string(), "tried to call clear on disposed context");
    assert_eq!(
        ctx.get_parameter_i32(glow::VIEWPORT).unwrap_err(),
        VirtualGlError::Disposed { op: "get_parameter_i32" }
    );
    assert!(matches!(ctx.canvas(), Err(VirtualGlError::Disposed { op: "canvas" })));
    assert_eq!(ctx.dispose().unwrap_err(), VirtualGlError::Disposed { op: "dispose" });

    let replacement = context(&vz, &s, "webgl2");
    assert!(replacement.id() > ctx.id());
    assert_eq!(vz.stats().contexts_disposed, 1);
}

#[test]
fn current_vertex_attributes_survive_switches() {
    let vz = virtualizer();
    let (ma, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");

    let pa = attribute_program(&a);
    let pb = attribute_program(&b);
    a.vertex_attrib_4_f32(1, 0.0, 0.0, 1.0, 1.0).unwrap();
    b.vertex_attrib_4_f32(1, 1.0, 0.0, 0.0, 1.0).unwrap();
    b.vertex_attrib_i4_i32(2, -1, 2, -3, 4).unwrap();

    assert_eq!(
        a.get_vertex_attrib_current(1).unwrap(),
        VertexAttribValue::Float([0.0, 0.0, 1.0, 1.0])
    );
    assert_eq!(
        b.get_vertex_attrib_current(2).unwrap(),
        VertexAttribValue::Int([-1, 2, -3, 4])
    );

    a.use_program(Some(pa)).unwrap();
    a.draw_arrays(glow::POINTS, 0, 1).unwrap();
    b.use_program(Some(pb)).unwrap();
    b.draw_arrays(glow::POINTS, 0, 1).unwrap();
    vz.flush();

    assert_eq!(ma.pixel(2, 1), Some(BLUE));
    assert_eq!(mb.pixel(2, 1), Some(RED));
}

#[test]
fn webgl1_contexts_reject_webgl2_entry_points() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "experimental-webgl");
    assert_eq!(ctx.kind().unwrap(), ContextKind::WebGl);

    let err = ctx
        .tex_storage_2d(glow::TEXTURE_2D, 1, glow::RGBA8, 1, 1)
        .unwrap_err();
    assert_eq!(
        err,
        VirtualGlError::NotAvailable {
            op: "tex_storage_2d",
            kind: ContextKind::WebGl
        }
    );
    assert_eq!(err.to_string(), "tex_storage_2d is not available on webgl contexts");
    assert!(ctx.bind_vertex_array(None).is_err());
    assert!(ctx.draw_buffers(&[glow::BACK]).is_err());
    assert!(ctx.draw_arrays_instanced(glow::POINTS, 0, 1, 1).is_err());
    assert!(ctx.create_texture().unwrap().is_some());
}

#[test]
fn overrides_answer_without_switching() {
    let vz = virtualizer();
    let (m, s) = surface(5, 3);
    let ctx = context_with(&vz, &s, "webgl2", r#"{"alpha": false, "antialias": true}"#);

    assert!(std::rc::Rc::ptr_eq(&ctx.canvas().unwrap(), &s));
    assert_eq!(ctx.drawing_buffer_width().unwrap(), 5);
    assert_eq!(ctx.drawing_buffer_height().unwrap(), 3);
    m.resize(7, 3);
    assert_eq!(ctx.drawing_buffer_width().unwrap(), 7);
    let attributes = ctx.get_context_attributes().unwrap();
    assert!(!attributes.alpha);
    assert!(!attributes.antialias);
    assert!(!ctx.is_context_lost().unwrap());

    assert_eq!(vz.current_context(), None);
    assert_eq!(vz.stats().context_switches, 0);
}

#[test]
fn owner_state_is_restored_after_every_flush() {
    let vz = virtualizer();
    vz.with_physical(|gl| {
        gl.viewport(1, 2, 3, 4);
        gl.enable(glow::SCISSOR_TEST);
        gl.clear_color(0.25, 0.5, 0.75, 1.0);
    });
    let (_, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    ctx.disable(glow::SCISSOR_TEST).unwrap();
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();

    assert_eq!(vz.current_context(), None);
    vz.inspect_physical(|gl| {
        assert_eq!(gl.default_framebuffer_pixel(8, 8), Some([0, 0, 0, 0]));
    });
    vz.with_physical(|gl| {
        let mut viewport = [0; 4];
        gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
        assert_eq!(viewport, [1, 2, 3, 4]);
        assert!(gl.is_enabled(glow::SCISSOR_TEST));
        assert_eq!(gl.get_parameter_program(glow::CURRENT_PROGRAM), None);
        assert_eq!(gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING), None);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    });
}
