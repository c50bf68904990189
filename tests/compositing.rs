mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::*;
use glmux::{
    CompositeError, Compositor, ContextAttributes, ContextHandle, ContextKind, ContextOptions,
    DestinationSurface, OffscreenTarget, SetupOptions, SurfaceError, SurfaceRef,
};
use glmux_gl::glow;
use glmux_gl::{PhysicalGl, SoftGl};
use pretty_assertions::assert_eq;

#[test]
fn red_and_green_points_reach_their_own_surfaces() {
    let vz = virtualizer();
    let (ma, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl");
    let b = context(&vz, &sb, "webgl2");
    let flat_a = flat_program(&a);
    let flat_b = flat_program(&b);

    draw_point(&a, &flat_a, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    draw_point(&b, &flat_b, 0.0, 0.0, [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(ma.presents(), 0);

    let report = vz.flush();
    assert_eq!(report.composited, vec![a.id(), b.id()]);
    assert!(report.failures.is_empty());
    assert_eq!(ma.pixel(2, 1), Some(RED));
    assert_eq!(mb.pixel(2, 1), Some(GREEN));
    assert_eq!(ma.pixel(0, 0), Some(CLEAR));
    assert_eq!(ma.frame().len(), 4 * 4 * 4);
}

#[test]
fn composites_are_coalesced_into_one_scheduled_flush() {
    let vz = virtualizer();
    let scheduled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&scheduled);
    vz.set_flush_scheduler(move || counter.set(counter.get() + 1));

    let (ma, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");
    let flat = flat_program(&a);
    for _ in 0..3 {
        draw_point(&a, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    }
    draw_point(&b, &flat, 0.0, 0.0, [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(scheduled.get(), 1);
    assert!(vz.is_flush_pending());

    let report = vz.flush();
    assert_eq!(report.composited.len(), 2);
    assert_eq!((ma.presents(), mb.presents()), (1, 1));
    assert!(vz.flush().is_empty());

    let stats = vz.stats();
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.composites_attempted, 2);
    assert_eq!(stats.composites_succeeded, 2);

    b.clear(glow::COLOR_BUFFER_BIT).unwrap();
    assert_eq!(scheduled.get(), 2);
}

#[test]
fn drawing_into_an_application_framebuffer_does_not_composite() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");

    let texture = ctx.create_texture().unwrap();
    ctx.bind_texture(glow::TEXTURE_2D, texture).unwrap();
    ctx.tex_image_2d(glow::TEXTURE_2D, 0, glow::RGBA as i32, 2, 2, 0, glow::RGBA, glow::UNSIGNED_BYTE, None)
        .unwrap();
    let fb = ctx.create_framebuffer().unwrap();
    ctx.bind_framebuffer(glow::FRAMEBUFFER, fb).unwrap();
    ctx.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, texture, 0)
        .unwrap();
    ctx.clear(glow::COLOR_BUFFER_BIT).unwrap();

    assert!(!vz.is_flush_pending());
    assert!(vz.flush().is_empty());
    assert_eq!(m.presents(), 0);
}

#[test]
fn a_failing_surface_does_not_block_the_others() {
    let vz = virtualizer();
    let (ma, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    ma.push_outcome(Err(SurfaceError::Rejected("detached".into())));
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");
    let flat = flat_program(&a);
    draw_point(&a, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    draw_point(&b, &flat, 0.0, 0.0, [0.0, 1.0, 0.0, 1.0]);

    let report = vz.flush();
    assert_eq!(
        report.failures,
        vec![(
            a.id(),
            CompositeError::Surface(SurfaceError::Rejected("detached".into()))
        )]
    );
    assert_eq!(report.composited, vec![b.id()]);
    assert_eq!(ma.presents(), 0);
    assert_eq!(mb.pixel(2, 1), Some(GREEN));
    assert_eq!(vz.stats().composites_failed, 1);

    // The next frame goes through.
    draw_point(&a, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(vz.flush().composited, vec![a.id()]);
    assert_eq!(ma.pixel(2, 1), Some(RED));
}

#[test]
fn the_drawing_buffer_is_cleared_after_presenting() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    ctx.clear_color(0.0, 0.0, 1.0, 1.0).unwrap();

    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    let mut pixel = [0u8; 4];
    ctx.read_pixels(2, 2, 1, 1, glow::RGBA, glow::UNSIGNED_BYTE, &mut pixel).unwrap();
    assert_eq!(pixel, RED);
    vz.flush();

    // Reads see the cleared buffer, not the presented frame.
    ctx.read_pixels(2, 2, 1, 1, glow::RGBA, glow::UNSIGNED_BYTE, &mut pixel).unwrap();
    assert_eq!(pixel, CLEAR);

    // The owed clear ignores the scissor and leaves the client's state alone.
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    ctx.enable(glow::SCISSOR_TEST).unwrap();
    ctx.scissor(0, 0, 1, 1).unwrap();
    draw_point(&ctx, &flat, -1.0, -1.0, [0.0, 1.0, 0.0, 1.0]);
    vz.flush();
    assert_eq!(m.pixel(2, 1), Some(RED));
    assert_eq!(m.pixel(0, 3), Some(GREEN));

    draw_point(&ctx, &flat, -1.0, -1.0, [0.0, 1.0, 0.0, 1.0]);
    vz.flush();
    assert_eq!(m.pixel(0, 3), Some(GREEN));
    assert_eq!(m.pixel(2, 1), Some(CLEAR));

    assert!(ctx.is_enabled(glow::SCISSOR_TEST).unwrap());
    let mut scissor = [0; 4];
    ctx.get_parameter_i32_slice(glow::SCISSOR_BOX, &mut scissor).unwrap();
    assert_eq!(scissor, [0, 0, 1, 1]);
    let mut color = [0.0; 4];
    ctx.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color).unwrap();
    assert_eq!(color, [0.0, 0.0, 1.0, 1.0]);
    assert!(vz.stats().deferred_clears >= 2);
}

#[test]
fn preserved_drawing_buffers_accumulate() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context_with(&vz, &s, "webgl2", r#"{"preserveDrawingBuffer": true}"#);
    let flat = flat_program(&ctx);

    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();
    draw_point(&ctx, &flat, -1.0, -1.0, [0.0, 1.0, 0.0, 1.0]);
    vz.flush();

    assert_eq!(m.pixel(2, 1), Some(RED));
    assert_eq!(m.pixel(0, 3), Some(GREEN));
    assert_eq!(vz.stats().deferred_clears, 0);
}

#[test]
fn opaque_contexts_present_full_alpha() {
    let vz = virtualizer();
    let (m, s) = surface(2, 2);
    let ctx = context_with(&vz, &s, "webgl2", r#"{"alpha": false}"#);
    ctx.clear_color(0.0, 0.0, 1.0, 0.0).unwrap();
    ctx.clear(glow::COLOR_BUFFER_BIT).unwrap();
    vz.flush();
    assert_eq!(m.pixel(1, 1).map(|p| p[3]), Some(255));
    assert_eq!(m.pixel(1, 1).map(|p| p[2]), Some(255));
}

#[test]
fn resizing_the_surface_reallocates_between_draws() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();
    assert_eq!(m.frame().len(), 4 * 4 * 4);

    m.resize(8, 6);
    assert_eq!(ctx.drawing_buffer_width().unwrap(), 8);
    ctx.viewport(0, 0, 8, 6).unwrap();
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();

    assert_eq!(m.frame().len(), 8 * 6 * 4);
    assert_eq!(m.pixel(4, 2), Some(RED));
    assert_eq!(vz.stats().resizes, 2);
}

#[test]
fn resizing_with_an_unpack_buffer_bound_keeps_the_binding() {
    let vz = virtualizer();
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    let pbo = ctx.create_buffer().unwrap();
    ctx.bind_buffer(glow::PIXEL_UNPACK_BUFFER, pbo).unwrap();
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();

    m.resize(6, 6);
    ctx.viewport(0, 0, 6, 6).unwrap();
    draw_point(&ctx, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    vz.flush();

    assert_eq!(m.frame().len(), 6 * 6 * 4);
    assert_eq!(m.pixel(3, 2), Some(RED));
    assert_eq!(ctx.get_parameter_buffer(glow::PIXEL_UNPACK_BUFFER_BINDING).unwrap(), pbo);
    assert_eq!(ctx.get_error().unwrap(), glow::NO_ERROR);
    assert_eq!(vz.stats().resizes, 2);
}

#[test]
fn readback_ignores_the_owner_pack_state() {
    let vz = virtualizer();
    let pbo = vz.with_physical(|gl| {
        let pbo = gl.create_buffer();
        gl.bind_buffer(glow::PIXEL_PACK_BUFFER, pbo);
        gl.pixel_store_i32(glow::PACK_ROW_LENGTH, 5);
        gl.pixel_store_i32(glow::PACK_SKIP_ROWS, 1);
        pbo
    });
    let (m, s) = surface(4, 4);
    let ctx = context(&vz, &s, "webgl2");
    let flat = flat_program(&ctx);
    draw_point(&ctx, &flat, 0.0, 0.0, [0.0, 1.0, 0.0, 1.0]);

    let report = vz.flush();
    assert!(report.failures.is_empty());
    assert_eq!(m.pixel(2, 1), Some(GREEN));
    vz.with_physical(|gl| {
        assert_eq!(gl.get_parameter_buffer(glow::PIXEL_PACK_BUFFER_BINDING), pbo);
        assert_eq!(gl.get_parameter_i32(glow::PACK_ROW_LENGTH), 5);
        assert_eq!(gl.get_parameter_i32(glow::PACK_SKIP_ROWS), 1);
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    });
}

#[test]
fn depth_and_stencil_buffers_follow_the_attributes() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let ctx = context_with(&vz, &s, "webgl2", r#"{"depth": false, "stencil": true}"#);
    let object_type = |attachment| {
        ctx.get_framebuffer_attachment_parameter_i32(
            glow::FRAMEBUFFER,
            attachment,
            glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE,
        )
        .unwrap()
    };
    assert_eq!(object_type(glow::STENCIL), glow::FRAMEBUFFER_DEFAULT as i32);
    assert_eq!(object_type(glow::DEPTH), glow::FRAMEBUFFER_DEFAULT as i32);

    let (_, bare) = surface(4, 4);
    let ctx = context_with(&vz, &bare, "webgl2", r#"{"depth": false}"#);
    assert_eq!(
        ctx.get_framebuffer_attachment_parameter_i32(
            glow::FRAMEBUFFER,
            glow::DEPTH,
            glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE
        )
        .unwrap(),
        glow::NONE as i32
    );
}

/// Records every frame it is asked to composite.
#[derive(Default)]
struct RecordingCompositor {
    frames: Rc<RefCell<Vec<(u32, u32)>>>,
    disposed: Rc<Cell<bool>>,
}

impl Compositor<SoftGl> for RecordingCompositor {
    fn composite(
        &mut self,
        gl: &mut SoftGl,
        source: &OffscreenTarget,
        surface: &dyn DestinationSurface,
        _attributes: &ContextAttributes,
    ) -> Result<(), CompositeError> {
        assert_eq!((surface.width(), surface.height()), (source.width, source.height));
        assert_eq!(gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING), None);
        // Leave state behind on purpose; the flush restores the owner's state afterwards.
        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        self.frames.borrow_mut().push((source.width, source.height));
        Ok(())
    }

    fn dispose(&mut self, _gl: &mut SoftGl) {
        self.disposed.set(true);
    }
}

#[test]
fn custom_compositors_come_from_the_configured_factory() {
    let vz = virtualizer();
    let frames = Rc::new(RefCell::new(Vec::new()));
    let disposed = Rc::new(Cell::new(false));
    let requests = Rc::new(RefCell::new(Vec::new()));
    let (f, d, r) = (Rc::clone(&frames), Rc::clone(&disposed), Rc::clone(&requests));
    vz.setup(SetupOptions {
        compositor_factory: Some(Rc::new(
            move |surface: &SurfaceRef, kind: ContextKind, attributes: &ContextAttributes| {
                r.borrow_mut().push((Rc::clone(surface), kind, *attributes));
                Box::new(RecordingCompositor {
                    frames: Rc::clone(&f),
                    disposed: Rc::clone(&d),
                }) as Box<dyn Compositor<SoftGl>>
            },
        )),
        ..Default::default()
    });

    let (m, s) = surface(3, 2);
    let ctx = context_with(&vz, &s, "webgl2", r#"{"stencil": true, "alpha": false}"#);
    {
        let requests = requests.borrow();
        assert_eq!(requests.len(), 1);
        let (surface, kind, attributes) = &requests[0];
        assert!(Rc::ptr_eq(surface, &s));
        assert_eq!(*kind, ContextKind::WebGl2);
        assert_eq!(*attributes, ctx.get_context_attributes().unwrap());
        assert!(attributes.stencil);
        assert!(!attributes.alpha);
    }
    ctx.clear(glow::COLOR_BUFFER_BIT).unwrap();
    vz.flush();
    assert_eq!(*frames.borrow(), vec![(3, 2)]);
    assert_eq!(m.presents(), 0);

    let mut color = [0.0; 4];
    vz.with_physical(|gl| gl.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color));
    assert_eq!(color, [0.0, 0.0, 0.0, 0.0]);

    ctx.dispose().unwrap();
    assert!(disposed.get());
}

#[test]
fn contexts_are_memoized_and_kinds_gated() {
    let vz = virtualizer();
    let (_, s) = surface(4, 4);
    let first = context(&vz, &s, "webgl");
    let again = context(&vz, &s, "experimental-webgl");
    assert_eq!(first, again);
    assert!(vz.get_context(&s, "webgl2", &ContextOptions::default()).unwrap().is_none());
    assert!(vz.get_context(&s, "2d", &ContextOptions::default()).unwrap().is_none());

    let native = vz
        .get_context_or_else(&s, "2d", &ContextOptions::default(), |_, kind| {
            Some(format!("native {kind}"))
        })
        .unwrap();
    assert!(matches!(native, Some(ContextHandle::Native(ref name)) if name == "native 2d"));
    let wrapped = vz
        .get_context_or_else(&s, "webgl", &ContextOptions::default(), |_, _| Some(String::new()))
        .unwrap();
    assert!(matches!(wrapped, Some(ContextHandle::Virtual(ref ctx)) if *ctx == first));

    vz.setup(SetupOptions::from_json(r#"{"disableWebGL1": true}"#).unwrap());
    let (_, other) = surface(4, 4);
    assert!(vz.get_context(&other, "webgl", &ContextOptions::default()).unwrap().is_none());
    assert!(vz.get_context(&other, "webgl2", &ContextOptions::default()).unwrap().is_some());

    vz.setup(SetupOptions::default());
    let (_, third) = surface(4, 4);
    assert!(vz.get_context(&third, "webgl", &ContextOptions::default()).unwrap().is_none());
    assert_eq!(vz.context_count(), 2);
}

#[test]
fn stats_are_exported_as_json() {
    let vz = virtualizer();
    let (_, sa) = surface(4, 4);
    let (_, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");
    a.clear(glow::COLOR_BUFFER_BIT).unwrap();
    b.clear(glow::COLOR_BUFFER_BIT).unwrap();
    vz.flush();

    let json: serde_json::Value = serde_json::from_str(&vz.stats_json()).unwrap();
    assert_eq!(json["contexts_created"], 2);
    assert_eq!(json["composites_succeeded"], 2);
    assert_eq!(json["flushes"], 1);
    // base -> a, a -> b, b -> base
    assert_eq!(json["context_switches"], 3);
}
