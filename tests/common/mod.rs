#![allow(dead_code)]

use std::rc::Rc;

use glmux::{ContextOptions, MemorySurface, SurfaceRef, VirtualContext, Virtualizer};
use glmux_gl::glow;
use glmux_gl::{ProgramId, SoftGl, UniformLocation};

pub type Ctx = VirtualContext<SoftGl>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn virtualizer() -> Virtualizer<SoftGl> {
    init_tracing();
    Virtualizer::new(SoftGl::new(16, 16))
}

/// A surface plus the type-erased handle the virtualizer keys on.
pub fn surface(width: u32, height: u32) -> (Rc<MemorySurface>, SurfaceRef) {
    let memory = Rc::new(MemorySurface::new(width, height));
    let handle: SurfaceRef = memory.clone();
    (memory, handle)
}

pub fn context(vz: &Virtualizer<SoftGl>, surface: &SurfaceRef, kind: &str) -> Ctx {
    vz.get_context(surface, kind, &ContextOptions::default())
        .unwrap()
        .unwrap()
}

pub fn context_with(vz: &Virtualizer<SoftGl>, surface: &SurfaceRef, kind: &str, json: &str) -> Ctx {
    let options = ContextOptions::from_json(json).unwrap();
    vz.get_context(surface, kind, &options).unwrap().unwrap()
}

fn link(ctx: &Ctx, vertex: &str, fragment: &str) -> ProgramId {
    let vs = ctx.create_shader(glow::VERTEX_SHADER).unwrap().unwrap();
    ctx.shader_source(vs, vertex).unwrap();
    ctx.compile_shader(vs).unwrap();
    let fs = ctx.create_shader(glow::FRAGMENT_SHADER).unwrap().unwrap();
    ctx.shader_source(fs, fragment).unwrap();
    ctx.compile_shader(fs).unwrap();
    let program = ctx.create_program().unwrap().unwrap();
    ctx.attach_shader(program, vs).unwrap();
    ctx.attach_shader(program, fs).unwrap();
    ctx.link_program(program).unwrap();
    assert!(ctx.get_program_link_status(program).unwrap());
    program
}

/// Points coloured by a `uniform vec4 color`. Position comes from attribute 0.
pub struct FlatProgram {
    pub program: ProgramId,
    pub color: UniformLocation,
}

pub fn flat_program(ctx: &Ctx) -> FlatProgram {
    let program = link(
        ctx,
        "attribute vec4 position;\nvoid main() { gl_Position = position; gl_PointSize = 1.0; }",
        "precision mediump float;\nuniform vec4 color;\nvoid main() { gl_FragColor = color; }",
    );
    let color = ctx.get_uniform_location(program, "color").unwrap().unwrap();
    FlatProgram { program, color }
}

/// Points coloured by the `color` attribute at location 1.
pub fn attribute_program(ctx: &Ctx) -> ProgramId {
    let program = link(
        ctx,
        "attribute vec4 position;\nattribute vec4 color;\nvarying vec4 v_color;\nvoid main() { gl_Position = position; v_color = color; gl_PointSize = 1.0; }",
        "precision mediump float;\nvarying vec4 v_color;\nvoid main() { gl_FragColor = v_color; }",
    );
    assert_eq!(ctx.get_attrib_location(program, "color").unwrap(), Some(1));
    program
}

/// Points coloured by texel (0,0) of the texture on unit 0.
pub fn texture_program(ctx: &Ctx) -> ProgramId {
    link(
        ctx,
        "attribute vec4 position;\nvoid main() { gl_Position = position; gl_PointSize = 1.0; }",
        "precision mediump float;\nuniform sampler2D tex;\nvoid main() { gl_FragColor = texture2D(tex, vec2(0.0)); }",
    )
}

/// Draws one point at clip-space `(x, y)` with a linked flat program.
pub fn draw_point(ctx: &Ctx, flat: &FlatProgram, x: f32, y: f32, rgba: [f32; 4]) {
    ctx.use_program(Some(flat.program)).unwrap();
    ctx.vertex_attrib_4_f32(0, x, y, 0.0, 1.0).unwrap();
    let [r, g, b, a] = rgba;
    ctx.uniform_4_f32(Some(&flat.color), r, g, b, a).unwrap();
    ctx.draw_arrays(glow::POINTS, 0, 1).unwrap();
}

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];
