use std::rc::Rc;

use glmux_gl::glow;
use glmux_gl::{FramebufferId, PhysicalGl, TextureId};

use crate::config::ContextAttributes;
use crate::context::ContextKind;
use crate::error::CompositeError;
use crate::surface::{DestinationSurface, SurfaceRef};

/// The offscreen colour texture of a virtual context and the size it was last allocated at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffscreenTarget {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Copies a virtual context's offscreen pixels to its destination surface.
///
/// Called with the base state current. Implementations may change state freely; the
/// virtualizer restores the base snapshot after every flush.
pub trait Compositor<G: PhysicalGl> {
    fn composite(
        &mut self,
        gl: &mut G,
        source: &OffscreenTarget,
        surface: &dyn DestinationSurface,
        attributes: &ContextAttributes,
    ) -> Result<(), CompositeError>;

    /// Releases GPU resources. Called once when the owning context is disposed.
    fn dispose(&mut self, gl: &mut G);
}

/// Builds the compositor of a new virtual context from its surface, kind and resolved
/// attributes.
pub type CompositorFactory<G> =
    Rc<dyn Fn(&SurfaceRef, ContextKind, &ContextAttributes) -> Box<dyn Compositor<G>>>;

/// Pack state the readback needs: tightly packed RGBA8 rows.
const PACK_DEFAULTS: [(u32, i32); 4] = [
    (glow::PACK_ALIGNMENT, 4),
    (glow::PACK_ROW_LENGTH, 0),
    (glow::PACK_SKIP_PIXELS, 0),
    (glow::PACK_SKIP_ROWS, 0),
];

/// Reads the offscreen texture back through a private framebuffer and hands RGBA8 rows to
/// [`DestinationSurface::present_rgba8`].
#[derive(Debug, Default)]
pub struct ReadbackCompositor {
    framebuffer: Option<FramebufferId>,
    pixels: Vec<u8>,
}

impl ReadbackCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    fn framebuffer<G: PhysicalGl>(&mut self, gl: &mut G) -> Result<FramebufferId, CompositeError> {
        if let Some(framebuffer) = self.framebuffer {
            return Ok(framebuffer);
        }
        let framebuffer = gl.create_framebuffer().ok_or(CompositeError::Allocation {
            what: "readback framebuffer",
        })?;
        self.framebuffer = Some(framebuffer);
        Ok(framebuffer)
    }
}

impl<G: PhysicalGl> Compositor<G> for ReadbackCompositor {
    fn composite(
        &mut self,
        gl: &mut G,
        source: &OffscreenTarget,
        surface: &dyn DestinationSurface,
        attributes: &ContextAttributes,
    ) -> Result<(), CompositeError> {
        let (width, height) = (source.width, source.height);
        if width == 0 || height == 0 {
            return Ok(());
        }
        let framebuffer = self.framebuffer(gl)?;

        let prev_draw = gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING);
        let prev_read = gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING);
        let prev_pack = gl.get_parameter_buffer(glow::PIXEL_PACK_BUFFER_BINDING);
        if prev_pack.is_some() {
            gl.bind_buffer(glow::PIXEL_PACK_BUFFER, None);
        }
        let prev_layout = PACK_DEFAULTS.map(|(pname, default)| {
            let value = gl.get_parameter_i32(pname);
            if value != default {
                gl.pixel_store_i32(pname, default);
            }
            (pname, value)
        });
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(source.texture),
            0,
        );

        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        let result = if status != glow::FRAMEBUFFER_COMPLETE {
            Err(CompositeError::IncompleteFramebuffer(status))
        } else {
            self.pixels.clear();
            self.pixels.resize(width as usize * height as usize * 4, 0);
            gl.read_pixels(
                0,
                0,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                &mut self.pixels,
            );
            finish_frame(&mut self.pixels, width, height, attributes);
            surface
                .present_rgba8(width, height, &self.pixels)
                .map_err(CompositeError::from)
        };

        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            None,
            0,
        );
        gl.bind_framebuffer(glow::READ_FRAMEBUFFER, prev_read);
        gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, prev_draw);
        for ((pname, value), (_, default)) in prev_layout.into_iter().zip(PACK_DEFAULTS) {
            if value != default {
                gl.pixel_store_i32(pname, value);
            }
        }
        if prev_pack.is_some() {
            gl.bind_buffer(glow::PIXEL_PACK_BUFFER, prev_pack);
        }
        result
    }

    fn dispose(&mut self, gl: &mut G) {
        if let Some(framebuffer) = self.framebuffer.take() {
            gl.delete_framebuffer(framebuffer);
        }
    }
}

/// Converts bottom-up GL rows into the top-down, premultiplied frame a surface expects.
fn finish_frame(pixels: &mut [u8], width: u32, height: u32, attributes: &ContextAttributes) {
    for px in pixels.chunks_exact_mut(4) {
        if !attributes.alpha {
            px[3] = 255;
        } else if !attributes.premultiplied_alpha {
            let a = u16::from(px[3]);
            for c in px.iter_mut().take(3) {
                *c = ((u16::from(*c) * a + 127) / 255) as u8;
            }
        }
    }

    let row = width as usize * 4;
    let rows = height as usize;
    for y in 0..rows / 2 {
        let (top, bottom) = pixels.split_at_mut((rows - 1 - y) * row);
        top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
    }
}
