//! Virtual contexts: the per-surface state and the client-facing handle.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use glmux_gl::glow;
use glmux_gl::{FramebufferId, PhysicalGl, RenderbufferId, TextureId, VertexArrayId};
use tracing::debug;

use crate::compositor::{Compositor, OffscreenTarget};
use crate::config::ContextAttributes;
use crate::dispatch::Availability;
use crate::error::{CompositeError, Result, VirtualGlError};
use crate::extensions::ExtensionEntry;
use crate::state::{gl_size, Limits, Snapshot};
use crate::surface::SurfaceRef;
use crate::virtualizer::{FlushScheduler, Shared};

/// Which API a virtual context exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKind {
    WebGl,
    WebGl2,
}

impl ContextKind {
    /// Maps a `getContext` type string. Non-WebGL kinds return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "webgl" | "experimental-webgl" => Some(ContextKind::WebGl),
            "webgl2" => Some(ContextKind::WebGl2),
            _ => None,
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextKind::WebGl => "webgl",
            ContextKind::WebGl2 => "webgl2",
        })
    }
}

/// Identifies a virtual context for the lifetime of its virtualizer. Ids increase in
/// creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub(crate) u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DepthStencil {
    pub renderbuffer: RenderbufferId,
    pub attachment: u32,
    pub internal_format: u32,
}

/// Everything the virtualizer owns on behalf of one virtual context.
pub(crate) struct ContextState<G: PhysicalGl> {
    pub kind: ContextKind,
    pub attributes: ContextAttributes,
    pub surface: SurfaceRef,
    pub texture: TextureId,
    pub framebuffer: FramebufferId,
    pub depth_stencil: Option<DepthStencil>,
    /// Bound whenever the client binds "no vertex array".
    pub default_vertex_array: VertexArrayId,
    pub snapshot: Snapshot,
    pub compositor: Box<dyn Compositor<G>>,
    pub extensions: BTreeMap<String, ExtensionEntry>,
    /// Size the offscreen storage was last allocated at.
    pub size: (u32, u32),
    pub needs_clear: bool,
    pub needs_composite: bool,
}

impl<G: PhysicalGl> ContextState<G> {
    /// Allocates the offscreen target. Storage stays 0x0 until the first resize. Every
    /// binding touched here is put back, so whichever context is live is undisturbed.
    pub fn create(
        gl: &mut G,
        limits: &Limits,
        surface: SurfaceRef,
        kind: ContextKind,
        attributes: ContextAttributes,
        compositor: Box<dyn Compositor<G>>,
    ) -> Result<Self> {
        let texture = gl.create_texture().ok_or(VirtualGlError::Allocation {
            what: "offscreen texture",
        })?;
        let Some(framebuffer) = gl.create_framebuffer() else {
            gl.delete_texture(texture);
            return Err(VirtualGlError::Allocation {
                what: "offscreen framebuffer",
            });
        };
        let renderbuffer = if attributes.depth || attributes.stencil {
            let Some(renderbuffer) = gl.create_renderbuffer() else {
                gl.delete_framebuffer(framebuffer);
                gl.delete_texture(texture);
                return Err(VirtualGlError::Allocation {
                    what: "depth/stencil renderbuffer",
                });
            };
            Some(renderbuffer)
        } else {
            None
        };
        let Some(default_vertex_array) = gl.create_vertex_array() else {
            if let Some(renderbuffer) = renderbuffer {
                gl.delete_renderbuffer(renderbuffer);
            }
            gl.delete_framebuffer(framebuffer);
            gl.delete_texture(texture);
            return Err(VirtualGlError::Allocation {
                what: "default vertex array",
            });
        };

        let depth_stencil = renderbuffer.map(|renderbuffer| {
            if attributes.stencil {
                DepthStencil {
                    renderbuffer,
                    attachment: glow::DEPTH_STENCIL_ATTACHMENT,
                    internal_format: glow::DEPTH24_STENCIL8,
                }
            } else {
                DepthStencil {
                    renderbuffer,
                    attachment: glow::DEPTH_ATTACHMENT,
                    internal_format: glow::DEPTH_COMPONENT16,
                }
            }
        });

        let prev_texture = gl.get_parameter_texture(glow::TEXTURE_BINDING_2D);
        let prev_draw = gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING);
        let prev_read = gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING);
        let prev_renderbuffer = gl.get_parameter_renderbuffer(glow::RENDERBUFFER_BINDING);

        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(texture),
            0,
        );
        if let Some(ds) = depth_stencil {
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(ds.renderbuffer));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                ds.attachment,
                glow::RENDERBUFFER,
                Some(ds.renderbuffer),
            );
        }

        gl.bind_texture(glow::TEXTURE_2D, prev_texture);
        gl.bind_framebuffer(glow::READ_FRAMEBUFFER, prev_read);
        gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, prev_draw);
        gl.bind_renderbuffer(glow::RENDERBUFFER, prev_renderbuffer);

        let snapshot = Snapshot::new(
            limits,
            Some(framebuffer),
            Some(default_vertex_array),
            surface.width(),
            surface.height(),
        );
        Ok(Self {
            kind,
            attributes,
            surface,
            texture,
            framebuffer,
            depth_stencil,
            default_vertex_array,
            snapshot,
            compositor,
            extensions: BTreeMap::new(),
            size: (0, 0),
            needs_clear: false,
            needs_composite: false,
        })
    }

    /// Reallocates the offscreen storage when the surface size changed. Must be called with
    /// this context live; the bindings it touches are put back.
    pub fn resize_if_needed(&mut self, gl: &mut G) -> bool {
        let size = (self.surface.width(), self.surface.height());
        if size == self.size {
            return false;
        }
        let (width, height) = (gl_size(size.0), gl_size(size.1));

        let prev_unpack = gl.get_parameter_buffer(glow::PIXEL_UNPACK_BUFFER_BINDING);
        if prev_unpack.is_some() {
            gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
        }
        let prev_texture = gl.get_parameter_texture(glow::TEXTURE_BINDING_2D);
        let format = if self.attributes.alpha {
            glow::RGBA
        } else {
            glow::RGB
        };
        gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            format as i32,
            width,
            height,
            0,
            format,
            glow::UNSIGNED_BYTE,
            None,
        );
        gl.bind_texture(glow::TEXTURE_2D, prev_texture);

        if let Some(ds) = self.depth_stencil {
            let prev_renderbuffer = gl.get_parameter_renderbuffer(glow::RENDERBUFFER_BINDING);
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(ds.renderbuffer));
            gl.renderbuffer_storage(glow::RENDERBUFFER, ds.internal_format, width, height);
            gl.bind_renderbuffer(glow::RENDERBUFFER, prev_renderbuffer);
        }
        if prev_unpack.is_some() {
            gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, prev_unpack);
        }

        debug!(from = ?self.size, to = ?size, "resized offscreen target");
        self.size = size;
        true
    }

    /// Performs the clear owed after a composite. Must be called with this context live.
    pub fn clear_if_needed(&mut self, gl: &mut G) -> bool {
        if !self.needs_clear {
            return false;
        }
        self.needs_clear = false;

        let prev_draw = gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING);
        let prev_read = gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING);
        let scissor = gl.is_enabled(glow::SCISSOR_TEST);
        let discard = gl.is_enabled(glow::RASTERIZER_DISCARD);
        let mut color = [0.0f32; 4];
        gl.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color);
        let depth = gl.get_parameter_f32(glow::DEPTH_CLEAR_VALUE);
        let stencil = gl.get_parameter_i32(glow::STENCIL_CLEAR_VALUE);
        let mut color_mask = [true; 4];
        gl.get_parameter_bool_slice(glow::COLOR_WRITEMASK, &mut color_mask);
        let depth_mask = gl.get_parameter_bool(glow::DEPTH_WRITEMASK);
        let stencil_front = gl.get_parameter_i32(glow::STENCIL_WRITEMASK) as u32;
        let stencil_back = gl.get_parameter_i32(glow::STENCIL_BACK_WRITEMASK) as u32;

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
        gl.disable(glow::SCISSOR_TEST);
        gl.disable(glow::RASTERIZER_DISCARD);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear_depth_f32(1.0);
        gl.clear_stencil(0);
        gl.color_mask(true, true, true, true);
        gl.depth_mask(true);
        gl.stencil_mask(u32::MAX);

        let mut mask = glow::COLOR_BUFFER_BIT;
        if self.attributes.depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if self.attributes.stencil {
            mask |= glow::STENCIL_BUFFER_BIT;
        }
        gl.clear(mask);

        gl.stencil_mask_separate(glow::FRONT, stencil_front);
        gl.stencil_mask_separate(glow::BACK, stencil_back);
        gl.depth_mask(depth_mask);
        let [r, g, b, a] = color_mask;
        gl.color_mask(r, g, b, a);
        gl.clear_stencil(stencil);
        gl.clear_depth_f32(depth);
        let [r, g, b, a] = color;
        gl.clear_color(r, g, b, a);
        if discard {
            gl.enable(glow::RASTERIZER_DISCARD);
        }
        if scissor {
            gl.enable(glow::SCISSOR_TEST);
        }
        gl.bind_framebuffer(glow::READ_FRAMEBUFFER, prev_read);
        gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, prev_draw);
        true
    }

    /// Hands the offscreen pixels to the compositor. The drawing buffer counts as presented
    /// whether or not the compositor succeeded.
    pub fn composite(&mut self, gl: &mut G) -> Result<(), CompositeError> {
        let target = OffscreenTarget {
            texture: self.texture,
            width: self.size.0,
            height: self.size.1,
        };
        let result = self
            .compositor
            .composite(gl, &target, self.surface.as_ref(), &self.attributes);
        self.needs_composite = false;
        if !self.attributes.preserve_drawing_buffer {
            self.needs_clear = true;
        }
        result
    }

    /// Deletes every GPU object owned by this context. The context must not be live.
    pub fn release(mut self, gl: &mut G) {
        gl.delete_texture(self.texture);
        gl.delete_framebuffer(self.framebuffer);
        if let Some(ds) = self.depth_stencil {
            gl.delete_renderbuffer(ds.renderbuffer);
        }
        gl.delete_vertex_array(self.default_vertex_array);
        self.compositor.dispose(gl);
    }
}

/// A client-facing virtual context.
///
/// Every method makes this context current on the physical context first, then forwards.
/// After [`VirtualContext::dispose`] every method returns [`VirtualGlError::Disposed`].
pub struct VirtualContext<G: PhysicalGl> {
    pub(crate) shared: Rc<RefCell<Shared<G>>>,
    pub(crate) id: ContextId,
}

impl<G: PhysicalGl> Clone for VirtualContext<G> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            id: self.id,
        }
    }
}

impl<G: PhysicalGl> fmt::Debug for VirtualContext<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualContext").field("id", &self.id).finish()
    }
}

impl<G: PhysicalGl> PartialEq for VirtualContext<G> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared) && self.id == other.id
    }
}

impl<G: PhysicalGl> VirtualContext<G> {
    pub(crate) fn new(shared: Rc<RefCell<Shared<G>>>, id: ContextId) -> Self {
        Self { shared, id }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        !self.shared.borrow().contexts.contains_key(&self.id)
    }

    /// Activates this context, applies a pending resize, then runs `f` on the engine.
    pub(crate) fn with_current_shared<R>(
        &self,
        op: &'static str,
        availability: Availability,
        f: impl FnOnce(&mut Shared<G>, ContextId) -> R,
    ) -> Result<R> {
        let mut shared = self.shared.borrow_mut();
        let kind = shared
            .contexts
            .get(&self.id)
            .map(|state| state.kind)
            .ok_or(VirtualGlError::Disposed { op })?;
        if availability == Availability::WebGl2Only && kind == ContextKind::WebGl {
            return Err(VirtualGlError::NotAvailable { op, kind });
        }
        shared.activate(self.id);
        shared.ensure_size(self.id);
        Ok(f(&mut shared, self.id))
    }

    pub(crate) fn with_current<R>(
        &self,
        op: &'static str,
        availability: Availability,
        f: impl FnOnce(&mut G, &mut ContextState<G>) -> R,
    ) -> Result<R> {
        self.with_current_shared(op, availability, |shared, id| {
            shared.split(id).map(|(gl, state)| f(gl, state))
        })?
        .ok_or(VirtualGlError::Disposed { op })
    }

    /// Plain pass-through call.
    pub(crate) fn forward<R>(
        &self,
        op: &'static str,
        availability: Availability,
        f: impl FnOnce(&mut G) -> R,
    ) -> Result<R> {
        self.with_current_shared(op, availability, |shared, _| f(&mut shared.gl))
    }

    /// Draw-type call: performs any owed clear first and schedules a composite when the
    /// drawing landed in the offscreen target.
    pub(crate) fn draw(
        &self,
        op: &'static str,
        availability: Availability,
        f: impl FnOnce(&mut G),
    ) -> Result<()> {
        let schedule: Option<FlushScheduler> =
            self.with_current_shared(op, availability, |shared, id| {
                shared.clear_if_needed(id);
                f(&mut shared.gl);
                shared.after_draw(id)
            })?;
        if let Some(hook) = schedule {
            hook();
        }
        Ok(())
    }

    /// Read of the drawing buffer: performs any owed clear first.
    pub(crate) fn read<R>(
        &self,
        op: &'static str,
        availability: Availability,
        f: impl FnOnce(&mut G) -> R,
    ) -> Result<R> {
        self.with_current_shared(op, availability, |shared, id| {
            shared.clear_if_needed(id);
            f(&mut shared.gl)
        })
    }

    /// Answers from the engine's records without touching the physical context.
    fn with_state<R>(&self, op: &'static str, f: impl FnOnce(&ContextState<G>) -> R) -> Result<R> {
        let shared = self.shared.borrow();
        shared
            .contexts
            .get(&self.id)
            .map(f)
            .ok_or(VirtualGlError::Disposed { op })
    }

    // --- overrides -----------------------------------------------------------------------

    /// The destination surface this context renders to.
    pub fn canvas(&self) -> Result<SurfaceRef> {
        self.with_state("canvas", |state| Rc::clone(&state.surface))
    }

    pub fn drawing_buffer_width(&self) -> Result<u32> {
        self.with_state("drawing_buffer_width", |state| state.surface.width())
    }

    pub fn drawing_buffer_height(&self) -> Result<u32> {
        self.with_state("drawing_buffer_height", |state| state.surface.height())
    }

    pub fn get_context_attributes(&self) -> Result<ContextAttributes> {
        self.with_state("get_context_attributes", |state| state.attributes)
    }

    pub fn is_context_lost(&self) -> Result<bool> {
        self.with_state("is_context_lost", |_| false)
    }

    pub fn kind(&self) -> Result<ContextKind> {
        self.with_state("kind", |state| state.kind)
    }

    // --- bespoke -------------------------------------------------------------------------

    /// Releases the offscreen target and makes every later call fail.
    pub fn dispose(&self) -> Result<()> {
        self.shared.borrow_mut().dispose_context(self.id)
    }

    pub fn get_parameter_i32(&self, pname: u32) -> Result<i32> {
        self.with_current("get_parameter_i32", Availability::Both, |gl, state| {
            let value = gl.get_parameter_i32(pname);
            translate_i32(gl, state, pname, value)
        })
    }

    pub fn get_parameter_framebuffer(&self, pname: u32) -> Result<Option<FramebufferId>> {
        self.with_current("get_parameter_framebuffer", Availability::Both, |gl, state| {
            gl.get_parameter_framebuffer(pname)
                .filter(|fb| *fb != state.framebuffer)
        })
    }

    pub fn get_parameter_vertex_array(&self, pname: u32) -> Result<Option<VertexArrayId>> {
        self.with_current("get_parameter_vertex_array", Availability::Both, |gl, state| {
            gl.get_parameter_vertex_array(pname)
                .filter(|vao| *vao != state.default_vertex_array)
        })
    }

    pub fn bind_framebuffer(&self, target: u32, framebuffer: Option<FramebufferId>) -> Result<()> {
        self.with_current("bind_framebuffer", Availability::Both, |gl, state| {
            gl.bind_framebuffer(target, framebuffer.or(Some(state.framebuffer)));
        })
    }

    pub fn delete_framebuffer(&self, framebuffer: FramebufferId) -> Result<()> {
        self.with_current("delete_framebuffer", Availability::Both, |gl, state| {
            if framebuffer == state.framebuffer {
                return;
            }
            let draw = gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING) == Some(framebuffer);
            let read = gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING) == Some(framebuffer);
            gl.delete_framebuffer(framebuffer);
            if draw {
                gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(state.framebuffer));
            }
            if read {
                gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(state.framebuffer));
            }
        })
    }

    pub fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) -> Result<()> {
        self.bind_vertex_array_as("bind_vertex_array", Availability::WebGl2Only, vertex_array)
    }

    pub(crate) fn bind_vertex_array_as(
        &self,
        op: &'static str,
        availability: Availability,
        vertex_array: Option<VertexArrayId>,
    ) -> Result<()> {
        self.with_current(op, availability, |gl, state| {
            gl.bind_vertex_array(vertex_array.or(Some(state.default_vertex_array)));
        })
    }

    pub fn delete_vertex_array(&self, vertex_array: VertexArrayId) -> Result<()> {
        self.delete_vertex_array_as("delete_vertex_array", Availability::WebGl2Only, vertex_array)
    }

    pub(crate) fn delete_vertex_array_as(
        &self,
        op: &'static str,
        availability: Availability,
        vertex_array: VertexArrayId,
    ) -> Result<()> {
        self.with_current(op, availability, |gl, state| {
            if vertex_array == state.default_vertex_array {
                return;
            }
            let bound = gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING) == Some(vertex_array);
            gl.delete_vertex_array(vertex_array);
            if bound {
                gl.bind_vertex_array(Some(state.default_vertex_array));
            }
        })
    }

    pub fn draw_buffers(&self, buffers: &[u32]) -> Result<()> {
        self.draw_buffers_as("draw_buffers", Availability::WebGl2Only, buffers)
    }

    /// `[BACK]` on the logical default framebuffer selects the offscreen colour attachment.
    /// Anything else is forwarded unchanged.
    pub(crate) fn draw_buffers_as(
        &self,
        op: &'static str,
        availability: Availability,
        buffers: &[u32],
    ) -> Result<()> {
        self.with_current(op, availability, |gl, state| {
            let on_default =
                gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING) == Some(state.framebuffer);
            if on_default && *buffers == [glow::BACK] {
                gl.draw_buffers(&[glow::COLOR_ATTACHMENT0]);
            } else {
                gl.draw_buffers(buffers);
            }
        })
    }

    pub fn read_buffer(&self, src: u32) -> Result<()> {
        self.with_current("read_buffer", Availability::WebGl2Only, |gl, state| {
            let on_default =
                gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING) == Some(state.framebuffer);
            if on_default && src == glow::BACK {
                gl.read_buffer(glow::COLOR_ATTACHMENT0);
            } else {
                gl.read_buffer(src);
            }
        })
    }

    pub fn get_framebuffer_attachment_parameter_i32(
        &self,
        target: u32,
        attachment: u32,
        pname: u32,
    ) -> Result<i32> {
        self.with_current(
            "get_framebuffer_attachment_parameter_i32",
            Availability::Both,
            |gl, state| {
                let binding = match target {
                    glow::READ_FRAMEBUFFER => glow::READ_FRAMEBUFFER_BINDING,
                    _ => glow::DRAW_FRAMEBUFFER_BINDING,
                };
                let on_default = gl.get_parameter_framebuffer(binding) == Some(state.framebuffer);
                if !on_default || !matches!(attachment, glow::BACK | glow::DEPTH | glow::STENCIL) {
                    return gl.get_framebuffer_attachment_parameter_i32(target, attachment, pname);
                }
                let mapped = match attachment {
                    glow::BACK => Some(glow::COLOR_ATTACHMENT0),
                    glow::DEPTH => state.depth_stencil.map(|ds| ds.attachment),
                    _ => state
                        .depth_stencil
                        .filter(|ds| ds.attachment == glow::DEPTH_STENCIL_ATTACHMENT)
                        .map(|ds| ds.attachment),
                };
                match (mapped, pname) {
                    (None, glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE) => glow::NONE as i32,
                    (None, _) => gl.get_framebuffer_attachment_parameter_i32(target, attachment, pname),
                    (Some(_), glow::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE) => {
                        glow::FRAMEBUFFER_DEFAULT as i32
                    }
                    (Some(_), glow::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME) => 0,
                    (Some(mapped), _) => {
                        gl.get_framebuffer_attachment_parameter_i32(target, mapped, pname)
                    }
                }
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn read_pixels(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        out: &mut [u8],
    ) -> Result<()> {
        self.read("read_pixels", Availability::Both, |gl| {
            gl.read_pixels(x, y, width, height, format, ty, out)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        self.read("copy_tex_sub_image_2d", Availability::Both, |gl| {
            gl.copy_tex_sub_image_2d(target, level, x_offset, y_offset, x, y, width, height)
        })
    }
}

fn is_draw_buffer_query(pname: u32) -> bool {
    (glow::DRAW_BUFFER0..=glow::DRAW_BUFFER15).contains(&pname)
}

/// Hides the private framebuffer and vertex array from integer binding queries.
fn translate_i32<G: PhysicalGl>(gl: &mut G, state: &ContextState<G>, pname: u32, value: i32) -> i32 {
    let framebuffer = state.framebuffer.get() as i32;
    match pname {
        glow::DRAW_FRAMEBUFFER_BINDING | glow::READ_FRAMEBUFFER_BINDING if value == framebuffer => 0,
        glow::VERTEX_ARRAY_BINDING if value == state.default_vertex_array.get() as i32 => 0,
        glow::READ_BUFFER
            if value == glow::COLOR_ATTACHMENT0 as i32
                && gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING)
                    == Some(state.framebuffer) =>
        {
            glow::BACK as i32
        }
        p if is_draw_buffer_query(p)
            && gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING)
                == Some(state.framebuffer) =>
        {
            if p != glow::DRAW_BUFFER0 {
                glow::NONE as i32
            } else if value == glow::COLOR_ATTACHMENT0 as i32 {
                glow::BACK as i32
            } else {
                value
            }
        }
        _ => value,
    }
}
