//! Extension objects handed out by [`VirtualContext::get_extension`].
//!
//! The WebGL 1 extensions that became core in ES 3.0 are emulated on the core API. Any other
//! name the physical context supports is enabled and returned as a passthrough.

use std::fmt;

use glmux_gl::glow;
use glmux_gl::webgl;
use glmux_gl::{PhysicalGl, VertexArrayId};
use tracing::{debug, warn};

use crate::context::{ContextId, ContextKind, VirtualContext};
use crate::dispatch::Availability;
use crate::error::Result;
use crate::state::{Limits, Snapshot};
use crate::virtualizer::Shared;

/// Identifies one extension object. Repeated requests on a context return the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExtensionKind {
    VertexArrayObject,
    InstancedArrays,
    DrawBuffers,
    Passthrough,
}

impl ExtensionKind {
    fn emulated(name: &str) -> Option<(ExtensionKind, &'static str)> {
        [
            (ExtensionKind::VertexArrayObject, webgl::OES_VERTEX_ARRAY_OBJECT),
            (ExtensionKind::InstancedArrays, webgl::ANGLE_INSTANCED_ARRAYS),
            (ExtensionKind::DrawBuffers, webgl::WEBGL_DRAW_BUFFERS),
        ]
        .into_iter()
        .find(|(_, canonical)| canonical.eq_ignore_ascii_case(name))
    }
}

/// Memo entry stored per context, keyed by the lowercased extension name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExtensionEntry {
    pub id: ExtensionId,
    pub kind: ExtensionKind,
    pub name: String,
}

/// Engine-wide state capture registered by an extension. Runs after the base fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionHook {
    /// Draw-buffer selection of the bound draw framebuffer.
    DrawBuffers,
}

impl ExtensionHook {
    pub fn save<G: PhysicalGl + ?Sized>(&self, gl: &mut G, limits: &Limits, snapshot: &mut Snapshot) {
        match self {
            ExtensionHook::DrawBuffers => {
                let count = match snapshot.draw_framebuffer {
                    None => 1,
                    Some(_) => limits.draw_buffers,
                };
                let buffers = (0..count)
                    .map(|i| gl.get_parameter_i32(glow::DRAW_BUFFER0 + i) as u32)
                    .collect();
                snapshot.extensions.draw_buffers = Some(buffers);
            }
        }
    }

    /// A snapshot saved before the hook was registered carries nothing for it; the bound
    /// framebuffer then keeps its own selection.
    pub fn restore<G: PhysicalGl + ?Sized>(&self, gl: &mut G, snapshot: &Snapshot) {
        match self {
            ExtensionHook::DrawBuffers => {
                if let Some(buffers) = &snapshot.extensions.draw_buffers {
                    gl.draw_buffers(buffers);
                }
            }
        }
    }
}

/// Finds or creates the memo entry for `name` on context `id`.
fn resolve<G: PhysicalGl>(shared: &mut Shared<G>, id: ContextId, name: &str) -> Option<ExtensionEntry> {
    let key = name.to_ascii_lowercase();
    let state = shared.contexts.get(&id)?;
    if let Some(entry) = state.extensions.get(&key) {
        return Some(entry.clone());
    }
    let context_kind = state.kind;

    let (kind, canonical) = match ExtensionKind::emulated(name) {
        // Core on WebGL 2.
        Some(_) if context_kind == ContextKind::WebGl2 => return None,
        Some((kind, canonical)) => (kind, canonical.to_string()),
        None => {
            let supported = shared
                .gl
                .supported_extensions()
                .into_iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(name))?;
            if !shared.gl.enable_extension(&supported) {
                return None;
            }
            warn!(extension = %supported, context = %id, "extension is passed through without virtualization");
            (ExtensionKind::Passthrough, supported)
        }
    };

    if kind == ExtensionKind::DrawBuffers && !shared.hooks.contains(&ExtensionHook::DrawBuffers) {
        shared.hooks.push(ExtensionHook::DrawBuffers);
    }

    let entry = ExtensionEntry {
        id: ExtensionId(shared.next_extension_id()),
        kind,
        name: canonical,
    };
    debug!(extension = %entry.name, context = %id, "created extension object");
    shared
        .contexts
        .get_mut(&id)?
        .extensions
        .insert(key, entry.clone());
    Some(entry)
}

impl<G: PhysicalGl> VirtualContext<G> {
    /// Returns the extension object for `name`, or `None` when it is unavailable on this
    /// context. Memoized per context.
    pub fn get_extension(&self, name: &str) -> Result<Option<Extension<G>>> {
        let entry = self.with_current_shared("get_extension", Availability::Both, |shared, id| {
            resolve(shared, id, name)
        })?;
        Ok(entry.map(|entry| Extension::new(self.clone(), entry)))
    }

    pub fn get_supported_extensions(&self) -> Result<Vec<String>> {
        self.with_current_shared("get_supported_extensions", Availability::Both, |shared, id| {
            let kind = shared.contexts.get(&id).map(|state| state.kind);
            let mut names: Vec<String> = shared
                .gl
                .supported_extensions()
                .into_iter()
                .filter(|name| ExtensionKind::emulated(name).is_none())
                .collect();
            if kind == Some(ContextKind::WebGl) {
                names.extend(
                    [
                        webgl::ANGLE_INSTANCED_ARRAYS,
                        webgl::OES_VERTEX_ARRAY_OBJECT,
                        webgl::WEBGL_DRAW_BUFFERS,
                    ]
                    .map(String::from),
                );
            }
            names
        })
    }
}

/// An extension object. Emulated variants carry the context they were obtained from and
/// fail with [`crate::VirtualGlError::Disposed`] once it is disposed.
pub enum Extension<G: PhysicalGl> {
    VertexArrayObject(OesVertexArrayObject<G>),
    InstancedArrays(AngleInstancedArrays<G>),
    DrawBuffers(WebGlDrawBuffers<G>),
    Passthrough(PassthroughExtension),
}

impl<G: PhysicalGl> Extension<G> {
    fn new(context: VirtualContext<G>, entry: ExtensionEntry) -> Self {
        let id = entry.id;
        match entry.kind {
            ExtensionKind::VertexArrayObject => {
                Extension::VertexArrayObject(OesVertexArrayObject { context, id })
            }
            ExtensionKind::InstancedArrays => {
                Extension::InstancedArrays(AngleInstancedArrays { context, id })
            }
            ExtensionKind::DrawBuffers => Extension::DrawBuffers(WebGlDrawBuffers { context, id }),
            ExtensionKind::Passthrough => Extension::Passthrough(PassthroughExtension {
                id,
                name: entry.name,
            }),
        }
    }

    pub fn id(&self) -> ExtensionId {
        match self {
            Extension::VertexArrayObject(ext) => ext.id,
            Extension::InstancedArrays(ext) => ext.id,
            Extension::DrawBuffers(ext) => ext.id,
            Extension::Passthrough(ext) => ext.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Extension::VertexArrayObject(_) => webgl::OES_VERTEX_ARRAY_OBJECT,
            Extension::InstancedArrays(_) => webgl::ANGLE_INSTANCED_ARRAYS,
            Extension::DrawBuffers(_) => webgl::WEBGL_DRAW_BUFFERS,
            Extension::Passthrough(ext) => &ext.name,
        }
    }

    pub fn as_vertex_array_object(&self) -> Option<&OesVertexArrayObject<G>> {
        match self {
            Extension::VertexArrayObject(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn as_instanced_arrays(&self) -> Option<&AngleInstancedArrays<G>> {
        match self {
            Extension::InstancedArrays(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn as_draw_buffers(&self) -> Option<&WebGlDrawBuffers<G>> {
        match self {
            Extension::DrawBuffers(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn as_passthrough(&self) -> Option<&PassthroughExtension> {
        match self {
            Extension::Passthrough(ext) => Some(ext),
            _ => None,
        }
    }
}

impl<G: PhysicalGl> fmt::Debug for Extension<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name())
            .field("id", &self.id())
            .finish()
    }
}

impl<G: PhysicalGl> PartialEq for Extension<G> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// `OES_vertex_array_object` on the core vertex array API.
pub struct OesVertexArrayObject<G: PhysicalGl> {
    context: VirtualContext<G>,
    id: ExtensionId,
}

impl<G: PhysicalGl> OesVertexArrayObject<G> {
    pub fn create_vertex_array_oes(&self) -> Result<Option<VertexArrayId>> {
        self.context
            .forward("create_vertex_array_oes", Availability::Both, |gl| gl.create_vertex_array())
    }

    pub fn delete_vertex_array_oes(&self, vertex_array: VertexArrayId) -> Result<()> {
        self.context
            .delete_vertex_array_as("delete_vertex_array_oes", Availability::Both, vertex_array)
    }

    pub fn is_vertex_array_oes(&self, vertex_array: VertexArrayId) -> Result<bool> {
        self.context.forward("is_vertex_array_oes", Availability::Both, |gl| {
            gl.is_vertex_array(vertex_array)
        })
    }

    /// `None` binds the context's default vertex array.
    pub fn bind_vertex_array_oes(&self, vertex_array: Option<VertexArrayId>) -> Result<()> {
        self.context
            .bind_vertex_array_as("bind_vertex_array_oes", Availability::Both, vertex_array)
    }
}

/// `ANGLE_instanced_arrays`. The instanced draws are draw-type calls.
pub struct AngleInstancedArrays<G: PhysicalGl> {
    context: VirtualContext<G>,
    id: ExtensionId,
}

impl<G: PhysicalGl> AngleInstancedArrays<G> {
    pub fn draw_arrays_instanced_angle(
        &self,
        mode: u32,
        first: i32,
        count: i32,
        primcount: i32,
    ) -> Result<()> {
        self.context
            .draw("draw_arrays_instanced_angle", Availability::Both, |gl| {
                gl.draw_arrays_instanced(mode, first, count, primcount)
            })
    }

    pub fn draw_elements_instanced_angle(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        primcount: i32,
    ) -> Result<()> {
        self.context
            .draw("draw_elements_instanced_angle", Availability::Both, |gl| {
                gl.draw_elements_instanced(mode, count, element_type, offset, primcount)
            })
    }

    pub fn vertex_attrib_divisor_angle(&self, index: u32, divisor: u32) -> Result<()> {
        self.context
            .forward("vertex_attrib_divisor_angle", Availability::Both, |gl| {
                gl.vertex_attrib_divisor(index, divisor)
            })
    }
}

/// `WEBGL_draw_buffers`. Its selection is saved and restored by [`ExtensionHook::DrawBuffers`].
pub struct WebGlDrawBuffers<G: PhysicalGl> {
    context: VirtualContext<G>,
    id: ExtensionId,
}

impl<G: PhysicalGl> WebGlDrawBuffers<G> {
    pub fn draw_buffers_webgl(&self, buffers: &[u32]) -> Result<()> {
        self.context
            .draw_buffers_as("draw_buffers_webgl", Availability::Both, buffers)
    }
}

/// A physical extension enabled as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassthroughExtension {
    id: ExtensionId,
    name: String,
}

impl PassthroughExtension {
    pub fn id(&self) -> ExtensionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
