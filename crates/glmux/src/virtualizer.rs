use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use glmux_gl::glow;
use glmux_gl::PhysicalGl;
use tracing::{debug, error, trace, warn};

use crate::compositor::{Compositor, ReadbackCompositor};
use crate::config::{ContextAttributes, ContextOptions, Settings, SetupOptions};
use crate::context::{ContextId, ContextKind, ContextState, VirtualContext};
use crate::error::{CompositeError, Result, VirtualGlError};
use crate::extensions::ExtensionHook;
use crate::save_restore::{restore, save};
use crate::state::{Limits, Snapshot};
use crate::stats::{VirtualizerStats, VirtualizerStatsSnapshot};
use crate::surface::{surface_key, SurfaceRef};

/// Host hook asking for [`Virtualizer::flush`] to run on a later turn of the event loop.
pub type FlushScheduler = Rc<dyn Fn()>;

/// Outcome of one flush.
#[derive(Debug, Default, PartialEq)]
pub struct FlushReport {
    /// Contexts whose frame reached their surface, in creation order.
    pub composited: Vec<ContextId>,
    pub failures: Vec<(ContextId, CompositeError)>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.composited.is_empty() && self.failures.is_empty()
    }

    pub(crate) fn merge(&mut self, other: FlushReport) {
        self.composited.extend(other.composited);
        self.failures.extend(other.failures);
    }
}

/// Either a virtual context or whatever the host's native factory produced.
#[derive(Debug)]
pub enum ContextHandle<G: PhysicalGl, N> {
    Virtual(VirtualContext<G>),
    Native(N),
}

/// Engine state shared by the virtualizer and every context handle.
pub(crate) struct Shared<G: PhysicalGl> {
    pub gl: G,
    pub limits: Limits,
    /// State of the physical context's owner while no virtual context is current.
    pub base: Snapshot,
    pub contexts: BTreeMap<ContextId, ContextState<G>>,
    surfaces: HashMap<usize, ContextId>,
    pub current: Option<ContextId>,
    pub composite_pending: bool,
    pub hooks: Vec<ExtensionHook>,
    pub settings: Settings<G>,
    pub stats: VirtualizerStats,
    flush_scheduler: Option<FlushScheduler>,
    next_context: u64,
    next_extension: u64,
}

impl<G: PhysicalGl> Shared<G> {
    fn new(mut gl: G) -> Self {
        let limits = Limits::query(&mut gl);
        let mut base = Snapshot::new(&limits, None, None, 0, 0);
        save(&mut gl, &limits, &[], &mut base);
        Self {
            gl,
            limits,
            base,
            contexts: BTreeMap::new(),
            surfaces: HashMap::new(),
            current: None,
            composite_pending: false,
            hooks: Vec::new(),
            settings: Settings::default(),
            stats: VirtualizerStats::new(),
            flush_scheduler: None,
            next_context: 1,
            next_extension: 1,
        }
    }

    pub fn split(&mut self, id: ContextId) -> Option<(&mut G, &mut ContextState<G>)> {
        let Self { gl, contexts, .. } = self;
        contexts.get_mut(&id).map(|state| (gl, state))
    }

    pub fn next_extension_id(&mut self) -> u64 {
        let id = self.next_extension;
        self.next_extension += 1;
        id
    }

    /// Makes `id` the live context: saves the outgoing owner, restores the incoming one.
    pub fn activate(&mut self, id: ContextId) {
        if self.current == Some(id) {
            return;
        }
        let Self {
            gl,
            limits,
            base,
            contexts,
            current,
            hooks,
            stats,
            ..
        } = self;

        match (*current).and_then(|cur| contexts.get_mut(&cur)) {
            Some(outgoing) => save(gl, limits, hooks, &mut outgoing.snapshot),
            None => save(gl, limits, hooks, base),
        }
        stats.inc_saves();
        if let Some(incoming) = contexts.get(&id) {
            restore(gl, hooks, &incoming.snapshot);
            stats.inc_restores();
        }
        trace!(from = ?*current, to = %id, "context switch");
        *current = Some(id);
        stats.inc_context_switches();
    }

    /// Hands the physical context back to its owner.
    pub fn deactivate(&mut self) {
        let Some(outgoing) = self.current.take() else {
            return;
        };
        let Self {
            gl,
            limits,
            base,
            contexts,
            hooks,
            stats,
            ..
        } = self;
        if let Some(state) = contexts.get_mut(&outgoing) {
            save(gl, limits, hooks, &mut state.snapshot);
            stats.inc_saves();
        }
        restore(gl, hooks, base);
        stats.inc_restores();
        trace!(from = %outgoing, "context switch to base");
        stats.inc_context_switches();
    }

    fn restore_base(&mut self) {
        restore(&mut self.gl, &self.hooks, &self.base);
        self.stats.inc_restores();
    }

    pub fn ensure_size(&mut self, id: ContextId) {
        if let Some((gl, state)) = self.split(id) {
            if state.resize_if_needed(gl) {
                self.stats.inc_resizes();
            }
        }
    }

    pub fn clear_if_needed(&mut self, id: ContextId) {
        if let Some((gl, state)) = self.split(id) {
            if state.clear_if_needed(gl) {
                self.stats.inc_deferred_clears();
            }
        }
    }

    /// Marks `id` dirty when the draw landed in its offscreen target. Returns the hook to
    /// call once the engine borrow is released, if this is the first pending composite.
    pub fn after_draw(&mut self, id: ContextId) -> Option<FlushScheduler> {
        let live = self.gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING);
        let state = self.contexts.get_mut(&id)?;
        if live != Some(state.framebuffer) {
            return None;
        }
        state.needs_composite = true;
        if self.composite_pending {
            return None;
        }
        self.composite_pending = true;
        trace!(context = %id, "composite scheduled");
        self.flush_scheduler.clone()
    }

    fn create_context(
        &mut self,
        surface: SurfaceRef,
        kind: ContextKind,
        attributes: ContextAttributes,
    ) -> Result<ContextId> {
        let compositor: Box<dyn Compositor<G>> = match &self.settings.compositor_factory {
            Some(factory) => factory(&surface, kind, &attributes),
            None => Box::new(ReadbackCompositor::new()),
        };
        let key = surface_key(&surface);
        let state = ContextState::create(
            &mut self.gl,
            &self.limits,
            surface,
            kind,
            attributes,
            compositor,
        )?;
        let id = ContextId(self.next_context);
        self.next_context += 1;
        debug!(context = %id, %kind, ?attributes, "created virtual context");
        self.contexts.insert(id, state);
        self.surfaces.insert(key, id);
        self.stats.inc_contexts_created();
        Ok(id)
    }

    pub fn dispose_context(&mut self, id: ContextId) -> Result<()> {
        if !self.contexts.contains_key(&id) {
            return Err(VirtualGlError::Disposed { op: "dispose" });
        }
        if self.current == Some(id) {
            self.deactivate();
        }
        let Some(state) = self.contexts.remove(&id) else {
            return Err(VirtualGlError::Disposed { op: "dispose" });
        };
        self.surfaces.retain(|_, owner| *owner != id);
        state.release(&mut self.gl);
        self.stats.inc_contexts_disposed();
        debug!(context = %id, "disposed virtual context");
        Ok(())
    }

    fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        if !self.composite_pending {
            return report;
        }
        self.composite_pending = false;
        self.stats.inc_flushes();

        if self.current.is_some() {
            self.deactivate();
        } else {
            let Self {
                gl,
                limits,
                base,
                hooks,
                ..
            } = self;
            save(gl, limits, hooks, base);
            self.stats.inc_saves();
        }

        let dirty: Vec<ContextId> = self
            .contexts
            .iter()
            .filter(|(_, state)| state.needs_composite)
            .map(|(id, _)| *id)
            .collect();
        for id in dirty {
            let Some((gl, state)) = self.split(id) else {
                continue;
            };
            let result = state.composite(gl);
            self.stats.inc_composites_attempted();
            match result {
                Ok(()) => {
                    self.stats.inc_composites_succeeded();
                    report.composited.push(id);
                }
                Err(err) => {
                    self.stats.inc_composites_failed();
                    error!(context = %id, error = %err, "composite failed");
                    report.failures.push((id, err));
                }
            }
        }

        self.restore_base();
        trace!(
            composited = report.composited.len(),
            failed = report.failures.len(),
            "flush complete"
        );
        report
    }
}

/// Multiplexes virtual contexts onto one physical context.
///
/// Cloning yields another handle to the same engine.
pub struct Virtualizer<G: PhysicalGl> {
    shared: Rc<RefCell<Shared<G>>>,
}

impl<G: PhysicalGl> Clone for Virtualizer<G> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<G: PhysicalGl> Virtualizer<G> {
    /// Takes ownership of the physical context. Its current state becomes the base state.
    pub fn new(gl: G) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::new(gl))),
        }
    }

    /// Applies engine-wide options. Omitted options keep their current values; a new
    /// compositor factory applies to contexts created afterwards.
    pub fn setup(&self, options: SetupOptions<G>) {
        self.shared.borrow_mut().settings.apply(options);
    }

    /// Installs the hook invoked when the first composite of a batch becomes pending.
    pub fn set_flush_scheduler(&self, hook: impl Fn() + 'static) {
        self.shared.borrow_mut().flush_scheduler = Some(Rc::new(hook));
    }

    /// Returns the virtual context for `surface`, creating it on first use.
    ///
    /// `Ok(None)` mirrors a canvas refusing the request: a non-WebGL `kind`, a WebGL 1
    /// request while WebGL 1 is disabled, or a surface that already has a context of the
    /// other kind.
    pub fn get_context(
        &self,
        surface: &SurfaceRef,
        kind: &str,
        options: &ContextOptions,
    ) -> Result<Option<VirtualContext<G>>> {
        let Some(kind) = ContextKind::from_name(kind) else {
            return Ok(None);
        };
        let mut shared = self.shared.borrow_mut();
        if kind == ContextKind::WebGl && shared.settings.disable_webgl1 {
            return Ok(None);
        }
        if let Some(&id) = shared.surfaces.get(&surface_key(surface)) {
            let existing = shared.contexts.get(&id).map(|state| state.kind);
            if existing != Some(kind) {
                warn!(requested = %kind, existing = ?existing, "surface already has a context of another kind");
                return Ok(None);
            }
            return Ok(Some(VirtualContext::new(Rc::clone(&self.shared), id)));
        }
        let id = shared.create_context(
            Rc::clone(surface),
            kind,
            ContextAttributes::resolve(options),
        )?;
        Ok(Some(VirtualContext::new(Rc::clone(&self.shared), id)))
    }

    /// Like [`Virtualizer::get_context`], but non-WebGL kinds go to `native`.
    pub fn get_context_or_else<N>(
        &self,
        surface: &SurfaceRef,
        kind: &str,
        options: &ContextOptions,
        native: impl FnOnce(&SurfaceRef, &str) -> Option<N>,
    ) -> Result<Option<ContextHandle<G, N>>> {
        if ContextKind::from_name(kind).is_none() {
            return Ok(native(surface, kind).map(ContextHandle::Native));
        }
        Ok(self
            .get_context(surface, kind, options)?
            .map(ContextHandle::Virtual))
    }

    /// Composites every dirty context, then hands the physical context back to its owner.
    pub fn flush(&self) -> FlushReport {
        self.shared.borrow_mut().flush()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.shared.borrow().composite_pending
    }

    /// The virtual context currently live on the physical context, if any.
    pub fn current_context(&self) -> Option<ContextId> {
        self.shared.borrow().current
    }

    pub fn context_count(&self) -> usize {
        self.shared.borrow().contexts.len()
    }

    pub fn stats(&self) -> VirtualizerStatsSnapshot {
        self.shared.borrow().stats.snapshot()
    }

    pub fn stats_json(&self) -> String {
        self.shared.borrow().stats.to_json()
    }

    /// Runs `f` as the physical context's owner, with no virtual context live.
    pub fn with_physical<R>(&self, f: impl FnOnce(&mut G) -> R) -> R {
        let mut shared = self.shared.borrow_mut();
        shared.deactivate();
        f(&mut shared.gl)
    }

    /// Read-only access to the physical context, without switching.
    pub fn inspect_physical<R>(&self, f: impl FnOnce(&G) -> R) -> R {
        let shared: Ref<'_, Shared<G>> = self.shared.borrow();
        f(&shared.gl)
    }
}
