use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the virtualizer: context switches, state traffic and compositing.
#[derive(Debug, Default)]
pub struct VirtualizerStats {
    context_switches: AtomicU64,
    saves: AtomicU64,
    restores: AtomicU64,
    resizes: AtomicU64,
    deferred_clears: AtomicU64,
    flushes: AtomicU64,
    composites_attempted: AtomicU64,
    composites_succeeded: AtomicU64,
    composites_failed: AtomicU64,
    contexts_created: AtomicU64,
    contexts_disposed: AtomicU64,
}

impl VirtualizerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_saves(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restores(&self) {
        self.restores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_resizes(&self) {
        self.resizes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_deferred_clears(&self) {
        self.deferred_clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_flushes(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_composites_attempted(&self) {
        self.composites_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_composites_succeeded(&self) {
        self.composites_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_composites_failed(&self) {
        self.composites_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_contexts_created(&self) {
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_contexts_disposed(&self) {
        self.contexts_disposed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> VirtualizerStatsSnapshot {
        VirtualizerStatsSnapshot {
            context_switches: self.context_switches.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            restores: self.restores.load(Ordering::Relaxed),
            resizes: self.resizes.load(Ordering::Relaxed),
            deferred_clears: self.deferred_clears.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            composites_attempted: self.composites_attempted.load(Ordering::Relaxed),
            composites_succeeded: self.composites_succeeded.load(Ordering::Relaxed),
            composites_failed: self.composites_failed.load(Ordering::Relaxed),
            contexts_created: self.contexts_created.load(Ordering::Relaxed),
            contexts_disposed: self.contexts_disposed.load(Ordering::Relaxed),
        }
    }

    /// Returns a JSON object as a string.
    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualizerStatsSnapshot {
    pub context_switches: u64,
    pub saves: u64,
    pub restores: u64,
    pub resizes: u64,
    pub deferred_clears: u64,
    pub flushes: u64,
    pub composites_attempted: u64,
    pub composites_succeeded: u64,
    pub composites_failed: u64,
    pub contexts_created: u64,
    pub contexts_disposed: u64,
}

impl VirtualizerStatsSnapshot {
    pub fn to_json(self) -> String {
        // Note: This is hand-built JSON; every field is a plain counter.
        format!(
            "{{\"context_switches\":{},\"saves\":{},\"restores\":{},\"resizes\":{},\"deferred_clears\":{},\"flushes\":{},\"composites_attempted\":{},\"composites_succeeded\":{},\"composites_failed\":{},\"contexts_created\":{},\"contexts_disposed\":{}}}",
            self.context_switches,
            self.saves,
            self.restores,
            self.resizes,
            self.deferred_clears,
            self.flushes,
            self.composites_attempted,
            self.composites_succeeded,
            self.composites_failed,
            self.contexts_created,
            self.contexts_disposed,
        )
    }
}
