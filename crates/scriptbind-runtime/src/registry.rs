//! Process-wide native registry.
//!
//! All registration happens during a single-threaded startup phase: the
//! embedding registers its natives, binds the issued trampolines into the
//! script state, and only then lets scripts run. Once that phase is over the
//! slot table is only read, and dispatch may happen from any thread.
//!
//! ```ignore
//! let registry = Registry::global();
//! registry.bind(&mut state, "add", |a: i64, b: i64| a + b)?;
//! ```

use linkme::distributed_slice;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use scriptbind_core::{NativeFn, ScriptState};
use tracing::{debug, trace, warn};

use crate::error::{CallError, DispatchError, RegistryError, SlotId};
use crate::handler::{FnHandler, Handler, NativeFunction, RawHandler};
use crate::slots::SlotTable;
use crate::trampoline::{self, MAX_SLOTS};

/// A native declared next to its definition and collected at link time.
///
/// ```ignore
/// fn add(a: i64, b: i64) -> i64 { a + b }
///
/// #[distributed_slice(NATIVE_TABLE)]
/// static ADD: NativeEntry = NativeEntry {
///     name: "add",
///     register: |registry| registry.register_handler(add),
/// };
/// ```
pub struct NativeEntry {
    /// Global name the native is bound to.
    pub name: &'static str,
    pub register: fn(&Registry) -> Result<SlotId, RegistryError>,
}

/// Natives collected from every linked crate.
#[distributed_slice]
pub static NATIVE_TABLE: [NativeEntry] = [..];

static GLOBAL: Lazy<Registry> = Lazy::new(|| {
    debug!(capacity = MAX_SLOTS, "creating native registry");
    Registry::with_capacity(MAX_SLOTS)
});

pub struct Registry {
    slots: SlotTable,
    /// Slots issued to `NATIVE_TABLE` entries, in table order.
    linked: Mutex<Vec<(&'static str, SlotId)>>,
}

impl Registry {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotTable::with_capacity(capacity),
            linked: Mutex::new(Vec::new()),
        }
    }

    /// The registry, created on first access.
    #[inline]
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    // ==================== Registration ====================

    /// Register a typed host function and return its slot.
    pub fn register_handler<F, Args>(&self, func: F) -> Result<SlotId, RegistryError>
    where
        F: NativeFunction<Args>,
        Args: 'static,
    {
        self.install(Box::new(FnHandler::<F, Args>::new(func)))
    }

    /// Register a function with direct stack access.
    pub fn register_raw<F>(&self, func: F) -> Result<SlotId, RegistryError>
    where
        F: Fn(&mut dyn ScriptState) -> Result<u32, CallError> + Send + Sync + 'static,
    {
        self.install(Box::new(RawHandler::new(func)))
    }

    /// Place an already built handler in the next free slot.
    pub fn install(&self, handler: Box<dyn Handler>) -> Result<SlotId, RegistryError> {
        match self.slots.allocate(handler) {
            Ok(slot) => {
                debug!(
                    slot = slot.index(),
                    handler = self.slots.handler_name(slot).unwrap_or_default(),
                    "registered native handler"
                );
                Ok(slot)
            }
            Err(err) => {
                warn!(capacity = self.slots.capacity(), "native handler slots exhausted");
                Err(err)
            }
        }
    }

    // ==================== Dispatch ====================

    /// Invoke the handler registered in `slot`.
    pub fn dispatch(&self, slot: SlotId, state: &mut dyn ScriptState) -> Result<u32, DispatchError> {
        trace!(slot = slot.index(), "dispatch");
        self.slots.dispatch(slot, state)
    }

    /// The runtime-facing function for `slot`.
    #[inline]
    pub fn trampoline(&self, slot: SlotId) -> Option<NativeFn> {
        trampoline::lookup(slot)
    }

    // ==================== Binding ====================

    /// Bind the trampoline of a registered `slot` to the global `name`.
    pub fn bind_slot(&self, state: &mut dyn ScriptState, name: &str, slot: SlotId) {
        self.push_slot(state, slot);
        state.set_global(name);
    }

    /// Push the trampoline of a registered `slot` as a function value.
    pub fn push_slot(&self, state: &mut dyn ScriptState, slot: SlotId) {
        match trampoline::lookup(slot) {
            Some(func) => state.push_function(func),
            None => {
                debug_assert!(false, "slot {} has no trampoline", slot);
                state.push_nil();
            }
        }
    }

    /// Register `func` and bind it to the global `name`.
    pub fn bind<F, Args>(&self, state: &mut dyn ScriptState, name: &str, func: F) -> Result<SlotId, RegistryError>
    where
        F: NativeFunction<Args>,
        Args: 'static,
    {
        let slot = self.install(Box::new(FnHandler::<F, Args>::named(name.to_string(), func)))?;
        self.bind_slot(state, name, slot);
        Ok(slot)
    }

    /// Bind every `NATIVE_TABLE` entry as a global.
    ///
    /// Each entry is registered once; later calls bind the same slots into
    /// another state. If registration fails part way, the entries already
    /// registered keep their slots, nothing is bound, and a later call resumes
    /// at the entry that failed.
    pub fn install_linked(&self, state: &mut dyn ScriptState) -> Result<Vec<SlotId>, RegistryError> {
        self.install_entries(&NATIVE_TABLE, state)
    }

    fn install_entries(
        &self,
        entries: &'static [NativeEntry],
        state: &mut dyn ScriptState,
    ) -> Result<Vec<SlotId>, RegistryError> {
        let mut linked = self.linked.lock();
        let done = linked.len();
        for entry in &entries[done..] {
            linked.push((entry.name, (entry.register)(self)?));
        }
        if linked.len() > done {
            debug!(count = linked.len() - done, "registered linked natives");
        }

        for &(name, slot) in linked.iter() {
            self.bind_slot(state, name, slot);
        }
        Ok(linked.iter().map(|&(_, slot)| slot).collect())
    }

    // ==================== Introspection ====================

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub fn is_registered(&self, slot: SlotId) -> bool {
        self.slots.is_registered(slot)
    }

    pub fn handler_name(&self, slot: SlotId) -> Option<&str> {
        self.slots.handler_name(slot)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("slots", &self.slots).finish()
    }
}
