//! Grouping natives into script-visible modules.

use scriptbind_core::ScriptState;
use scriptbind_runtime::{CallError, FnHandler, Handler, NativeFunction, RawHandler, Registry, RegistryError, SlotId};
use tracing::debug;

/// A named set of native functions installed in one step.
///
/// ```ignore
/// NativeModule::new("vec")
///     .function("dot", |a: Vec<f64>, b: Vec<f64>| a.iter().zip(&b).map(|(x, y)| x * y).sum::<f64>())
///     .function("len", |a: Vec<f64>| a.len())
///     .install_as(Registry::global(), &mut state, "vec")?;
/// ```
pub struct NativeModule {
    name: String,
    entries: Vec<(String, Box<dyn Handler>)>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: Vec::new() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a typed function.
    pub fn function<F, Args>(mut self, name: &str, func: F) -> Self
    where
        F: NativeFunction<Args>,
        Args: 'static,
    {
        let handler = FnHandler::<F, Args>::named(self.qualified(name), func);
        self.entries.push((name.to_string(), Box::new(handler)));
        self
    }

    /// Add a function with direct stack access.
    pub fn raw_function<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&mut dyn ScriptState) -> Result<u32, CallError> + Send + Sync + 'static,
    {
        let handler = RawHandler::named(self.qualified(name), func);
        self.entries.push((name.to_string(), Box::new(handler)));
        self
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}.{}", self.name, name)
    }

    /// Register every function and bind them as fields of a table stored in
    /// the global `global`.
    ///
    /// On exhaustion nothing is bound; slots issued before the failure stay
    /// allocated.
    pub fn install_as(
        self,
        registry: &Registry,
        state: &mut dyn ScriptState,
        global: &str,
    ) -> Result<Vec<SlotId>, RegistryError> {
        let mut slots = Vec::with_capacity(self.entries.len());
        state.create_table(0, self.entries.len());
        for (field, handler) in self.entries {
            match registry.install(handler) {
                Ok(slot) => {
                    registry.push_slot(state, slot);
                    state.set_field(-2, &field);
                    slots.push(slot);
                }
                Err(err) => {
                    state.pop(1);
                    return Err(err);
                }
            }
        }
        state.set_global(global);
        debug!(module = %self.name, global, functions = slots.len(), "installed native module");
        Ok(slots)
    }

    /// Register every function and bind each one to a global of its own name.
    pub fn install_globals(
        self,
        registry: &Registry,
        state: &mut dyn ScriptState,
    ) -> Result<Vec<SlotId>, RegistryError> {
        let mut slots = Vec::with_capacity(self.entries.len());
        for (field, handler) in self.entries {
            let slot = registry.install(handler)?;
            registry.bind_slot(state, &field, slot);
            slots.push(slot);
        }
        debug!(module = %self.name, functions = slots.len(), "installed native globals");
        Ok(slots)
    }
}

impl std::fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModule")
            .field("name", &self.name)
            .field("functions", &self.entries.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>())
            .finish()
    }
}
