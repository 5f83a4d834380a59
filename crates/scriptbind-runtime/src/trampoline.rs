//! Per-slot trampolines.
//!
//! The runtime can only register `NativeFn`, a context-in/count-out function
//! with no room for type information. Each slot therefore gets its own
//! monomorphised function with the slot id baked in as a const parameter;
//! the typed handler is looked up again on the host side when the call
//! arrives. The table of trampolines is generated by the build script and
//! sized by `SCRIPTBIND_MAX_SLOTS`.

use scriptbind_core::{NativeFn, ScriptState};
use tracing::error;

use crate::error::SlotId;
use crate::registry::Registry;

include!(concat!(env!("OUT_DIR"), "/trampolines.rs"));

fn trampoline<const SLOT: usize>(state: &mut dyn ScriptState) -> i32 {
    match Registry::global().dispatch(SlotId::new(SLOT), state) {
        Ok(count) => count as i32,
        Err(err) => {
            error!(slot = SLOT, error = %err, "native call failed");
            state.raise_error(&err.to_string())
        }
    }
}

/// Trampoline for `slot`, `None` past `MAX_SLOTS`.
#[inline]
pub(crate) fn lookup(slot: SlotId) -> Option<NativeFn> {
    TRAMPOLINES.get(slot.index()).copied()
}
