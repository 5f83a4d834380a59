//! Native call dispatch for scriptbind.
//!
//! The script runtime registers native functions through a single ABI,
//! `fn(&mut dyn ScriptState) -> i32`. This crate maps arbitrary typed Rust
//! functions onto that ABI:
//!
//! - **`Handler`**: a boxed, type-erased call target. `FnHandler` adapts any
//!   `Fn(A1..An) -> R` through the value codec; `RawHandler` gets the stack.
//! - **`SlotTable`**: fixed-capacity, write-once handler slots.
//! - **Trampolines**: one generated `NativeFn` per slot, forwarding to
//!   `Registry::global().dispatch(slot, state)`.
//! - **`Registry`**: the process-wide slot table plus binding helpers.
//! - **`NATIVE_TABLE`**: natives collected at link time, bound by
//!   `Registry::install_linked`.
//!
//! Dispatch failures (bad arguments, native errors, unregistered slots) are
//! raised as script errors by the trampoline and never abort the process.

pub mod error;
pub mod handler;
pub mod registry;
pub mod slots;
pub mod trampoline;

pub use linkme::distributed_slice;
pub use scriptbind_core::IntoResults;

pub use error::{CallError, DispatchError, RegistryError, SlotId};
pub use handler::{FnHandler, Handler, NativeFunction, RawHandler};
pub use registry::{NativeEntry, Registry, NATIVE_TABLE};
pub use slots::SlotTable;
pub use trampoline::MAX_SLOTS;
