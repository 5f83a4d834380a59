//! SDK for exposing Rust functions to scripts.
//!
//! # Example
//!
//! ```ignore
//! use scriptbind_ext::prelude::*;
//!
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
//!     x.max(lo).min(hi)
//! }
//!
//! scriptbind_ext::logging::init();
//! export_natives!(&mut state; "add" => add, "clamp" => clamp)?;
//!
//! NativeModule::new("text")
//!     .function("upper", |s: String| s.to_uppercase())
//!     .install_as(Registry::global(), &mut state, "text")?;
//! ```
//!
//! Natives can also be declared next to their definition and bound in bulk
//! with `Registry::install_linked`:
//!
//! ```ignore
//! #[distributed_slice(NATIVE_TABLE)]
//! static ADD: NativeEntry = NativeEntry {
//!     name: "add",
//!     register: |registry| registry.register_handler(add),
//! };
//! ```

pub mod logging;
pub mod module;

pub use scriptbind_core::{
    ByteView, ConvertError, FromStack, FromStackOwned, IntoResults, MemState, NativeFn, Pod,
    RuntimeError, ScriptState, StackIndex, ToStack, Value, ValueKind,
};
pub use scriptbind_runtime::{
    distributed_slice, CallError, DispatchError, FnHandler, Handler, NativeEntry, NativeFunction,
    RawHandler, Registry, RegistryError, SlotId, MAX_SLOTS, NATIVE_TABLE,
};

pub use module::NativeModule;

/// Everyday imports for extension code.
pub mod prelude {
    pub use crate::export_natives;
    pub use crate::module::NativeModule;
    pub use scriptbind_core::{
        ByteView, FromStack, MemState, ScriptState, ToStack, Value, ValueKind,
    };
    pub use scriptbind_runtime::{
        distributed_slice, CallError, NativeEntry, Registry, RegistryError, SlotId, NATIVE_TABLE,
    };
}

/// Bind `"name" => function` pairs as globals of a script state.
///
/// Evaluates to `Result<Vec<SlotId>, RegistryError>` with one slot per pair,
/// stopping at the first registration failure. Without an explicit registry
/// the global one is used.
///
/// ```ignore
/// let slots = export_natives!(&mut state; "add" => add, "neg" => |x: i64| -x)?;
/// let slots = export_natives!(Registry::global(), &mut state; "add" => add)?;
/// ```
#[macro_export]
macro_rules! export_natives {
    ($registry:expr, $state:expr; $($name:literal => $func:expr),+ $(,)?) => {
        (|| -> ::core::result::Result<::std::vec::Vec<$crate::SlotId>, $crate::RegistryError> {
            let registry: &$crate::Registry = $registry;
            let state: &mut dyn $crate::ScriptState = $state;
            ::core::result::Result::Ok(::std::vec![$(registry.bind(&mut *state, $name, $func)?),+])
        })()
    };
    ($state:expr; $($name:literal => $func:expr),+ $(,)?) => {
        $crate::export_natives!($crate::Registry::global(), $state; $($name => $func),+)
    };
}
