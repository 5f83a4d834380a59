//! Core of scriptbind: the call-context boundary and the value codec.
//!
//! # Architecture
//!
//! - **`ScriptState`**: the call context the script runtime hands to a native
//!   function. Stack-like, positionally indexed, with type predicates and raw
//!   table access.
//! - **`NativeFn`**: the runtime's only native-call ABI, `fn(&mut dyn ScriptState) -> i32`.
//! - **`FromStack` / `ToStack`**: type-indexed conversion between stack slots
//!   and host values. Composite codecs delegate to their element codecs.
//! - **`MemState`**: an in-memory runtime implementing `ScriptState`.
//!
//! # Example
//!
//! ```ignore
//! use scriptbind_core::{FromStack, MemState, ToStack};
//!
//! let mut state = MemState::new();
//! (1i64, "one").to_stack(&mut state);
//! let pair = <(i64, String)>::from_stack(&mut state, -1)?;
//! ```

pub mod codec;
pub mod error;
pub mod kind;
pub mod mem;
pub mod state;

pub use codec::{ByteView, FromStack, FromStackOwned, IntoResults, Pod, ToStack};
pub use error::{ConvertError, ConvertResult};
pub use kind::ValueKind;
pub use mem::{MemState, RuntimeError, Table, TableRef, Value};
pub use state::{NativeFn, ScriptState, StackIndex};
