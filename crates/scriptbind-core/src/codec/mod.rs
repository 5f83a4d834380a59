//! Type-indexed value codec.
//!
//! Every supported host type `T` carries a conversion pair:
//!
//! - `FromStack::from_stack(state, idx) -> T` reads the value at `idx`;
//! - `ToStack::to_stack(&value, state) -> u32` pushes and returns the result
//!   count reported to the runtime.
//!
//! The codec is selected by the host type, never by the runtime tag. Composite
//! codecs (tuples, arrays, sequences, maps) only call the codecs of their
//! element types; scalar handling lives in `scalar.rs` alone.
//!
//! # Table shapes
//!
//! | Host type | Script value |
//! |---|---|
//! | tuple / `[T; N]` | sequential table, length == arity |
//! | `Vec<T>` / `[T]` | sequential table, 1-indexed |
//! | `BTreeMap` / `HashMap` / `IndexMap` | sequential table of `{k, v}` pairs |
//! | `ByteView<T>` | byte string |
//!
//! The map shape is a positional list of pairs, not a keyed table. Keys are
//! never used as table indices.

mod buffer;
mod composite;
mod map;
mod scalar;
mod seq;

pub use buffer::{ByteView, Pod};

use crate::error::{ConvertError, ConvertResult};
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

/// Read a host value from a stack position.
///
/// `'s` is the borrow of the call context. Owned types implement this for
/// every `'s`; zero-copy views borrow the runtime value for `'s`.
pub trait FromStack<'s>: Sized {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self>;
}

/// Host types that do not borrow from the call context.
pub trait FromStackOwned: for<'s> FromStack<'s> {}

impl<T> FromStackOwned for T where T: for<'s> FromStack<'s> {}

/// Push a host value onto the stack.
pub trait ToStack {
    /// Push the value and return the number of results it represents.
    ///
    /// Composite values always leave exactly one table on the stack, even
    /// when they report 0 results (empty sequences and maps).
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32;
}

impl<T: ToStack + ?Sized> ToStack for &T {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        (**self).to_stack(state)
    }
}

impl<T: ToStack + ?Sized> ToStack for Box<T> {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        (**self).to_stack(state)
    }
}

/// Values a native function may hand back to the script.
///
/// Every `ToStack` type pushes itself. `Result<T, E>` pushes `T` on success
/// and yields the rendered error otherwise, leaving the stack untouched.
pub trait IntoResults {
    fn push_results<S: ScriptState + ?Sized>(self, state: &mut S) -> Result<u32, String>;
}

impl<T: ToStack> IntoResults for T {
    #[inline]
    fn push_results<S: ScriptState + ?Sized>(self, state: &mut S) -> Result<u32, String> {
        Ok(self.to_stack(state))
    }
}

impl<T: ToStack, E: std::fmt::Display> IntoResults for Result<T, E> {
    fn push_results<S: ScriptState + ?Sized>(self, state: &mut S) -> Result<u32, String> {
        match self {
            Ok(value) => Ok(value.to_stack(state)),
            Err(err) => Err(err.to_string()),
        }
    }
}

// ==================== Shared helpers ====================

/// Fail with `TypeMismatch` unless the value at `idx` has kind `expected`.
#[inline]
pub(crate) fn expect_kind<S: ScriptState + ?Sized>(
    state: &S,
    idx: StackIndex,
    expected: ValueKind,
) -> ConvertResult<()> {
    let found = state.kind(idx);
    if found == expected {
        Ok(())
    } else {
        Err(ConvertError::mismatch(idx, expected.name(), found))
    }
}

/// Fail with `LengthMismatch` unless the table at `idx` has `expected` elements.
#[inline]
pub(crate) fn expect_len<S: ScriptState + ?Sized>(
    state: &S,
    idx: StackIndex,
    expected: usize,
) -> ConvertResult<()> {
    let found = state.raw_len(idx);
    if found == expected {
        Ok(())
    } else {
        Err(ConvertError::LengthMismatch { index: idx, expected, found })
    }
}

/// Decode `t[n]` of the table at absolute index `table` as `T`.
///
/// The element is pushed, decoded at -1 and popped again, also when decoding
/// fails, so the caller's stack is unchanged on return.
pub(crate) fn read_element<T, S>(state: &mut S, table: StackIndex, n: i64) -> ConvertResult<T>
where
    T: FromStackOwned,
    S: ScriptState + ?Sized,
{
    state.raw_get_index(table, n);
    let value = T::from_stack(&mut *state, -1);
    state.pop(1);
    value
}

/// Push `value` and store it as `t[n]` of the table on top of the stack.
///
/// A value that pushes nothing (`()`) is stored as nil so the table stays on
/// top for the next element.
pub(crate) fn write_element<T, S>(state: &mut S, n: i64, value: &T)
where
    T: ToStack + ?Sized,
    S: ScriptState + ?Sized,
{
    let before = state.top();
    value.to_stack(state);
    if state.top() == before {
        state.push_nil();
    }
    state.raw_set_index(-2, n);
}

#[cfg(test)]
mod tests;
