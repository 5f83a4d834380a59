//! Sequences: `Vec<T>` and `[T]` as 1-indexed sequential tables.

use super::{expect_kind, read_element, write_element, FromStack, FromStackOwned, ToStack};
use crate::error::ConvertResult;
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

/// The table length decides the element count; elements are decoded in order.
impl<'s, T: FromStackOwned> FromStack<'s> for Vec<T> {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        expect_kind(state, idx, ValueKind::Table)?;
        let table = state.abs_index(idx);
        let len = state.raw_len(table);
        let mut items = Vec::with_capacity(len);
        for i in 1..=len {
            items.push(read_element::<T, S>(state, table, i as i64)?);
        }
        Ok(items)
    }
}

/// An empty sequence reports 0 results ("no value produced").
impl<T: ToStack> ToStack for [T] {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.create_table(self.len(), 0);
        for (i, item) in self.iter().enumerate() {
            write_element(state, i as i64 + 1, item);
        }
        if self.is_empty() {
            0
        } else {
            1
        }
    }
}

impl<T: ToStack> ToStack for Vec<T> {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        self.as_slice().to_stack(state)
    }
}
