//! Fixed-arity composites: tuples and arrays.
//!
//! A tuple of arity N, and an array `[T; N]`, is a sequential table of
//! exactly N elements. A pair is simply the arity-2 tuple. Tuples are
//! provided up to arity 16; `[T; N]` covers homogeneous data of any length.

use super::{expect_kind, expect_len, read_element, write_element, FromStack, FromStackOwned, ToStack};
use crate::error::ConvertResult;
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

macro_rules! impl_tuple {
    ($len:expr => $($name:ident : $n:tt),+) => {
        impl<'s, $($name: FromStackOwned),+> FromStack<'s> for ($($name,)+) {
            fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
                expect_kind(state, idx, ValueKind::Table)?;
                expect_len(state, idx, $len)?;
                let table = state.abs_index(idx);
                Ok(($(read_element::<$name, S>(state, table, $n + 1)?,)+))
            }
        }

        impl<$($name: ToStack),+> ToStack for ($($name,)+) {
            fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
                state.create_table($len, 0);
                $(write_element(state, $n + 1, &self.$n);)+
                1
            }
        }
    };
}

impl_tuple!(1 => A: 0);
impl_tuple!(2 => A: 0, B: 1);
impl_tuple!(3 => A: 0, B: 1, C: 2);
impl_tuple!(4 => A: 0, B: 1, C: 2, D: 3);
impl_tuple!(5 => A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(6 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple!(7 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple!(8 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
impl_tuple!(9 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
impl_tuple!(10 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
impl_tuple!(11 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
impl_tuple!(12 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
impl_tuple!(13 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12);
impl_tuple!(14 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13);
impl_tuple!(15 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14);
impl_tuple!(16 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14, P: 15);

impl<'s, T: FromStackOwned, const N: usize> FromStack<'s> for [T; N] {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        expect_kind(state, idx, ValueKind::Table)?;
        expect_len(state, idx, N)?;
        let table = state.abs_index(idx);
        let mut items = Vec::with_capacity(N);
        for i in 1..=N {
            items.push(read_element::<T, S>(state, table, i as i64)?);
        }
        match items.try_into() {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("length checked against N"),
        }
    }
}

impl<T: ToStack, const N: usize> ToStack for [T; N] {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.create_table(N, 0);
        for (i, item) in self.iter().enumerate() {
            write_element(state, i as i64 + 1, item);
        }
        1
    }
}
