//! Key/value collections as a list of pairs.
//!
//! `{(1, "a"), (2, "b")}` is encoded as `{ {1, "a"}, {2, "b"} }`: a sequential
//! table whose entries are 2-element pair tables, in the iteration order of
//! the source collection. Keys are never used as table indices, so script
//! code cannot look a value up by key. Existing script data depends on this
//! shape, so it is kept as is.
//!
//! When a pair list repeats a key, the first entry wins.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;

use super::{expect_kind, read_element, write_element, FromStack, FromStackOwned, ToStack};
use crate::error::ConvertResult;
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

/// Decode every entry of the pair list at `idx`, in table order.
fn read_pairs<K, V, S>(state: &mut S, idx: StackIndex, mut insert: impl FnMut(K, V)) -> ConvertResult<()>
where
    K: FromStackOwned,
    V: FromStackOwned,
    S: ScriptState + ?Sized,
{
    expect_kind(state, idx, ValueKind::Table)?;
    let table = state.abs_index(idx);
    let len = state.raw_len(table);
    for i in 1..=len {
        let (key, value) = read_element::<(K, V), S>(state, table, i as i64)?;
        insert(key, value);
    }
    Ok(())
}

fn write_pairs<'a, K, V, S>(state: &mut S, len: usize, entries: impl Iterator<Item = (&'a K, &'a V)>) -> u32
where
    K: ToStack + 'a,
    V: ToStack + 'a,
    S: ScriptState + ?Sized,
{
    state.create_table(len, 0);
    for (i, entry) in entries.enumerate() {
        write_element(state, i as i64 + 1, &entry);
    }
    if len == 0 {
        0
    } else {
        1
    }
}

impl<'s, K, V> FromStack<'s> for BTreeMap<K, V>
where
    K: FromStackOwned + Ord,
    V: FromStackOwned,
{
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let mut map = BTreeMap::new();
        read_pairs(state, idx, |k, v| {
            map.entry(k).or_insert(v);
        })?;
        Ok(map)
    }
}

impl<K: ToStack, V: ToStack> ToStack for BTreeMap<K, V> {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        write_pairs(state, self.len(), self.iter())
    }
}

impl<'s, K, V, H> FromStack<'s> for HashMap<K, V, H>
where
    K: FromStackOwned + Eq + Hash,
    V: FromStackOwned,
    H: BuildHasher + Default,
{
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let mut map = HashMap::with_hasher(H::default());
        read_pairs(state, idx, |k, v| {
            map.entry(k).or_insert(v);
        })?;
        Ok(map)
    }
}

impl<K: ToStack, V: ToStack, H> ToStack for HashMap<K, V, H> {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        write_pairs(state, self.len(), self.iter())
    }
}

/// Keeps the table order on decode and the insertion order on encode.
impl<'s, K, V, H> FromStack<'s> for IndexMap<K, V, H>
where
    K: FromStackOwned + Eq + Hash,
    V: FromStackOwned,
    H: BuildHasher + Default,
{
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let mut map = IndexMap::with_hasher(H::default());
        read_pairs(state, idx, |k, v| {
            map.entry(k).or_insert(v);
        })?;
        Ok(map)
    }
}

impl<K: ToStack, V: ToStack, H> ToStack for IndexMap<K, V, H> {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        write_pairs(state, self.len(), self.iter())
    }
}
