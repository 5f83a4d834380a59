//! In-memory script runtime.
//!
//! `MemState` implements `ScriptState` over a plain value stack with
//! reference-counted tables and a globals table. It follows the usual
//! embedded-script conventions (1-based sequence tables, frame-relative
//! indices, native functions reporting their result count) and is what the
//! codec and dispatch tests run against.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use thiserror::Error;

use crate::kind::ValueKind;
use crate::state::{NativeFn, ScriptState, StackIndex};

/// Maximum nesting of `MemState::call`.
pub const MAX_CALL_DEPTH: usize = 200;

/// Shared table handle. Tables compare by identity.
pub type TableRef = Rc<RefCell<Table>>;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Rc<[u8]>),
    Table(TableRef),
    Function(NativeFn),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) | Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Table(_) => ValueKind::Table,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// A new sequential table holding `items` at 1..=n.
    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Value {
        let items: Vec<Value> = items.into_iter().collect();
        let mut table = Table::with_capacity(items.len(), 0);
        for (i, item) in items.into_iter().enumerate() {
            table.set(i as i64 + 1, item);
        }
        Value::Table(Rc::new(RefCell::new(table)))
    }

    pub fn bytes(bytes: &[u8]) -> Value {
        Value::String(Rc::from(bytes))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            Value::Number(n) => float_to_integer(n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Value::Integer(i) => Some(i as f64),
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(&s[..]),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<NativeFn> {
        match *self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Value::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            Value::Function(func) => write!(f, "function: {:#x}", *func as usize),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
                self.as_number() == other.as_number()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::bytes(v.as_bytes())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::bytes(v.as_bytes())
    }
}

impl From<TableRef> for Value {
    fn from(v: TableRef) -> Self {
        Value::Table(v)
    }
}

impl From<NativeFn> for Value {
    fn from(v: NativeFn) -> Self {
        Value::Function(v)
    }
}

fn float_to_integer(n: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it does not fit.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if n.fract() == 0.0 && n >= -LIMIT && n < LIMIT {
        Some(n as i64)
    } else {
        None
    }
}

// ==================== Table ====================

/// A table with a 1-based array part, an integer hash part and
/// string-keyed fields.
///
/// The array part holds keys `1..=n` and may contain nils, either reserved by
/// `with_capacity` or cleared later. Integer keys beyond it live in the hash
/// part and move over as soon as the array part reaches them. The border is
/// the last non-nil slot of the array part, so `{nil, 5}` built with two
/// reserved slots has length 2.
#[derive(Debug, Default)]
pub struct Table {
    array: Vec<Value>,
    hash: HashMap<i64, Value>,
    fields: IndexMap<String, Value>,
}

impl Table {
    /// A table with `narr` nil slots reserved in the array part.
    pub fn with_capacity(narr: usize, nrec: usize) -> Self {
        Self {
            array: vec![Value::Nil; narr],
            hash: HashMap::new(),
            fields: IndexMap::with_capacity(nrec),
        }
    }

    /// Border of the array part.
    #[inline]
    pub fn len(&self) -> usize {
        self.array.iter().rposition(|v| !v.is_nil()).map_or(0, |i| i + 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.hash.is_empty() && self.fields.is_empty()
    }

    pub fn get(&self, n: i64) -> Value {
        if n >= 1 && (n as usize) <= self.array.len() {
            self.array[n as usize - 1].clone()
        } else {
            self.hash.get(&n).cloned().unwrap_or(Value::Nil)
        }
    }

    pub fn set(&mut self, n: i64, value: Value) {
        let slots = self.array.len();
        if n >= 1 && (n as usize) <= slots {
            self.array[n as usize - 1] = value;
        } else if n >= 1 && n as usize == slots + 1 && !value.is_nil() {
            self.hash.remove(&n);
            self.array.push(value);
            while let Some(next) = self.hash.remove(&(self.array.len() as i64 + 1)) {
                self.array.push(next);
            }
        } else if value.is_nil() {
            self.hash.remove(&n);
        } else {
            self.hash.insert(n, value);
        }
    }

    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        if value.is_nil() {
            self.fields.shift_remove(name);
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }

    /// Names of the string-keyed fields, in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Copy of the array part up to the border.
    pub fn sequence(&self) -> Vec<Value> {
        self.array[..self.len()].to_vec()
    }
}

// ==================== MemState ====================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Raised by a native function through `ScriptState::raise_error`.
    #[error("{0}")]
    Raised(String),
    #[error("native function reported {reported} results but pushed {available}")]
    BadResultCount { reported: i32, available: usize },
    #[error("attempt to call a {0} value")]
    NotCallable(ValueKind),
    #[error("call stack overflow")]
    StackOverflow,
}

/// In-memory call context.
#[derive(Debug, Default)]
pub struct MemState {
    stack: Vec<Value>,
    /// Stack offset of the current frame.
    base: usize,
    globals: IndexMap<String, Value>,
    /// Error raised by the running native function.
    error: Option<String>,
    depth: usize,
}

impl MemState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, idx: StackIndex) -> Option<usize> {
        let len = self.stack.len();
        if idx > 0 {
            let slot = self.base + idx as usize - 1;
            (slot < len).then_some(slot)
        } else if idx < 0 {
            let back = idx.unsigned_abs() as usize;
            (back <= len - self.base).then(|| len - back)
        } else {
            None
        }
    }

    fn value_at(&self, idx: StackIndex) -> Option<&Value> {
        self.slot(idx).map(|slot| &self.stack[slot])
    }

    fn table_at(&self, idx: StackIndex) -> Option<TableRef> {
        self.value_at(idx).and_then(Value::as_table).cloned()
    }

    fn pop_value(&mut self) -> Value {
        if self.stack.len() > self.base {
            self.stack.pop().unwrap_or(Value::Nil)
        } else {
            Value::Nil
        }
    }

    /// Copy of the value at `idx`, nil outside the frame.
    pub fn value(&self, idx: StackIndex) -> Value {
        self.value_at(idx).cloned().unwrap_or(Value::Nil)
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(value.into());
    }

    pub fn global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.globals.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Call a native function with `args` as positions 1..=n of a new frame.
    ///
    /// Returns the top `n` values of the callee frame, `n` being the count the
    /// function reported.
    pub fn call(&mut self, func: NativeFn, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow);
        }

        let saved_base = self.base;
        let base = self.stack.len();
        self.stack.extend(args.iter().cloned());
        self.base = base;
        self.depth += 1;

        let reported = func(self);

        self.depth -= 1;
        let available = self.stack.len() - base;
        let outcome = match self.error.take() {
            Some(message) => Err(RuntimeError::Raised(message)),
            None if reported < 0 || reported as usize > available => {
                Err(RuntimeError::BadResultCount { reported, available })
            }
            None => Ok(self.stack[self.stack.len() - reported as usize..].to_vec()),
        };

        self.stack.truncate(base);
        self.base = saved_base;
        outcome
    }

    pub fn call_value(&mut self, callee: &Value, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        match callee {
            Value::Function(func) => self.call(*func, args),
            other => Err(RuntimeError::NotCallable(other.kind())),
        }
    }

    pub fn call_global(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let callee = self.global(name);
        self.call_value(&callee, args)
    }
}

impl ScriptState for MemState {
    fn top(&self) -> StackIndex {
        (self.stack.len() - self.base) as StackIndex
    }

    fn pop(&mut self, n: usize) {
        let keep = self.stack.len().saturating_sub(n).max(self.base);
        self.stack.truncate(keep);
    }

    fn kind(&self, idx: StackIndex) -> ValueKind {
        self.value_at(idx).map_or(ValueKind::NoValue, Value::kind)
    }

    fn to_number(&self, idx: StackIndex) -> Option<f64> {
        self.value_at(idx).and_then(Value::as_number)
    }

    fn to_integer(&self, idx: StackIndex) -> Option<i64> {
        self.value_at(idx).and_then(Value::as_integer)
    }

    fn to_boolean(&self, idx: StackIndex) -> Option<bool> {
        self.value_at(idx).and_then(Value::as_bool)
    }

    fn to_bytes(&self, idx: StackIndex) -> Option<&[u8]> {
        self.value_at(idx).and_then(Value::as_bytes)
    }

    fn push_nil(&mut self) {
        self.stack.push(Value::Nil);
    }

    fn push_number(&mut self, value: f64) {
        self.stack.push(Value::Number(value));
    }

    fn push_integer(&mut self, value: i64) {
        self.stack.push(Value::Integer(value));
    }

    fn push_boolean(&mut self, value: bool) {
        self.stack.push(Value::Boolean(value));
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.stack.push(Value::bytes(bytes));
    }

    fn raw_len(&self, idx: StackIndex) -> usize {
        self.value_at(idx)
            .and_then(Value::as_table)
            .map_or(0, |t| t.borrow().len())
    }

    fn raw_get_index(&mut self, idx: StackIndex, n: i64) {
        let value = self.table_at(idx).map_or(Value::Nil, |t| t.borrow().get(n));
        self.stack.push(value);
    }

    fn raw_set_index(&mut self, idx: StackIndex, n: i64) {
        let table = self.table_at(idx);
        let value = self.pop_value();
        if let Some(table) = table {
            table.borrow_mut().set(n, value);
        }
    }

    fn create_table(&mut self, narr: usize, nrec: usize) {
        let table = Table::with_capacity(narr, nrec);
        self.stack.push(Value::Table(Rc::new(RefCell::new(table))));
    }

    fn set_field(&mut self, idx: StackIndex, name: &str) {
        let table = self.table_at(idx);
        let value = self.pop_value();
        if let Some(table) = table {
            table.borrow_mut().set_field(name, value);
        }
    }

    fn push_function(&mut self, func: NativeFn) {
        self.stack.push(Value::Function(func));
    }

    fn set_global(&mut self, name: &str) {
        let value = self.pop_value();
        if value.is_nil() {
            self.globals.shift_remove(name);
        } else {
            self.globals.insert(name.to_string(), value);
        }
    }

    fn raise_error(&mut self, message: &str) -> i32 {
        self.error = Some(message.to_string());
        -1
    }
}
