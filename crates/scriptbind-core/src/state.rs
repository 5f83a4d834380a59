//! The call-context boundary between native code and the script runtime.
//!
//! A `ScriptState` is owned by the runtime for the duration of one native
//! call. Native code borrows it, reads arguments by position, pushes results
//! and reports how many values it pushed. Nothing here retains the context
//! past the call.
//!
//! # Indexing
//!
//! Positions are `i32`. Positive indices are absolute within the current
//! frame (1 = first argument); negative indices are relative to the top
//! (-1 = most recently pushed value). Index 0 is never valid.

use crate::kind::ValueKind;

/// Stack position inside the current call frame.
pub type StackIndex = i32;

/// Native-call ABI of the script runtime: call context in, result count out.
///
/// This is the only function shape the runtime can register, so it carries
/// no per-function type information. A negative return is only produced by
/// `ScriptState::raise_error`.
pub type NativeFn = fn(&mut dyn ScriptState) -> i32;

/// Call context capability consumed by the codec and the dispatch layer.
pub trait ScriptState {
    // ==================== Stack ====================

    /// Number of values in the current frame.
    fn top(&self) -> StackIndex;

    /// Remove `n` values from the top of the stack.
    fn pop(&mut self, n: usize);

    /// Kind of the value at `idx`, `ValueKind::NoValue` outside the frame.
    fn kind(&self, idx: StackIndex) -> ValueKind;

    /// Convert a relative index into an absolute one.
    ///
    /// Composite codecs push temporaries while reading a table, so they pin
    /// the table position first.
    #[inline]
    fn abs_index(&self, idx: StackIndex) -> StackIndex {
        if idx > 0 {
            idx
        } else {
            self.top() + idx + 1
        }
    }

    // ==================== Predicates ====================

    #[inline]
    fn is_number(&self, idx: StackIndex) -> bool {
        self.kind(idx) == ValueKind::Number
    }

    #[inline]
    fn is_boolean(&self, idx: StackIndex) -> bool {
        self.kind(idx) == ValueKind::Boolean
    }

    #[inline]
    fn is_string(&self, idx: StackIndex) -> bool {
        self.kind(idx) == ValueKind::String
    }

    #[inline]
    fn is_table(&self, idx: StackIndex) -> bool {
        self.kind(idx) == ValueKind::Table
    }

    #[inline]
    fn is_nil_or_none(&self, idx: StackIndex) -> bool {
        self.kind(idx).is_nil_or_none()
    }

    // ==================== Scalar reads ====================

    /// Numeric value at `idx` as a float.
    fn to_number(&self, idx: StackIndex) -> Option<f64>;

    /// Numeric value at `idx` as an integer. Floats convert only when their
    /// value is integral and in range.
    fn to_integer(&self, idx: StackIndex) -> Option<i64>;

    fn to_boolean(&self, idx: StackIndex) -> Option<bool>;

    /// Bytes of the string at `idx`, borrowed from the runtime value.
    fn to_bytes(&self, idx: StackIndex) -> Option<&[u8]>;

    // ==================== Pushes ====================

    fn push_nil(&mut self);
    fn push_number(&mut self, value: f64);
    fn push_integer(&mut self, value: i64);
    fn push_boolean(&mut self, value: bool);
    fn push_bytes(&mut self, bytes: &[u8]);

    #[inline]
    fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    // ==================== Tables ====================

    /// Length (border) of the sequence part of the table at `idx`.
    fn raw_len(&self, idx: StackIndex) -> usize;

    /// Push `t[n]` where `t` is the table at `idx`, without metamethods.
    fn raw_get_index(&mut self, idx: StackIndex, n: i64);

    /// Pop the top value and store it as `t[n]` where `t` is the table at `idx`.
    /// `idx` is resolved before the pop.
    fn raw_set_index(&mut self, idx: StackIndex, n: i64);

    /// Push a new table with preallocated array and record parts.
    fn create_table(&mut self, narr: usize, nrec: usize);

    /// Pop the top value and store it as `t[name]` where `t` is the table at `idx`.
    fn set_field(&mut self, idx: StackIndex, name: &str);

    // ==================== Registration ====================

    /// Push a native function value.
    fn push_function(&mut self, func: NativeFn);

    /// Pop the top value and bind it to the global `name`.
    fn set_global(&mut self, name: &str);

    // ==================== Errors ====================

    /// Report a script-level error for the running native call.
    ///
    /// Returns the value the native function must hand back to the runtime.
    /// Runtimes that unwind on error never return from this call.
    fn raise_error(&mut self, message: &str) -> i32;
}
