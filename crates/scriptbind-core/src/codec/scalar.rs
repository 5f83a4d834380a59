//! Scalar codecs: numbers, booleans, strings, `Option` and `()`.

use std::borrow::Cow;
use std::ffi::{CStr, CString};

use super::{expect_kind, FromStack, FromStackOwned, ToStack};
use crate::error::{ConvertError, ConvertResult};
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

// ==================== Integers ====================

// Integers travel as runtime integers so every 64-bit value round-trips.
// A float read into an integer type truncates toward zero. Values that do not
// fit the target type are rejected, except for `u64`, which reinterprets the
// runtime integer's bits so `u64::MAX` survives a round trip.

/// Read the number at `idx` as a runtime integer.
fn read_integer<S: ScriptState + ?Sized>(state: &S, idx: StackIndex, target: &'static str) -> ConvertResult<i64> {
    // 2^63 is exactly representable; anything at or above it does not fit.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    expect_kind(state, idx, ValueKind::Number)?;
    if let Some(v) = state.to_integer(idx) {
        return Ok(v);
    }
    match state.to_number(idx) {
        Some(v) if v.is_finite() && v.trunc() >= -LIMIT && v.trunc() < LIMIT => Ok(v.trunc() as i64),
        Some(_) => Err(ConvertError::OutOfRange { index: idx, target }),
        None => Err(ConvertError::mismatch(idx, "number", state.kind(idx))),
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl<'s> FromStack<'s> for $ty {
            fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
                let v = read_integer(state, idx, stringify!($ty))?;
                <$ty>::try_from(v).map_err(|_| ConvertError::OutOfRange { index: idx, target: stringify!($ty) })
            }
        }

        impl ToStack for $ty {
            #[inline]
            fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
                state.push_integer(*self as i64);
                1
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, usize);

impl<'s> FromStack<'s> for u64 {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        expect_kind(state, idx, ValueKind::Number)?;
        match state.to_integer(idx) {
            Some(v) => Ok(v as u64),
            None => {
                let v = read_integer(state, idx, "u64")?;
                u64::try_from(v).map_err(|_| ConvertError::OutOfRange { index: idx, target: "u64" })
            }
        }
    }
}

impl ToStack for u64 {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.push_integer(*self as i64);
        1
    }
}

// ==================== Floats ====================

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {$(
        impl<'s> FromStack<'s> for $ty {
            fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
                state
                    .to_number(idx)
                    .filter(|_| state.is_number(idx))
                    .map(|v| v as $ty)
                    .ok_or_else(|| ConvertError::mismatch(idx, "number", state.kind(idx)))
            }
        }

        impl ToStack for $ty {
            #[inline]
            fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
                state.push_number(*self as f64);
                1
            }
        }
    )*};
}

impl_float!(f32, f64);

// ==================== Booleans ====================

impl<'s> FromStack<'s> for bool {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        state
            .to_boolean(idx)
            .ok_or_else(|| ConvertError::mismatch(idx, "boolean", state.kind(idx)))
    }
}

impl ToStack for bool {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.push_boolean(*self);
        1
    }
}

// ==================== Strings ====================

fn string_bytes<S: ScriptState + ?Sized>(state: &S, idx: StackIndex) -> ConvertResult<&[u8]> {
    expect_kind(state, idx, ValueKind::String)?;
    state
        .to_bytes(idx)
        .ok_or_else(|| ConvertError::mismatch(idx, "string", state.kind(idx)))
}

/// Strings are always decoded into an owned `String`.
impl<'s> FromStack<'s> for String {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let bytes = string_bytes(state, idx)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ConvertError::InvalidUtf8 { index: idx })
    }
}

impl<'s> FromStack<'s> for CString {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let bytes = string_bytes(state, idx)?;
        CString::new(bytes).map_err(|_| ConvertError::InteriorNul { index: idx })
    }
}

impl<'s> FromStack<'s> for char {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let s = String::from_stack(state, idx)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConvertError::LengthMismatch { index: idx, expected: 1, found: s.chars().count() }),
        }
    }
}

impl ToStack for str {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.push_str(self);
        1
    }
}

impl ToStack for String {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        self.as_str().to_stack(state)
    }
}

impl ToStack for Cow<'_, str> {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        self.as_ref().to_stack(state)
    }
}

impl ToStack for CStr {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.push_bytes(self.to_bytes());
        1
    }
}

impl ToStack for CString {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        self.as_c_str().to_stack(state)
    }
}

impl ToStack for char {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        let mut buf = [0u8; 4];
        state.push_str(self.encode_utf8(&mut buf));
        1
    }
}

// ==================== Nil ====================

/// `None` is nil. A missing trailing argument also decodes as `None`.
impl<'s, T: FromStackOwned> FromStack<'s> for Option<T> {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        if state.is_nil_or_none(idx) {
            Ok(None)
        } else {
            T::from_stack(state, idx).map(Some)
        }
    }
}

impl<T: ToStack> ToStack for Option<T> {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        match self {
            Some(v) => v.to_stack(state),
            None => {
                state.push_nil();
                1
            }
        }
    }
}

/// `()` pushes nothing: a native function returning `()` produces no results.
impl<'s> FromStack<'s> for () {
    #[inline]
    fn from_stack<S: ScriptState + ?Sized>(_state: &'s mut S, _idx: StackIndex) -> ConvertResult<Self> {
        Ok(())
    }
}

impl ToStack for () {
    #[inline]
    fn to_stack<S: ScriptState + ?Sized>(&self, _state: &mut S) -> u32 {
        0
    }
}
