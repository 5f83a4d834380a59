//! Raw byte buffers: typed, zero-copy views over script byte strings.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use super::{expect_kind, FromStack, ToStack};
use crate::error::{ConvertError, ConvertResult};
use crate::kind::ValueKind;
use crate::state::{ScriptState, StackIndex};

/// Element types that may be reinterpreted from raw bytes.
///
/// # Safety
///
/// Implementors must be `Copy`, have no padding, no invalid bit patterns and
/// a non-zero size.
pub unsafe trait Pod: Copy + 'static {}

macro_rules! impl_pod {
    ($($ty:ty),* $(,)?) => {$(unsafe impl Pod for $ty {})*};
}

impl_pod!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64);

// `[T; 0]` satisfies the bound but is rejected when a `ByteView` uses it.
unsafe impl<T: Pod, const N: usize> Pod for [T; N] {}

/// A view of `len()` elements of `T` stored in a byte string.
///
/// Decoding borrows the runtime's bytes; no copy is made. The element count is
/// `byte_len / size_of::<T>()`, trailing bytes that do not form a whole
/// element are ignored. Encoding pushes exactly `len() * size_of::<T>()` bytes.
///
/// Zero-sized elements fail to compile:
///
/// ```compile_fail
/// use scriptbind_core::ByteView;
///
/// let view = ByteView::<[u8; 0]>::from_bytes(b"abcd");
/// ```
#[derive(Clone, Copy)]
pub struct ByteView<'a, T: Pod> {
    bytes: &'a [u8],
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> ByteView<'a, T> {
    const ELEM_BYTES: usize = {
        let size = mem::size_of::<T>();
        assert!(size != 0, "ByteView element type must not be zero-sized");
        size
    };

    /// View raw bytes as elements of `T`.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        let whole = bytes.len() - bytes.len() % Self::ELEM_BYTES;
        Self { bytes: &bytes[..whole], _marker: PhantomData }
    }

    /// View a host slice as raw bytes.
    pub fn from_slice(items: &'a [T]) -> Self {
        // SAFETY: T is Pod, so every byte of the slice is initialised.
        let bytes = unsafe {
            std::slice::from_raw_parts(items.as_ptr() as *const u8, items.len() * Self::ELEM_BYTES)
        };
        Self { bytes, _marker: PhantomData }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / Self::ELEM_BYTES
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte length covered by the view, always `len() * size_of::<T>()`.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Element `i`, read unaligned.
    pub fn get(&self, i: usize) -> Option<T> {
        if i >= self.len() {
            return None;
        }
        // SAFETY: bounds checked above; T is Pod so any bit pattern is valid.
        Some(unsafe { (self.bytes.as_ptr().add(i * Self::ELEM_BYTES) as *const T).read_unaligned() })
    }

    /// The elements as a typed slice, when the bytes happen to be aligned for `T`.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.bytes.as_ptr().align_offset(mem::align_of::<T>()) != 0 {
            return None;
        }
        // SAFETY: aligned, length is a whole number of elements, T is Pod.
        Some(unsafe { std::slice::from_raw_parts(self.bytes.as_ptr() as *const T, self.len()) })
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let view = *self;
        (0..view.len()).filter_map(move |i| view.get(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: Pod> fmt::Debug for ByteView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.len())
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

impl<'s, T: Pod> FromStack<'s> for ByteView<'s, T> {
    fn from_stack<S: ScriptState + ?Sized>(state: &'s mut S, idx: StackIndex) -> ConvertResult<Self> {
        let state: &'s S = state;
        expect_kind(state, idx, ValueKind::String)?;
        state
            .to_bytes(idx)
            .map(ByteView::from_bytes)
            .ok_or_else(|| ConvertError::mismatch(idx, "string", state.kind(idx)))
    }
}

impl<T: Pod> ToStack for ByteView<'_, T> {
    fn to_stack<S: ScriptState + ?Sized>(&self, state: &mut S) -> u32 {
        state.push_bytes(self.bytes);
        1
    }
}
