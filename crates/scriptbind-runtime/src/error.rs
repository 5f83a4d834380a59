//! Dispatch and registration errors.

use std::fmt;

use scriptbind_core::ConvertError;
use thiserror::Error;

/// Identifier of a handler slot. Issued by `SlotTable::allocate` in
/// increasing order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure inside a single native call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// An argument did not convert to the parameter type.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// The native function itself returned an error.
    #[error("{0}")]
    Native(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("all {capacity} native handler slots are in use")]
    Exhausted { capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no native handler registered in slot {0}")]
    Unregistered(SlotId),

    #[error(transparent)]
    Call(#[from] CallError),
}

impl From<ConvertError> for DispatchError {
    fn from(err: ConvertError) -> Self {
        DispatchError::Call(CallError::Convert(err))
    }
}
