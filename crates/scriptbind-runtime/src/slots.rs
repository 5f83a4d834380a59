//! Fixed-capacity handler slot table.
//!
//! Slots go from empty to registered exactly once and are never reused.
//! Allocation takes the next free id from an atomic counter, so ids are
//! issued in increasing order and a filled slot is only ever read.

use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use scriptbind_core::ScriptState;

use crate::error::{DispatchError, RegistryError, SlotId};
use crate::handler::Handler;
use crate::trampoline::MAX_SLOTS;

pub struct SlotTable {
    slots: Box<[OnceCell<Box<dyn Handler>>]>,
    next: AtomicUsize,
}

impl SlotTable {
    /// A table with `capacity` slots. The capacity is clamped to
    /// `MAX_SLOTS` so every id it issues has a trampoline.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_SLOTS);
        Self {
            slots: (0..capacity).map(|_| OnceCell::new()).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Install `handler` in the next free slot.
    pub fn allocate(&self, handler: Box<dyn Handler>) -> Result<SlotId, RegistryError> {
        let capacity = self.slots.len();
        let slot = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1))
            .map_err(|_| RegistryError::Exhausted { capacity })?;

        let installed = self.slots[slot].set(handler).is_ok();
        assert!(installed, "handler slot {} issued twice", slot);
        Ok(SlotId::new(slot))
    }

    #[inline]
    pub fn get(&self, slot: SlotId) -> Option<&dyn Handler> {
        self.slots.get(slot.index())?.get().map(|h| &**h)
    }

    /// Invoke the handler in `slot` with the caller's context.
    pub fn dispatch(&self, slot: SlotId, state: &mut dyn ScriptState) -> Result<u32, DispatchError> {
        let handler = self.get(slot).ok_or(DispatchError::Unregistered(slot))?;
        Ok(handler.handle(state)?)
    }

    /// Number of ids issued so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_registered(&self, slot: SlotId) -> bool {
        self.get(slot).is_some()
    }

    pub fn handler_name(&self, slot: SlotId) -> Option<&str> {
        self.get(slot).map(|h| h.name())
    }
}

impl std::fmt::Debug for SlotTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotTable")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use crate::handler::{FnHandler, RawHandler};
    use pretty_assertions::assert_eq;
    use scriptbind_core::{MemState, Value};

    fn double(x: i64) -> i64 {
        x * 2
    }

    #[test]
    fn test_ids_are_sequential() {
        let table = SlotTable::with_capacity(4);
        assert!(table.is_empty());
        for expected in 0..3 {
            let slot = table.allocate(Box::new(FnHandler::new(double))).unwrap();
            assert_eq!(slot, SlotId::new(expected));
        }
        assert_eq!(table.len(), 3);
        assert!(table.is_registered(SlotId::new(2)));
        assert!(!table.is_registered(SlotId::new(3)));
    }

    #[test]
    fn test_exhaustion() {
        let table = SlotTable::with_capacity(2);
        table.allocate(Box::new(FnHandler::new(double))).unwrap();
        table.allocate(Box::new(FnHandler::new(double))).unwrap();
        assert_eq!(
            table.allocate(Box::new(FnHandler::new(double))),
            Err(RegistryError::Exhausted { capacity: 2 })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_capacity_is_clamped() {
        let table = SlotTable::with_capacity(MAX_SLOTS + 10);
        assert_eq!(table.capacity(), MAX_SLOTS);
    }

    #[test]
    fn test_dispatch_routes_to_slot() {
        let table = SlotTable::with_capacity(4);
        let doubler = table.allocate(Box::new(FnHandler::new(double))).unwrap();
        let failing = table
            .allocate(Box::new(RawHandler::named("fail", |_: &mut dyn ScriptState| {
                Err(CallError::Native("nope".into()))
            })))
            .unwrap();

        let mut state = MemState::new();
        state.push(21);
        assert_eq!(table.dispatch(doubler, &mut state), Ok(1));
        assert_eq!(state.value(-1), Value::from(42));

        assert_eq!(
            table.dispatch(failing, &mut state),
            Err(DispatchError::Call(CallError::Native("nope".into())))
        );
        assert_eq!(table.handler_name(failing), Some("fail"));
    }

    #[test]
    fn test_dispatch_unregistered() {
        let table = SlotTable::with_capacity(2);
        let mut state = MemState::new();
        assert_eq!(
            table.dispatch(SlotId::new(1), &mut state),
            Err(DispatchError::Unregistered(SlotId::new(1)))
        );
        assert_eq!(
            table.dispatch(SlotId::new(99), &mut state),
            Err(DispatchError::Unregistered(SlotId::new(99)))
        );
    }
}
