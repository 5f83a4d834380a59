//! End-to-end dispatch through the global registry and generated trampolines.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use scriptbind_core::{ByteView, FromStack, MemState, RuntimeError, ScriptState, Value};
use scriptbind_runtime::{CallError, DispatchError, Registry, SlotId, MAX_SLOTS};

fn sum(a: i32, b: i32) -> i32 {
    a + b
}

fn word_lengths(words: Vec<String>) -> BTreeMap<String, usize> {
    words.into_iter().map(|w| (w.clone(), w.len())).collect()
}

fn parse_port(text: String) -> Result<u16, std::num::ParseIntError> {
    text.parse()
}

#[test]
fn test_trampoline_forwards_to_handler() {
    let registry = Registry::global();
    let slot = registry.register_handler(sum).unwrap();
    let func = registry.trampoline(slot).unwrap();

    let mut state = MemState::new();
    let out = state.call(func, &[Value::from(3), Value::from(4)]).unwrap();
    assert_eq!(out, vec![Value::from(7)]);
}

#[test]
fn test_bind_exposes_global() {
    let registry = Registry::global();
    let mut state = MemState::new();
    let slot = registry.bind(&mut state, "word_lengths", word_lengths).unwrap();
    assert_eq!(registry.handler_name(slot), Some("word_lengths"));

    let words = Value::sequence([Value::from("ab"), Value::from("c")]);
    let out = state.call_global("word_lengths", &[words]).unwrap();
    assert_eq!(out.len(), 1);

    let pairs = out[0].as_table().unwrap().borrow().sequence();
    let first = pairs[0].as_table().unwrap().borrow().sequence();
    assert_eq!(first, vec![Value::from("ab"), Value::from(2)]);
}

#[test]
fn test_errors_become_script_errors() {
    let registry = Registry::global();
    let mut state = MemState::new();
    registry.bind(&mut state, "parse_port", parse_port).unwrap();
    registry.bind(&mut state, "sum", sum).unwrap();

    let out = state.call_global("parse_port", &[Value::from("8080")]).unwrap();
    assert_eq!(out, vec![Value::from(8080)]);

    let err = state.call_global("parse_port", &[Value::from("http")]).unwrap_err();
    assert!(matches!(err, RuntimeError::Raised(ref msg) if msg.contains("invalid digit")));

    let err = state.call_global("sum", &[Value::from(1), Value::from(true)]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Raised("bad value at stack index 2: expected number, found boolean".to_string())
    );
}

#[test]
fn test_empty_result_reports_zero() {
    let registry = Registry::global();
    let mut state = MemState::new();
    registry.bind(&mut state, "evens", |limit: u32| (0..limit).filter(|n| n % 2 == 0).collect::<Vec<_>>()).unwrap();

    assert_eq!(state.call_global("evens", &[Value::from(0)]).unwrap(), vec![]);
    let out = state.call_global("evens", &[Value::from(5)]).unwrap();
    assert_eq!(out[0].as_table().unwrap().borrow().len(), 3);
}

#[test]
fn test_raw_handler_reads_byte_view() {
    let registry = Registry::global();
    let slot = registry
        .register_raw(|state: &mut dyn ScriptState| {
            let samples = ByteView::<f32>::from_stack(state, 1)?;
            let peak = samples.iter().fold(0.0f32, f32::max);
            state.push_number(peak as f64);
            Ok(1)
        })
        .unwrap();

    let bytes: Vec<u8> = [0.5f32, 2.0, 1.5].iter().flat_map(|v| v.to_ne_bytes()).collect();
    let mut state = MemState::new();
    let out = state.call(registry.trampoline(slot).unwrap(), &[Value::bytes(&bytes)]).unwrap();
    assert_eq!(out, vec![Value::from(2.0)]);
}

#[test]
fn test_unregistered_slot() {
    let registry = Registry::global();
    let mut state = MemState::new();
    let last = SlotId::new(MAX_SLOTS - 1);
    if !registry.is_registered(last) {
        assert_eq!(registry.dispatch(last, &mut state), Err(DispatchError::Unregistered(last)));
        let err = state.call(registry.trampoline(last).unwrap(), &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::Raised(_)));
    }
    assert!(registry.trampoline(SlotId::new(MAX_SLOTS)).is_none());
}

#[test]
fn test_dispatch_directly() {
    let registry = Registry::global();
    let slot = registry.register_handler(|s: String| s.to_uppercase()).unwrap();
    let mut state = MemState::new();
    state.push("abc");
    assert_eq!(registry.dispatch(slot, &mut state), Ok(1));
    assert_eq!(state.value(-1), Value::from("ABC"));

    state.pop(2);
    state.push(1);
    assert!(matches!(
        registry.dispatch(slot, &mut state),
        Err(DispatchError::Call(CallError::Convert(_)))
    ));
}
