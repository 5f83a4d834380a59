use std::collections::{BTreeMap, HashMap};
use std::ffi::CString;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::mem::{MemState, Value};

fn encode<T: ToStack + ?Sized>(value: &T) -> (MemState, u32) {
    let mut state = MemState::new();
    let count = value.to_stack(&mut state);
    (state, count)
}

fn round_trip<T: ToStack + FromStackOwned>(value: &T) -> T {
    let (mut state, _) = encode(value);
    T::from_stack(&mut state, -1).unwrap()
}

fn decode<T: FromStackOwned>(value: Value) -> ConvertResult<T> {
    let mut state = MemState::new();
    state.push(value);
    T::from_stack(&mut state, -1)
}

// ==================== Scalars ====================

#[test]
fn test_integer_extremes() {
    assert_eq!(round_trip(&0i32), 0);
    assert_eq!(round_trip(&-17i32), -17);
    assert_eq!(round_trip(&i64::MIN), i64::MIN);
    assert_eq!(round_trip(&i64::MAX), i64::MAX);
    assert_eq!(round_trip(&u8::MAX), u8::MAX);
    assert_eq!(round_trip(&usize::MIN), 0);
}

#[test]
fn test_float_into_integer_truncates() {
    assert_eq!(decode::<i32>(Value::from(3.9)).unwrap(), 3);
    assert_eq!(decode::<i64>(Value::from(-2.5)).unwrap(), -2);
    assert_eq!(decode::<u8>(Value::from(255.7)).unwrap(), 255);
}

#[test]
fn test_integer_out_of_range() {
    let out_of_range = |target| ConvertError::OutOfRange { index: -1, target };
    assert_eq!(decode::<u8>(Value::from(300)).unwrap_err(), out_of_range("u8"));
    assert_eq!(decode::<usize>(Value::from(-1)).unwrap_err(), out_of_range("usize"));
    assert_eq!(decode::<i32>(Value::from(10_000_000_000i64)).unwrap_err(), out_of_range("i32"));
    assert_eq!(decode::<i8>(Value::from(-128.5)).unwrap(), -128);
    assert_eq!(decode::<i8>(Value::from(-129.0)).unwrap_err(), out_of_range("i8"));

    assert_eq!(decode::<i32>(Value::from(f64::NAN)).unwrap_err(), out_of_range("i32"));
    assert_eq!(decode::<i64>(Value::from(f64::INFINITY)).unwrap_err(), out_of_range("i64"));
    assert_eq!(decode::<i64>(Value::from(1e19)).unwrap_err(), out_of_range("i64"));
}

#[test]
fn test_u64_reinterprets_runtime_integer() {
    assert_eq!(round_trip(&u64::MAX), u64::MAX);
    let (state, _) = encode(&u64::MAX);
    assert_eq!(state.to_integer(-1), Some(-1));
    assert_eq!(decode::<u64>(Value::from(-1)).unwrap(), u64::MAX);
    assert_eq!(
        decode::<u64>(Value::from(-1.5)).unwrap_err(),
        ConvertError::OutOfRange { index: -1, target: "u64" }
    );
}

#[test]
fn test_numeric_string_is_not_a_number() {
    let err = decode::<i32>(Value::from("12")).unwrap_err();
    assert_eq!(
        err,
        ConvertError::TypeMismatch { index: -1, expected: "number", found: ValueKind::String }
    );
    assert!(decode::<f64>(Value::from("1.5")).is_err());
}

#[test]
fn test_boolean_mismatch() {
    let err = decode::<bool>(Value::from(1)).unwrap_err();
    assert_eq!(
        err,
        ConvertError::TypeMismatch { index: -1, expected: "boolean", found: ValueKind::Number }
    );
    assert_eq!(round_trip(&true), true);
    assert_eq!(round_trip(&false), false);
}

#[test]
fn test_strings() {
    assert_eq!(round_trip(&String::new()), "");
    assert_eq!(round_trip(&"héllo".to_string()), "héllo");
    assert_eq!(round_trip(&'λ'), 'λ');

    assert_eq!(
        decode::<String>(Value::bytes(&[0xff, 0xfe])).unwrap_err(),
        ConvertError::InvalidUtf8 { index: -1 }
    );
    assert_eq!(
        decode::<CString>(Value::bytes(b"a\0b")).unwrap_err(),
        ConvertError::InteriorNul { index: -1 }
    );
    assert_eq!(
        decode::<char>(Value::from("ab")).unwrap_err(),
        ConvertError::LengthMismatch { index: -1, expected: 1, found: 2 }
    );
}

#[test]
fn test_option_and_missing_values() {
    assert_eq!(decode::<Option<i32>>(Value::Nil).unwrap(), None);
    assert_eq!(decode::<Option<i32>>(Value::from(4)).unwrap(), Some(4));

    let mut state = MemState::new();
    assert_eq!(Option::<String>::from_stack(&mut state, 3).unwrap(), None);

    let (state, count) = encode(&None::<i32>);
    assert_eq!(count, 1);
    assert_eq!(state.value(-1), Value::Nil);
}

#[test]
fn test_unit_pushes_nothing() {
    let (state, count) = encode(&());
    assert_eq!(count, 0);
    assert_eq!(state.top(), 0);
}

// ==================== Composites ====================

#[test]
fn test_pair() {
    let pair = (7i32, "seven".to_string());
    let (state, count) = encode(&pair);
    assert_eq!(count, 1);
    assert_eq!(state.raw_len(-1), 2);
    assert_eq!(round_trip(&pair), pair);
}

#[test]
fn test_tuple_arity_mismatch() {
    let value = Value::sequence([Value::from(1), Value::from(2), Value::from(3)]);
    assert_eq!(
        decode::<(i32, i32)>(value).unwrap_err(),
        ConvertError::LengthMismatch { index: -1, expected: 2, found: 3 }
    );
}

#[test]
fn test_tuple_element_mismatch_leaves_stack_unchanged() {
    let mut state = MemState::new();
    state.push(Value::sequence([Value::from(1), Value::from("x")]));
    let err = <(i32, i32)>::from_stack(&mut state, -1).unwrap_err();
    assert_eq!(
        err,
        ConvertError::TypeMismatch { index: -1, expected: "number", found: ValueKind::String }
    );
    assert_eq!(state.top(), 1);
}

#[test]
fn test_wide_tuple() {
    let wide = (1u8, 2i16, 3u32, 4i64, 5.5f64, true, 'x', "h".to_string(), 9usize, -10isize);
    assert_eq!(round_trip(&wide), wide);
}

#[test]
fn test_fixed_array() {
    assert_eq!(round_trip(&[1u8, 2, 3, 4]), [1, 2, 3, 4]);
    assert!(decode::<[u8; 4]>(Value::sequence([Value::from(1)])).is_err());
}

#[test]
fn test_empty_sequence_reports_no_value() {
    let (state, count) = encode(&Vec::<i32>::new());
    assert_eq!(count, 0);
    assert_eq!(state.top(), 1);
    assert_eq!(state.kind(-1), ValueKind::Table);
    assert_eq!(state.raw_len(-1), 0);
}

#[test]
fn test_sequence_order() {
    let items = vec![10i32, 20, 30];
    let (mut state, count) = encode(&items);
    assert_eq!(count, 1);
    assert_eq!(state.raw_len(-1), 3);
    state.raw_get_index(-1, 1);
    assert_eq!(state.to_integer(-1), Some(10));
    state.pop(1);
    assert_eq!(Vec::<i32>::from_stack(&mut state, -1).unwrap(), items);
}

#[test]
fn test_nested_sequences() {
    let nested = vec![vec![1i32], vec![], vec![2, 3]];
    assert_eq!(round_trip(&nested), nested);
}

#[test]
fn test_unit_element_stored_as_nil() {
    let (state, count) = encode(&((), 5i32));
    assert_eq!(count, 1);
    let table = state.value(-1);
    let table = table.as_table().unwrap().borrow();
    assert_eq!(table.get(1), Value::Nil);
    assert_eq!(table.get(2), Value::from(5));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_nil_elements_keep_composite_length() {
    let (mut state, _) = encode(&(None::<i32>, 5i32));
    assert_eq!(state.raw_len(-1), 2);
    assert_eq!(<(Option<i32>, i32)>::from_stack(&mut state, -1).unwrap(), (None, 5));

    let items = vec![Some(1i32), None, Some(3)];
    assert_eq!(round_trip(&items), items);
    assert_eq!(round_trip(&[None::<String>, Some("x".to_string())]), [None, Some("x".to_string())]);
}

// ==================== Maps ====================

#[test]
fn test_map_is_list_of_pairs() {
    let map = BTreeMap::from([(1i32, "a".to_string()), (2, "b".to_string())]);
    let (state, count) = encode(&map);
    assert_eq!(count, 1);

    let value = state.value(-1);
    let table = value.as_table().unwrap().borrow();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(1).as_table().unwrap().borrow().sequence(), vec![Value::from(1), Value::from("a")]);
    assert_eq!(table.get(2).as_table().unwrap().borrow().sequence(), vec![Value::from(2), Value::from("b")]);
    drop(table);

    assert_eq!(round_trip(&map), map);
}

#[test]
fn test_empty_map_reports_no_value() {
    let (state, count) = encode(&HashMap::<String, i32>::new());
    assert_eq!(count, 0);
    assert_eq!(state.kind(-1), ValueKind::Table);
}

#[test]
fn test_hash_map_round_trip() {
    let map: HashMap<String, Vec<i32>> =
        HashMap::from([("a".to_string(), vec![1, 2]), ("b".to_string(), vec![])]);
    assert_eq!(round_trip(&map), map);
}

#[test]
fn test_index_map_keeps_order() {
    let mut map = IndexMap::new();
    map.insert(3i32, true);
    map.insert(1, false);
    map.insert(2, true);
    let decoded = round_trip(&map);
    assert_eq!(decoded.keys().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
}

#[test]
fn test_duplicate_key_keeps_first_entry() {
    let pairs = || {
        Value::sequence([
            Value::sequence([Value::from(1), Value::from(10)]),
            Value::sequence([Value::from(2), Value::from(15)]),
            Value::sequence([Value::from(1), Value::from(20)]),
        ])
    };
    assert_eq!(decode::<BTreeMap<i32, i32>>(pairs()).unwrap(), BTreeMap::from([(1, 10), (2, 15)]));
    assert_eq!(decode::<HashMap<i32, i32>>(pairs()).unwrap(), HashMap::from([(1, 10), (2, 15)]));

    let ordered = decode::<IndexMap<i32, i32>>(pairs()).unwrap();
    assert_eq!(ordered.into_iter().collect::<Vec<_>>(), vec![(1, 10), (2, 15)]);
}

#[test]
fn test_map_entry_must_be_pair() {
    let value = Value::sequence([Value::sequence([Value::from(1)])]);
    assert_eq!(
        decode::<BTreeMap<i32, i32>>(value).unwrap_err(),
        ConvertError::LengthMismatch { index: -1, expected: 2, found: 1 }
    );
}

// ==================== Byte views ====================

#[test]
fn test_byte_view_count_ignores_partial_element() {
    let mut state = MemState::new();
    state.push(Value::bytes(&[0u8; 10]));
    let view = ByteView::<u32>::from_stack(&mut state, -1).unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view.byte_len(), 8);

    let mut out = MemState::new();
    assert_eq!(view.to_stack(&mut out), 1);
    assert_eq!(out.to_bytes(-1).map(<[u8]>::len), Some(8));
}

#[test]
fn test_byte_view_from_slice() {
    let items = [1u16, 2, 0xffff];
    let (mut state, count) = encode(&ByteView::from_slice(&items));
    assert_eq!(count, 1);
    assert_eq!(state.to_bytes(-1).map(<[u8]>::len), Some(6));

    let view = ByteView::<u16>::from_stack(&mut state, -1).unwrap();
    assert_eq!(view.to_vec(), items.to_vec());
    assert_eq!(view.get(3), None);
}

#[test]
fn test_byte_view_requires_string() {
    let mut state = MemState::new();
    state.push(Value::from(1));
    let err = ByteView::<u8>::from_stack(&mut state, -1).unwrap_err();
    assert_eq!(
        err,
        ConvertError::TypeMismatch { index: -1, expected: "string", found: ValueKind::Number }
    );
}

#[test]
fn test_byte_view_of_arrays() {
    let mut state = MemState::new();
    state.push(Value::bytes(b"abcdefghij"));
    let view = ByteView::<[u8; 4]>::from_stack(&mut state, -1).unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view.to_vec(), vec![*b"abcd", *b"efgh"]);
}

// ==================== Properties ====================

proptest! {
    #[test]
    fn prop_i64_round_trip(v in any::<i64>()) {
        prop_assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn prop_f64_round_trip(v in -1.0e300f64..1.0e300) {
        prop_assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn prop_string_round_trip(s in ".*") {
        prop_assert_eq!(round_trip(&s), s);
    }

    #[test]
    fn prop_sequence_round_trip(items in prop::collection::vec(any::<i32>(), 0..32)) {
        let (state, count) = encode(&items);
        prop_assert_eq!(count, if items.is_empty() { 0 } else { 1 });
        prop_assert_eq!(state.raw_len(-1), items.len());
        prop_assert_eq!(round_trip(&items), items);
    }

    #[test]
    fn prop_map_round_trip(map in prop::collection::btree_map(any::<i16>(), any::<bool>(), 0..16)) {
        prop_assert_eq!(round_trip(&map), map);
    }
}

// ==================== Results ====================

#[test]
fn test_result_pushes_only_on_success() {
    let mut state = MemState::new();
    let ok: Result<i32, String> = Ok(4);
    assert_eq!(ok.push_results(&mut state), Ok(1));
    assert_eq!(state.top(), 1);

    let err: Result<i32, String> = Err("bad input".to_string());
    assert_eq!(err.push_results(&mut state), Err("bad input".to_string()));
    assert_eq!(state.top(), 1);

    assert_eq!(().push_results(&mut state), Ok(0));
}
