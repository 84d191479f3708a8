//! Property-based invariant tests for coercion and sequence ordering.
//!
//! Verifies:
//! 1. Coercion is idempotent: coercing `value.to_raw()` again with the same
//!    kind yields `value`, invalid sentinels included
//! 2. Any interleaving of appends, prepends, mode switches and removals
//!    keeps the backing list and the container's children in the same order
//! 3. Removed entities are detached and, once dropped, release their nodes

use std::rc::Rc;

use proptest::prelude::*;
use serde_json::{json, Value};
use spark_bind::engine::tree;
use spark_bind::{
    allocate_index, coerce, get_allocated_count, reset_registry, BindConfig, BindContext,
    Blueprint, CoercionPolicy, EntityType, FieldKind, InsertMode, ObservableSequence, RawRecord,
    Schema, TemplateRegistry,
};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_raw() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        "-?[0-9]{1,15}".prop_map(Value::from),
        " ?-?[0-9]{1,6}\\.[0-9]{1,3} ?".prop_map(Value::from),
        Just(json!("2024-05-01T12:30:00.123456Z")),
        Just(json!("inf")),
        Just(json!([1, "x"])),
        Just(json!({"k": 1})),
    ]
}

fn arb_kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::Text),
        Just(FieldKind::Integer),
        Just(FieldKind::Float),
        Just(FieldKind::Timestamp),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Prepend(Vec<u8>),
    AppendIn(InsertMode, Vec<u8>),
    SetMode(InsertMode),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    Pop,
    Truncate(usize),
    RetainEven,
}

fn arb_mode() -> impl Strategy<Value = InsertMode> {
    prop_oneof![Just(InsertMode::Back), Just(InsertMode::Front)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    let batch = prop::collection::vec(any::<u8>(), 0..4);
    prop_oneof![
        batch.clone().prop_map(Op::Append),
        batch.clone().prop_map(Op::Prepend),
        (arb_mode(), batch).prop_map(|(mode, items)| Op::AppendIn(mode, items)),
        arb_mode().prop_map(Op::SetMode),
        (0usize..8).prop_map(Op::RemoveAt),
        (0usize..8, 0usize..4).prop_map(|(start, count)| Op::RemoveRange(start, count)),
        Just(Op::Pop),
        (0usize..8).prop_map(Op::Truncate),
        Just(Op::RetainEven),
    ]
}

// ── Fixtures ──────────────────────────────────────────────────────────

fn sequence() -> ObservableSequence {
    reset_registry();
    let item = EntityType::new("Item", Schema::new().field("n", FieldKind::Integer)).into_rc();
    let factory = move |_: &str, _: &RawRecord| Some(item.clone());
    let registry = TemplateRegistry::new().with("Item", Blueprint::new("li").display("n"));
    let ctx = BindContext::new(Rc::new(registry), Rc::new(factory), BindConfig::default());
    ObservableSequence::new("items", allocate_index(), ctx)
}

fn records(items: &[u8]) -> Vec<RawRecord> {
    items
        .iter()
        .filter_map(|n| json!({ "n": n }).as_object().cloned())
        .collect()
}

fn insert(model: &mut Vec<i64>, mode: InsertMode, items: &[u8]) {
    for n in items {
        match mode {
            InsertMode::Back => model.push(i64::from(*n)),
            InsertMode::Front => model.insert(0, i64::from(*n)),
        }
    }
}

fn values(seq: &ObservableSequence) -> Vec<i64> {
    seq.iter()
        .filter_map(|e| e.get("n").and_then(|v| v.as_integer()))
        .collect()
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn coercion_is_idempotent(raw in arb_raw(), kind in arb_kind()) {
        let first = coerce(Some(&raw), kind, CoercionPolicy::Lenient).unwrap();
        if let Some(value) = first {
            let again = coerce(Some(&value.to_raw()), kind, CoercionPolicy::Lenient).unwrap();
            prop_assert_eq!(again, Some(value));
        }
    }

    #[test]
    fn strict_and_lenient_agree_on_valid_input(raw in arb_raw(), kind in arb_kind()) {
        let lenient = coerce(Some(&raw), kind, CoercionPolicy::Lenient).unwrap();
        let strict = coerce(Some(&raw), kind, CoercionPolicy::Strict);
        match lenient {
            Some(value) if value.is_invalid() => prop_assert!(strict.is_err()),
            other => prop_assert_eq!(strict.ok(), Some(other)),
        }
    }

    #[test]
    fn sequence_mirrors_container(ops in prop::collection::vec(arb_op(), 0..24)) {
        let mut seq = sequence();
        let mut model: Vec<i64> = Vec::new();
        let mut mode = InsertMode::Back;

        for op in ops {
            match op {
                Op::Append(items) => {
                    seq.append_all(&records(&items));
                    insert(&mut model, mode, &items);
                }
                Op::Prepend(items) => {
                    seq.prepend_all(&records(&items));
                    mode = InsertMode::Front;
                    insert(&mut model, mode, &items);
                }
                Op::AppendIn(temporary, items) => {
                    seq.append_all_in(temporary, &records(&items));
                    insert(&mut model, temporary, &items);
                }
                Op::SetMode(next) => {
                    seq.set_insert_mode(next);
                    mode = next;
                }
                Op::RemoveAt(index) => {
                    let removed = seq.remove_at(index);
                    if index < model.len() {
                        model.remove(index);
                        let node = removed.as_ref().map(|e| e.node());
                        prop_assert_eq!(node.and_then(tree::parent), None);
                    } else {
                        prop_assert!(removed.is_none());
                    }
                }
                Op::RemoveRange(start, count) => {
                    let removed = seq.remove_range(start, count);
                    let start = start.min(model.len());
                    let end = (start + count).min(model.len());
                    prop_assert_eq!(removed.len(), end - start);
                    model.drain(start..end);
                }
                Op::Pop => {
                    prop_assert_eq!(seq.pop().is_some(), model.pop().is_some());
                }
                Op::Truncate(len) => {
                    seq.truncate(len);
                    model.truncate(len);
                }
                Op::RetainEven => {
                    seq.retain(|e| e.get("n").and_then(|v| v.as_integer()).is_some_and(|n| n % 2 == 0));
                    model.retain(|n| n % 2 == 0);
                }
            }

            prop_assert!(seq.is_mirrored());
            prop_assert_eq!(values(&seq), model.clone());
            prop_assert_eq!(seq.insert_mode(), mode);
        }

        // Container plus one node per live entity.
        prop_assert_eq!(get_allocated_count(), 1 + seq.len());
    }
}
