//! Integration tests for the tether bridge
//!
//! Exercises the full surface end-to-end:
//! - global namespace set/get through the engine stack
//! - function marshaling, registry stability, and stack balance
//! - composite translation of nested arrays
//! - re-entrant host callbacks
//! - error-message stability

use tether::{
    BridgeError, ElementType, EngineConfig, HostValue, Instance, InstanceRef, Result, ScriptFn,
    ScriptVal, ScriptValue, ValueKind,
};

/// Install a native function as a global and drain it back as a callable
/// function value bound to the instance.
fn install_function(
    inst: &InstanceRef,
    name: &str,
    f: impl Fn(&InstanceRef, &[ScriptVal]) -> Result<ScriptVal> + 'static,
) -> ScriptValue {
    inst.borrow_mut()
        .set_global(name, ScriptVal::Func(ScriptFn::new(f)));
    Instance::globals(inst)
        .get(&ScriptValue::string(name))
        .expect("function global should drain into a function value")
}

fn int_array(values: &[i64]) -> ScriptValue {
    ScriptValue::array(values.iter().map(|v| ScriptValue::integral(*v)).collect())
}

// ============================================
// Global Namespace
// ============================================

#[test]
fn test_global_round_trip_integral() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);

    globals
        .set(&ScriptValue::string("x"), &ScriptValue::integral(42))
        .unwrap();
    let value = globals.get(&ScriptValue::string("x")).unwrap();

    assert_eq!(value.kind(), ValueKind::Integral);
    assert_eq!(value.translate_i64().unwrap(), 42);
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_global_round_trip_array_value() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);

    globals
        .set(&ScriptValue::string("data"), &int_array(&[1, 2, 3]))
        .unwrap();
    let value = globals.get(&ScriptValue::string("data")).unwrap();

    assert_eq!(value.kind(), ValueKind::Array);
    assert!(value.is_bound());
    let array = value
        .translate_array(&ElementType::array_of(ElementType::I64))
        .unwrap();
    assert_eq!(
        array.values(),
        &[HostValue::I64(1), HostValue::I64(2), HostValue::I64(3)]
    );
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_global_set_requires_string_key() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);
    let err = globals
        .set(&ScriptValue::integral(0), &ScriptValue::integral(1))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidKeyType { .. }));
}

#[test]
fn test_global_get_rejects_non_string_keys() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);
    for key in [
        ScriptValue::integral(1),
        ScriptValue::floating(1.5),
        ScriptValue::array(vec![]),
    ] {
        let err = globals.get(&key).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedGlobalKey { .. }));
    }
}

// ============================================
// Scalar Translation
// ============================================

#[test]
fn test_scalar_agreement_through_engine() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);
    globals
        .set(&ScriptValue::string("pi"), &ScriptValue::floating(3.75))
        .unwrap();

    let value = globals.get(&ScriptValue::string("pi")).unwrap();
    assert!(value.can_translate_f64());
    assert_eq!(value.translate_f64().unwrap(), 3.75);
    assert!(value.can_translate_i32());
    assert_eq!(value.translate_i32().unwrap(), 3);
    assert!(!value.can_translate_bool());
    assert!(value.translate_bool().is_err());
}

#[test]
fn test_copy_is_independent_of_original() {
    let original = int_array(&[5, 6]);
    let copy = original.copy();
    let target = ElementType::array_of(ElementType::I64);
    assert_eq!(
        original.translate_array(&target).unwrap(),
        copy.translate_array(&target).unwrap()
    );
}

// ============================================
// Function Calls
// ============================================

#[test]
fn test_call_function_through_registry() {
    let inst = Instance::new();
    let double = install_function(&inst, "double", |_, args| match args {
        [ScriptVal::Int(i)] => Ok(ScriptVal::Int(i * 2)),
        _ => Err(BridgeError::internal("expected one int argument")),
    });

    let result = double.call_with(&[ScriptValue::integral(21)]).unwrap();
    assert_eq!(result.translate_i64().unwrap(), 42);
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_two_sequential_calls_hit_the_same_function() {
    let inst = Instance::new();
    let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&log);
    let f = install_function(&inst, "record", move |_, args| {
        sink.borrow_mut().push(args.len());
        Ok(ScriptVal::Nil)
    });

    f.call_with(&[ScriptValue::integral(1), ScriptValue::integral(2)])
        .unwrap();
    assert_eq!(inst.borrow().depth(), 0);
    f.call_with(&[ScriptValue::string("only")]).unwrap();
    assert_eq!(inst.borrow().depth(), 0);

    assert_eq!(*log.borrow(), vec![2, 1]);
}

#[test]
fn test_failed_call_keeps_stack_depth() {
    let inst = Instance::new();
    let f = install_function(&inst, "fail", |_, _| {
        Err(BridgeError::internal("deliberate failure"))
    });

    assert!(f.call().is_err());
    assert_eq!(inst.borrow().depth(), 0);
    assert!(f.call_with(&[ScriptValue::null()]).is_err());
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_stub_function_kinds_never_marshal() {
    let inst = Instance::new();
    let lambda = ScriptValue::host_lambda(std::rc::Rc::new(()));
    let reflect = ScriptValue::host_reflect(std::rc::Rc::new(()));

    assert!(lambda.is_function());
    assert!(reflect.is_function());
    assert!(matches!(
        lambda.call().unwrap_err(),
        BridgeError::UnimplementedCallKind { .. }
    ));
    assert!(matches!(
        reflect.call().unwrap_err(),
        BridgeError::UnimplementedCallKind { .. }
    ));
    // no marshaling attempt, the stack was never touched
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_function_returned_from_function() {
    let inst = Instance::new();
    let make_adder = install_function(&inst, "make_adder", |_, _| {
        Ok(ScriptVal::Func(ScriptFn::new(|_, args| match args {
            [ScriptVal::Int(a), ScriptVal::Int(b)] => Ok(ScriptVal::Int(a + b)),
            _ => Err(BridgeError::internal("expected two ints")),
        })))
    });

    let adder = make_adder.call().unwrap();
    assert_eq!(adder.kind(), ValueKind::Function);
    let sum = adder
        .call_with(&[ScriptValue::integral(19), ScriptValue::integral(23)])
        .unwrap();
    assert_eq!(sum.translate_i64().unwrap(), 42);
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_reentrant_callback_calls_second_function() {
    let inst = Instance::new();
    install_function(&inst, "inner", |_, _| Ok(ScriptVal::Int(5)));
    let outer = install_function(&inst, "outer", |inst, _| {
        let inner = Instance::globals(inst).get(&ScriptValue::string("inner"))?;
        let five = inner.call()?;
        Ok(ScriptVal::Int(five.translate_i64()? + 1))
    });

    let result = outer.call().unwrap();
    assert_eq!(result.translate_i64().unwrap(), 6);
    assert_eq!(inst.borrow().depth(), 0);
}

#[test]
fn test_tiny_stack_overflows_cleanly() {
    let inst = Instance::with_config(EngineConfig {
        max_stack_depth: 2,
        ..EngineConfig::default()
    });
    let f = install_function(&inst, "f", |_, _| Ok(ScriptVal::Nil));
    let err = f
        .call_with(&[
            ScriptValue::integral(1),
            ScriptValue::integral(2),
            ScriptValue::integral(3),
        ])
        .unwrap_err();
    assert!(err.is_internal());
    assert_eq!(inst.borrow().depth(), 0);
}

// ============================================
// Composite Translation
// ============================================

#[test]
fn test_two_level_nested_array_through_engine() {
    let inst = Instance::new();
    let globals = Instance::globals(&inst);
    let matrix = ScriptValue::array(vec![int_array(&[1, 2]), int_array(&[3, 4])]);
    globals.set(&ScriptValue::string("m"), &matrix).unwrap();

    let value = globals.get(&ScriptValue::string("m")).unwrap();
    let target = ElementType::array_of(ElementType::array_of(ElementType::I64));
    let array = value.translate_array(&target).unwrap();

    assert_eq!(array.len(), 2);
    let HostValue::Array(row) = array.get(0).unwrap() else {
        panic!("expected nested array");
    };
    assert_eq!(row.values(), &[HostValue::I64(1), HostValue::I64(2)]);
    let HostValue::Array(row) = array.get(1).unwrap() else {
        panic!("expected nested array");
    };
    assert_eq!(row.values(), &[HostValue::I64(3), HostValue::I64(4)]);
}

#[test]
fn test_large_array_translation() {
    let values: Vec<i64> = (0..10_000).collect();
    let array = int_array(&values)
        .translate_array(&ElementType::array_of(ElementType::I64))
        .unwrap();
    assert_eq!(array.len(), 10_000);
    assert_eq!(array.get(9_999).unwrap(), &HostValue::I64(9_999));
}

#[test]
fn test_array_indexing_bounds() {
    let array = int_array(&[1, 2]);
    assert_eq!(
        array.get(&ScriptValue::integral(0)).unwrap().translate_i64().unwrap(),
        1
    );
    assert!(matches!(
        array.get(&ScriptValue::integral(2)).unwrap_err(),
        BridgeError::IndexOutOfRange { index: 2, len: 2 }
    ));
    assert!(matches!(
        array.get(&ScriptValue::integral(-1)).unwrap_err(),
        BridgeError::IndexOutOfRange { index: -1, len: 2 }
    ));
}

// ============================================
// Error Messages
// ============================================

#[test]
fn test_error_message_stability() {
    insta::assert_snapshot!(
        BridgeError::type_mismatch(ValueKind::String, "i64"),
        @"type mismatch: value (tag 4) cannot be used as i64"
    );
    insta::assert_snapshot!(
        BridgeError::unsupported_global_key(ValueKind::Floating),
        @"globals cannot be indexed with non-string keys (tag 3)"
    );
    insta::assert_snapshot!(
        BridgeError::index_out_of_range(5, 2),
        @"index 5 out of range for array of length 2"
    );
    insta::assert_snapshot!(
        BridgeError::registry_miss(9),
        @"internal error: no registry entry for function handle 9"
    );
    insta::assert_snapshot!(
        BridgeError::unimplemented_call("lambda function"),
        @"cannot call stub (lambda function)"
    );
}

#[test]
fn test_internal_errors_are_distinguishable() {
    let inst = Instance::new();
    let f = install_function(&inst, "f", |_, _| Ok(ScriptVal::Nil));
    let key = inst.borrow().config().function_registry_key.clone();
    inst.borrow_mut().set_global(key, ScriptVal::Nil);

    let err = f.call().unwrap_err();
    assert!(err.is_internal());

    let user_err = ScriptValue::integral(1).translate_bool().unwrap_err();
    assert!(!user_err.is_internal());
}
