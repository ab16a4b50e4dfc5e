//! Dispatch tests against in-process C-ABI functions

use super::*;
use crate::error::BridgeError;
use core::ffi::c_int;

// Test helpers
extern "C" fn add_i32(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

extern "C" fn mul_f64(a: f64, b: f64) -> f64 {
    a * b
}

extern "C" fn no_args() -> i32 {
    42
}

extern "C" fn mixed(a: i32, x: f64, b: i64) -> f64 {
    f64::from(a) * x + b as f64
}

extern "C" fn widen(a: i32) -> i64 {
    i64::from(a) << 32
}

extern "C" fn checked_sqrt(x: f64, out: *mut f64) -> c_int {
    if out.is_null() || x < 0.0 {
        return -1;
    }
    unsafe { *out = x.sqrt() };
    0
}

extern "C" fn always_fails(out: *mut i64) -> c_int {
    unsafe { *out = 99 };
    7
}

fn bind(
    addr: *const (),
    params: &[InterchangeType],
    ret: InterchangeType,
    convention: ResultConvention,
) -> ForeignFn {
    unsafe { ForeignFn::new("test", addr, params.to_vec(), ret, convention).unwrap() }
}

fn invoke(f: &ForeignFn, args: &[InterchangeValue]) -> Result<InterchangeValue, BridgeError> {
    let frame = marshal_args("test", args, f.params())?;
    let slot = f.call("test", &frame)?;
    Ok(from_foreign(slot, f.return_type()))
}

#[test]
fn test_interchange_type_sizes() {
    assert_eq!(InterchangeType::I32.size(), 4);
    assert_eq!(InterchangeType::I64.size(), 8);
    assert_eq!(InterchangeType::F64.size(), 8);
    assert_eq!(InterchangeType::F64.align(), 8);
    assert_eq!(core::mem::size_of::<ForeignSlot>(), 8);
}

#[test]
fn test_interchange_type_checks() {
    assert!(InterchangeType::I32.is_integral());
    assert!(InterchangeType::I64.is_integral());
    assert!(InterchangeType::F64.is_float());
    assert!(!InterchangeType::F64.is_integral());
}

#[test]
fn test_type_names_parse() {
    assert_eq!("int32".parse::<InterchangeType>(), Ok(InterchangeType::I32));
    assert_eq!("Double".parse::<InterchangeType>(), Ok(InterchangeType::F64));
    assert_eq!("i64".parse::<InterchangeType>(), Ok(InterchangeType::I64));
    assert!("string".parse::<InterchangeType>().is_err());
}

#[test]
fn test_literal_parsing_narrows_explicitly() {
    assert_eq!(
        InterchangeValue::parse("-12", InterchangeType::I32),
        Ok(InterchangeValue::I32(-12))
    );
    assert!(matches!(
        InterchangeValue::parse("2147483648", InterchangeType::I32),
        Err(BridgeError::RangeOverflow { target: "i32", .. })
    ));
    assert!(matches!(
        InterchangeValue::parse("99999999999999999999", InterchangeType::I64),
        Err(BridgeError::RangeOverflow { target: "i64", .. })
    ));
    assert!(matches!(
        InterchangeValue::parse("1.5", InterchangeType::I32),
        Err(BridgeError::InvalidLiteral { .. })
    ));
    assert_eq!(
        InterchangeValue::parse("27", InterchangeType::F64),
        Ok(InterchangeValue::F64(27.0))
    );
}

#[test]
fn test_slot_round_trip_extremes() {
    let values = [
        InterchangeValue::I32(i32::MIN),
        InterchangeValue::I32(i32::MAX),
        InterchangeValue::I64(i64::MIN),
        InterchangeValue::I64(i64::MAX),
        InterchangeValue::F64(-0.0),
        InterchangeValue::F64(f64::MIN_POSITIVE / 2.0),
        InterchangeValue::F64(f64::NEG_INFINITY),
        InterchangeValue::F64(f64::from_bits(0x7ff8_0000_dead_beef)),
    ];
    for v in values {
        let back = from_foreign(to_foreign(v), v.ty());
        assert!(back.bit_eq(&v), "{:?} came back as {:?}", v, back);
    }
}

#[test]
fn test_call_no_args() {
    let f = bind(
        no_args as *const (),
        &[],
        InterchangeType::I32,
        ResultConvention::Direct,
    );
    assert_eq!(invoke(&f, &[]), Ok(InterchangeValue::I32(42)));
}

#[test]
fn test_call_integer_and_float_args() {
    let add = bind(
        add_i32 as *const (),
        &[InterchangeType::I32, InterchangeType::I32],
        InterchangeType::I32,
        ResultConvention::Direct,
    );
    assert_eq!(
        invoke(&add, &[InterchangeValue::I32(-5), InterchangeValue::I32(12)]),
        Ok(InterchangeValue::I32(7))
    );

    let mul = bind(
        mul_f64 as *const (),
        &[InterchangeType::F64, InterchangeType::F64],
        InterchangeType::F64,
        ResultConvention::Direct,
    );
    assert_eq!(
        invoke(&mul, &[InterchangeValue::F64(1.5), InterchangeValue::F64(-4.0)]),
        Ok(InterchangeValue::F64(-6.0))
    );
}

#[test]
fn test_call_mixed_register_classes() {
    let f = bind(
        mixed as *const (),
        &[InterchangeType::I32, InterchangeType::F64, InterchangeType::I64],
        InterchangeType::F64,
        ResultConvention::Direct,
    );
    let result = invoke(
        &f,
        &[
            InterchangeValue::I32(3),
            InterchangeValue::F64(0.5),
            InterchangeValue::I64(10),
        ],
    );
    assert_eq!(result, Ok(InterchangeValue::F64(11.5)));
}

#[test]
fn test_i64_return_is_not_truncated() {
    let f = bind(
        widen as *const (),
        &[InterchangeType::I32],
        InterchangeType::I64,
        ResultConvention::Direct,
    );
    assert_eq!(
        invoke(&f, &[InterchangeValue::I32(3)]),
        Ok(InterchangeValue::I64(3i64 << 32))
    );
}

#[test]
fn test_status_out_success_and_failure() {
    let f = bind(
        checked_sqrt as *const (),
        &[InterchangeType::F64],
        InterchangeType::F64,
        ResultConvention::Status,
    );
    assert_eq!(
        invoke(&f, &[InterchangeValue::F64(16.0)]),
        Ok(InterchangeValue::F64(4.0))
    );
    assert_eq!(
        invoke(&f, &[InterchangeValue::F64(-1.0)]),
        Err(BridgeError::ForeignCallFailure {
            function: "test".into(),
            code: -1
        })
    );
}

#[test]
fn test_failed_status_discards_out_value() {
    let f = bind(
        always_fails as *const (),
        &[],
        InterchangeType::I64,
        ResultConvention::Status,
    );
    assert!(matches!(
        invoke(&f, &[]),
        Err(BridgeError::ForeignCallFailure { code: 7, .. })
    ));
}

#[test]
fn test_too_many_params_rejected() {
    let params = vec![InterchangeType::I32; MAX_PARAMS + 1];
    let result = unsafe {
        ForeignFn::new(
            "wide",
            no_args as *const (),
            params,
            InterchangeType::I32,
            ResultConvention::Direct,
        )
    };
    match result {
        Err(BridgeError::UnsupportedSignature { name, .. }) => assert_eq!(name, "wide"),
        other => panic!("expected UnsupportedSignature, got {:?}", other),
    }
}

#[test]
fn test_symbol_table() {
    use crate::interop::InterchangeType::*;

    let mut table = SymbolTable::new("test");
    assert!(table.is_empty());
    let add_proto = Prototype::direct(&[I32, I32], I32);
    unsafe {
        assert!(table.insert("add_i32", add_i32 as *const (), add_proto.clone()).is_none());
        assert!(table
            .insert("mul_f64", mul_f64 as *const (), Prototype::direct(&[F64, F64], F64))
            .is_none());
    }
    assert_eq!(table.len(), 2);
    assert_eq!(table.names(), vec!["add_i32", "mul_f64"]);

    let add = table.get("add_i32").unwrap();
    assert_eq!(add.address(), add_i32 as *const ());
    assert_eq!(add.prototype(), &add_proto);
    assert!(table.get("missing").is_none());
}

#[test]
fn test_call_through_symbol_prototype() {
    let mut table = SymbolTable::new("test");
    unsafe {
        table.insert(
            "checked_sqrt",
            checked_sqrt as *const (),
            Prototype::status(&[InterchangeType::F64], InterchangeType::F64),
        );
    }

    let f = ForeignFn::from_symbol("checked_sqrt", table.get("checked_sqrt").unwrap()).unwrap();
    assert_eq!(f.convention(), ResultConvention::Status);
    assert_eq!(
        invoke(&f, &[InterchangeValue::F64(9.0)]),
        Ok(InterchangeValue::F64(3.0))
    );
}

#[test]
fn test_prototype_c_declaration() {
    use crate::interop::InterchangeType::*;

    assert_eq!(
        Prototype::direct(&[I32], I64).c_declaration("factorial"),
        "int64_t factorial(int32_t)"
    );
    assert_eq!(
        Prototype::status(&[I32, I32], I32).c_declaration("divide_checked"),
        "int divide_checked(int32_t, int32_t, int32_t *out)"
    );
    assert_eq!(Prototype::direct(&[], F64).c_declaration("pi"), "double pi(void)");
}
