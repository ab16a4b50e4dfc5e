use numbridge::{native, Bridge, BridgeConfig, BridgeError, InterchangeType, InterchangeValue};

fn bridge() -> Bridge {
    native::bridge().expect("native declarations bind")
}

fn exact_factorial(n: u32) -> i64 {
    (1..=i64::from(n)).product()
}

#[test]
fn test_factorial_matches_exact_values() {
    let bridge = bridge();
    for n in 0..=20 {
        let result = bridge.invoke("factorial", &[InterchangeValue::I32(n)]).unwrap();
        assert_eq!(
            result,
            InterchangeValue::I64(exact_factorial(n as u32)),
            "factorial({})",
            n
        );
    }
}

#[test]
fn test_factorial_of_zero_is_one() {
    let bridge = bridge();
    assert_eq!(
        bridge.invoke("factorial", &[InterchangeValue::I32(0)]),
        Ok(InterchangeValue::I64(1))
    );
}

#[test]
fn test_factorial_boundary_past_i64() {
    let bridge = bridge();
    // 20! is the largest factorial an i64 holds
    assert_eq!(
        bridge.call::<i64>("factorial", (20,)),
        Ok(2_432_902_008_176_640_000)
    );
    // The C routine wraps modulo 2^64 past that; the bridge passes it through
    assert_eq!(
        bridge.call::<i64>("factorial", (21,)),
        Ok(-4_249_290_049_419_214_848)
    );
}

#[test]
fn test_factorial_at_i32_extremes() {
    let bridge = bridge();
    assert_eq!(
        bridge.call::<i64>("factorial", (65,)),
        Ok(-9_223_372_036_854_775_808)
    );
    // 2^64 divides every factorial from 66! on
    assert_eq!(bridge.call::<i64>("factorial", (66,)), Ok(0));
    assert_eq!(
        bridge.invoke("factorial", &[InterchangeValue::I32(i32::MAX)]),
        Ok(InterchangeValue::I64(0))
    );
    assert_eq!(
        bridge.invoke("factorial", &[InterchangeValue::I32(i32::MIN)]),
        Ok(InterchangeValue::I64(1))
    );
}

#[test]
fn test_factorial_negative_input_is_passed_through() {
    let bridge = bridge();
    // Domain checking is the foreign routine's business; it returns 1 for n < 2
    assert_eq!(bridge.call::<i64>("factorial", (-3,)), Ok(1));
}

#[test]
fn test_factorial_result_narrowing_to_i32() {
    let bridge = bridge();
    assert_eq!(bridge.call::<i32>("factorial", (12,)), Ok(479_001_600));
    assert!(matches!(
        bridge.call::<i32>("factorial", (13,)),
        Err(BridgeError::RangeOverflow { target: "i32", .. })
    ));
}

#[test]
fn test_cube_root_of_perfect_cubes() {
    let bridge = bridge();
    let cases = [(8.0, 2.0), (27.0, 3.0), (64.0, 4.0), (125.0, 5.0), (1000.0, 10.0)];
    for (x, expected) in cases {
        let root: f64 = bridge.call("cubeRoot", (x,)).unwrap();
        assert!(
            ((root - expected) / expected).abs() < 1e-12,
            "cubeRoot({}) = {}",
            x,
            root
        );
        assert!(((root * root * root - x) / x).abs() < 1e-9);
    }
}

#[test]
fn test_cube_root_of_zero_is_exact() {
    let bridge = bridge();
    let root = bridge.invoke("cubeRoot", &[InterchangeValue::F64(0.0)]).unwrap();
    assert!(root.bit_eq(&InterchangeValue::F64(0.0)));
}

#[test]
fn test_cube_root_negative_branch_is_unmodified() {
    let bridge = bridge();
    let root: f64 = bridge.call("cubeRoot", (-8.0,)).unwrap();
    assert!((root + 2.0).abs() < 1e-12);
}

#[test]
fn test_unknown_function() {
    let bridge = bridge();
    assert_eq!(
        bridge.invoke("unknownFn", &[]),
        Err(BridgeError::UnknownFunction {
            name: "unknownFn".into()
        })
    );
    assert!(matches!(
        bridge.call::<i64>("unknownFn", ()),
        Err(BridgeError::UnknownFunction { .. })
    ));
}

#[test]
fn test_argument_out_of_i32_range() {
    let bridge = bridge();
    assert_eq!(
        bridge.call::<i64>("factorial", (1i64 << 31,)),
        Err(BridgeError::RangeOverflow {
            value: "2147483648".into(),
            target: "i32"
        })
    );
    assert_eq!(
        InterchangeValue::parse("2147483648", InterchangeType::I32),
        Err(BridgeError::RangeOverflow {
            value: "2147483648".into(),
            target: "i32"
        })
    );
}

#[test]
fn test_invoke_requires_exact_tags() {
    let bridge = bridge();
    assert!(matches!(
        bridge.invoke("factorial", &[InterchangeValue::I64(5)]),
        Err(BridgeError::ArgumentType {
            index: 0,
            expected: InterchangeType::I32,
            ..
        })
    ));
    assert!(matches!(
        bridge.invoke("cubeRoot", &[InterchangeValue::I32(8)]),
        Err(BridgeError::ArgumentType { .. })
    ));
    assert!(matches!(
        bridge.invoke("cubeRoot", &[]),
        Err(BridgeError::ArityMismatch {
            expected: 1,
            found: 0,
            ..
        })
    ));
}

#[test]
fn test_fibonacci() {
    let bridge = bridge();
    let expected = [0i64, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610];
    for (n, want) in expected.iter().enumerate() {
        assert_eq!(bridge.call::<i64>("fibonacci", (n,)), Ok(*want));
    }
    assert_eq!(
        bridge.call::<i64>("fibonacci", (92,)),
        Ok(7_540_113_804_746_346_429)
    );
}

#[test]
fn test_fibonacci_at_i32_extremes() {
    let bridge = bridge();
    assert_eq!(
        bridge.call::<i64>("fibonacci", (93,)),
        Ok(-6_246_583_658_587_674_878)
    );
    assert_eq!(
        bridge.invoke("fibonacci", &[InterchangeValue::I32(i32::MAX)]),
        Ok(InterchangeValue::I64(6_798_988_702_295_324_957))
    );
    assert_eq!(bridge.call::<i64>("fibonacci", (i32::MIN,)), Ok(0));
}

#[test]
fn test_divide_checked_status_convention() {
    let bridge = bridge();
    assert_eq!(bridge.call::<i32>("divide_checked", (10, 3)), Ok(3));
    assert_eq!(bridge.call::<i32>("divide_checked", (100, -7)), Ok(-14));
    assert_eq!(
        bridge.call::<i32>("divide_checked", (10, 0)),
        Err(BridgeError::ForeignCallFailure {
            function: "divide_checked".into(),
            code: -1
        })
    );
    assert!(matches!(
        bridge.call::<i32>("divide_checked", (i32::MIN, -1)),
        Err(BridgeError::ForeignCallFailure { code: -1, .. })
    ));
}

#[test]
fn test_native_declarations_listing() {
    let bridge = bridge();
    let listed: Vec<String> = bridge.signatures().map(|s| s.to_string()).collect();
    assert_eq!(
        listed,
        vec![
            "factorial(i32) -> i64",
            "cubeRoot(f64) -> f64",
            "fibonacci(i32) -> i64",
            "divide_checked(i32, i32) -> i32 [status]",
        ]
    );
}

#[test]
fn test_independent_bridges_coexist() {
    let a = bridge();
    let b = bridge();
    assert_eq!(
        a.call::<i64>("factorial", (5,)),
        b.call::<i64>("factorial", (5,))
    );
}

fn bridge_from_config(toml: &str) -> Result<Bridge, BridgeError> {
    let config = BridgeConfig::parse(toml).expect("config parses");
    let table = config.declarations().expect("declarations are valid");
    Bridge::new(table, &native::symbols())
}

#[test]
fn test_config_cannot_retype_linked_routine() {
    let err = bridge_from_config(
        r#"
        [[function]]
        name = "factorial"
        params = ["f64"]
        returns = "f64"
        "#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        BridgeError::PrototypeMismatch {
            name: "factorial".into(),
            declared: "factorial(f64) -> f64".into(),
            linked: "int64_t factorial(int32_t)".into(),
        }
    );
}

#[test]
fn test_config_cannot_change_result_convention() {
    let err = bridge_from_config(
        r#"
        [[function]]
        name = "divide_checked"
        params = ["i32", "i32"]
        returns = "i32"
        "#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        BridgeError::PrototypeMismatch {
            name: "divide_checked".into(),
            declared: "divide_checked(i32, i32) -> i32".into(),
            linked: "int divide_checked(int32_t, int32_t, int32_t *out)".into(),
        }
    );
}

#[test]
fn test_config_subset_matching_prototypes() {
    let bridge = bridge_from_config(
        r#"
        [[function]]
        name = "divide_checked"
        params = ["int32", "int32"]
        returns = "int32"
        convention = "status"
        "#,
    )
    .unwrap();

    assert_eq!(bridge.call::<i32>("divide_checked", (10, 3)), Ok(3));
    assert!(matches!(
        bridge.invoke("factorial", &[InterchangeValue::I32(5)]),
        Err(BridgeError::UnknownFunction { .. })
    ));
}
