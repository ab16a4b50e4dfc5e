//! The linked numeric library (`native/numeric.c`)
//!
//! `build.rs` compiles the C sources into a static archive that is linked
//! into this crate, so the symbols below are resolved at link time.

use crate::bridge::Bridge;
use crate::declarations::{DeclarationTable, Signature};
use crate::error::Result;
use crate::interop::{Prototype, SymbolTable};
use core::ffi::c_int;

/// Name the native symbol table is registered under
pub const LIBRARY_NAME: &str = "numbridge_numeric";

extern "C" {
    fn factorial(n: i32) -> i64;
    #[link_name = "cubeRoot"]
    fn cube_root(x: f64) -> f64;
    fn fibonacci(n: i32) -> i64;
    fn divide_checked(a: i32, b: i32, out: *mut i32) -> c_int;
}

/// Entry points exported by the native library, with their `numeric.h`
/// prototypes
pub fn symbols() -> SymbolTable {
    use crate::interop::InterchangeType::*;

    let mut table = SymbolTable::new(LIBRARY_NAME);

    // Each address is a C function linked into this binary and each
    // prototype is copied from native/numeric.h.
    unsafe {
        table.insert("factorial", factorial as *const (), Prototype::direct(&[I32], I64));
        table.insert("cubeRoot", cube_root as *const (), Prototype::direct(&[F64], F64));
        table.insert("fibonacci", fibonacci as *const (), Prototype::direct(&[I32], I64));
        table.insert(
            "divide_checked",
            divide_checked as *const (),
            Prototype::status(&[I32, I32], I32),
        );
    }

    table
}

/// Declared calling signatures of the native library
pub fn declarations() -> Result<DeclarationTable> {
    use crate::interop::InterchangeType::*;

    let mut table = DeclarationTable::new();
    table.declare_fn("factorial", &[I32], I64)?;
    table.declare_fn("cubeRoot", &[F64], F64)?;
    table.declare_fn("fibonacci", &[I32], I64)?;
    table.declare(Signature::with_status("divide_checked", vec![I32, I32], I32))?;
    Ok(table)
}

/// Bridge over the native library with its own declarations
pub fn bridge() -> Result<Bridge> {
    Bridge::new(declarations()?, &symbols())
}
