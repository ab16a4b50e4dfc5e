//! Foreign function dispatch through the C calling convention
//!
//! An entry point is stored as a bare address. At call time the declared
//! signature selects a concrete `unsafe extern "C" fn(..) -> ..` type, the
//! address is reinterpreted as that type and called directly, so the compiler
//! emits the exact register/stack assignment the platform ABI requires.

use super::abi::{ResultConvention, MAX_PARAMS};
use super::marshal::{ArgFrame, ForeignSlot};
use super::symbols::Symbol;
use super::types::InterchangeType;
use crate::error::{BridgeError, Result};
use core::ffi::c_int;
use core::mem;

/// Rust scalar carried by an interchange type across the C ABI
trait Scalar: Copy + Default {
    /// # Safety
    /// `slot` must have been written through this scalar's interchange type.
    unsafe fn read(slot: ForeignSlot) -> Self;
    fn write(self) -> ForeignSlot;
}

impl Scalar for i32 {
    #[inline]
    unsafe fn read(slot: ForeignSlot) -> Self {
        slot.i32
    }
    #[inline]
    fn write(self) -> ForeignSlot {
        ForeignSlot::from_i32(self)
    }
}

impl Scalar for i64 {
    #[inline]
    unsafe fn read(slot: ForeignSlot) -> Self {
        slot.i64
    }
    #[inline]
    fn write(self) -> ForeignSlot {
        ForeignSlot::from_i64(self)
    }
}

impl Scalar for f64 {
    #[inline]
    unsafe fn read(slot: ForeignSlot) -> Self {
        slot.f64
    }
    #[inline]
    fn write(self) -> ForeignSlot {
        ForeignSlot::from_f64(self)
    }
}

/// Raw outcome of one foreign call, before status interpretation
#[derive(Debug, Clone, Copy)]
enum Completion {
    Value(ForeignSlot),
    Status(c_int, ForeignSlot),
}

// One direct-return and one status-out trampoline per arity.
macro_rules! trampolines {
    ($direct:ident, $status:ident; $($arg:ident: $ty:ident),*) => {
        unsafe fn $direct<$($ty: Scalar,)* R: Scalar>(
            addr: *const (),
            $($arg: ForeignSlot,)*
        ) -> Completion {
            let f: unsafe extern "C" fn($($ty),*) -> R = mem::transmute_copy(&addr);
            Completion::Value(f($($ty::read($arg)),*).write())
        }

        unsafe fn $status<$($ty: Scalar,)* R: Scalar>(
            addr: *const (),
            $($arg: ForeignSlot,)*
        ) -> Completion {
            let f: unsafe extern "C" fn($($ty,)* *mut R) -> c_int = mem::transmute_copy(&addr);
            let mut out = R::default();
            let status = f($($ty::read($arg),)* &mut out);
            Completion::Status(status, out.write())
        }
    };
}

trampolines!(direct0, status0;);
trampolines!(direct1, status1; a: A);
trampolines!(direct2, status2; a: A, b: B);
trampolines!(direct3, status3; a: A, b: B, c: C);

// Binds `$alias` to the Rust scalar for an interchange type within `$body`.
macro_rules! with_scalar {
    ($ty:expr, $alias:ident => $body:expr) => {
        match $ty {
            InterchangeType::I32 => {
                type $alias = i32;
                $body
            }
            InterchangeType::I64 => {
                type $alias = i64;
                $body
            }
            InterchangeType::F64 => {
                type $alias = f64;
                $body
            }
        }
    };
}

/// A resolved foreign entry point together with the shape it is called with
#[derive(Debug, Clone)]
pub struct ForeignFn {
    addr: *const (),
    params: Vec<InterchangeType>,
    ret: InterchangeType,
    convention: ResultConvention,
}

// The entry point is an immutable code address. Re-entrancy of the routine
// behind it is part of the foreign library's declared contract.
unsafe impl Send for ForeignFn {}
unsafe impl Sync for ForeignFn {}

impl ForeignFn {
    /// Describe a foreign entry point.
    ///
    /// `name` is only used to label errors.
    ///
    /// # Safety
    /// `addr` must be the address of a function using the C calling
    /// convention whose real prototype is exactly the one described by
    /// `params`, `ret` and `convention`, and it must stay valid for the
    /// lifetime of this value.
    pub unsafe fn new(
        name: &str,
        addr: *const (),
        params: Vec<InterchangeType>,
        ret: InterchangeType,
        convention: ResultConvention,
    ) -> Result<Self> {
        if params.len() > MAX_PARAMS {
            return Err(BridgeError::UnsupportedSignature {
                name: name.to_string(),
                reason: format!(
                    "{} parameters exceed the supported maximum of {}",
                    params.len(),
                    MAX_PARAMS
                ),
            });
        }

        Ok(Self {
            addr,
            params,
            ret,
            convention,
        })
    }

    /// Callable for a linked symbol, shaped by the symbol's own prototype
    pub fn from_symbol(name: &str, symbol: &Symbol) -> Result<Self> {
        let prototype = symbol.prototype();
        // `SymbolTable::insert` requires the prototype to be the real one
        unsafe {
            Self::new(
                name,
                symbol.address(),
                prototype.params().to_vec(),
                prototype.return_type(),
                prototype.convention(),
            )
        }
    }

    #[inline]
    pub fn address(&self) -> *const () {
        self.addr
    }

    #[inline]
    pub fn params(&self) -> &[InterchangeType] {
        &self.params
    }

    #[inline]
    pub fn return_type(&self) -> InterchangeType {
        self.ret
    }

    #[inline]
    pub fn convention(&self) -> ResultConvention {
        self.convention
    }

    /// Call the foreign routine with an already-marshaled frame.
    ///
    /// Only the first `self.params().len()` slots of `frame` are read. For
    /// status-out routines a non-success status becomes
    /// [`BridgeError::ForeignCallFailure`] named after `function`.
    pub fn call(&self, function: &str, frame: &ArgFrame) -> Result<ForeignSlot> {
        // Construction guarantees the address/prototype contract and the arity
        // bound; the frame slots were written through the declared types.
        let completion = unsafe { self.dispatch(frame) };

        match completion {
            Completion::Value(slot) => Ok(slot),
            Completion::Status(status, slot) if ResultConvention::is_success(status) => Ok(slot),
            Completion::Status(status, _) => Err(BridgeError::ForeignCallFailure {
                function: function.to_string(),
                code: status,
            }),
        }
    }

    unsafe fn dispatch(&self, frame: &ArgFrame) -> Completion {
        let addr = self.addr;
        let p = &self.params;
        let [a, b, c] = *frame;

        match (self.convention, p.len()) {
            (ResultConvention::Direct, 0) => with_scalar!(self.ret, R => direct0::<R>(addr)),
            (ResultConvention::Direct, 1) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => direct1::<A, R>(addr, a))
            }),
            (ResultConvention::Direct, 2) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => with_scalar!(p[1], B => direct2::<A, B, R>(addr, a, b)))
            }),
            (ResultConvention::Direct, _) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => with_scalar!(p[1], B => {
                    with_scalar!(p[2], C => direct3::<A, B, C, R>(addr, a, b, c))
                }))
            }),
            (ResultConvention::Status, 0) => with_scalar!(self.ret, R => status0::<R>(addr)),
            (ResultConvention::Status, 1) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => status1::<A, R>(addr, a))
            }),
            (ResultConvention::Status, 2) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => with_scalar!(p[1], B => status2::<A, B, R>(addr, a, b)))
            }),
            (ResultConvention::Status, _) => with_scalar!(self.ret, R => {
                with_scalar!(p[0], A => with_scalar!(p[1], B => {
                    with_scalar!(p[2], C => status3::<A, B, C, R>(addr, a, b, c))
                }))
            }),
        }
    }
}
