//! Type marshaling - host ↔ interchange ↔ C conversions
//!
//! Design: every narrowing is an explicit, checked conversion. Widening is
//! exact and always allowed; integer ↔ float crossings are never implicit.

use super::abi::MAX_PARAMS;
use super::types::{InterchangeType, InterchangeValue};
use crate::error::{BridgeError, Result};
use num_traits::ToPrimitive;

/// C-side image of an interchange value (untagged union)
///
/// Slots are always built from a zeroed 8-byte image, so reading the wider
/// fields of a slot written through `i32` never touches uninitialised bytes.
#[repr(C)]
pub union ForeignSlot {
    pub i32: i32,
    pub i64: i64,
    pub f64: f64,
}

impl ForeignSlot {
    #[inline]
    pub const fn zeroed() -> Self {
        Self { i64: 0 }
    }

    #[inline]
    pub fn from_i32(v: i32) -> Self {
        let mut slot = Self::zeroed();
        slot.i32 = v;
        slot
    }

    #[inline]
    pub const fn from_i64(v: i64) -> Self {
        Self { i64: v }
    }

    #[inline]
    pub const fn from_f64(v: f64) -> Self {
        Self { f64: v }
    }

    /// Raw 64-bit image of the slot
    #[inline]
    pub fn bits(&self) -> u64 {
        // Every slot is fully initialised (see type docs)
        unsafe { self.i64 as u64 }
    }
}

impl Default for ForeignSlot {
    #[inline]
    fn default() -> Self {
        Self::zeroed()
    }
}

// Unions can't derive these
impl Copy for ForeignSlot {}
impl Clone for ForeignSlot {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl core::fmt::Debug for ForeignSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ForeignSlot({:#018x})", self.bits())
    }
}

/// Marshal an interchange value into its C representation
#[inline]
pub fn to_foreign(value: InterchangeValue) -> ForeignSlot {
    match value {
        InterchangeValue::I32(v) => ForeignSlot::from_i32(v),
        InterchangeValue::I64(v) => ForeignSlot::from_i64(v),
        InterchangeValue::F64(v) => ForeignSlot::from_f64(v),
    }
}

/// Read a C representation back as the given interchange type
#[inline]
pub fn from_foreign(slot: ForeignSlot, ty: InterchangeType) -> InterchangeValue {
    // Every bit pattern is a valid i32/i64/f64 and slots are fully initialised
    unsafe {
        match ty {
            InterchangeType::I32 => InterchangeValue::I32(slot.i32),
            InterchangeType::I64 => InterchangeValue::I64(slot.i64),
            InterchangeType::F64 => InterchangeValue::F64(slot.f64),
        }
    }
}

/// Argument frame for one foreign call
pub type ArgFrame = [ForeignSlot; MAX_PARAMS];

/// Check interchange arguments against declared parameter types and marshal
/// them into a call frame.
///
/// Tags must match exactly: an `I32` where `I64` is declared is rejected, the
/// caller has to widen explicitly (or go through the typed host API).
pub fn marshal_args(
    function: &str,
    args: &[InterchangeValue],
    params: &[InterchangeType],
) -> Result<ArgFrame> {
    if args.len() != params.len() {
        return Err(BridgeError::ArityMismatch {
            function: function.to_string(),
            expected: params.len(),
            found: args.len(),
        });
    }

    let mut frame = [ForeignSlot::zeroed(); MAX_PARAMS];
    for (index, (arg, &expected)) in args.iter().zip(params).enumerate() {
        if arg.ty() != expected {
            return Err(BridgeError::ArgumentType {
                function: function.to_string(),
                index,
                expected,
                found: arg.ty().name().to_string(),
            });
        }
        frame[index] = to_foreign(*arg);
    }

    Ok(frame)
}

/// Conversion failure without call-site context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// Value does not fit the target exactly
    Overflow { value: String, target: &'static str },
    /// Integer where a float is expected or vice versa
    KindMismatch {
        found: &'static str,
        target: &'static str,
    },
}

impl MarshalError {
    /// Attach the argument position this conversion was for
    pub fn at_argument(
        self,
        function: &str,
        index: usize,
        expected: InterchangeType,
    ) -> BridgeError {
        match self {
            Self::Overflow { value, target } => BridgeError::RangeOverflow { value, target },
            Self::KindMismatch { found, .. } => BridgeError::ArgumentType {
                function: function.to_string(),
                index,
                expected,
                found: found.to_string(),
            },
        }
    }

    /// Attach the function whose result this conversion was for
    pub fn at_result(self, function: &str, found: InterchangeType) -> BridgeError {
        match self {
            Self::Overflow { value, target } => BridgeError::RangeOverflow { value, target },
            Self::KindMismatch { target, .. } => BridgeError::ResultType {
                function: function.to_string(),
                expected: target,
                found,
            },
        }
    }
}

/// Host-native value that can be marshaled to an interchange type
pub trait IntoInterchange: Copy {
    /// Name of the host type, for diagnostics
    fn host_name(&self) -> &'static str;

    fn into_interchange(self, target: InterchangeType) -> Result<InterchangeValue, MarshalError>;
}

/// Host-native type that an interchange value can be marshaled back into
pub trait FromInterchange: Sized {
    const HOST_NAME: &'static str;

    fn from_interchange(value: InterchangeValue) -> Result<Self, MarshalError>;
}

fn overflow(value: impl ToString, target: &'static str) -> MarshalError {
    MarshalError::Overflow {
        value: value.to_string(),
        target,
    }
}

macro_rules! integer_marshaling {
    ($($t:ty),* $(,)?) => {$(
        impl IntoInterchange for $t {
            #[inline]
            fn host_name(&self) -> &'static str {
                stringify!($t)
            }

            fn into_interchange(self, target: InterchangeType) -> Result<InterchangeValue, MarshalError> {
                match target {
                    InterchangeType::I32 => self
                        .to_i32()
                        .map(InterchangeValue::I32)
                        .ok_or_else(|| overflow(self, target.name())),
                    InterchangeType::I64 => self
                        .to_i64()
                        .map(InterchangeValue::I64)
                        .ok_or_else(|| overflow(self, target.name())),
                    InterchangeType::F64 => Err(MarshalError::KindMismatch {
                        found: stringify!($t),
                        target: target.name(),
                    }),
                }
            }
        }

        impl FromInterchange for $t {
            const HOST_NAME: &'static str = stringify!($t);

            fn from_interchange(value: InterchangeValue) -> Result<Self, MarshalError> {
                match value {
                    InterchangeValue::I32(v) => <$t as num_traits::NumCast>::from(v)
                        .ok_or_else(|| overflow(v, Self::HOST_NAME)),
                    InterchangeValue::I64(v) => <$t as num_traits::NumCast>::from(v)
                        .ok_or_else(|| overflow(v, Self::HOST_NAME)),
                    InterchangeValue::F64(_) => Err(MarshalError::KindMismatch {
                        found: InterchangeType::F64.name(),
                        target: Self::HOST_NAME,
                    }),
                }
            }
        }
    )*};
}

integer_marshaling!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoInterchange for f64 {
    #[inline]
    fn host_name(&self) -> &'static str {
        "f64"
    }

    fn into_interchange(self, target: InterchangeType) -> Result<InterchangeValue, MarshalError> {
        match target {
            InterchangeType::F64 => Ok(InterchangeValue::F64(self)),
            _ => Err(MarshalError::KindMismatch {
                found: "f64",
                target: target.name(),
            }),
        }
    }
}

impl IntoInterchange for f32 {
    #[inline]
    fn host_name(&self) -> &'static str {
        "f32"
    }

    fn into_interchange(self, target: InterchangeType) -> Result<InterchangeValue, MarshalError> {
        match target {
            // f32 -> f64 is exact, NaN payloads included
            InterchangeType::F64 => Ok(InterchangeValue::F64(f64::from(self))),
            _ => Err(MarshalError::KindMismatch {
                found: "f32",
                target: target.name(),
            }),
        }
    }
}

impl FromInterchange for f64 {
    const HOST_NAME: &'static str = "f64";

    fn from_interchange(value: InterchangeValue) -> Result<Self, MarshalError> {
        match value {
            InterchangeValue::F64(v) => Ok(v),
            other => Err(MarshalError::KindMismatch {
                found: other.ty().name(),
                target: Self::HOST_NAME,
            }),
        }
    }
}

impl FromInterchange for f32 {
    const HOST_NAME: &'static str = "f32";

    /// Standard IEEE-754 narrowing (round to nearest), except that a finite
    /// double outside the f32 range is an overflow instead of infinity.
    fn from_interchange(value: InterchangeValue) -> Result<Self, MarshalError> {
        match value {
            InterchangeValue::F64(v) => {
                let narrowed = v as f32;
                if v.is_finite() && narrowed.is_infinite() {
                    Err(overflow(v, Self::HOST_NAME))
                } else {
                    Ok(narrowed)
                }
            }
            other => Err(MarshalError::KindMismatch {
                found: other.ty().name(),
                target: Self::HOST_NAME,
            }),
        }
    }
}

impl IntoInterchange for InterchangeValue {
    #[inline]
    fn host_name(&self) -> &'static str {
        self.ty().name()
    }

    /// Already-tagged values pass through only when the tag matches
    fn into_interchange(self, target: InterchangeType) -> Result<InterchangeValue, MarshalError> {
        if self.ty() == target {
            Ok(self)
        } else {
            Err(MarshalError::KindMismatch {
                found: self.ty().name(),
                target: target.name(),
            })
        }
    }
}

impl FromInterchange for InterchangeValue {
    const HOST_NAME: &'static str = "interchange value";

    #[inline]
    fn from_interchange(value: InterchangeValue) -> Result<Self, MarshalError> {
        Ok(value)
    }
}
