//! Interchange types shared by both sides of the boundary
//!
//! Only three scalar representations ever cross: 32-bit signed integers,
//! 64-bit signed integers and IEEE-754 doubles.

use super::marshal::IntoInterchange;
use crate::error::{BridgeError, Result};
use core::fmt;
use core::num::IntErrorKind;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Interchange type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InterchangeType {
    #[serde(rename = "i32", alias = "int32", alias = "int")]
    I32,
    #[serde(rename = "i64", alias = "int64", alias = "long")]
    I64,
    #[serde(rename = "f64", alias = "float64", alias = "double")]
    F64,
}

impl InterchangeType {
    /// Size in bytes of the C representation
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::I32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }

    /// Alignment of the C representation
    #[inline]
    pub const fn align(self) -> usize {
        self.size()
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64)
    }

    /// Canonical short name (`i32`, `i64`, `f64`)
    pub const fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F64 => "f64",
        }
    }

    /// Matching C type, for diagnostics
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::I32 => "int32_t",
            Self::I64 => "int64_t",
            Self::F64 => "double",
        }
    }
}

impl fmt::Display for InterchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterchangeType {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i32" | "int32" | "int" => Ok(Self::I32),
            "i64" | "int64" | "long" => Ok(Self::I64),
            "f64" | "float64" | "double" => Ok(Self::F64),
            other => Err(format!("unknown interchange type '{}'", other)),
        }
    }
}

/// A scalar value tagged with its interchange type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InterchangeValue {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl InterchangeValue {
    #[inline]
    pub const fn ty(&self) -> InterchangeType {
        match self {
            Self::I32(_) => InterchangeType::I32,
            Self::I64(_) => InterchangeType::I64,
            Self::F64(_) => InterchangeType::F64,
        }
    }

    /// Bit-level equality. Unlike `==`, NaN payloads compare equal to themselves
    /// and `0.0` differs from `-0.0`.
    pub fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }

    /// Parse a host literal for the given interchange type.
    ///
    /// Integers are read as the host's default `i64` and then narrowed with an
    /// explicit range check, so `2147483648` for `i32` is a range error rather
    /// than a parse error.
    pub fn parse(text: &str, ty: InterchangeType) -> Result<Self> {
        let text = text.trim();
        let invalid = || BridgeError::InvalidLiteral {
            text: text.to_string(),
            target: ty,
        };

        match ty {
            InterchangeType::I32 | InterchangeType::I64 => {
                let wide = text.parse::<i64>().map_err(|e| match e.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        BridgeError::range_overflow(text, ty.name())
                    }
                    _ => invalid(),
                })?;
                wide.into_interchange(ty)
                    .map_err(|_| BridgeError::range_overflow(text, ty.name()))
            }
            InterchangeType::F64 => text.parse::<f64>().map(Self::F64).map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for InterchangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i32> for InterchangeValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for InterchangeValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for InterchangeValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}
