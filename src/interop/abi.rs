//! ABI (Application Binary Interface) handling
//!
//! Every foreign entry point uses the platform C calling convention. What
//! varies per function is how its result comes back.

use core::ffi::c_int;
use serde::{Deserialize, Serialize};

/// Largest parameter count a foreign signature may declare
pub const MAX_PARAMS: usize = 3;

/// Status code a status-out routine returns on success
pub const STATUS_OK: c_int = 0;

/// Calling convention the C ABI maps to on this host, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallingConvention {
    /// C calling convention (platform default)
    C,
    /// System V AMD64 ABI (Unix x86-64)
    SysV,
    /// Microsoft x64 calling convention (Windows)
    Win64,
    /// ARM AAPCS (ARM 32-bit)
    Aapcs,
    /// ARM64 calling convention
    Aarch64,
}

impl CallingConvention {
    /// Get platform default
    #[inline]
    pub const fn host() -> Self {
        #[cfg(all(target_arch = "x86_64", target_os = "windows"))]
        return Self::Win64;

        #[cfg(all(target_arch = "x86_64", not(target_os = "windows")))]
        return Self::SysV;

        #[cfg(target_arch = "aarch64")]
        return Self::Aarch64;

        #[cfg(target_arch = "arm")]
        return Self::Aapcs;

        #[cfg(not(any(
            target_arch = "x86_64",
            target_arch = "aarch64",
            target_arch = "arm"
        )))]
        return Self::C;
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::SysV => "System V AMD64",
            Self::Win64 => "Microsoft x64",
            Self::Aapcs => "ARM AAPCS",
            Self::Aarch64 => "AArch64 AAPCS64",
        }
    }
}

/// How a foreign routine hands its result back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultConvention {
    /// `R f(args...)`: the return value is the result
    #[default]
    Direct,
    /// `int f(args..., R *out)`: the return value is a status code,
    /// `STATUS_OK` on success, and the result is written through `out`
    #[serde(alias = "status_out")]
    Status,
}

impl ResultConvention {
    /// Whether a returned status code signals success
    #[inline]
    pub const fn is_success(status: c_int) -> bool {
        status == STATUS_OK
    }
}
