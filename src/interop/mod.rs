//! Interoperability - call statically linked C routines
//!
//! Design: scalar-only C ABI calls with checked type marshaling
//!
//! Architecture:
//! - `types.rs` - interchange type system (InterchangeType, InterchangeValue)
//! - `marshal.rs` - host ↔ interchange ↔ C conversions (ForeignSlot)
//! - `call.rs` - signature-directed dispatch through typed function pointers
//! - `abi.rs` - calling and result conventions
//! - `symbols.rs` - name → entry point + prototype resolution

mod abi;
mod call;
mod marshal;
mod symbols;
mod types;

pub use abi::{CallingConvention, ResultConvention, MAX_PARAMS, STATUS_OK};
pub use call::ForeignFn;
pub use marshal::{
    from_foreign, marshal_args, to_foreign, ArgFrame, ForeignSlot, FromInterchange,
    IntoInterchange, MarshalError,
};
pub use symbols::{Prototype, Symbol, SymbolTable};
pub use types::{InterchangeType, InterchangeValue};

#[cfg(test)]
mod tests;
