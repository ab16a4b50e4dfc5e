//! numbridge - typed marshaling bridge to a natively compiled numeric library
//!
//! A [`DeclarationTable`] states how each foreign routine is called, a
//! [`Bridge`] binds those declarations to linked C entry points and performs
//! each call synchronously with checked conversions on both sides.

pub mod bridge;
pub mod config;
pub mod declarations;
pub mod error;
pub mod interop;
pub mod logging;
pub mod native;

pub use bridge::{Bridge, HostArgs};
pub use config::{BridgeConfig, ConfigError};
pub use declarations::{DeclarationTable, Signature};
pub use error::BridgeError;
pub use interop::{
    FromInterchange, InterchangeType, InterchangeValue, IntoInterchange, ResultConvention,
    SymbolTable,
};
