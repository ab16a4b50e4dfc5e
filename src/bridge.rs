//! Marshaling bridge
//!
//! Binds a frozen [`DeclarationTable`] to linked entry points and performs one
//! synchronous foreign call per invocation, with exact type conversion on the
//! way in and on the way out.

use crate::declarations::{DeclarationTable, Signature};
use crate::error::{BridgeError, Result};
use crate::interop::{
    from_foreign, marshal_args, CallingConvention, ForeignFn, FromInterchange, InterchangeValue,
    IntoInterchange, SymbolTable,
};
use crate::logging;
use std::collections::HashMap;

/// Host-native argument list for [`Bridge::call`]
///
/// Implemented for tuples of up to three [`IntoInterchange`] values.
pub trait HostArgs {
    /// Convert every argument to the parameter type `signature` declares for
    /// its position, narrowing with range checks where needed.
    fn into_values(self, signature: &Signature) -> Result<Vec<InterchangeValue>>;
}

fn check_arity(signature: &Signature, found: usize) -> Result<()> {
    if signature.arity() != found {
        return Err(BridgeError::ArityMismatch {
            function: signature.name().to_string(),
            expected: signature.arity(),
            found,
        });
    }
    Ok(())
}

fn rejected(function: &str, error: BridgeError) -> BridgeError {
    if let BridgeError::RangeOverflow { value, target } = &error {
        logging::log_narrowing_rejected(function, value, target);
    }
    logging::log_ffi_error(function, &error);
    error
}

impl HostArgs for () {
    fn into_values(self, signature: &Signature) -> Result<Vec<InterchangeValue>> {
        check_arity(signature, 0)?;
        Ok(Vec::new())
    }
}

macro_rules! host_args_tuple {
    ($len:expr; $($name:ident: $idx:tt),+) => {
        impl<$($name: IntoInterchange),+> HostArgs for ($($name,)+) {
            fn into_values(self, signature: &Signature) -> Result<Vec<InterchangeValue>> {
                check_arity(signature, $len)?;
                let params = signature.params();
                Ok(vec![$(
                    self.$idx
                        .into_interchange(params[$idx])
                        .map_err(|e| e.at_argument(signature.name(), $idx, params[$idx]))?
                ),+])
            }
        }
    };
}

host_args_tuple!(1; A: 0);
host_args_tuple!(2; A: 0, B: 1);
host_args_tuple!(3; A: 0, B: 1, C: 2);

/// Immutable registry of callable foreign functions
///
/// Holds no mutable state: any number of threads may share one bridge and
/// call into it concurrently, provided the foreign routines are re-entrant.
#[derive(Debug)]
pub struct Bridge {
    library: String,
    table: DeclarationTable,
    bound: HashMap<String, ForeignFn>,
}

impl Bridge {
    /// Bind every declaration in `table` to its entry point in `symbols`.
    ///
    /// Fails with `UnresolvedSymbol` if a declared function is not exported
    /// by the symbol table, and with `PrototypeMismatch` if the declaration
    /// differs from the linked routine's prototype in any parameter, the
    /// return type or the result convention.
    pub fn new(table: DeclarationTable, symbols: &SymbolTable) -> Result<Self> {
        let mut bound = HashMap::with_capacity(table.len());

        for signature in table.iter() {
            let name = signature.name();
            let symbol = symbols
                .get(name)
                .ok_or_else(|| BridgeError::UnresolvedSymbol {
                    name: name.to_string(),
                })?;

            if !signature.matches(symbol.prototype()) {
                return Err(BridgeError::PrototypeMismatch {
                    name: name.to_string(),
                    declared: signature.to_string(),
                    linked: symbol.prototype().c_declaration(name),
                });
            }

            bound.insert(name.to_string(), ForeignFn::from_symbol(name, symbol)?);
        }

        logging::log_bridge_ready(symbols.library(), bound.len(), CallingConvention::host());

        Ok(Self {
            library: symbols.library().to_string(),
            table,
            bound,
        })
    }

    /// Library the entry points were resolved from
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn lookup(&self, name: &str) -> Result<&Signature> {
        self.table.lookup(name)
    }

    /// Declared signatures, in declaration order
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.table.iter()
    }

    /// Invoke a foreign function with interchange values.
    ///
    /// Each argument's tag must equal the declared parameter type; nothing is
    /// converted implicitly on this path.
    pub fn invoke(&self, name: &str, args: &[InterchangeValue]) -> Result<InterchangeValue> {
        self.invoke_unlogged(name, args).map_err(|e| {
            logging::log_ffi_error(name, &e);
            e
        })
    }

    /// Invoke a foreign function with host-native values.
    ///
    /// Arguments are converted to the declared parameter types and the result
    /// to `R`, both with checked narrowing:
    ///
    /// ```no_run
    /// # fn main() -> Result<(), numbridge::BridgeError> {
    /// let bridge = numbridge::native::bridge()?;
    /// let f: i64 = bridge.call("factorial", (5i64,))?;
    /// assert_eq!(f, 120);
    /// # Ok(())
    /// # }
    /// ```
    pub fn call<R: FromInterchange>(&self, name: &str, args: impl HostArgs) -> Result<R> {
        let signature = self.lookup(name).map_err(|e| {
            logging::log_ffi_error(name, &e);
            e
        })?;

        let values = args.into_values(signature).map_err(|e| rejected(name, e))?;

        let result = self.invoke(name, &values)?;

        R::from_interchange(result).map_err(|e| rejected(name, e.at_result(name, result.ty())))
    }

    fn invoke_unlogged(&self, name: &str, args: &[InterchangeValue]) -> Result<InterchangeValue> {
        let function = self
            .bound
            .get(name)
            .ok_or_else(|| BridgeError::unknown_function(name))?;

        logging::log_ffi_call(name, args);

        let frame = marshal_args(name, args, function.params())?;
        let slot = function.call(name, &frame)?;
        let result = from_foreign(slot, function.return_type());

        logging::log_ffi_return(name, &result);
        Ok(result)
    }
}
