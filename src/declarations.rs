//! Foreign function declaration table
//!
//! The single source of truth for how each foreign routine is called. A table
//! is filled once during startup and then handed to a [`Bridge`], which only
//! ever reads it.
//!
//! [`Bridge`]: crate::Bridge

use crate::error::{BridgeError, Result};
use crate::interop::{InterchangeType, Prototype, ResultConvention, MAX_PARAMS};
use crate::logging;
use std::collections::HashMap;
use std::fmt;

/// Calling signature of one foreign routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    params: Vec<InterchangeType>,
    ret: InterchangeType,
    convention: ResultConvention,
}

impl Signature {
    /// Signature of a routine that returns its result directly
    pub fn new(name: impl Into<String>, params: Vec<InterchangeType>, ret: InterchangeType) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            convention: ResultConvention::Direct,
        }
    }

    /// Signature of a routine that returns a status code and writes its
    /// result through a trailing out-pointer
    pub fn with_status(
        name: impl Into<String>,
        params: Vec<InterchangeType>,
        ret: InterchangeType,
    ) -> Self {
        Self {
            convention: ResultConvention::Status,
            ..Self::new(name, params, ret)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[InterchangeType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn return_type(&self) -> InterchangeType {
        self.ret
    }

    pub fn convention(&self) -> ResultConvention {
        self.convention
    }

    /// Whether this declaration calls a routine exactly the way `prototype`
    /// says it must be called
    pub fn matches(&self, prototype: &Prototype) -> bool {
        self.params == prototype.params()
            && self.ret == prototype.return_type()
            && self.convention == prototype.convention()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BridgeError::UnsupportedSignature {
                name: self.name.clone(),
                reason: "function name is empty".to_string(),
            });
        }
        if self.params.len() > MAX_PARAMS {
            return Err(BridgeError::UnsupportedSignature {
                name: self.name.clone(),
                reason: format!(
                    "{} parameters exceed the supported maximum of {}",
                    self.params.len(),
                    MAX_PARAMS
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ") -> {}", self.ret)?;
        if self.convention == ResultConvention::Status {
            write!(f, " [status]")?;
        }
        Ok(())
    }
}

/// Declared signatures for one binding session, in declaration order
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    signatures: Vec<Signature>,
    index: HashMap<String, usize>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signature.
    ///
    /// Fails with `DuplicateDeclaration` if the name is already declared in
    /// this table, and with `UnsupportedSignature` for an empty name or more
    /// than [`MAX_PARAMS`] parameters.
    pub fn declare(&mut self, signature: Signature) -> Result<&Signature> {
        signature.validate()?;

        if self.index.contains_key(signature.name()) {
            return Err(BridgeError::DuplicateDeclaration {
                name: signature.name().to_string(),
            });
        }

        logging::log_declaration(&signature);

        let slot = self.signatures.len();
        self.index.insert(signature.name().to_string(), slot);
        self.signatures.push(signature);
        Ok(&self.signatures[slot])
    }

    /// Shorthand for declaring a direct-return routine
    pub fn declare_fn(
        &mut self,
        name: impl Into<String>,
        params: &[InterchangeType],
        ret: InterchangeType,
    ) -> Result<&Signature> {
        self.declare(Signature::new(name, params.to_vec(), ret))
    }

    pub fn lookup(&self, name: &str) -> Result<&Signature> {
        self.index
            .get(name)
            .map(|&i| &self.signatures[i])
            .ok_or_else(|| BridgeError::unknown_function(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }
}
