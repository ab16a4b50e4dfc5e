//! Symbol resolution for statically linked foreign routines
//!
//! Entry points are linked at build time, so resolution is a name lookup in
//! a table filled once at startup rather than a `dlsym` walk. Each entry
//! carries the routine's real C prototype, which is the only shape it may
//! ever be called with.

use super::abi::ResultConvention;
use super::types::InterchangeType;
use std::collections::HashMap;

/// Real calling shape of a linked routine, as its C header states it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prototype {
    params: Vec<InterchangeType>,
    ret: InterchangeType,
    convention: ResultConvention,
}

impl Prototype {
    /// `R f(params...)`
    pub fn direct(params: &[InterchangeType], ret: InterchangeType) -> Self {
        Self {
            params: params.to_vec(),
            ret,
            convention: ResultConvention::Direct,
        }
    }

    /// `int f(params..., R *out)`
    pub fn status(params: &[InterchangeType], ret: InterchangeType) -> Self {
        Self {
            params: params.to_vec(),
            ret,
            convention: ResultConvention::Status,
        }
    }

    pub fn params(&self) -> &[InterchangeType] {
        &self.params
    }

    pub fn return_type(&self) -> InterchangeType {
        self.ret
    }

    pub fn convention(&self) -> ResultConvention {
        self.convention
    }

    /// Render as a C declaration, e.g. `int divide_checked(int32_t, int32_t, int32_t *out)`
    pub fn c_declaration(&self, name: &str) -> String {
        let mut params: Vec<String> = self.params.iter().map(|p| p.c_name().to_string()).collect();

        let head = match self.convention {
            ResultConvention::Direct => format!("{} {}", self.ret.c_name(), name),
            ResultConvention::Status => {
                params.push(format!("{} *out", self.ret.c_name()));
                format!("int {}", name)
            }
        };

        if params.is_empty() {
            format!("{}(void)", head)
        } else {
            format!("{}({})", head, params.join(", "))
        }
    }
}

/// Address of a linked foreign entry point and its prototype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    addr: *const (),
    prototype: Prototype,
}

impl Symbol {
    #[inline]
    pub fn address(&self) -> *const () {
        self.addr
    }

    #[inline]
    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }
}

// Code addresses are immutable for the life of the process.
unsafe impl Send for Symbol {}
unsafe impl Sync for Symbol {}

/// Name → entry point table for one linked library
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    library: String,
    entries: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            entries: HashMap::new(),
        }
    }

    /// Name of the library these symbols come from
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Register an entry point under its exported name.
    ///
    /// Returns the previous entry if the name was already present.
    ///
    /// # Safety
    /// `addr` must be a C-ABI function that stays valid for the rest of the
    /// process, and its real prototype must be exactly `prototype`.
    pub unsafe fn insert(
        &mut self,
        name: impl Into<String>,
        addr: *const (),
        prototype: Prototype,
    ) -> Option<Symbol> {
        self.entries.insert(name.into(), Symbol { addr, prototype })
    }

    /// Get entry point by symbol name
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exported names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
