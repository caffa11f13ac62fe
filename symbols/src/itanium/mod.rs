//! Decoder for a reduced subset of the Itanium C++ ABI mangling scheme.
//!
//! A mangled name describes a scoped declaration: its namespaces and classes,
//! template instantiations, the function's parameter list, qualifiers and
//! special members such as constructors, destructors, virtual tables, type
//! info objects and non-virtual call thunks.
//!
//! For example, given the definition:
//!
//! ```c++
//! namespace space {
//!   int foo(int x, int y) { return x+y; }
//! }
//! ```
//!
//! the linker symbol `_ZN5space3fooEii` decodes into a [`Symbol`] that
//! formats as `space::foo(int p0, int p1)`.
//!
//! The encoding compresses repeated fragments with back references (`S_`,
//! `S0_`, ...) into a table that is filled as a side effect of decoding. The
//! table and the cursor are created per call and never shared, so any number
//! of symbols can be decoded in parallel.
//!
//! Only a subset of the grammar is understood: there are no exception
//! specifications, closures or vendor extensions.

mod ast;
mod cursor;
mod error;
mod subs;
mod tests;
pub mod types;

use std::fmt;

use crate::TokenStream;
use ast::{Demangle, DemangleContext, Parse, ParseContext};
use cursor::Cursor;

pub use ast::{
    CtorDtor, Indirection, MangledName, Name, Object, Parameter, Qualifiers, SpecialName,
};
pub use error::{Error, Reason, Result};
pub use subs::{Substitutable, SubstitutionTable};

/// Demangle a symbol, `None` if it isn't a valid mangled name.
pub fn parse(s: &str) -> Option<TokenStream> {
    match Symbol::new(s) {
        Ok(sym) => Some(sym.demangle()),
        Err(err) => {
            log::trace!("[itanium::parse] '{s}': {err}");
            None
        }
    }
}

/// A mangled symbol that has been parsed into an AST.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol<'a> {
    raw: &'a str,
    substitutions: SubstitutionTable,
    parsed: MangledName,
}

impl Symbol<'_> {
    /// Parse the mangled symbol.
    ///
    /// Input left over after a complete name is ignored.
    pub fn new(raw: &str) -> Result<Symbol> {
        let mut substitutions = SubstitutionTable::new();

        let parsed = {
            let ctx = ParseContext::new();
            let mut input = Cursor::new(raw);

            let parsed = MangledName::parse(&ctx, &mut substitutions, &mut input)?;

            if !input.is_empty() {
                log::trace!(
                    "[itanium::Symbol::new] ignoring {} trailing bytes of '{raw}'",
                    input.remaining_len()
                );
            }

            parsed
        };

        Ok(Symbol {
            raw,
            substitutions,
            parsed,
        })
    }

    /// The input this symbol was parsed from.
    #[inline]
    pub fn raw(&self) -> &str {
        self.raw
    }

    /// The decoded entity.
    #[inline]
    pub fn entity(&self) -> &MangledName {
        &self.parsed
    }

    /// Every back reference candidate recorded while decoding, in order.
    #[inline]
    pub fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    /// Demangle the symbol into colored tokens.
    pub fn demangle(&self) -> TokenStream {
        let mut ctx = DemangleContext::new();
        self.parsed.demangle(&mut ctx);
        ctx.stream
    }
}

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.parsed, f)
    }
}
