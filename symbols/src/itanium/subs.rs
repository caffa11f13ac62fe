//! Types dealing with the substitutions table.

use std::fmt;
use std::ops::Deref;

use super::ast::{self, Demangle, DemangleContext, Object, Parameter, Qualifiers};

/// An enumeration of all of the fragments that can end up in the
/// substitution table.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Substitutable {
    /// A strict prefix (of at least two segments) of the entity's own name.
    Prefix(Vec<Object>),

    /// A fully or partially qualified parameter type.
    Parameter(Parameter),
}

impl Demangle for Substitutable {
    fn demangle(&self, ctx: &mut DemangleContext) {
        match *self {
            Substitutable::Prefix(ref objects) => ast::demangle_objects(objects, ctx, false),
            Substitutable::Parameter(ref param) => param.demangle(ctx),
        }
    }
}

impl fmt::Display for Substitutable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = DemangleContext::new();
        self.demangle(&mut ctx);
        fmt::Display::fmt(&ctx.stream, f)
    }
}

/// The table of substitutable components that we have parsed thus far, and for
/// which there are potential back-references.
///
/// The table is append-only, an entry's index never changes once inserted.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct SubstitutionTable(Vec<Substitutable>);

impl SubstitutionTable {
    /// Construct a new `SubstitutionTable`.
    pub fn new() -> SubstitutionTable {
        SubstitutionTable(Vec::new())
    }

    /// Insert a freshly-parsed substitutable component into the table and
    /// return the index at which it now lives.
    pub(crate) fn insert(&mut self, entity: Substitutable) -> usize {
        let idx = self.0.len();
        log::trace!("SubstitutionTable::insert @ {idx}: {entity}");
        self.0.push(entity);
        idx
    }

    /// Record the prefixes of the entity's name.
    ///
    /// A name of `N` segments contributes the prefixes of length `2..N`, so
    /// neither the full name nor a single segment is ever recorded here.
    pub(crate) fn insert_prefixes(&mut self, objects: &[Object]) {
        for len in 2..objects.len() {
            self.insert(Substitutable::Prefix(objects[..len].to_vec()));
        }
    }

    /// Record every backreference candidate of a finalized parameter.
    pub(crate) fn insert_parameter(&mut self, param: &Parameter) {
        for section in decompose(param) {
            self.insert(Substitutable::Parameter(section));
        }
    }
}

/// Split a parameter into progressively more qualified variants.
///
/// Section order:
///
/// - base (every template argument stripped)
/// - templates, only when some segment has template arguments
/// - complex
/// - const
/// - pointer/reference, one section per marker
///
/// Each section is built on top of the previous one. A basic type (a type of a
/// single segment) never records its base section.
pub(crate) fn decompose(param: &Parameter) -> Vec<Parameter> {
    let base = Parameter::new(param.ty.iter().map(Object::stripped).collect());
    let mut sections = vec![base];

    if param.ty.iter().any(|object| !object.template_args.is_empty()) {
        sections.push(Parameter::new(param.ty.clone()));
    }

    for qualifier in [Qualifiers::COMPLEX, Qualifiers::CONST] {
        if param.qualifiers.contains(qualifier) {
            let mut section = sections[sections.len() - 1].clone();
            section.qualifiers |= qualifier;
            sections.push(section);
        }
    }

    let unreferenced = sections[sections.len() - 1].clone();
    for len in 1..=param.indirection.len() {
        let mut section = unreferenced.clone();
        section.indirection = param.indirection[..len].to_vec();
        sections.push(section);
    }

    if param.ty.len() == 1 {
        sections.remove(0);
    }

    sections
}

impl Deref for SubstitutionTable {
    type Target = [Substitutable];

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}
