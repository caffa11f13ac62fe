//! Abstract syntax tree types for mangled symbols.

use std::cell::Cell;
use std::fmt;

use bitflags::bitflags;
use once_cell::unsync::OnceCell;
use tokenizing::{Color, ColorScheme};

use super::cursor::Cursor;
use super::error::{Error, Reason, Result};
use super::subs::{Substitutable, SubstitutionTable};
use super::types::{BuiltinType, WellKnownComponent};
use crate::{Colors, TokenStream};

/// Keeps track of recursion levels and early returns with an error if there
/// is too much recursion.
macro_rules! try_begin_parse {
    ($ctx:expr, $input:expr) => {
        let _auto_check_recursion = AutoParseRecursion::new($ctx, $input)?;
    };
}

#[derive(Debug, Default, Clone, Copy)]
struct ParseContextState {
    // The current recursion level. Should always be less than or equal to the
    // maximum.
    recursion_level: u32,
}

/// Common context needed when parsing.
#[derive(Debug)]
pub(crate) struct ParseContext {
    // Maximum amount of recursive parsing calls we will allow. If this is too
    // large, we can blow the stack.
    max_recursion: u32,
    // Mutable state within the `ParseContext`.
    state: Cell<ParseContextState>,
    // First segment of the entity's own name, set once that name is known to
    // have more than one segment.
    enclosing: OnceCell<Object>,
}

impl ParseContext {
    /// Construct a new `ParseContext`.
    pub(crate) fn new() -> ParseContext {
        ParseContext {
            max_recursion: 96,
            state: Cell::new(ParseContextState::default()),
            enclosing: OnceCell::new(),
        }
    }

    #[inline]
    fn enter_recursion(&self, input: &Cursor) -> Result<()> {
        let mut state = self.state.get();
        let new_recursion_level = state.recursion_level + 1;

        if new_recursion_level >= self.max_recursion {
            Err(input.error(Reason::TooMuchRecursion))
        } else {
            state.recursion_level = new_recursion_level;
            self.state.set(state);
            Ok(())
        }
    }

    #[inline]
    fn exit_recursion(&self) {
        let mut state = self.state.get();
        debug_assert!(state.recursion_level >= 1);
        state.recursion_level -= 1;
        self.state.set(state);
    }
}

/// An RAII type to automatically check the recursion level against the
/// maximum. If the maximum has been crossed, return an error. Otherwise,
/// increment the level upon construction, and decrement it upon destruction.
struct AutoParseRecursion<'a>(&'a ParseContext);

impl<'a> AutoParseRecursion<'a> {
    #[inline]
    fn new(ctx: &'a ParseContext, input: &Cursor) -> Result<AutoParseRecursion<'a>> {
        ctx.enter_recursion(input)?;
        Ok(AutoParseRecursion(ctx))
    }
}

impl<'a> Drop for AutoParseRecursion<'a> {
    #[inline]
    fn drop(&mut self) {
        self.0.exit_recursion();
    }
}

/// A trait for anything that can be parsed from a `Cursor`, updating the
/// substitution table as needed.
///
/// On failure the cursor is left wherever decoding gave up, callers never
/// retry with a different production.
pub(crate) trait Parse: Sized {
    fn parse(
        ctx: &ParseContext,
        subs: &mut SubstitutionTable,
        input: &mut Cursor,
    ) -> Result<Self>;
}

/// Common state that is required when demangling a parsed symbol.
#[derive(Debug, Default)]
pub(crate) struct DemangleContext {
    /// What the demangled name is being written to.
    pub stream: TokenStream,
}

impl DemangleContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push(&mut self, text: &'static str, color: &'static Color) {
        self.stream.push(text, color);
    }

    #[inline]
    fn push_owned(&mut self, text: String, color: &'static Color) {
        self.stream.push_string(text, color);
    }

    #[inline]
    fn space(&mut self) {
        self.push(" ", Colors::spacing());
    }
}

/// Any AST node that can be written out as a human-readable declaration.
pub(crate) trait Demangle {
    fn demangle(&self, ctx: &mut DemangleContext);
}

/// How a parameter is named when it's written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// `p0`, `p1`, ... for function arguments.
    Argument(usize),

    /// `T0`, `T1`, ... for template arguments.
    TemplateArg(usize),
}

impl Placeholder {
    fn demangle(self, ctx: &mut DemangleContext) {
        ctx.space();
        match self {
            Placeholder::Argument(idx) => ctx.push_owned(format!("p{idx}"), Colors::item()),
            Placeholder::TemplateArg(idx) => ctx.push_owned(format!("T{idx}"), Colors::item()),
        }
    }
}

/// The spelling of a single name segment.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Name {
    /// A length prefixed identifier, taken from the input.
    Source(String),

    /// A builtin type such as `int`.
    Builtin(BuiltinType),

    /// One of the `std` abbreviations.
    WellKnown(WellKnownComponent),
}

impl Name {
    pub fn as_str(&self) -> &str {
        match self {
            Name::Source(name) => name,
            Name::Builtin(ty) => ty.printable(),
            Name::WellKnown(wkc) => wkc.printable(),
        }
    }
}

impl Demangle for Name {
    fn demangle(&self, ctx: &mut DemangleContext) {
        match *self {
            Name::Source(ref name) => ctx.push_owned(name.clone(), Colors::item()),
            Name::Builtin(ty) => ctx.push(ty.printable(), Colors::known()),
            Name::WellKnown(wkc) => ctx.push(wkc.printable(), Colors::known()),
        }
    }
}

/// One segment of a scope chain, `vector<int>` in `std::vector<int>`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Object {
    pub name: Name,
    pub template_args: Vec<Parameter>,
}

impl Object {
    pub fn new(name: Name) -> Self {
        Self { name, template_args: Vec::new() }
    }

    /// The same segment without its template arguments.
    pub fn stripped(&self) -> Self {
        Self::new(self.name.clone())
    }

    fn demangle_with(&self, ctx: &mut DemangleContext, named_args: bool) {
        self.name.demangle(ctx);

        if self.template_args.is_empty() {
            return;
        }

        ctx.push("<", Colors::brackets());
        for (idx, arg) in self.template_args.iter().enumerate() {
            if idx != 0 {
                ctx.push(", ", Colors::delimiter());
            }

            let placeholder = named_args.then_some(Placeholder::TemplateArg(idx));
            arg.demangle_with(ctx, placeholder);
        }
        ctx.push(">", Colors::brackets());
    }
}

impl Demangle for Object {
    fn demangle(&self, ctx: &mut DemangleContext) {
        self.demangle_with(ctx, false)
    }
}

/// Write out `a::b::c`, naming the last segment's template arguments when
/// `named_args` is set.
pub(crate) fn demangle_objects(objects: &[Object], ctx: &mut DemangleContext, named_args: bool) {
    for (idx, object) in objects.iter().enumerate() {
        if idx != 0 {
            ctx.push("::", Colors::delimiter());
        }

        object.demangle_with(ctx, named_args && idx == objects.len() - 1);
    }
}

bitflags! {
    /// Qualifiers applied to a parameter's type.
    #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
    pub struct Qualifiers: u8 {
        const COMPLEX = 1 << 0;
        const CONST = 1 << 1;
    }
}

/// A pointer or reference marker.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Indirection {
    Pointer,
    Reference,
}

impl Indirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Indirection::Pointer => "*",
            Indirection::Reference => "&",
        }
    }
}

/// One decoded type occurrence, either a function argument or a template
/// argument.
///
/// ```text
/// <parameter> ::= [P | R]* [K] [C] [N] <builtin-type> [<template-args>] [E]
///             ::= [P | R]* [K] [C] [N] <object-chain> [E]
///             ::= [P | R]* [K] [C] [N] S [<seq-id>] _ [<template-args>] [<object-chain>] [E]
/// ```
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Parameter {
    /// Non-empty chain describing the base type.
    pub ty: Vec<Object>,
    pub qualifiers: Qualifiers,
    /// Outermost marker first.
    pub indirection: Vec<Indirection>,
}

impl Parameter {
    pub fn new(ty: Vec<Object>) -> Self {
        Self { ty, ..Self::default() }
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.qualifiers.contains(Qualifiers::CONST)
    }

    #[inline]
    pub fn is_complex(&self) -> bool {
        self.qualifiers.contains(Qualifiers::COMPLEX)
    }

    /// Fill in everything this parameter doesn't set itself from a resolved
    /// back reference.
    ///
    /// Fields that are already set win. The resolved type chain is appended
    /// to whatever this parameter has already decoded.
    pub fn merge(self, resolved: &Parameter) -> Parameter {
        let mut ty = self.ty;
        ty.extend(resolved.ty.iter().cloned());

        let indirection = if self.indirection.is_empty() {
            resolved.indirection.clone()
        } else {
            self.indirection
        };

        Parameter {
            ty,
            qualifiers: self.qualifiers | resolved.qualifiers,
            indirection,
        }
    }

    fn is_void(&self) -> bool {
        self.qualifiers.is_empty()
            && self.indirection.is_empty()
            && matches!(
                self.ty.as_slice(),
                [Object { name: Name::Builtin(BuiltinType::Void), template_args }]
                    if template_args.is_empty()
            )
    }

    fn demangle_with(&self, ctx: &mut DemangleContext, placeholder: Option<Placeholder>) {
        if self.is_complex() {
            ctx.push("complex", Colors::annotation());
            ctx.space();
        }

        demangle_objects(&self.ty, ctx, false);

        // the placeholder goes between the type and its qualifiers
        if let Some(placeholder) = placeholder {
            placeholder.demangle(ctx);
        }

        if self.is_const() {
            ctx.space();
            ctx.push("const", Colors::special());
        }

        for marker in self.indirection.iter() {
            ctx.push(marker.as_str(), Colors::special());
        }
    }
}

impl Demangle for Parameter {
    fn demangle(&self, ctx: &mut DemangleContext) {
        self.demangle_with(ctx, None)
    }
}

impl Parse for Parameter {
    fn parse(
        ctx: &ParseContext,
        subs: &mut SubstitutionTable,
        input: &mut Cursor,
    ) -> Result<Parameter> {
        try_begin_parse!(ctx, input);

        let mut param = Parameter::default();

        loop {
            if input.try_consume("P") {
                param.indirection.push(Indirection::Pointer);
            } else if input.try_consume("R") {
                param.indirection.push(Indirection::Reference);
            } else {
                break;
            }
        }

        if input.try_consume("K") {
            param.qualifiers |= Qualifiers::CONST;
        }

        if input.try_consume("C") {
            param.qualifiers |= Qualifiers::COMPLEX;
        }

        let nested = input.try_consume("N");

        if is_substitution(input) {
            param = Substitution::parse(ctx, subs, input)?.resolve(ctx, subs, param, input)?;

            if input.try_consume("I") {
                let template_args = parse_template_args(ctx, subs, input)?;
                if let Some(last) = param.ty.last_mut() {
                    last.template_args = template_args;
                }
            }

            if input.peek_digit() {
                let (objects, _) = parse_objects(ctx, subs, input, false)?;
                param.ty.extend(objects);
            }
        } else if input.peek_digit() || input.peek_matches("S") {
            let (objects, _) = parse_objects(ctx, subs, input, false)?;
            param.ty = objects;
        } else if let Some(builtin) = BuiltinType::parse(input) {
            let mut object = Object::new(Name::Builtin(builtin));
            if input.try_consume("I") {
                object.template_args = parse_template_args(ctx, subs, input)?;
            }
            param.ty.push(object);
        } else if input.is_empty() {
            return Err(input.error(Reason::UnexpectedEnd));
        } else {
            return Err(input.error(Reason::UnexpectedText));
        }

        if nested {
            input.consume("E")?;
        }

        if param.ty.is_empty() {
            return Err(input.error(Reason::BadBackReference));
        }

        subs.insert_parameter(&param);
        Ok(param)
    }
}

/// Whether the input continues with a `S [<seq-id>] _` back reference rather
/// than one of the `std` abbreviations.
fn is_substitution(input: &Cursor) -> bool {
    input.peek_matches("S") && matches!(input.peek_second(), Some(b'0'..=b'9' | b'_'))
}

/// A back reference into the substitution table.
///
/// ```text
/// <substitution> ::= S_
///                ::= S <seq-id> _
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Substitution(Option<usize>);

impl Parse for Substitution {
    fn parse(
        ctx: &ParseContext,
        _subs: &mut SubstitutionTable,
        input: &mut Cursor,
    ) -> Result<Substitution> {
        try_begin_parse!(ctx, input);

        input.consume("S")?;
        let idx = input.opt_number()?;
        input.consume("_")?;
        Ok(Substitution(idx))
    }
}

impl Substitution {
    /// Resolve the reference on top of the partially decoded `param`.
    ///
    /// Without an index the reference names the most recent entry. Once the
    /// entity's own name is known to have more than one segment, a reference
    /// that is missing its index or points past the end of the table names the
    /// first segment of that name instead.
    fn resolve(
        self,
        ctx: &ParseContext,
        subs: &SubstitutionTable,
        mut param: Parameter,
        input: &Cursor,
    ) -> Result<Parameter> {
        let entry = match self.0 {
            Some(idx) => subs.get(idx),
            None => None,
        };

        if entry.is_none() {
            if let Some(enclosing) = ctx.enclosing.get() {
                param.ty.push(enclosing.clone());
                return Ok(param);
            }
        }

        let entry = match self.0 {
            Some(_) => entry,
            None => subs.last(),
        };

        match entry {
            Some(Substitutable::Prefix(objects)) => {
                param.ty.extend(objects.iter().cloned());
                Ok(param)
            }
            Some(Substitutable::Parameter(resolved)) => Ok(param.merge(resolved)),
            None => Err(Error::new(Reason::BadBackReference, input.index())),
        }
    }
}

/// Parse template arguments after the opening `I`, through the closing `E`.
///
/// ```text
/// <template-args> ::= I <parameter>+ E
/// ```
fn parse_template_args(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Vec<Parameter>> {
    try_begin_parse!(ctx, input);

    let mut args = vec![Parameter::parse(ctx, subs, input)?];
    while !input.try_consume("E") {
        args.push(Parameter::parse(ctx, subs, input)?);
    }

    Ok(args)
}

/// Whether a name ends in a constructor or a destructor.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum CtorDtor {
    Constructor,
    Destructor,
}

impl CtorDtor {
    /// ```text
    /// <ctor-dtor-name> ::= C [<number>]
    ///                  ::= D [<number>]
    /// ```
    fn parse(input: &mut Cursor) -> Result<Option<CtorDtor>> {
        let ctor_dtor = if input.try_consume("C") {
            CtorDtor::Constructor
        } else if input.try_consume("D") {
            CtorDtor::Destructor
        } else {
            return Ok(None);
        };

        input.opt_number()?;
        Ok(Some(ctor_dtor))
    }

    /// The segment that names the special member of class `class`.
    fn object(self, class: &Object) -> Object {
        match self {
            CtorDtor::Constructor => Object::new(class.name.clone()),
            CtorDtor::Destructor => Object::new(Name::Source(format!("~{}", class.name.as_str()))),
        }
    }
}

/// Parse a possibly nested name.
///
/// ```text
/// <object-chain> ::= [<std-abbreviation> [<template-args>]]
///                    {<length> <identifier> [<template-args>]}
///                    [<ctor-dtor-name>]
/// ```
///
/// Only the entity's own nested name can end in a constructor or destructor,
/// anywhere else a trailing `C` is the complex qualifier of whatever follows.
fn parse_objects(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
    special_members: bool,
) -> Result<(Vec<Object>, Option<CtorDtor>)> {
    try_begin_parse!(ctx, input);

    let mut objects = Vec::new();

    if let Some(wkc) = WellKnownComponent::parse(input) {
        let mut object = Object::new(Name::WellKnown(wkc));
        if input.try_consume("I") {
            object.template_args = parse_template_args(ctx, subs, input)?;
        }
        objects.push(object);

        if !input.peek_digit() {
            return Ok((objects, None));
        }
    }

    loop {
        let len = input.number()?;
        let mut object = Object::new(Name::Source(input.identifier(len)?.to_owned()));

        if input.try_consume("I") {
            object.template_args = parse_template_args(ctx, subs, input)?;
        }

        objects.push(object);

        if !input.peek_digit() {
            break;
        }
    }

    if !special_members {
        return Ok((objects, None));
    }

    let ctor_dtor = CtorDtor::parse(input)?;
    if let Some(ctor_dtor) = ctor_dtor {
        // a name always has at least one segment at this point
        let special = ctor_dtor.object(&objects[objects.len() - 1]);
        objects.push(special);
    }

    Ok((objects, ctor_dtor))
}

/// The kind of object a `_ZT` symbol describes.
///
/// ```text
/// <special-name> ::= TV                   # virtual table
///                ::= TI                   # typeinfo structure
///                ::= TS                   # typeinfo name
///                ::= Th n <number> _      # non-virtual call thunk
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum SpecialName {
    VirtualTable,
    TypeInfo,
    TypeName,
    NonVirtualThunk(usize),
}

impl Parse for SpecialName {
    fn parse(
        ctx: &ParseContext,
        _subs: &mut SubstitutionTable,
        input: &mut Cursor,
    ) -> Result<SpecialName> {
        try_begin_parse!(ctx, input);

        input.consume("T")?;

        if input.try_consume("V") {
            return Ok(SpecialName::VirtualTable);
        }

        if input.try_consume("I") {
            return Ok(SpecialName::TypeInfo);
        }

        if input.try_consume("S") {
            return Ok(SpecialName::TypeName);
        }

        input.consume("hn")?;
        let offset = input.number()?;
        input.consume("_")?;
        Ok(SpecialName::NonVirtualThunk(offset))
    }
}

/// The root AST node, and starting production.
///
/// ```text
/// <mangled-name> ::= _Z [<special-name>] [N] [K] <object-chain> [E] [<parameter>*] [E]
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct MangledName {
    pub special: Option<SpecialName>,
    /// Top level `const`, i.e. a const member function.
    pub is_const: bool,
    pub objects: Vec<Object>,
    pub ctor_dtor: Option<CtorDtor>,
    pub parameters: Vec<Parameter>,
}

impl MangledName {
    /// Whether the name describes a virtual table, a type info object or a
    /// type name rather than something callable.
    #[inline]
    pub fn is_bare_type(&self) -> bool {
        matches!(
            self.special,
            Some(SpecialName::VirtualTable | SpecialName::TypeInfo | SpecialName::TypeName)
        )
    }

    #[inline]
    pub fn thunk_offset(&self) -> Option<usize> {
        match self.special {
            Some(SpecialName::NonVirtualThunk(offset)) => Some(offset),
            _ => None,
        }
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.ctor_dtor == Some(CtorDtor::Constructor)
    }

    #[inline]
    pub fn is_destructor(&self) -> bool {
        self.ctor_dtor == Some(CtorDtor::Destructor)
    }

    fn demangle_arguments(&self, ctx: &mut DemangleContext, named: bool) {
        ctx.push("(", Colors::brackets());
        for (idx, param) in self.parameters.iter().enumerate() {
            if idx != 0 {
                ctx.push(", ", Colors::delimiter());
            }

            if named {
                param.demangle_with(ctx, Some(Placeholder::Argument(idx)));
            } else {
                ctx.push_owned(format!("p{idx}"), Colors::item());
            }
        }
        ctx.push(")", Colors::brackets());
    }

    /// `{ (this - N)->name(p0, p1); }`, with the last segment's template
    /// arguments replaced by their placeholders.
    fn demangle_thunk_body(&self, ctx: &mut DemangleContext, offset: usize) {
        ctx.push(" {\n\t", Colors::brackets());
        ctx.push("(", Colors::brackets());
        ctx.push("this", Colors::annotation());
        ctx.push_owned(format!(" - {offset}"), Colors::comment());
        ctx.push(")", Colors::brackets());
        ctx.push("->", Colors::delimiter());

        let (last, scope) = match self.objects.split_last() {
            Some(split) => split,
            None => return,
        };

        demangle_objects(scope, ctx, false);
        if !scope.is_empty() {
            ctx.push("::", Colors::delimiter());
        }

        last.name.demangle(ctx);
        if !last.template_args.is_empty() {
            ctx.push("<", Colors::brackets());
            for idx in 0..last.template_args.len() {
                if idx != 0 {
                    ctx.push(", ", Colors::delimiter());
                }
                ctx.push_owned(format!("T{idx}"), Colors::item());
            }
            ctx.push(">", Colors::brackets());
        }

        self.demangle_arguments(ctx, false);
        ctx.push(";\n}", Colors::brackets());
    }
}

impl Parse for MangledName {
    fn parse(
        ctx: &ParseContext,
        subs: &mut SubstitutionTable,
        input: &mut Cursor,
    ) -> Result<MangledName> {
        try_begin_parse!(ctx, input);

        input.consume("_Z")?;

        let special = if input.peek_matches("T") {
            Some(SpecialName::parse(ctx, subs, input)?)
        } else {
            None
        };

        let nested = input.try_consume("N");
        let is_const = input.try_consume("K");
        let (objects, ctor_dtor) = parse_objects(ctx, subs, input, nested)?;
        subs.insert_prefixes(&objects);

        if objects.len() > 1 && ctx.enclosing.set(objects[0].clone()).is_err() {
            log::trace!("[MangledName::parse] enclosing scope was already set");
        }

        let bare_type = matches!(
            special,
            Some(SpecialName::VirtualTable | SpecialName::TypeInfo | SpecialName::TypeName)
        );

        let mut parameters = Vec::new();
        if !bare_type {
            input.try_consume("E");

            while !input.is_empty() && !input.try_consume("E") {
                parameters.push(Parameter::parse(ctx, subs, input)?);
            }

            // `v` on its own is the empty argument list
            if parameters.len() == 1 && parameters[0].is_void() {
                parameters.clear();
            }
        }

        Ok(MangledName {
            special,
            is_const,
            objects,
            ctor_dtor,
            parameters,
        })
    }
}

impl Demangle for MangledName {
    fn demangle(&self, ctx: &mut DemangleContext) {
        let thunk_offset = self.thunk_offset();

        match self.special {
            Some(SpecialName::VirtualTable) | Some(SpecialName::TypeName) => {
                ctx.push("struct", Colors::annotation());
                ctx.space();
            }
            Some(SpecialName::TypeInfo) => {
                ctx.push("struct : public struct", Colors::annotation());
                ctx.space();
            }
            _ => {}
        }

        demangle_objects(&self.objects, ctx, thunk_offset.is_some());

        if self.special == Some(SpecialName::VirtualTable) {
            ctx.space();
            ctx.push(": public struct", Colors::annotation());
        }

        if self.is_bare_type() {
            ctx.push(" { }", Colors::brackets());
            return;
        }

        self.demangle_arguments(ctx, true);

        if self.is_const {
            ctx.space();
            ctx.push("const", Colors::special());
        }

        if let Some(offset) = thunk_offset {
            self.demangle_thunk_body(ctx, offset);
        }
    }
}

impl fmt::Display for MangledName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = DemangleContext::new();
        self.demangle(&mut ctx);
        fmt::Display::fmt(&ctx.stream, f)
    }
}
