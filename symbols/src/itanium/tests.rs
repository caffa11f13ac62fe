#![cfg(test)]

use super::ast::{
    CtorDtor, Indirection, MangledName, Name, Object, Parameter, Parse, ParseContext, Qualifiers,
    SpecialName,
};
use super::cursor::Cursor;
use super::error::Reason;
use super::subs::{decompose, Substitutable, SubstitutionTable};
use super::types::{BuiltinType, WellKnownComponent};
use super::*;

macro_rules! none {
    ($mangled:literal) => {
        if parse($mangled).is_some() {
            panic!("Formatting '{}' succeeded when it wasn't supposed to.", $mangled);
        }
    };
}

macro_rules! eq {
    ($mangled:literal => $demangled:literal) => {
        let symbol = parse($mangled).expect(&format!("Formatting '{}' failed.", $mangled));

        assert_eq!(
            String::from_iter(symbol.tokens().iter().map(|t| &t.text[..])),
            $demangled
        );
    };
}

fn source(name: &str) -> Object {
    Object::new(Name::Source(name.to_string()))
}

fn builtin(ty: BuiltinType) -> Object {
    Object::new(Name::Builtin(ty))
}

fn param(ty: Vec<Object>, qualifiers: Qualifiers, indirection: &[Indirection]) -> Parameter {
    Parameter {
        ty,
        qualifiers,
        indirection: indirection.to_vec(),
    }
}

/// Parse `input` as `production` and check the new entries of the table.
fn assert_subs(input: &str, expected: &[Substitutable]) {
    let symbol = Symbol::new(input)
        .unwrap_or_else(|err| panic!("Parsing {input:?} failed: {err}"));

    if &symbol.substitutions()[..] != expected {
        panic!(
            "Parsing {:?} produced a substitutions table of\n\n{:#?}\n\nbut we expected\n\n{:#?}",
            input,
            symbol.substitutions(),
            expected
        );
    }
}

fn reason(input: &str) -> Reason {
    match Symbol::new(input) {
        Ok(sym) => panic!("Parsing {input:?} succeeded as '{sym}' when it wasn't supposed to."),
        Err(err) => err.reason(),
    }
}

#[test]
fn basic() {
    eq!("_Z3fooi" => "foo(int p0)");
    eq!("_ZN3Foo3BarEv" => "Foo::Bar()");
    eq!("_Z3foov" => "foo()");
    eq!("_Z3foo" => "foo()");
    eq!("_ZN5space3fooEii" => "space::foo(int p0, int p1)");
    eq!("_Z4mainiPPc" => "main(int p0, char p1**)");
}

#[test]
fn rejects_unmangled() {
    none!("foo");
    none!("");
    none!("_Z");
    none!("Z3fooi");
    none!("_Z3fo");
    none!("_Z0foo");
    none!("_ZN03fooEv");
    none!("_Z3foo!");
}

#[test]
fn missing_prefix_leaves_table_empty() {
    let ctx = ParseContext::new();
    let mut subs = SubstitutionTable::new();
    let mut input = Cursor::new("N3Foo3BarEPKi");

    let err = MangledName::parse(&ctx, &mut subs, &mut input).unwrap_err();

    assert_eq!(err.reason(), Reason::UnexpectedText);
    assert_eq!(err.offset(), 0);
    assert!(subs.is_empty());
}

#[test]
fn qualifiers() {
    eq!("_Z3fooPKc" => "foo(char p0 const*)");
    eq!("_Z3fooRKSs" => "foo(std::string p0 const&)");
    eq!("_Z3fooCd" => "foo(complex double p0)");
    eq!("_Z3fooPRi" => "foo(int p0*&)");
    eq!("_Z3fooKCf" => "foo(complex float p0 const)");
    eq!("_ZNK3Foo3getEv" => "Foo::get() const");
    eq!("_ZNK3Foo3getEi" => "Foo::get(int p0) const");
}

#[test]
fn nested_parameters() {
    eq!("_ZN3fooE3Bar" => "foo(Bar p0)");
    eq!("_ZN3fooE1a1b" => "foo(a::b p0)");
    eq!("_Z3fooN1a1bEi" => "foo(a::b p0, int p1)");
    eq!("_Z3fooRKN5space5ThingE" => "foo(space::Thing p0 const&)");
}

#[test]
fn entity_name_takes_every_segment() {
    // without `N` the name still continues while lengths follow
    eq!("_Z3foo3Bar" => "foo::Bar()");
    eq!("_Z3foo3Bari" => "foo::Bar(int p0)");

    let sym = Symbol::new("_Z3foo3Bar").unwrap();
    assert_eq!(sym.entity().objects, vec![source("foo"), source("Bar")]);
    assert!(sym.entity().parameters.is_empty());
}

#[test]
fn constructors_and_destructors() {
    eq!("_ZN3FooC1Ev" => "Foo::Foo()");
    eq!("_ZN3FooC2Ei" => "Foo::Foo(int p0)");
    eq!("_ZN3FooD0Ev" => "Foo::~Foo()");
    eq!("_ZN5space3FooD2Ev" => "space::Foo::~Foo()");
    eq!("_ZN3FooIiEC1Ev" => "Foo<int>::Foo()");

    let sym = Symbol::new("_ZN3FooC1Ev").unwrap();
    assert!(sym.entity().is_constructor());
    assert!(!sym.entity().is_destructor());
    assert_eq!(sym.entity().objects, vec![source("Foo"), source("Foo")]);

    let sym = Symbol::new("_ZN3FooD1Ev").unwrap();
    assert_eq!(sym.entity().ctor_dtor, Some(CtorDtor::Destructor));
    assert_eq!(sym.entity().objects, vec![source("Foo"), source("~Foo")]);
}

#[test]
fn complex_is_not_a_constructor() {
    // without a nested name a trailing `C` qualifies the first parameter
    eq!("_Z3fooCf" => "foo(complex float p0)");

    let sym = Symbol::new("_Z3fooCf").unwrap();
    assert_eq!(sym.entity().ctor_dtor, None);
}

#[test]
fn templates() {
    eq!("_ZN3FooIiE3barEv" => "Foo<int>::bar()");
    eq!("_Z3maxIiEvii" => "max<int>(void p0, int p1, int p2)");
    eq!("_Z3fooSaIcE" => "foo(std::allocator<char> p0)");
    eq!("_ZN3fooE4PairIifE" => "foo(Pair<int, float> p0)");
    eq!("_ZNSt6vectorIiSaIiEE9push_backERKi" =>
        "std::vector<int, std::allocator<int>>::push_back(int p0 const&)");
    eq!("_Z3fooSt6vectorIiE" => "foo(std::vector<int> p0)");
    none!("_Z3fooIE");
    none!("_Z3fooIi");
}

#[test]
fn special_names() {
    eq!("_ZTV3Foo" => "struct Foo : public struct { }");
    eq!("_ZTVN5space3FooE" => "struct space::Foo : public struct { }");
    eq!("_ZTI3Foo" => "struct : public struct Foo { }");
    eq!("_ZTS3Foo" => "struct Foo { }");
    none!("_ZTX3Foo");
    none!("_ZTh8_3Foo");

    let sym = Symbol::new("_ZTI3Foo").unwrap();
    assert!(sym.entity().is_bare_type());
    assert_eq!(sym.entity().special, Some(SpecialName::TypeInfo));
    assert!(sym.entity().parameters.is_empty());
}

#[test]
fn thunks() {
    eq!("_ZThn8_N3Foo3BarEv" => "Foo::Bar() {\n\t(this - 8)->Foo::Bar();\n}");
    eq!("_ZThn16_N3Foo3BarEiPc" =>
        "Foo::Bar(int p0, char p1*) {\n\t(this - 16)->Foo::Bar(p0, p1);\n}");
    eq!("_ZThn8_NK3Foo3getEv" => "Foo::get() const {\n\t(this - 8)->Foo::get();\n}");
    eq!("_ZThn4_N3Foo3setIicEEv" =>
        "Foo::set<int T0, char T1>() {\n\t(this - 4)->Foo::set<T0, T1>();\n}");
    eq!("_ZThn4_N3Foo3setIPKcEEv" =>
        "Foo::set<char T0 const*>() {\n\t(this - 4)->Foo::set<T0>();\n}");

    let sym = Symbol::new("_ZThn24_N3Foo3BarEv").unwrap();
    assert_eq!(sym.entity().thunk_offset(), Some(24));
    assert!(!sym.entity().is_bare_type());
}

#[test]
fn back_references() {
    // `int*` is recorded, the bare `int` isn't
    eq!("_Z3fooPiS_" => "foo(int p0*, int p1*)");
    eq!("_Z3fooPKcS0_" => "foo(char p0 const*, char p1 const)");
    eq!("_Z3fooPKcS1_" => "foo(char p0 const*, char p1 const*)");
    eq!("_Z3fooPKcS_" => "foo(char p0 const*, char p1 const*)");
    eq!("_Z3fooPKcS_S1_" => "foo(char p0 const*, char p1 const*, char p2 const*)");
    eq!("_ZN1a1b1cES_" => "a::b::c(a p0)");
    eq!("_ZN1a1b1cES0_" => "a::b::c(a::b p0)");
    eq!("_ZN3Foo3BarES_" => "Foo::Bar(Foo p0)");
    eq!("_Z3fooSaIcES0_" => "foo(std::allocator<char> p0, std::allocator<char> p1)");
}

#[test]
fn back_references_merge_qualifiers() {
    // the reference doesn't override a pointer of its own
    eq!("_Z3fooPKcRS0_" => "foo(char p0 const*, char p1 const&)");
    eq!("_Z3fooPKcKS1_" => "foo(char p0 const*, char p1 const*)");
}

#[test]
fn back_reference_continues_the_name() {
    eq!("_ZN1a1b1cES0_1d" => "a::b::c(a::b::d p0)");
    eq!("_ZN1a1b1cEPS0_" => "a::b::c(a::b p0*)");
}

#[test]
fn bad_back_references() {
    // nothing has been recorded yet
    assert_eq!(reason("_Z3fooS_"), Reason::BadBackReference);
    assert_eq!(reason("_Z3fooS0_"), Reason::BadBackReference);
    // a basic type never records its bare form
    assert_eq!(reason("_Z3fooiS_"), Reason::BadBackReference);
    assert_eq!(reason("_ZN3fooE3BarS_"), Reason::BadBackReference);
    // forward reference
    assert_eq!(reason("_Z3fooPiS1_"), Reason::BadBackReference);
    assert_eq!(reason("_Z3fooS0"), Reason::UnexpectedEnd);
}

#[test]
fn enclosing_scope_fallback() {
    // a two segment name has no prefixes of its own
    eq!("_ZN3Foo3BarES0_" => "Foo::Bar(Foo p0)");
    eq!("_ZN3Foo3BarEPKcS5_" => "Foo::Bar(char p0 const*, Foo p1)");
    // in range indices still name the table
    eq!("_ZN3Foo3BarEPKcS1_" => "Foo::Bar(char p0 const*, char p1 const*)");
    // the index-less form never looks at the table
    eq!("_ZN3Foo3BarEPKcS_" => "Foo::Bar(char p0 const*, Foo p1)");
}

#[test]
fn basic_type_then_enclosing_scope() {
    // the bare `int` is never recorded, `S_` still resolves
    eq!("_ZN3Foo3BarEiS_" => "Foo::Bar(int p0, Foo p1)");
    assert_subs("_ZN3Foo3BarEiS_", &[]);

    eq!("_ZN1a1b1cEiS_" => "a::b::c(int p0, a p1)");
    assert_subs("_ZN1a1b1cEiS_", &[Substitutable::Prefix(vec![source("a"), source("b")])]);
}

#[test]
fn prefixes_are_recorded() {
    assert_subs("_ZN3FooC1Ev", &[]);
    assert_subs("_ZN1a1b1cEv", &[Substitutable::Prefix(vec![source("a"), source("b")])]);
    assert_subs(
        "_ZN1a1b1c1dEv",
        &[
            Substitutable::Prefix(vec![source("a"), source("b")]),
            Substitutable::Prefix(vec![source("a"), source("b"), source("c")]),
        ],
    );
}

#[test]
fn parameters_are_decomposed() {
    let int = || vec![builtin(BuiltinType::Int)];

    assert_subs("_Z3fooi", &[]);
    assert_subs(
        "_Z3fooPPKi",
        &[
            Substitutable::Parameter(param(int(), Qualifiers::CONST, &[])),
            Substitutable::Parameter(param(int(), Qualifiers::CONST, &[Indirection::Pointer])),
            Substitutable::Parameter(param(
                int(),
                Qualifiers::CONST,
                &[Indirection::Pointer, Indirection::Pointer],
            )),
        ],
    );

    let mut pair = source("Pair");
    pair.template_args = vec![Parameter::new(int())];
    assert_subs(
        "_Z3fooN1a4PairIiEE",
        &[
            Substitutable::Parameter(param(
                vec![source("a"), source("Pair")],
                Qualifiers::empty(),
                &[],
            )),
            Substitutable::Parameter(param(
                vec![source("a"), pair],
                Qualifiers::empty(),
                &[],
            )),
        ],
    );
}

#[test]
fn decomposition_order() {
    let mut vector = source("vector");
    vector.template_args = vec![Parameter::new(vec![builtin(BuiltinType::Char)])];

    let complex = Qualifiers::COMPLEX;
    let both = Qualifiers::COMPLEX | Qualifiers::CONST;
    let ty = vec![source("std"), vector.clone()];
    let stripped = vec![source("std"), source("vector")];

    let sections = decompose(&param(
        ty.clone(),
        both,
        &[Indirection::Reference, Indirection::Pointer],
    ));

    assert_eq!(
        sections,
        vec![
            param(stripped, Qualifiers::empty(), &[]),
            param(ty.clone(), Qualifiers::empty(), &[]),
            param(ty.clone(), complex, &[]),
            param(ty.clone(), both, &[]),
            param(ty.clone(), both, &[Indirection::Reference]),
            param(ty, both, &[Indirection::Reference, Indirection::Pointer]),
        ]
    );
}

#[test]
fn template_args_are_recorded_first() {
    let sym = Symbol::new("_ZN1a1bIPiE1cES_").unwrap();
    let int_ptr = param(vec![builtin(BuiltinType::Int)], Qualifiers::empty(), &[Indirection::Pointer]);

    let mut b = source("b");
    b.template_args = vec![int_ptr.clone()];

    assert_eq!(
        &sym.substitutions()[..],
        &[
            Substitutable::Parameter(int_ptr),
            Substitutable::Prefix(vec![source("a"), b]),
        ]
    );

    // `S_` names the enclosing scope rather than the table
    assert_eq!(sym.to_string(), "a::b<int*>::c(a p0)");
}

#[test]
fn template_back_reference() {
    eq!("_ZN1a1bIPiS_E1cEv" => "a::b<int*, int*>::c()");
}

#[test]
fn merge_keeps_existing_fields() {
    let resolved = param(
        vec![builtin(BuiltinType::Char)],
        Qualifiers::CONST,
        &[Indirection::Pointer],
    );

    let own = param(vec![], Qualifiers::COMPLEX, &[Indirection::Reference]);
    let merged = own.merge(&resolved);

    assert_eq!(merged.ty, vec![builtin(BuiltinType::Char)]);
    assert_eq!(merged.qualifiers, Qualifiers::COMPLEX | Qualifiers::CONST);
    assert_eq!(merged.indirection, vec![Indirection::Reference]);

    let merged = Parameter::default().merge(&resolved);
    assert_eq!(merged, resolved);
}

#[test]
fn std_abbreviations() {
    eq!("_ZNSt4pairE" => "std::pair()");
    eq!("_Z3fooSs" => "foo(std::string p0)");
    eq!("_Z3fooRSo" => "foo(std::ostream p0&)");

    let sym = Symbol::new("_Z3fooSd").unwrap();
    assert_eq!(
        sym.entity().parameters[0].ty,
        vec![Object::new(Name::WellKnown(WellKnownComponent::StdIostream))]
    );
}

#[test]
fn trailing_input_is_ignored() {
    eq!("_ZN3Foo3BarEvE" => "Foo::Bar()");
    eq!("_ZTV3FooXYZ" => "struct Foo : public struct { }");
}

#[test]
fn too_much_recursion() {
    let mut mangled = String::from("_Z3foo");
    for _ in 0..200 {
        mangled.push_str("1AI");
    }
    mangled.push('i');
    for _ in 0..200 {
        mangled.push('E');
    }

    assert_eq!(reason(&mangled), Reason::TooMuchRecursion);
}

#[test]
fn deterministic() {
    for input in ["_ZNSt6vectorIiSaIiEE9push_backERKi", "_ZThn8_N3Foo3BarEiS_", "_Z3fooPKcS_"] {
        let first = Symbol::new(input).unwrap();
        let second = Symbol::new(input).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}

#[test]
fn enclosing_scope_is_set_once() {
    let ctx = ParseContext::new();
    let mut subs = SubstitutionTable::new();

    let mut input = Cursor::new("_ZN3Foo3BarEv");
    MangledName::parse(&ctx, &mut subs, &mut input).unwrap();

    // a second name decoded with the same context keeps the first scope
    let mut input = Cursor::new("_ZN3Baz3QuxES_");
    let entity = MangledName::parse(&ctx, &mut subs, &mut input).unwrap();

    assert_eq!(entity.parameters, vec![Parameter::new(vec![source("Foo")])]);
}
