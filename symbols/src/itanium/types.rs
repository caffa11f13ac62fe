//! Static spellings for builtin types and well-known `std` components.

use super::cursor::Cursor;

/// Define a "vocabulary" nonterminal, something like `BuiltinType` that
/// expands to one of a fixed set of short tokens.
///
/// Generates the enum, a side-effect free lookup by token, a cursor based
/// parser that consumes the token on a hit and leaves the input untouched on
/// a miss, and the printable spelling of every variant.
macro_rules! define_vocabulary {
    ( $(#[$attr:meta])* pub enum $typename:ident {
        $($variant:ident ( $mangled:literal, $printable:literal )),*
    } ) => {
        $(#[$attr])*
        pub enum $typename {
            $(
                #[doc=$printable]
                $variant
            ),*
        }

        impl $typename {
            /// Every variant, in lookup order.
            pub const ALL: &'static [$typename] = &[$($typename::$variant),*];

            /// Resolve a mangled token, `None` if the token isn't part of
            /// this vocabulary.
            pub fn lookup(token: &str) -> Option<$typename> {
                match token {
                    $($mangled => Some($typename::$variant),)*
                    _ => None,
                }
            }

            /// Consume one of the vocabulary's tokens if the input starts
            /// with one.
            pub(crate) fn parse(input: &mut Cursor) -> Option<$typename> {
                $(
                    if input.try_consume($mangled) {
                        return Some($typename::$variant);
                    }
                )*

                None
            }

            #[inline]
            pub fn mangled(&self) -> &'static str {
                match *self {
                    $($typename::$variant => $mangled),*
                }
            }

            #[inline]
            pub fn printable(&self) -> &'static str {
                match *self {
                    $($typename::$variant => $printable),*
                }
            }
        }
    };
}

define_vocabulary! {
    /// A one of the standard variants of the <builtin-type> production.
    ///
    /// ```text
    /// <builtin-type> ::= v  # void
    ///                ::= w  # wchar_t
    ///                ::= b  # bool
    ///                ::= c  # char
    ///                ::= a  # signed char
    ///                ::= h  # unsigned char
    ///                ::= s  # short
    ///                ::= t  # unsigned short
    ///                ::= i  # int
    ///                ::= j  # unsigned int
    ///                ::= l  # long
    ///                ::= m  # unsigned long
    ///                ::= x  # long long, __int64
    ///                ::= y  # unsigned long long, __int64
    ///                ::= n  # __int128
    ///                ::= o  # unsigned __int128
    ///                ::= f  # float
    ///                ::= d  # double
    ///                ::= e  # long double, __float80
    ///                ::= g  # __float128
    ///                ::= z  # ellipsis
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum BuiltinType {
        Void             ("v", "void"),
        Wchar            ("w", "wchar_t"),
        Bool             ("b", "bool"),
        Char             ("c", "char"),
        SignedChar       ("a", "signed char"),
        UnsignedChar     ("h", "unsigned char"),
        Short            ("s", "short"),
        UnsignedShort    ("t", "unsigned short"),
        Int              ("i", "int"),
        UnsignedInt      ("j", "unsigned int"),
        Long             ("l", "long"),
        UnsignedLong     ("m", "unsigned long"),
        LongLong         ("x", "long long"),
        UnsignedLongLong ("y", "unsigned long long"),
        Int128           ("n", "__int128"),
        Uint128          ("o", "unsigned __int128"),
        Float            ("f", "float"),
        Double           ("d", "double"),
        LongDouble       ("e", "long double"),
        Float128         ("g", "__float128"),
        Ellipsis         ("z", "...")
    }
}

define_vocabulary! {
    /// The `std` abbreviations of the <substitution> production.
    ///
    /// ```text
    /// <substitution> ::= St # ::std::
    ///                ::= Sa # ::std::allocator
    ///                ::= Sb # ::std::basic_string
    ///                ::= Ss # ::std::string
    ///                ::= Si # ::std::istream
    ///                ::= So # ::std::ostream
    ///                ::= Sd # ::std::iostream
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum WellKnownComponent {
        Std          ("St", "std"),
        StdAllocator ("Sa", "std::allocator"),
        StdString1   ("Sb", "std::basic_string"),
        StdString2   ("Ss", "std::string"),
        StdIstream   ("Si", "std::istream"),
        StdOstream   ("So", "std::ostream"),
        StdIostream  ("Sd", "std::iostream")
    }
}

/// Token to spelling lookup over both vocabularies.
///
/// A miss isn't an error, it only means the token has to be decoded as a
/// regular name.
pub fn lookup(token: &str) -> Option<&'static str> {
    BuiltinType::lookup(token)
        .map(|ty| ty.printable())
        .or_else(|| WellKnownComponent::lookup(token).map(|wkc| wkc.printable()))
}
