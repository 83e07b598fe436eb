//!
//! # Enum-String Mapping Module
//!
//! Defines the [enumstr] macro and paired [EnumStr] trait,
//! mapping fieldless enums to and from the strings that appear
//! in technology label text ("Function: metal-1", "Style: patterned").
//!
//! Beyond the exact mapping, [EnumStr] provides case-insensitive parsing
//! (label text is matched without regard to case)
//! and the full list of string-values, which serves as the set of choices
//! offered when an enumerated field is edited.
//!
//! ```rs
//! use tech21utils::enumstr;
//!
//! enumstr!(
//! /// # Fill Style
//! FillStyle {
//!     Solid: "solid",
//!     Patterned: "patterned",
//!  }
//! );
//! ```
//!

///
/// # String-Enumeration Trait
///
/// * `to_str` converts a variant to its string-value.
/// * `from_str` does the opposite, case *sensitively*.
/// * `from_str_nocase` parses ignoring ASCII case.
/// * `variants` lists every variant, in declaration order.
///
pub trait EnumStr: std::marker::Sized + Copy + 'static {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
    fn variants() -> &'static [Self];

    /// Parse `txt`, ignoring surrounding whitespace and ASCII case.
    fn from_str_nocase(txt: &str) -> Option<Self> {
        let txt = txt.trim();
        Self::variants()
            .iter()
            .find(|v| v.to_str().eq_ignore_ascii_case(txt))
            .copied()
    }
    /// String-values of all variants, e.g. as choices for an edit prompt
    fn choices() -> Vec<String> {
        Self::variants().iter().map(|v| v.to_str().to_string()).collect()
    }
}

///
/// # Enum-String Pairing Macro
///
/// Creates a fieldless `enum` which implements [EnumStr] and [std::fmt::Display].
/// Variants derive the common comparison traits (including [Ord], in declaration order)
/// and `serde::{Serialize, Deserialize}`, which must be in scope at the invocation site.
/// Additional attributes, e.g. further derives, may precede the enum name.
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
                $variant ),*
        }
        impl $crate::EnumStr for $enum_name {
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
            fn variants() -> &'static [Self] {
                &[ $( Self::$variant ),* ]
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", $crate::EnumStr::to_str(self))
            }
        }
    }
}
