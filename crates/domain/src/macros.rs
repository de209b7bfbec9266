//! Macro for implementing Display and FromStr for configuration option enums
//!
//! Option values are spelled the way operators type them in configuration
//! files (`enqueue-member-dn`, `parse-whole-group`, ...). The first spelling
//! of each variant is canonical and is what `Display` produces; any further
//! spellings are accepted as aliases when parsing.
//!
//! # Example
//!
//! ```rust
//! use groupderef_domain::impl_option_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Flavor {
//!     Plain,
//!     Fancy,
//! }
//!
//! impl_option_conversions!(Flavor {
//!     Plain => "plain" | "simple",
//!     Fancy => "fancy",
//! });
//!
//! assert_eq!(Flavor::Plain.to_string(), "plain");
//! assert_eq!("SIMPLE".parse::<Flavor>(), Ok(Flavor::Plain));
//! ```

/// Implements Display and FromStr for option enums
///
/// - Display writes the canonical (first) spelling
/// - FromStr is case-insensitive and accepts every listed spelling
/// - Parse errors name the enum and list the canonical spellings
#[macro_export]
macro_rules! impl_option_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical configuration spelling of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "Invalid {}: '{}' (expected one of: {})",
                        stringify!($enum_name),
                        s,
                        [$($str),+].join(", ")
                    )),
                }
            }
        }
    };
}
