//! Macro for implementing Display and FromStr for domain enums
//!
//! Eliminates boilerplate for simple tag-like enums by providing a single
//! implementation of both Display and FromStr. Parsing is case-insensitive
//! and the string representation is consistent lowercase.
//!
//! # Example
//!
//! ```rust
//! use repflow_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Tone {
//!     Calm,
//!     Energetic,
//! }
//!
//! impl_domain_enum_conversions!(Tone {
//!     Calm => "calm",
//!     Energetic => "energetic",
//! });
//! ```

/// Implements Display and FromStr traits for tag-like domain enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::types::stats::SuggestionKind;

    #[test]
    fn test_display_conversion() {
        assert_eq!(SuggestionKind::Warning.to_string(), "warning");
        assert_eq!(SuggestionKind::Success.to_string(), "success");
        assert_eq!(SuggestionKind::Info.to_string(), "info");
        assert_eq!(SuggestionKind::Motivation.to_string(), "motivation");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(SuggestionKind::from_str("WARNING").unwrap(), SuggestionKind::Warning);
        assert_eq!(SuggestionKind::from_str("Motivation").unwrap(), SuggestionKind::Motivation);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = SuggestionKind::from_str("celebration");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid SuggestionKind: celebration"));
    }

    #[test]
    fn test_roundtrip() {
        let kinds = vec![
            SuggestionKind::Warning,
            SuggestionKind::Success,
            SuggestionKind::Info,
            SuggestionKind::Motivation,
        ];

        for kind in kinds {
            let string = kind.to_string();
            let parsed = SuggestionKind::from_str(&string).unwrap();
            assert_eq!(kind, parsed);
        }
    }
}
