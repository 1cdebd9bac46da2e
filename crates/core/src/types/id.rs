//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Catalog documents are
//! hand-edited JSON, so ids are free-form strings rather than integers.

/// Errors that can occur when parsing an id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or whitespace only.
    #[error("id cannot be empty")]
    Empty,
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` (deserialization rejects blank ids)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr`, `AsRef<str>` and `Borrow<str>` implementations
///
/// # Example
///
/// ```rust
/// # use acchiappasogni_core::define_id;
/// define_id!(ShelfId);
/// define_id!(BinId);
///
/// let shelf = ShelfId::parse("A-1").unwrap();
/// let bin = BinId::parse("A-1").unwrap();
/// assert_eq!(shelf.as_str(), bin.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: ShelfId = bin;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an id, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Empty`](crate::IdError::Empty) if nothing is
            /// left after trimming.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(DesignName);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = ProductId::parse("  AE-001 ").unwrap();
        assert_eq!(id.as_str(), "AE-001");
    }

    #[test]
    fn test_parse_blank_rejected() {
        assert_eq!(ProductId::parse("   "), Err(IdError::Empty));
        assert_eq!(ProductId::parse(""), Err(IdError::Empty));
    }

    #[test]
    fn test_serde_transparent_string() {
        let id = ProductId::parse("AE-7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"AE-7\"");

        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_blank_fails() {
        assert!(serde_json::from_str::<ProductId>("\"  \"").is_err());
    }

    #[test]
    fn test_borrow_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(ProductId::parse("x").unwrap(), 3);
        assert_eq!(map.get("x"), Some(&3));
    }
}
