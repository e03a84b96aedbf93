//! Newtype IDs for type-safe entity references.
//!
//! The remote API is not consistent about id encoding: the same field can
//! arrive as `"42"`, `42` or a 24-character object id. Every id is therefore
//! stored in its text form and deserializes from either a JSON string or a
//! JSON number.

use serde::{Deserialize, Deserializer};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or a number
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use lumen_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("1");
/// let order_id = OrderId::new("1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from its text form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_flexible_id(deserializer).map(Self)
            }
        }
    };
}

/// Wire forms an id may take.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

/// Deserialize an id that may be encoded as a JSON string or number.
///
/// # Errors
///
/// Returns the deserializer's error when the value is neither.
#[doc(hidden)]
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(ReviewId);
define_id!(AddressId);
define_id!(ReturnId);
define_id!(TicketId);
define_id!(NotificationId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string_and_number() {
        let a: ProductId = serde_json::from_str("\"65f1c0ffee\"").unwrap();
        assert_eq!(a.as_str(), "65f1c0ffee");

        let b: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(b, ProductId::new("42"));

        let c: OrderId = serde_json::from_str("-7").unwrap();
        assert_eq!(c.to_string(), "-7");
    }

    #[test]
    fn test_id_rejects_non_scalar() {
        assert!(serde_json::from_str::<UserId>("{\"id\": 1}").is_err());
        assert!(serde_json::from_str::<UserId>("null").is_err());
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = CartItemId::from("9");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"9\"");
    }
}
