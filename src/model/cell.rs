//! Opaque byte wrappers for row keys and cell values.

use std::fmt;

use bytes::Bytes;

macro_rules! byte_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(Bytes);

        impl $name {
            /// Wrap anything convertible into shared bytes.
            pub fn of(bytes: impl Into<Bytes>) -> Self {
                Self(bytes.into())
            }

            /// Borrow the wrapped bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Shared handle to the wrapped bytes.
            pub fn to_bytes(&self) -> Bytes {
                self.0.clone()
            }

            /// Number of wrapped bytes.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Whether no bytes are wrapped.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.escape_ascii())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(\"{}\")", stringify!($name), self.0.escape_ascii())
            }
        }

        impl From<Bytes> for $name {
            fn from(value: Bytes) -> Self {
                Self(value)
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(value: Vec<u8>) -> Self {
                Self(Bytes::from(value))
            }
        }

        impl From<&[u8]> for $name {
            fn from(value: &[u8]) -> Self {
                Self(Bytes::copy_from_slice(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(Bytes::copy_from_slice(value.as_bytes()))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Bytes::from(value))
            }
        }
    };
}

byte_wrapper!(
    /// Logical row key as supplied by the caller, before any salting.
    RowKey
);

byte_wrapper!(
    /// Cell content.
    Value
);
