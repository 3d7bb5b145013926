//! # Chunkset Codec
//!
//! Element encoding contract for chunkset.
//!
//! A chunked collection never interprets its elements; it only needs to turn
//! each one into bytes and back. This crate defines that contract through the
//! [`Encode`] and [`Decode`] traits and implements it with CBOR for the
//! standard scalar types, `String`, and a few containers.
//!
//! The only requirement is `decode(encode(x)) == x`. The encoding itself is
//! an implementation detail: chunk files are ephemeral and never read by a
//! different build.
//!
//! ## Usage
//!
//! ```
//! use chunkset_codec::{Decode, Encode};
//!
//! let bytes = "random@line".to_string().encode().unwrap();
//! let decoded = String::decode(&bytes).unwrap();
//! assert_eq!(decoded, "random@line");
//! ```
//!
//! Any serde type can opt in with [`cbor_element!`]:
//!
//! ```
//! use chunkset_codec::{cbor_element, Decode, Encode};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Locator {
//!     host: String,
//!     port: u16,
//! }
//!
//! cbor_element!(Locator);
//!
//! let locator = Locator { host: "a".into(), port: 1 };
//! let bytes = locator.encode().unwrap();
//! assert_eq!(Locator::decode(&bytes).unwrap(), locator);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;

pub use cbor::{from_cbor, to_cbor};
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be encoded to bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from bytes produced by [`Encode`].
pub trait Decode: Sized {
    /// Decode a value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

/// Implements [`Encode`] and [`Decode`] through CBOR for serde types.
#[macro_export]
macro_rules! cbor_element {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Encode for $ty {
                fn encode(&self) -> $crate::CodecResult<::std::vec::Vec<u8>> {
                    $crate::to_cbor(self)
                }
            }

            impl $crate::Decode for $ty {
                fn decode(bytes: &[u8]) -> $crate::CodecResult<Self> {
                    $crate::from_cbor(bytes)
                }
            }
        )+
    };
}

cbor_element!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String,
);

impl<T: Serialize> Encode for Vec<T> {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl<T: DeserializeOwned> Decode for Vec<T> {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

impl<T: Serialize> Encode for Option<T> {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl<T: DeserializeOwned> Decode for Option<T> {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

macro_rules! tuple_element {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> Encode for ($($name,)+) {
            fn encode(&self) -> CodecResult<Vec<u8>> {
                to_cbor(self)
            }
        }

        impl<$($name: DeserializeOwned),+> Decode for ($($name,)+) {
            fn decode(bytes: &[u8]) -> CodecResult<Self> {
                from_cbor(bytes)
            }
        }
    };
}

tuple_element!(A, B);
tuple_element!(A, B, C);
