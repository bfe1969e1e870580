//! # Canonical serialization format
//!
//! `lcs_codec` is a [`serde`] data format whose output is canonical: two logically equal
//! values of the same type always serialize to the same bytes. The format is not
//! self-describing; the reader must know the type it is decoding into.
//!
//! All integers, including every length, count and discriminant, are little-endian.
//!
//! ```text
//! bool                        u8, 0x00 or 0x01
//! i8 .. i64, u8 .. u64        [u8; width / 8]
//!
//! struct ByteBlob or String {
//!     len:        u32,
//!     body:       [u8; len],
//! }
//!
//! struct Sequence or FixedArray {
//!     count:      u32,
//!     elements:   [T; count],     // FixedArray: count must equal the declared length
//! }
//!
//! struct Map {
//!     count:      u32,
//!     entries:    [(K, V); count], // ascending by the encoded bytes of K
//! }
//!
//! struct Record {
//!     field_0:    F0,             // declaration order, skipped fields omitted
//!     field_1:    F1,
//!     ...
//! }
//!
//! struct Optional {
//!     presence:   u8,             // 0x00 absent, 0x01 present
//!     value:      T,              // iff present
//! }
//!
//! struct TaggedUnion {
//!     discriminant:   u32,
//!     payload:        Record,
//! }
//! ```
//!
//! Shapes map onto Rust types as follows. `Box<T>` and `&T` are transparent.
//! `Option<T>` is the optional shape. `#[serde(skip)]` removes a field from the wire.
//! `[T; N]` and tuples are fixed arrays, while tuple structs are records.
//! Enums are tagged unions whose discriminant is the variant's declaration index,
//! unless declared through [`tagged_union!`] with explicit discriminants.
//!
//! `f32`, `f64`, `char`, `i128` and `u128` are rejected with [`Error::UnsupportedKind`].
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Account {
//!     active: bool,
//!     key: Vec<u8>,
//!     label: String,
//! }
//!
//! let account = Account {
//!     active: true,
//!     key: vec![0x11, 0x22],
//!     label: String::from("hello"),
//! };
//! let bytes = lcs_codec::to_bytes(&account).unwrap();
//! assert_eq!(
//!     bytes,
//!     [0x01, 2, 0, 0, 0, 0x11, 0x22, 5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']
//! );
//! let decoded: Account = lcs_codec::from_bytes(&bytes).unwrap();
//! assert_eq!(account, decoded);
//! ```

pub mod de;
pub mod error;
pub mod limits;
pub mod ser;
pub mod tagged;
pub mod wire;


pub use de::{from_bytes, from_bytes_with_limits, from_reader, Decoder, Deserializer};
pub use error::{Error, Result};
pub use limits::Limits;
pub use ser::{to_bytes, to_writer, Serializer};
pub use tagged::{EnumVariant, TaggedUnion};
