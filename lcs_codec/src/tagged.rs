//! Tagged unions with explicit discriminants.
//!
//! A plain `enum` encodes its variant's declaration index as the discriminant. When the wire
//! discriminants are fixed by an external format, the enum is declared through
//! [`tagged_union!`](crate::tagged_union) instead. The macro derives the enum's
//! `Serialize` and `Deserialize` itself and routes both through the registry, so the
//! registered discriminant is used wherever the enum appears: as a field, inside a
//! collection, behind a `Box` or at the root of a message.
//!
//! ```rust
//! use lcs_codec::tagged_union;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Transfer {
//!     amount: u64,
//! }
//!
//! tagged_union! {
//!     #[derive(PartialEq, Debug)]
//!     pub enum Payload {
//!         Transfer(Transfer) = 5,
//!         Halt = 9,
//!     }
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Envelope {
//!     sender: String,
//!     payload: Payload,
//! }
//!
//! let env = Envelope {
//!     sender: String::from("a"),
//!     payload: Payload::Halt,
//! };
//! let bytes = lcs_codec::to_bytes(&env).unwrap();
//! assert_eq!(bytes, [1, 0, 0, 0, b'a', 9, 0, 0, 0]);
//! assert_eq!(env, lcs_codec::from_bytes::<Envelope>(&bytes).unwrap());
//!
//! let root = lcs_codec::to_bytes(&Payload::Transfer(Transfer { amount: 1 })).unwrap();
//! assert_eq!(root, [5, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
//! ```
//!
//! Entries are matched to variants by name, so registration order carries no wire meaning.
//! A hand-written [`TaggedUnion`] impl pairs with `#[serde(remote = "Self")]` on the enum's
//! derives and [`tagged_serde!`](crate::tagged_serde) for the trait impls.

use crate::error::NO_MATCHING_VARIANT;
use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde::ser::{self, Impossible};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

const NOT_AN_ENUM: &str = "tagged union serializer applied to a non-enum value";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EnumVariant {
    /// The variant's name as serde sees it, i.e. after any `#[serde(rename)]`.
    pub name: &'static str,
    pub discriminant: u32,
}

/// A type that declares the wire discriminant of each of its variants.
pub trait TaggedUnion {
    const VARIANTS: &'static [EnumVariant];

    fn discriminant_of(variant: &str) -> Option<u32> {
        Self::VARIANTS
            .iter()
            .find(|entry| entry.name == variant)
            .map(|entry| entry.discriminant)
    }

    fn variant_of(discriminant: u32) -> Option<&'static str> {
        Self::VARIANTS
            .iter()
            .find(|entry| entry.discriminant == discriminant)
            .map(|entry| entry.name)
    }
}

pub const fn distinct_discriminants(variants: &[EnumVariant]) -> bool {
    let mut i = 0;
    while i < variants.len() {
        let mut j = i + 1;
        while j < variants.len() {
            if variants[i].discriminant == variants[j].discriminant {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Declares an enum together with its [`TaggedUnion`] registry and its serde impls.
///
/// Every variant is written as it would be in a plain enum, followed by `= discriminant`.
/// Discriminants are checked for duplicates at compile time. The macro supplies
/// `Serialize` and `Deserialize`, so they must not be derived again, and the calling crate
/// must depend on `serde`.
#[macro_export]
macro_rules! tagged_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident $( ( $($tuple:tt)* ) )? $( { $($fields:tt)* } )? = $disc:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(::serde::Serialize, ::serde::Deserialize)]
        #[serde(remote = "Self")]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant $( ( $($tuple)* ) )? $( { $($fields)* } )?
            ),+
        }

        impl $crate::TaggedUnion for $name {
            const VARIANTS: &'static [$crate::EnumVariant] = &[
                $(
                    $crate::EnumVariant {
                        name: stringify!($variant),
                        discriminant: $disc,
                    }
                ),+
            ];
        }

        const _: () = assert!(
            $crate::tagged::distinct_discriminants(<$name as $crate::TaggedUnion>::VARIANTS),
            "duplicate discriminant in tagged union"
        );

        $crate::tagged_serde!($name);
    };
}

/// Implements `Serialize` and `Deserialize` for a [`TaggedUnion`] enum whose serde derives
/// carry `#[serde(remote = "Self")]`.
#[macro_export]
macro_rules! tagged_serde {
    ($name:ident) => {
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $name::serialize(
                    self,
                    $crate::tagged::TaggedSerializer::<S, $name>::new(serializer),
                )
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $name::deserialize($crate::tagged::TaggedDeserializer::<D, $name>::new(
                    deserializer,
                ))
            }
        }
    };
}

/* Encoding: swap the declaration index for the registered discriminant. */

/// Wraps a serializer and replaces each variant index with `T`'s discriminant for that variant.
pub struct TaggedSerializer<S, T> {
    inner: S,
    _phant: PhantomData<fn(&T)>,
}

impl<S: Serializer, T: TaggedUnion> TaggedSerializer<S, T> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _phant: PhantomData,
        }
    }

    fn discriminant(name: &str, variant: &str) -> Result<u32, S::Error> {
        T::discriminant_of(variant).ok_or_else(|| {
            <S::Error as ser::Error>::custom(format_args!(
                "{}{}::{}",
                NO_MATCHING_VARIANT, name, variant
            ))
        })
    }
}

macro_rules! reject_non_enum {
    ($( fn $method:ident( $($arg:ty),* ) -> $ret:ty; )*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ret, S::Error> {
                Err(<S::Error as ser::Error>::custom(NOT_AN_ENUM))
            }
        )*
    };
}

impl<S: Serializer, T: TaggedUnion> Serializer for TaggedSerializer<S, T> {
    type Ok = S::Ok;
    type Error = S::Error;

    type SerializeSeq = Impossible<S::Ok, S::Error>;
    type SerializeTuple = Impossible<S::Ok, S::Error>;
    type SerializeTupleStruct = Impossible<S::Ok, S::Error>;
    type SerializeTupleVariant = S::SerializeTupleVariant;
    type SerializeMap = Impossible<S::Ok, S::Error>;
    type SerializeStruct = Impossible<S::Ok, S::Error>;
    type SerializeStructVariant = S::SerializeStructVariant;

    reject_non_enum! {
        fn serialize_bool(bool) -> S::Ok;
        fn serialize_i8(i8) -> S::Ok;
        fn serialize_i16(i16) -> S::Ok;
        fn serialize_i32(i32) -> S::Ok;
        fn serialize_i64(i64) -> S::Ok;
        fn serialize_u8(u8) -> S::Ok;
        fn serialize_u16(u16) -> S::Ok;
        fn serialize_u32(u32) -> S::Ok;
        fn serialize_u64(u64) -> S::Ok;
        fn serialize_f32(f32) -> S::Ok;
        fn serialize_f64(f64) -> S::Ok;
        fn serialize_char(char) -> S::Ok;
        fn serialize_str(&str) -> S::Ok;
        fn serialize_bytes(&[u8]) -> S::Ok;
        fn serialize_none() -> S::Ok;
        fn serialize_unit() -> S::Ok;
        fn serialize_unit_struct(&'static str) -> S::Ok;
        fn serialize_seq(Option<usize>) -> Self::SerializeSeq;
        fn serialize_tuple(usize) -> Self::SerializeTuple;
        fn serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct;
        fn serialize_map(Option<usize>) -> Self::SerializeMap;
        fn serialize_struct(&'static str, usize) -> Self::SerializeStruct;
    }

    fn serialize_some<V>(self, _value: &V) -> Result<S::Ok, S::Error>
    where
        V: ?Sized + Serialize,
    {
        Err(<S::Error as ser::Error>::custom(NOT_AN_ENUM))
    }

    fn serialize_newtype_struct<V>(self, _name: &'static str, _value: &V) -> Result<S::Ok, S::Error>
    where
        V: ?Sized + Serialize,
    {
        Err(<S::Error as ser::Error>::custom(NOT_AN_ENUM))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<S::Ok, S::Error> {
        let discriminant = Self::discriminant(name, variant)?;
        self.inner.serialize_unit_variant(name, discriminant, variant)
    }

    fn serialize_newtype_variant<V>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &V,
    ) -> Result<S::Ok, S::Error>
    where
        V: ?Sized + Serialize,
    {
        let discriminant = Self::discriminant(name, variant)?;
        self.inner
            .serialize_newtype_variant(name, discriminant, variant, value)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, S::Error> {
        let discriminant = Self::discriminant(name, variant)?;
        self.inner
            .serialize_tuple_variant(name, discriminant, variant, len)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, S::Error> {
        let discriminant = Self::discriminant(name, variant)?;
        self.inner
            .serialize_struct_variant(name, discriminant, variant, len)
    }

    fn is_human_readable(&self) -> bool {
        self.inner.is_human_readable()
    }
}

/* Decoding: swap the registered discriminant for the variant's name. */

/// Wraps a deserializer and resolves each decoded discriminant through `T`'s registry.
pub struct TaggedDeserializer<D, T> {
    inner: D,
    _phant: PhantomData<fn() -> T>,
}

impl<D, T> TaggedDeserializer<D, T> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            _phant: PhantomData,
        }
    }
}

impl<'de, D: Deserializer<'de>, T: TaggedUnion> Deserializer<'de> for TaggedDeserializer<D, T> {
    type Error = D::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, D::Error> {
        Err(<D::Error as de::Error>::custom(NOT_AN_ENUM))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.inner.deserialize_enum(
            name,
            variants,
            RemapVisitor::<V, T> {
                visitor,
                _phant: PhantomData,
            },
        )
    }

    fn is_human_readable(&self) -> bool {
        self.inner.is_human_readable()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct RemapVisitor<V, T> {
    visitor: V,
    _phant: PhantomData<fn() -> T>,
}

impl<'de, V: Visitor<'de>, T: TaggedUnion> Visitor<'de> for RemapVisitor<V, T> {
    type Value = V::Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.visitor.expecting(formatter)
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<V::Value, A::Error> {
        self.visitor.visit_enum(RemapAccess::<A, T> {
            inner: data,
            _phant: PhantomData,
        })
    }
}

struct RemapAccess<A, T> {
    inner: A,
    _phant: PhantomData<fn() -> T>,
}

impl<'de, A: EnumAccess<'de>, T: TaggedUnion> EnumAccess<'de> for RemapAccess<A, T> {
    type Error = A::Error;
    type Variant = A::Variant;

    fn variant_seed<S>(self, seed: S) -> Result<(S::Value, A::Variant), A::Error>
    where
        S: DeserializeSeed<'de>,
    {
        self.inner.variant_seed(RemapSeed::<S, T> {
            seed,
            _phant: PhantomData,
        })
    }
}

struct RemapSeed<S, T> {
    seed: S,
    _phant: PhantomData<fn() -> T>,
}

impl<'de, S: DeserializeSeed<'de>, T: TaggedUnion> DeserializeSeed<'de> for RemapSeed<S, T> {
    type Value = S::Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<S::Value, D::Error> {
        let discriminant = u32::deserialize(deserializer)?;
        let variant = T::variant_of(discriminant).ok_or_else(|| {
            <D::Error as de::Error>::unknown_variant(&discriminant.to_string(), &[])
        })?;
        let variant: de::value::StrDeserializer<D::Error> = variant.into_deserializer();
        self.seed.deserialize(variant)
    }
}
