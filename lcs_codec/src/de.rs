use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::wire::{Discriminant, FlagByte, LengthPrefix};
use serde::de::{self, DeserializeOwned, DeserializeSeed, Visitor};
use serde::forward_to_deserialize_any;
use std::io::{BufRead, BufReader, Read};
use tracing::{debug, trace};

/// Deserializes a `T` that must span all of `bytes`.
pub fn from_bytes<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_bytes_with_limits(bytes, Limits::default())
}

pub fn from_bytes_with_limits<T>(bytes: &[u8], limits: Limits) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut de = Deserializer::with_limits(bytes, limits);
    let value = T::deserialize(&mut de)?;

    /* An unconsumed byte means `bytes` is not the canonical encoding of any `T`. */
    let trailing = de.r.len();
    if trailing > 0 {
        debug!(offset = de.consumed, trailing, "unexpected trailing data");
        return Err(Error::TrailingData);
    }

    trace!(len = bytes.len(), "decoded value");
    Ok(value)
}

/// Deserializes a `T` that must span the whole stream.
pub fn from_reader<R, T>(r: R) -> Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut dec = Decoder::new(r);
    let value = dec.decode()?;
    if !dec.is_eof()? {
        debug!(offset = dec.consumed(), "unexpected trailing data");
        return Err(Error::TrailingData);
    }
    Ok(value)
}

/// Decodes consecutive values from one stream.
///
/// There is no separator between neighboring values; the caller must know the type of each.
pub struct Decoder<R> {
    de: Deserializer<BufReader<R>>,
}

impl<R: Read> Decoder<R> {
    pub fn new(r: R) -> Self {
        Self::with_limits(r, Limits::default())
    }

    pub fn with_limits(r: R, limits: Limits) -> Self {
        Self {
            de: Deserializer::with_limits(BufReader::new(r), limits),
        }
    }

    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        T::deserialize(&mut self.de)
    }

    /// Peeks at the stream without consuming from it.
    pub fn is_eof(&mut self) -> Result<bool> {
        let buf = self.de.r.fill_buf()?;
        Ok(buf.is_empty())
    }

    pub fn consumed(&self) -> u64 {
        self.de.consumed
    }
}

pub struct Deserializer<R> {
    r: R,
    limits: Limits,
    consumed: u64,
}

impl<R: Read> Deserializer<R> {
    pub fn new(r: R) -> Self {
        Self::with_limits(r, Limits::default())
    }

    pub fn with_limits(r: R, limits: Limits) -> Self {
        Self {
            r,
            limits,
            consumed: 0,
        }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    fn read_bytes<const LEN: usize>(&mut self) -> Result<[u8; LEN]> {
        let mut buf = [0u8; LEN];
        self.r.read_exact(&mut buf)?;
        self.consumed += LEN as u64;
        Ok(buf)
    }

    fn read_flag(&mut self) -> Result<(u8, Option<FlagByte>)> {
        let [byte] = self.read_bytes::<1>()?;
        Ok((byte, FlagByte::parse(byte)))
    }

    /// Reads a length or count prefix, rejecting it before anything it claims is allocated.
    fn read_len(&mut self, max: u32) -> Result<usize> {
        let prefix = LengthPrefix::from_le_bytes(self.read_bytes()?);
        if *prefix > max {
            debug!(
                offset = self.consumed,
                len = *prefix,
                max,
                "length prefix over the ceiling"
            );
            return Err(Error::OversizedLength { len: *prefix, max });
        }
        Ok(prefix.as_usize())
    }

    fn read_count(&mut self) -> Result<usize> {
        self.read_len(self.limits.max_count)
    }

    /// The body buffer grows as bytes arrive, so a short stream never costs the claimed length.
    fn read_blob(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len(self.limits.max_blob_len)?;
        let mut body = vec![];
        (&mut self.r).take(len as u64).read_to_end(&mut body)?;
        self.consumed += body.len() as u64;
        if body.len() != len {
            debug!(offset = self.consumed, len, got = body.len(), "byte blob cut short");
            return Err(Error::ShortStream);
        }
        Ok(body)
    }
}

impl<'de, 'a, R: Read> de::Deserializer<'de> for &'a mut Deserializer<R> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("self-described value"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.read_flag()? {
            (_, Some(flag)) => visitor.visit_bool(flag.into()),
            (byte, None) => {
                debug!(offset = self.consumed, byte, "invalid bool");
                Err(Error::InvalidBool(byte))
            }
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(i8::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(i16::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(i32::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(i64::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_i128<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("i128"))
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(u8::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(u16::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(u32::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(u64::from_le_bytes(self.read_bytes()?))
    }
    fn deserialize_u128<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("u128"))
    }

    fn deserialize_f32<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("f32"))
    }
    fn deserialize_f64<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("f64"))
    }
    fn deserialize_char<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("char"))
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }
    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let body = self.read_blob()?;
        let s = String::from_utf8(body)?;
        visitor.visit_string(s)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }
    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.read_blob()?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.read_flag()? {
            (_, Some(FlagByte::Unset)) => visitor.visit_none(),
            (_, Some(FlagByte::Set)) => visitor.visit_some(self),
            (byte, None) => {
                debug!(offset = self.consumed, byte, "invalid presence flag");
                Err(Error::InvalidPresenceFlag(byte))
            }
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }
    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let count = self.read_count()?;
        visitor.visit_seq(Counted::new(self, count))
    }
    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let count = self.read_count()?;
        if count != len {
            debug!(offset = self.consumed, expected = len, count, "fixed array count mismatch");
            return Err(Error::LengthMismatch {
                expected: len,
                found: count,
            });
        }
        visitor.visit_seq(Counted::new(self, len))
    }
    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(Counted::new(self, len))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let count = self.read_count()?;
        visitor.visit_map(Counted::new(self, count))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(Counted::new(self, fields.len()))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(Enum {
            de: self,
            name,
            variants,
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("identifier"))
    }
    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::UnsupportedKind("ignored value"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Hands out exactly `remaining` members: sequence elements, record fields or map entries.
struct Counted<'a, R> {
    de: &'a mut Deserializer<R>,
    remaining: usize,
}

impl<'a, R> Counted<'a, R> {
    fn new(de: &'a mut Deserializer<R>, remaining: usize) -> Self {
        Self { de, remaining }
    }
}

impl<'de, 'a, R: Read> de::SeqAccess<'de> for Counted<'a, R> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.de.limits.capacity_hint(self.remaining))
    }
}

impl<'de, 'a, R: Read> de::MapAccess<'de> for Counted<'a, R> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.de.limits.capacity_hint(self.remaining))
    }
}

struct Enum<'a, R> {
    de: &'a mut Deserializer<R>,
    name: &'static str,
    variants: &'static [&'static str],
}

impl<'de, 'a, R: Read> de::EnumAccess<'de> for Enum<'a, R> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: DeserializeSeed<'de>,
    {
        let discriminant = Discriminant::from_le_bytes(self.de.read_bytes()?);
        let value = seed.deserialize(DiscriminantDeserializer {
            discriminant,
            name: self.name,
            variants: self.variants,
            offset: self.de.consumed,
        })?;
        Ok((value, self))
    }
}

impl<'de, 'a, R: Read> de::VariantAccess<'de> for Enum<'a, R> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(Counted::new(self.de, len))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(Counted::new(self.de, fields.len()))
    }
}

/// Presents a decoded discriminant to the enum's variant identifier.
///
/// Identifier lookups treat the discriminant as a declaration index and reject indexes past
/// the last variant. Plain integer lookups hand over the raw value, which lets a registry of
/// explicit discriminants (see [`crate::tagged`]) do its own matching.
struct DiscriminantDeserializer {
    discriminant: Discriminant,
    name: &'static str,
    variants: &'static [&'static str],
    offset: u64,
}

impl<'de> de::Deserializer<'de> for DiscriminantDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(*self.discriminant)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let index = *self.discriminant;
        if index as usize >= self.variants.len() {
            debug!(offset = self.offset, enum_name = self.name, index, "unknown variant");
            return Err(Error::UnknownVariant(format!("{}::#{}", self.name, index)));
        }
        visitor.visit_u32(index)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum ignored_any
    }
}
