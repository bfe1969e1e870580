use crate::error::{Error, Result};
use crate::wire::{FlagByte, LengthPrefix};
use itertools::Itertools;
use serde::ser::{self, Serialize};
use std::io::Write;
use tracing::trace;

/// Serializes `value` into a fresh buffer.
///
/// A value behind `&`, `Box` or any other transparent owner encodes exactly like the value itself.
pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buf = vec![];
    to_writer(&mut buf, value)?;
    trace!(len = buf.len(), "encoded value");
    Ok(buf)
}

pub fn to_writer<W, T>(w: W, value: &T) -> Result<()>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let mut ser = Serializer::new(w);
    value.serialize(&mut ser)
}

pub struct Serializer<W> {
    w: W,
}

impl<W: Write> Serializer<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let prefix = LengthPrefix::from_len(len)?;
        self.w.write_all(&prefix.to_le_bytes())?;
        Ok(())
    }
    fn write_discriminant(&mut self, discriminant: u32) -> Result<()> {
        self.w.write_all(&discriminant.to_le_bytes())?;
        Ok(())
    }
    fn write_flag(&mut self, flag: FlagByte) -> Result<()> {
        self.w.write_all(&[flag.to_byte()])?;
        Ok(())
    }
    fn write_blob(&mut self, body: &[u8]) -> Result<()> {
        self.write_len(body.len())?;
        self.w.write_all(body)?;
        Ok(())
    }
}

impl<'a, W: Write> ser::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = MapCompound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write_flag(FlagByte::from(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_i16(self, v: i16) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_i32(self, v: i32) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_i64(self, v: i64) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_i128(self, _v: i128) -> Result<()> {
        Err(Error::UnsupportedKind("i128"))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.w.write_all(&[v])?;
        Ok(())
    }
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.w.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn serialize_u128(self, _v: u128) -> Result<()> {
        Err(Error::UnsupportedKind("u128"))
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::UnsupportedKind("f32"))
    }
    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::UnsupportedKind("f64"))
    }
    fn serialize_char(self, _v: char) -> Result<()> {
        Err(Error::UnsupportedKind("char"))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_blob(v.as_bytes())
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_blob(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.write_flag(FlagByte::Unset)
    }
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_flag(FlagByte::Set)?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.write_discriminant(variant_index)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_discriminant(variant_index)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = len.ok_or(Error::UnknownLength)?;
        self.write_len(len)?;
        Ok(Compound::counted(self, len))
    }
    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.write_len(len)?;
        Ok(Compound::counted(self, len))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(Compound::record(self))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.write_discriminant(variant_index)?;
        Ok(Compound::record(self))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapCompound {
            ser: self,
            entries: vec![],
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(Compound::record(self))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.write_discriminant(variant_index)?;
        Ok(Compound::record(self))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Writes the members of a sequence, fixed array or record back to back.
///
/// For sequences and arrays the count prefix is already on the wire, so the number of
/// members actually written must match it.
pub struct Compound<'a, W> {
    ser: &'a mut Serializer<W>,
    expected: Option<usize>,
    written: usize,
}

impl<'a, W: Write> Compound<'a, W> {
    fn counted(ser: &'a mut Serializer<W>, len: usize) -> Self {
        Self {
            ser,
            expected: Some(len),
            written: 0,
        }
    }
    fn record(ser: &'a mut Serializer<W>) -> Self {
        Self {
            ser,
            expected: None,
            written: 0,
        }
    }

    fn member<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)?;
        self.written += 1;
        Ok(())
    }
    fn finish(self) -> Result<()> {
        match self.expected {
            Some(expected) if expected != self.written => Err(Error::LengthMismatch {
                expected,
                found: self.written,
            }),
            _ => Ok(()),
        }
    }
}

impl<'a, W: Write> ser::SerializeSeq for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeTuple for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeTupleVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    /// A field skipped depending on its value would make the layout value-dependent,
    /// which a reader without that value cannot follow.
    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        trace!(field = key, "rejecting conditionally skipped field");
        Err(Error::UnsupportedKind("conditionally skipped field"))
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeStructVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.member(value)
    }
    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        trace!(field = key, "rejecting conditionally skipped field");
        Err(Error::UnsupportedKind("conditionally skipped field"))
    }
    fn end(self) -> Result<()> {
        self.finish()
    }
}

/// Buffers every entry, then emits them ordered by the encoded key bytes.
pub struct MapCompound<'a, W> {
    ser: &'a mut Serializer<W>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pending_key: Option<Vec<u8>>,
}

impl<'a, W: Write> ser::SerializeMap for MapCompound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(to_bytes(key)?);
        Ok(())
    }
    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::Message(String::from("map value without a key")))?;
        let value = to_bytes(value)?;
        self.entries.push((key, value));
        Ok(())
    }
    fn end(self) -> Result<()> {
        let entries = self
            .entries
            .into_iter()
            .sorted_by(|(k0, _), (k1, _)| k0.cmp(k1))
            .collect::<Vec<_>>();
        if entries
            .iter()
            .tuple_windows()
            .any(|((k0, _), (k1, _))| k0 == k1)
        {
            return Err(Error::DuplicateMapKey);
        }

        self.ser.write_len(entries.len())?;
        for (k, v) in entries {
            self.ser.w.write_all(&k)?;
            self.ser.w.write_all(&v)?;
        }
        Ok(())
    }
}
