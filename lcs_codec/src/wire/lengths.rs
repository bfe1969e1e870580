use crate::error::{Error, Result};
use derive_more::{Deref, From};
use std::mem;

#[derive(From, Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct LengthPrefix(u32);
impl LengthPrefix {
    pub fn from_len(len: usize) -> Result<Self> {
        let int = u32::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        Ok(Self(int))
    }
    pub fn from_le_bytes(buf: [u8; mem::size_of::<u32>()]) -> Self {
        Self(u32::from_le_bytes(buf))
    }
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(From, Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Discriminant(u32);
impl Discriminant {
    pub fn from_le_bytes(buf: [u8; mem::size_of::<u32>()]) -> Self {
        Self(u32::from_le_bytes(buf))
    }
}
