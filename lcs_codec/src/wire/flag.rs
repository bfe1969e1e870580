use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// The single byte behind both `bool` and the presence flag of an optional value.
/// Only these two bytes are legal; decoders never coerce other values.
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, FromPrimitive, Debug)]
pub enum FlagByte {
    Unset = 0,
    Set = 1,
}

impl FlagByte {
    pub fn parse(byte: u8) -> Option<Self> {
        Self::from_u8(byte)
    }
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl From<bool> for FlagByte {
    fn from(b: bool) -> Self {
        if b {
            FlagByte::Set
        } else {
            FlagByte::Unset
        }
    }
}
impl From<FlagByte> for bool {
    fn from(flag: FlagByte) -> Self {
        flag == FlagByte::Set
    }
}
