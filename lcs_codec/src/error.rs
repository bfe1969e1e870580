use serde::{de, ser};
use std::fmt::Display;
use std::io::{self, ErrorKind};
use std::string::FromUtf8Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Leads the message a generic serializer error carries when a union variant has no
/// registered discriminant. [`Error`] recovers the variant from it.
pub(crate) const NO_MATCHING_VARIANT: &str = "no registered discriminant for variant ";

/// Every error aborts the encode or decode call in progress.
/// A partially populated target must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected value {0:#04x} for bool")]
    InvalidBool(u8),

    #[error("unexpected value {0:#04x} for presence flag")]
    InvalidPresenceFlag(u8),

    #[error("length {len} exceeds the ceiling of {max} bytes")]
    OversizedLength { len: u32, max: u32 },

    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("unknown variant {0}")]
    UnknownVariant(String),

    #[error("no registered discriminant for variant {0}")]
    NoMatchingVariant(String),

    #[error("unsupported kind: {0}")]
    UnsupportedKind(&'static str),

    #[error("length {0} does not fit a u32 prefix")]
    LengthOverflow(usize),

    #[error("sequence length must be known before serializing")]
    UnknownLength,

    #[error("map keys encode to identical bytes")]
    DuplicateMapKey,

    #[error("string is not valid utf-8")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("stream ended before the value was complete")]
    ShortStream,

    #[error("unexpected trailing data")]
    TrailingData,

    #[error(transparent)]
    Io(io::Error),

    #[error("{0}")]
    Message(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            ErrorKind::UnexpectedEof => Error::ShortStream,
            _ => Error::Io(e),
        }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        let msg = msg.to_string();
        match msg.strip_prefix(NO_MATCHING_VARIANT) {
            Some(variant) => Error::NoMatchingVariant(variant.to_owned()),
            None => Error::Message(msg),
        }
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    fn unknown_variant(variant: &str, _expected: &'static [&'static str]) -> Self {
        Error::UnknownVariant(variant.to_owned())
    }
}
