//! Fixed-width scalars that frame the variable-width shapes.
//!
//! ```text
//! LengthPrefix    u32     byte length of a blob, or element count of a sequence, array or map
//! Discriminant    u32     registered tag of a tagged-union variant
//! FlagByte        u8      bool value, or presence of an optional value
//! ```

mod flag;
mod lengths;

pub use flag::*;
pub use lengths::*;
