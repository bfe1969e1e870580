/// Largest byte blob the decoder accepts.
pub const MAX_BYTE_BLOB_LEN: u32 = 100 * 1024 * 1024;

/// Sequences and maps pre-allocate at most this many elements, then grow as elements decode.
pub const PREALLOC_CAP: usize = 100;

/// Resource bounds applied while decoding.
///
/// The bounds guard against hostile length fields. They are not part of the wire format:
/// any input accepted under tighter limits decodes identically under the defaults.
///
/// `max_count` bounds sequence, fixed array and map counts. It defaults to the byte blob
/// ceiling because `Vec<u8>` decodes as a sequence of `u8`, indistinguishable from any
/// other sequence. That default also rejects sequences of zero-sized elements that claim
/// more members, e.g. a `Vec<()>` of 100 MiB + 1; raise `max_count` to accept those.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Limits {
    /// Checked against string and byte blob lengths before the body is read.
    pub max_blob_len: u32,
    /// Checked against element and entry counts before any element is read.
    pub max_count: u32,
    pub prealloc_cap: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_blob_len: MAX_BYTE_BLOB_LEN,
            max_count: MAX_BYTE_BLOB_LEN,
            prealloc_cap: PREALLOC_CAP,
        }
    }
}

impl Limits {
    pub fn with_max_blob_len(self, max_blob_len: u32) -> Self {
        Self {
            max_blob_len,
            ..self
        }
    }

    pub fn with_max_count(self, max_count: u32) -> Self {
        Self { max_count, ..self }
    }

    pub fn with_prealloc_cap(self, prealloc_cap: usize) -> Self {
        Self {
            prealloc_cap,
            ..self
        }
    }

    pub(crate) fn capacity_hint(&self, claimed: usize) -> usize {
        claimed.min(self.prealloc_cap)
    }
}
