use anyhow::{anyhow, Result};
use lcs_codec::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Parses hex digits, ignoring whitespace, e.g. `"05000000 68656C6C6F"`.
pub fn hex(s: &str) -> Vec<u8> {
    let digits = s.split_whitespace().collect::<String>();
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).unwrap())
        .collect()
}

pub fn verify<T>(value: &T, expected: &str) -> Result<()>
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let expected = hex(expected);
    assert_eq!(expected, lcs_codec::to_bytes(value)?, "\n{:?}\n", value);
    round_trip(value)
}

pub fn round_trip<T>(value: &T) -> Result<()>
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let serialized = lcs_codec::to_bytes(value)?;
    let deserialized = lcs_codec::from_bytes::<T>(&serialized)?;
    assert_eq!(value, &deserialized, "\n{:?}\n", serialized);
    Ok(())
}

/// Succeeds iff `res` failed, and the error satisfies `pred`.
pub fn expect_err<T, F>(res: lcs_codec::Result<T>, pred: F) -> Result<()>
where
    T: Debug,
    F: Fn(&Error) -> bool,
{
    match res {
        Err(ref e) if pred(e) => Ok(()),
        other => Err(anyhow!("Unexpected outcome {:?}", other)),
    }
}
