use super::helpers::{expect_err, hex, round_trip};
use anyhow::Result;
use itertools::Itertools;
use lcs_codec::Error;
use rand::seq::SliceRandom;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

fn gen_entries() -> Vec<(String, Vec<u32>)> {
    (0..40u32)
        .map(|i| (format!("key{}", i), (0..i % 5).collect()))
        .collect()
}

#[test]
fn maps_ignore_insertion_order() -> Result<()> {
    let mut rand_rng = rand::thread_rng();
    let mut entries = gen_entries();

    let reference = lcs_codec::to_bytes(&entries.iter().cloned().collect::<BTreeMap<_, _>>())?;

    for _ in 0..20 {
        entries.shuffle(&mut rand_rng);

        let hash_map = entries.iter().cloned().collect::<HashMap<_, _>>();
        assert_eq!(reference, lcs_codec::to_bytes(&hash_map)?);
        round_trip(&hash_map)?;

        let btree_map = entries.iter().cloned().collect::<BTreeMap<_, _>>();
        assert_eq!(reference, lcs_codec::to_bytes(&btree_map)?);
    }
    Ok(())
}

#[test]
fn nested_maps_ignore_insertion_order() -> Result<()> {
    let keys = [3u8, 1, 2];

    for perm in keys.iter().permutations(keys.len()) {
        let mut outer = HashMap::new();
        for &k in perm.iter() {
            let inner = perm
                .iter()
                .map(|&&j| (j as u64 * 1000, format!("{}-{}", k, j)))
                .collect::<HashMap<_, _>>();
            outer.insert(*k, inner);
        }

        let serialized = lcs_codec::to_bytes(&outer)?;
        let expected = keys
            .iter()
            .sorted()
            .map(|&k| {
                let inner = keys
                    .iter()
                    .map(|&j| (j as u64 * 1000, format!("{}-{}", k, j)))
                    .collect::<BTreeMap<_, _>>();
                (k, inner)
            })
            .collect::<BTreeMap<_, _>>();
        assert_eq!(lcs_codec::to_bytes(&expected)?, serialized);
        round_trip(&outer)?;
    }
    Ok(())
}

#[test]
fn duplicate_keys_on_decode_keep_the_last() -> Result<()> {
    let bytes = hex("03000000 01 0A 02 14 01 1E");

    let m = lcs_codec::from_bytes::<BTreeMap<u8, u8>>(&bytes)?;
    assert_eq!(m, BTreeMap::from([(1, 30), (2, 20)]));

    let m = lcs_codec::from_bytes::<HashMap<u8, u8>>(&bytes)?;
    assert_eq!(m, HashMap::from([(1, 30), (2, 20)]));
    Ok(())
}

/// Two distinct keys whose encodings collide.
#[derive(PartialEq, Eq, Hash, Debug)]
struct Lossy(u16);
impl Serialize for Lossy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8((self.0 % 256) as u8)
    }
}

#[test]
fn colliding_key_encodings_are_rejected() -> Result<()> {
    let m = HashMap::from([(Lossy(1), true), (Lossy(257), false)]);
    expect_err(lcs_codec::to_bytes(&m), |e| {
        matches!(e, Error::DuplicateMapKey)
    })
}
