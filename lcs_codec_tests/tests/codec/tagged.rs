use super::helpers::{expect_err, hex, round_trip, verify};
use anyhow::Result;
use lcs_codec::{tagged_union, EnumVariant, Error, TaggedUnion};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct Transfer {
    to: String,
    amount: u64,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct Rotate {
    new_key: [u8; 4],
}

tagged_union! {
    /// Registered out of discriminant order on purpose.
    #[derive(PartialEq, Debug)]
    pub enum Op {
        Transfer(Transfer) = 9,
        Rotate(Rotate) = 2,
        Freeze = 40,
        Limit { daily: u32 } = 0x0100,
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Txn {
    nonce: u64,
    op: Op,
    fallback: Option<Op>,
    boxed: Box<Op>,
}

#[test]
fn registry_lookups() {
    assert_eq!(
        Op::VARIANTS,
        &[
            EnumVariant {
                name: "Transfer",
                discriminant: 9
            },
            EnumVariant {
                name: "Rotate",
                discriminant: 2
            },
            EnumVariant {
                name: "Freeze",
                discriminant: 40
            },
            EnumVariant {
                name: "Limit",
                discriminant: 0x0100
            },
        ]
    );
    assert_eq!(Op::discriminant_of("Freeze"), Some(40));
    assert_eq!(Op::discriminant_of("Thaw"), None);
    assert_eq!(Op::variant_of(0x0100), Some("Limit"));
    assert_eq!(Op::variant_of(3), None);
}

#[test]
fn root_values() -> Result<()> {
    verify(
        &Op::Transfer(Transfer {
            to: String::from("bob"),
            amount: 3,
        }),
        "09000000 03000000 626F62 0300000000000000",
    )?;
    verify(
        &Op::Rotate(Rotate {
            new_key: [1, 2, 3, 4],
        }),
        "02000000 04000000 01020304",
    )?;
    verify(&Op::Freeze, "28000000")?;
    verify(&Op::Limit { daily: 5 }, "00010000 05000000")?;
    verify(&Box::new(Op::Freeze), "28000000")?;
    Ok(())
}

#[test]
fn union_fields() -> Result<()> {
    let txn = Txn {
        nonce: 1,
        op: Op::Freeze,
        fallback: None,
        boxed: Box::new(Op::Limit { daily: 7 }),
    };
    verify(
        &txn,
        "0100000000000000 28000000 00 00010000 07000000",
    )?;

    let txn = Txn {
        nonce: 2,
        op: Op::Limit { daily: 1 },
        fallback: Some(Op::Freeze),
        boxed: Box::new(Op::Freeze),
    };
    verify(
        &txn,
        "0200000000000000 00010000 01000000 01 28000000 28000000",
    )?;
    Ok(())
}

#[test]
fn unions_inside_collections() -> Result<()> {
    verify(
        &vec![Op::Freeze, Op::Limit { daily: 2 }],
        "02000000 28000000 00010000 02000000",
    )?;
    verify(
        &BTreeMap::from([
            (2u8, Op::Freeze),
            (
                1u8,
                Op::Rotate(Rotate {
                    new_key: [9, 9, 9, 9],
                }),
            ),
        ]),
        "02000000 01 02000000 04000000 09090909 02 28000000",
    )?;

    let by_name = HashMap::from([
        (String::from("freeze"), Op::Freeze),
        (String::from("limit"), Op::Limit { daily: 3 }),
    ]);
    round_trip(&by_name)?;
    Ok(())
}

#[test]
fn unknown_discriminants_are_rejected() -> Result<()> {
    let is_unknown = |e: &Error| matches!(e, Error::UnknownVariant(_));

    /* 3 is past the last declaration index and 0 is a declaration index; neither is registered. */
    expect_err(lcs_codec::from_bytes::<Op>(&hex("03000000")), is_unknown)?;
    expect_err(lcs_codec::from_bytes::<Op>(&hex("00000000")), is_unknown)?;
    expect_err(
        lcs_codec::from_bytes::<Txn>(&hex("0100000000000000 01000000")),
        is_unknown,
    )?;
    expect_err(
        lcs_codec::from_bytes::<Vec<Op>>(&hex("01000000 00000000")),
        is_unknown,
    )?;
    Ok(())
}

/// Table listed in the opposite order of the enum.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(remote = "Self")]
enum Reversed {
    A,
    B(u8),
}

impl TaggedUnion for Reversed {
    const VARIANTS: &'static [EnumVariant] = &[
        EnumVariant {
            name: "B",
            discriminant: 7,
        },
        EnumVariant {
            name: "A",
            discriminant: 3,
        },
    ];
}
lcs_codec::tagged_serde!(Reversed);

#[test]
fn registration_order_is_irrelevant() -> Result<()> {
    verify(&Reversed::A, "03000000")?;
    verify(&Reversed::B(1), "07000000 01")?;
    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(remote = "Self")]
enum Partial {
    Known,
    Missing,
}

impl TaggedUnion for Partial {
    const VARIANTS: &'static [EnumVariant] = &[EnumVariant {
        name: "Known",
        discriminant: 1,
    }];
}
lcs_codec::tagged_serde!(Partial);

#[test]
fn unregistered_variants_fail_to_encode() -> Result<()> {
    verify(&Partial::Known, "01000000")?;
    expect_err(lcs_codec::to_bytes(&Partial::Missing), |e| {
        matches!(e, Error::NoMatchingVariant(v) if v == "Partial::Missing")
    })?;
    expect_err(lcs_codec::to_bytes(&vec![Partial::Known, Partial::Missing]), |e| {
        matches!(e, Error::NoMatchingVariant(_))
    })?;
    Ok(())
}

/// Without a registry, the discriminant is the declaration index.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
enum Shape {
    Empty,
    Circle { radius: u32 },
    Polygon(Vec<(i16, i16)>),
}

#[test]
fn plain_enums() -> Result<()> {
    verify(&Shape::Empty, "00000000")?;
    verify(&Shape::Circle { radius: 2 }, "01000000 02000000")?;
    verify(
        &Shape::Polygon(vec![(1, 2)]),
        "02000000 01000000 02000000 0100 0200",
    )?;
    round_trip(&vec![Shape::Empty, Shape::Circle { radius: 9 }])?;

    expect_err(lcs_codec::from_bytes::<Shape>(&hex("03000000")), |e| {
        matches!(e, Error::UnknownVariant(_))
    })?;
    Ok(())
}
