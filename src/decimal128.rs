use std::fmt;

use serde::{
    de::{Deserialize, Deserializer, Visitor},
    ser::{Serialize, Serializer},
};

/// A 128-bit decimal floating point value, carried as its 16 raw
/// little-endian wire bytes.
///
/// The codec moves these bytes losslessly; decimal arithmetic and text
/// conversion belong to a numerics layer, not here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    bytes: [u8; 16],
}

impl Decimal128 {
    pub const fn from_bytes(bytes: [u8; 16]) -> Decimal128 {
        Decimal128 { bytes }
    }

    pub const fn bytes(&self) -> [u8; 16] {
        self.bytes
    }
}

impl AsRef<[u8]> for Decimal128 {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Decimal128(0x{})", hex::encode(self.bytes))
    }
}

impl Serialize for Decimal128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Decimal128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecVisitor;
        impl<'de> Visitor<'de> for DecVisitor {
            type Value = Decimal128;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "16 bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let bytes: [u8; 16] = v
                    .try_into()
                    .map_err(|_| E::custom(format!("expected 16 bytes, got {}", v.len())))?;
                Ok(Decimal128::from_bytes(bytes))
            }
        }
        deserializer.deserialize_bytes(DecVisitor)
    }
}
