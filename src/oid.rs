use std::fmt;
use std::str::FromStr;

use serde::{
    de::{Deserialize, Deserializer, Visitor},
    ser::{Serialize, Serializer},
};

use crate::error::{Error, Result};

/// A 12-byte object identifier.
///
/// The layout is a 4-byte big-endian creation timestamp (seconds since the
/// epoch), 5 bytes of per-process random data, and a 3-byte big-endian
/// counter. The codec itself treats the value as opaque bytes; the layout
/// only matters to [`ObjectId::new`] and [`ObjectId::timestamp`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Build an ObjectId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { bytes }
    }

    /// The raw 12 bytes.
    pub const fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Parse from the 24-character lowercase or uppercase hex form.
    pub fn from_hex(s: &str) -> Result<ObjectId> {
        if s.len() != 24 {
            return Err(Error::BadString(format!(
                "ObjectId hex string must be 24 characters, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::BadString(format!("ObjectId hex string: {}", e)))?;
        Ok(ObjectId { bytes })
    }

    /// The creation timestamp embedded in the first 4 bytes, as seconds
    /// since the epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// Generate a fresh identifier from the current time, the per-process
    /// random value, and a monotonically increasing counter.
    ///
    /// Panics if the operating system RNG fails while initializing the
    /// per-process state, which is treated the same as running out of
    /// memory.
    #[cfg(feature = "getrandom")]
    pub fn new() -> ObjectId {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::OnceLock;
        use std::time::{SystemTime, UNIX_EPOCH};

        static PROCESS_RANDOM: OnceLock<[u8; 5]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let random = PROCESS_RANDOM.get_or_init(|| {
            let mut buf = [0u8; 5];
            getrandom::getrandom(&mut buf).expect("operating system RNG failure");
            buf
        });
        let counter = COUNTER.get_or_init(|| {
            let mut buf = [0u8; 4];
            getrandom::getrandom(&mut buf).expect("operating system RNG failure");
            AtomicU32::new(u32::from_le_bytes(buf))
        });

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = counter.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(random);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(self.bytes))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ObjectId({})", hex::encode(self.bytes))
    }
}

impl FromStr for ObjectId {
    type Err = Error;
    fn from_str(s: &str) -> Result<ObjectId> {
        ObjectId::from_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.bytes))
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OidVisitor;
        impl<'de> Visitor<'de> for OidVisitor {
            type Value = ObjectId;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "a 24-character hex string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ObjectId::from_hex(v).map_err(|e| E::custom(e))
            }
        }
        deserializer.deserialize_str(OidVisitor)
    }
}
