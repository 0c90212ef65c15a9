use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

/// A replication timestamp: an opaque (seconds, increment) counter pair.
///
/// This is not a wall-clock time; it is the internal clock value a
/// replicated log uses to order operations. On the wire it is 8 bytes,
/// little-endian, increment in the low 4 bytes and seconds in the high 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Seconds component (high 32 bits).
    pub seconds: u32,
    /// Ordinal within the second (low 32 bits).
    pub increment: u32,
}

impl Timestamp {
    pub const fn new(seconds: u32, increment: u32) -> Timestamp {
        Timestamp { seconds, increment }
    }

    /// Pack into the combined 64-bit form.
    pub const fn as_u64(&self) -> u64 {
        ((self.seconds as u64) << 32) | self.increment as u64
    }

    /// Unpack from the combined 64-bit form.
    pub const fn from_u64(v: u64) -> Timestamp {
        Timestamp {
            seconds: (v >> 32) as u32,
            increment: v as u32,
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_u64())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Timestamp::from_u64)
    }
}
