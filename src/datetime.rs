use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

/// A UTC datetime, stored as signed milliseconds since the epoch.
///
/// This is the wire representation exactly; no calendar math happens here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    millis: i64,
}

impl DateTime {
    /// Earliest representable datetime.
    pub const MIN: DateTime = DateTime { millis: i64::MIN };
    /// Latest representable datetime.
    pub const MAX: DateTime = DateTime { millis: i64::MAX };

    /// Build from milliseconds since the epoch. Negative values are
    /// datetimes before 1970.
    pub const fn from_millis(millis: i64) -> DateTime {
        DateTime { millis }
    }

    /// Milliseconds since the epoch.
    pub const fn timestamp_millis(&self) -> i64 {
        self.millis
    }

    /// The current time, truncated to millisecond precision.
    pub fn now() -> DateTime {
        SystemTime::now().into()
    }

    /// Convert to a `SystemTime`, saturating at the representable ends.
    pub fn to_system_time(&self) -> SystemTime {
        if self.millis >= 0 {
            UNIX_EPOCH + Duration::from_millis(self.millis as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis(self.millis.unsigned_abs())
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> DateTime {
        let millis = match st.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis().min(i64::MAX as u128) as i64,
            Err(e) => -(e.duration().as_millis().min(i64::MAX as u128) as i64),
        };
        DateTime { millis }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DateTime({}ms)", self.millis)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.millis)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(DateTime::from_millis)
    }
}
