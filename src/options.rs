use std::collections::HashMap;

use crate::error::{Error, Result};

/// Settings consumed by the size calculator and the encoder. Both passes
/// must see the same options or the pre-computed length is wrong.
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Reject keys with a leading `$` or an interior `.`. Keys containing
    /// a NUL byte are always rejected regardless of this setting.
    pub check_keys: bool,
    /// Accepted for call-site parity with older payload producers; code
    /// values already carry their source text, so this changes nothing.
    pub serialize_functions: bool,
    /// Drop `Undefined` entries entirely instead of writing them with the
    /// null tag. Array slots are never dropped.
    pub ignore_undefined: bool,
}

impl EncodeOptions {
    pub fn new() -> EncodeOptions {
        EncodeOptions::default()
    }
}

/// Settings consumed by the decoder.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Byte offset into the buffer at which the document starts.
    pub offset: usize,
    /// Accept a buffer longer than the document's declared size. The
    /// default demands exact equality.
    pub allow_shorter_buffer: bool,
    /// Master switch for the promotions below.
    pub promote_values: bool,
    /// Accepted for parity with producers where 64-bit values need an
    /// explicit wrapper; `i64` is already native here, so this only
    /// participates in the big-integer consistency check.
    pub promote_longs: bool,
    /// Decode 64-bit integers into arbitrary-precision `Value::BigInt`.
    /// Requires `promote_values` and `promote_longs`.
    pub use_big_int64: bool,
    /// Decode binary payloads into plain `Value::Bytes`, dropping the
    /// subtype. Requires `promote_values`.
    pub promote_buffers: bool,
    /// Return regular expressions as the structured pattern/options pair
    /// without checking that the pattern compiles. When off, a pattern
    /// that fails to compile is a decode error.
    pub bson_regexp: bool,
    /// Short-circuit every embedded document and array into an unparsed
    /// `RawDocument`/`RawArray` byte span.
    pub raw_documents: bool,
    /// Keys whose embedded document/array values stay raw, at any depth.
    pub fields_to_keep_raw: Vec<String>,
    /// UTF-8 validation policy for keys and string values.
    pub utf8: Utf8Policy,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            offset: 0,
            allow_shorter_buffer: false,
            promote_values: true,
            promote_longs: true,
            use_big_int64: false,
            promote_buffers: false,
            bson_regexp: false,
            raw_documents: false,
            fields_to_keep_raw: Vec::new(),
            utf8: Utf8Policy::All(true),
        }
    }
}

impl DecodeOptions {
    pub fn new() -> DecodeOptions {
        DecodeOptions::default()
    }

    /// Pre-flight consistency check, run before any bytes are touched.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.use_big_int64 && !(self.promote_values && self.promote_longs) {
            return Err(Error::Config(
                "big-integer decoding requires promote_values and promote_longs".into(),
            ));
        }
        if self.promote_buffers && !self.promote_values {
            return Err(Error::Config(
                "promote_buffers requires promote_values".into(),
            ));
        }
        self.utf8.resolve()?;
        Ok(())
    }
}

/// Whether decoded strings (keys and values) must be valid UTF-8.
///
/// `All` applies one setting everywhere. `Keys` enumerates exceptions: the
/// map must be uniform (every listed key mapped to the same boolean `v`),
/// listed keys get `v` for their whole subtree, and unlisted keys get `!v`.
#[derive(Clone, Debug)]
pub enum Utf8Policy {
    All(bool),
    Keys(HashMap<String, bool>),
}

impl Default for Utf8Policy {
    fn default() -> Utf8Policy {
        Utf8Policy::All(true)
    }
}

impl Utf8Policy {
    /// Resolve to `(default, exceptions)`. The exceptions map, when
    /// present, is keyed lookup for per-subtree overrides.
    pub(crate) fn resolve(&self) -> Result<(bool, Option<&HashMap<String, bool>>)> {
        match self {
            Utf8Policy::All(v) => Ok((*v, None)),
            Utf8Policy::Keys(map) => {
                let mut values = map.values();
                let first = *values
                    .next()
                    .ok_or_else(|| Error::Config("UTF-8 key map cannot be empty".into()))?;
                if values.any(|v| *v != first) {
                    return Err(Error::Config(
                        "UTF-8 key map must be uniformly true or uniformly false".into(),
                    ));
                }
                Ok((!first, Some(map)))
            }
        }
    }
}
