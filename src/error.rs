use std::fmt;

use serde::{de, ser};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while sizing, encoding, or decoding documents.
///
/// There is no partial-success mode: when a call returns an error, no
/// bytes were committed and no partially populated document is handed
/// back. Retry policy belongs to whatever layer supplied the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Conflicting or malformed options, caught before any bytes are touched.
    Config(String),
    /// A document key failed encode-side validation (interior NUL, or a
    /// reserved `$`/`.` pattern when key checking was requested).
    BadKey(String),
    /// Nesting exceeded [`MAX_DEPTH`](crate::MAX_DEPTH).
    DepthLimit(usize),
    /// Buffer ended before the bytes needed at `step` were available.
    TooShort {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A length at `step` does not fit the wire's signed 32-bit length
    /// fields, so the value cannot be framed at all.
    TooLong { step: &'static str, actual: usize },
    /// A declared length disagrees with the bytes actually present or
    /// consumed. `declared` is signed because it comes off the wire as a
    /// 32-bit signed field.
    BadSize {
        step: &'static str,
        declared: i64,
        actual: usize,
    },
    /// Document or array is missing its 0x00 terminator byte.
    BadTerminator { offset: usize },
    /// String payload malformed: zero or oversized length field, missing
    /// NUL at the declared end, or invalid UTF-8 under a validating policy.
    BadString(String),
    /// Boolean byte other than 0x00 or 0x01.
    BadBool(u8),
    /// Regular expression rejected: an option flag outside the accepted
    /// set, a NUL byte in the pattern, or a pattern that fails the
    /// requested compile check.
    BadRegex(String),
    /// Element tag byte not recognized by this codec.
    UnknownTag { tag: u8, key: String },
    /// Binary payload malformed: size past the end of the buffer, or a
    /// legacy inner length that disagrees with the outer one.
    BadBinary(String),
    /// Structural problem in the input document during encoding, such as a
    /// raw sub-document span whose framing is inconsistent.
    BadEncode(String),
    /// Occurs when serde serialization or deserialization fails.
    SerdeFail(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref msg) => write!(f, "Bad configuration: {}", msg),
            Error::BadKey(ref key) => write!(f, "Illegal document key {:?}", key),
            Error::DepthLimit(limit) => {
                write!(f, "Document nesting exceeded the depth limit of {}", limit)
            }
            Error::TooShort {
                step,
                expected,
                actual,
            } => write!(
                f,
                "Buffer too short: needed {} bytes but had {} on step [{}]",
                expected, actual, step
            ),
            Error::TooLong { step, actual } => write!(
                f,
                "Length {} exceeds the 32-bit wire limit on step [{}]",
                actual, step
            ),
            Error::BadSize {
                step,
                declared,
                actual,
            } => write!(
                f,
                "Declared size {} disagrees with actual {} on step [{}]",
                declared, actual, step
            ),
            Error::BadTerminator { offset } => {
                write!(f, "Missing 0x00 terminator at offset {}", offset)
            }
            Error::BadString(ref msg) => write!(f, "Bad string: {}", msg),
            Error::BadBool(byte) => write!(f, "Illegal boolean byte 0x{:02x}", byte),
            Error::BadRegex(ref msg) => write!(f, "Bad regular expression: {}", msg),
            Error::UnknownTag { tag, ref key } => {
                write!(f, "Unknown element tag 0x{:02x} for key {:?}", tag, key)
            }
            Error::BadBinary(ref msg) => write!(f, "Bad binary value: {}", msg),
            Error::BadEncode(ref msg) => write!(f, "Encoding failure: {}", msg),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
