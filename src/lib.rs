//! bindoc is a binary document codec: it turns an ordered, dynamically
//! typed document (nested maps and arrays of heterogeneous values) into a
//! length-prefixed binary form, and reconstructs the document losslessly
//! from those bytes.
//!
//! The codec is three tightly coupled passes over one value grammar:
//!
//! - [`document_size`] computes the exact encoded length of a document
//!   before any buffer exists, so encoding is a single allocation.
//! - [`to_vec`]/[`encode_into`] write tag/key/payload triples into that
//!   buffer, back-patching each (sub)document's 4-byte length prefix once
//!   its terminator is written.
//! - [`from_slice`]/[`from_slice_ref`] parse the bytes back, enforcing
//!   every structural invariant on the way: declared sizes, terminators,
//!   exact consumption, string lengths, and tag validity.
//!
//! Every encoded document starts with its own total length (those 4 bytes
//! included) and ends with a single `0x00`; nested documents are
//! self-contained. Calls are synchronous and share no state, so
//! independent documents may be encoded or decoded concurrently without
//! coordination.
//!
//! ```
//! use bindoc::{doc, DecodeOptions, EncodeOptions, Value};
//!
//! let d = doc! {
//!     "greeting" => "hello",
//!     "count" => 3i32,
//! };
//! let bytes = bindoc::to_vec(&d, &EncodeOptions::new())?;
//! assert_eq!(bytes.len(), bindoc::document_size(&d, &EncodeOptions::new())?);
//!
//! let back = bindoc::from_slice(&bytes, &DecodeOptions::new())?;
//! assert_eq!(back, Value::Document(d));
//! # Ok::<(), bindoc::Error>(())
//! ```

mod macros;

mod binary;
mod code;
mod datetime;
mod dbref;
mod de;
mod decimal128;
mod document;
mod error;
mod oid;
mod options;
mod regexp;
mod ser;
mod tag;
mod timestamp;
mod value;
mod value_ref;

pub mod decode;
pub mod encode;
pub mod size;

pub use self::binary::{Binary, BinaryRef, BinarySubtype};
pub use self::code::Code;
pub use self::datetime::DateTime;
pub use self::dbref::{DbPointer, DbRef};
pub use self::decimal128::Decimal128;
pub use self::decode::{array_from_slice, from_slice, from_slice_ref};
pub use self::document::Document;
pub use self::encode::{encode_into, to_vec};
pub use self::error::{Error, Result};
pub use self::oid::ObjectId;
pub use self::options::{DecodeOptions, EncodeOptions, Utf8Policy};
pub use self::regexp::Regexp;
pub use self::size::document_size;
pub use self::tag::ElementType;
pub use self::timestamp::Timestamp;
pub use self::value::Value;
pub use self::value_ref::{
    CodeRef, DbPointerRef, DbRefRef, DocumentRef, RegexpRef, ValueRef,
};

/// Maximum nesting depth accepted by the size, encode, and decode passes.
/// Exceeding it is [`Error::DepthLimit`], never a stack overflow.
pub const MAX_DEPTH: usize = 128;
