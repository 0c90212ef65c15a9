//! Exact encoded-size pre-computation.
//!
//! [`document_size`] walks the same branches the encoder walks and returns
//! the exact byte count the encoder will produce under the same options.
//! It performs no writes and no allocation besides the reference-triple
//! document form, so it can run before any output buffer exists.

use crate::binary::BinarySubtype;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::options::EncodeOptions;
use crate::value::Value;
use crate::MAX_DEPTH;

/// Exact number of bytes `encode::to_vec` will produce for this document
/// under these options.
pub fn document_size(doc: &Document, opts: &EncodeOptions) -> Result<usize> {
    doc_size(doc, opts, 0)
}

/// Wire length fields are signed 32-bit. Anything larger cannot be
/// framed and must be rejected, never wrapped.
pub(crate) fn wire_len(len: usize, step: &'static str) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::TooLong { step, actual: len })
}

fn doc_size(doc: &Document, opts: &EncodeOptions, depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit(MAX_DEPTH));
    }
    // 4-byte length prefix + trailing terminator.
    let mut total = 5;
    for (key, value) in doc.iter() {
        total += entry_size(key.len(), value, opts, depth, false)?;
    }
    // Every inner length field is bounded by its document's total, so
    // checking each document total covers strings and binaries too.
    wire_len(total, "document")?;
    Ok(total)
}

fn array_size(items: &[Value], opts: &EncodeOptions, depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit(MAX_DEPTH));
    }
    let mut total = 5;
    for (index, value) in items.iter().enumerate() {
        total += entry_size(index_len(index), value, opts, depth, true)?;
    }
    wire_len(total, "array")?;
    Ok(total)
}

/// Size of one element: tag byte + key cstring + payload. Zero when the
/// entry is an undefined field the options drop (never inside arrays).
fn entry_size(
    key_len: usize,
    value: &Value,
    opts: &EncodeOptions,
    depth: usize,
    in_array: bool,
) -> Result<usize> {
    if value.is_undefined() && opts.ignore_undefined && !in_array {
        return Ok(0);
    }
    let payload = match value {
        Value::Double(_)
        | Value::DateTime(_)
        | Value::Int64(_)
        | Value::BigInt(_)
        | Value::Timestamp(_) => 8,
        Value::Str(s) | Value::Symbol(s) => 4 + s.len() + 1,
        Value::Document(d) => doc_size(d, opts, depth + 1)?,
        Value::Array(items) => array_size(items, opts, depth + 1)?,
        Value::Binary(b) => {
            let legacy = if b.subtype == BinarySubtype::BinaryOld {
                4
            } else {
                0
            };
            4 + 1 + legacy + b.bytes.len()
        }
        Value::Bytes(b) => 4 + 1 + b.len(),
        Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => 0,
        Value::ObjectId(_) => 12,
        Value::Bool(_) => 1,
        Value::Regexp(r) => r.pattern().len() + 1 + r.options().len() + 1,
        Value::DbPointer(p) => 4 + p.namespace.len() + 1 + 12,
        Value::Code(c) => match &c.scope {
            Some(scope) if !scope.is_empty() => {
                4 + 4 + c.code.len() + 1 + doc_size(scope, opts, depth + 1)?
            }
            _ => 4 + c.code.len() + 1,
        },
        Value::Int32(_) => 4,
        Value::Decimal128(_) => 16,
        Value::DbRef(r) => doc_size(&r.to_document(), opts, depth + 1)?,
        Value::RawDocument(b) | Value::RawArray(b) => b.len(),
    };
    Ok(1 + key_len + 1 + payload)
}

/// Decimal digit count of an array index, the synthesized key's length.
fn index_len(mut index: usize) -> usize {
    let mut len = 1;
    while index >= 10 {
        index /= 10;
        len += 1;
    }
    len
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::binary::Binary;

    #[test]
    fn empty_document_is_five_bytes() {
        let opts = EncodeOptions::new();
        assert_eq!(document_size(&Document::new(), &opts).unwrap(), 5);
    }

    #[test]
    fn hello_world() {
        let mut doc = Document::new();
        doc.insert("hello", "world");
        // 4 + (1 + 5 + 1 + 4 + 5 + 1) + 1
        assert_eq!(document_size(&doc, &EncodeOptions::new()).unwrap(), 22);
    }

    #[test]
    fn string_length_counts_utf8_bytes() {
        let mut doc = Document::new();
        doc.insert("s", "\u{e9}");
        // key entry: 1 + 1 + 1, payload: 4 + 2 + 1
        assert_eq!(document_size(&doc, &EncodeOptions::new()).unwrap(), 15);
    }

    #[test]
    fn dropped_undefined_contributes_nothing() {
        let mut doc = Document::new();
        doc.insert("gone", Value::Undefined);
        let mut opts = EncodeOptions::new();
        assert_eq!(document_size(&doc, &opts).unwrap(), 5 + 1 + 4 + 1);
        opts.ignore_undefined = true;
        assert_eq!(document_size(&doc, &opts).unwrap(), 5);
    }

    #[test]
    fn array_slots_keep_undefined() {
        let mut doc = Document::new();
        doc.insert("a", vec![Value::Undefined]);
        let mut opts = EncodeOptions::new();
        opts.ignore_undefined = true;
        // doc frame 5 + entry (1 + 1 + 1) + array frame 5 + slot (1 + 1 + 1)
        assert_eq!(document_size(&doc, &opts).unwrap(), 16);
    }

    #[test]
    fn legacy_binary_adds_inner_length() {
        let mut doc = Document::new();
        doc.insert("b", Binary::new(BinarySubtype::Generic, vec![1, 2, 3]));
        let generic = document_size(&doc, &EncodeOptions::new()).unwrap();
        let mut doc = Document::new();
        doc.insert("b", Binary::new(BinarySubtype::BinaryOld, vec![1, 2, 3]));
        let old = document_size(&doc, &EncodeOptions::new()).unwrap();
        assert_eq!(old, generic + 4);
    }

    #[test]
    fn index_digit_counts() {
        let items: Vec<Value> = (0..12).map(Value::Int32).collect();
        let mut doc = Document::new();
        doc.insert("a", items);
        // indices 0..=9 take one digit, 10 and 11 take two
        let array = 5 + 10 * (1 + 1 + 1 + 4) + 2 * (1 + 2 + 1 + 4);
        assert_eq!(
            document_size(&doc, &EncodeOptions::new()).unwrap(),
            5 + 1 + 1 + 1 + array
        );
    }

    #[test]
    fn lengths_past_the_32_bit_limit_are_rejected() {
        // Multi-gigabyte payloads are impractical to build here; the guard
        // itself is pure arithmetic.
        assert_eq!(wire_len(i32::MAX as usize, "binary").unwrap(), i32::MAX);
        assert_eq!(
            wire_len(i32::MAX as usize + 1, "binary"),
            Err(Error::TooLong {
                step: "binary",
                actual: i32::MAX as usize + 1,
            })
        );
        assert_eq!(
            wire_len(usize::MAX, "document"),
            Err(Error::TooLong {
                step: "document",
                actual: usize::MAX,
            })
        );
    }

    #[test]
    fn nesting_past_limit_is_rejected() {
        let mut doc = Document::new();
        for _ in 0..MAX_DEPTH {
            let mut outer = Document::new();
            outer.insert("d", doc);
            doc = outer;
        }
        assert_eq!(
            document_size(&doc, &EncodeOptions::new()),
            Err(Error::DepthLimit(MAX_DEPTH))
        );
    }
}
