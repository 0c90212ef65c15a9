//! Document encoder.
//!
//! The output buffer is pre-reserved from the size calculator and never
//! resized mid-document. Each (sub)document reserves a 4-byte zero
//! placeholder for its length prefix, writes its body, then back-patches
//! the prefix by absolute offset once the terminator is down.

use num_bigint::{BigInt, Sign};

use crate::binary::BinarySubtype;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::options::EncodeOptions;
use crate::size::{document_size, wire_len};
use crate::tag::ElementType;
use crate::value::Value;
use crate::MAX_DEPTH;

/// Key names that bypass `check_keys`. They are structural markers for the
/// reference-triple convention and for clock metadata, not user data.
const RESERVED_KEYS: &[&str] = &["$ref", "$id", "$db", "$clusterTime"];

/// Encode a document into a freshly allocated, exactly-sized buffer.
pub fn to_vec(doc: &Document, opts: &EncodeOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(document_size(doc, opts)?);
    write_document(&mut buf, doc, opts, 0)?;
    Ok(buf)
}

/// Encode a document appended at the buffer's current end, returning the
/// number of bytes written. On error the buffer is restored to its prior
/// length; no partial document is ever left behind.
pub fn encode_into(buf: &mut Vec<u8>, doc: &Document, opts: &EncodeOptions) -> Result<usize> {
    let start = buf.len();
    match write_document(buf, doc, opts, 0) {
        Ok(()) => Ok(buf.len() - start),
        Err(e) => {
            buf.truncate(start);
            Err(e)
        }
    }
}

fn write_document(
    buf: &mut Vec<u8>,
    doc: &Document,
    opts: &EncodeOptions,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit(MAX_DEPTH));
    }
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    for (key, value) in doc.iter() {
        validate_key(key, opts.check_keys)?;
        write_entry(buf, key, value, opts, depth, false)?;
    }
    buf.push(0);
    patch_len(buf, start, "document")?;
    Ok(())
}

fn write_array(buf: &mut Vec<u8>, items: &[Value], opts: &EncodeOptions, depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit(MAX_DEPTH));
    }
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    let mut key = String::new();
    for (index, value) in items.iter().enumerate() {
        key.clear();
        push_index(&mut key, index);
        // Synthesized index keys are ascii digits, nothing to validate.
        write_entry(buf, &key, value, opts, depth, true)?;
    }
    buf.push(0);
    patch_len(buf, start, "array")?;
    Ok(())
}

fn write_entry(
    buf: &mut Vec<u8>,
    key: &str,
    value: &Value,
    opts: &EncodeOptions,
    depth: usize,
    in_array: bool,
) -> Result<()> {
    if value.is_undefined() && opts.ignore_undefined && !in_array {
        return Ok(());
    }
    // Undefined survives as a null-tagged element so array slots stay
    // aligned and document fields stay present.
    let tag = if value.is_undefined() {
        ElementType::Null
    } else {
        value.element_type()
    };
    buf.push(tag.into_u8());
    buf.extend_from_slice(key.as_bytes());
    buf.push(0);

    match value {
        Value::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Str(s) | Value::Symbol(s) => write_string(buf, s)?,
        Value::Document(d) => write_document(buf, d, opts, depth + 1)?,
        Value::Array(items) => write_array(buf, items, opts, depth + 1)?,
        Value::Binary(b) => {
            let legacy = b.subtype == BinarySubtype::BinaryOld;
            let extra = if legacy { 4 } else { 0 };
            let outer = wire_len(b.bytes.len() + extra, "binary")?;
            write_i32(buf, outer);
            buf.push(b.subtype.into_u8());
            if legacy {
                write_i32(buf, outer - 4);
            }
            buf.extend_from_slice(&b.bytes);
        }
        Value::Bytes(b) => {
            write_i32(buf, wire_len(b.len(), "binary")?);
            buf.push(BinarySubtype::Generic.into_u8());
            buf.extend_from_slice(b);
        }
        Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::ObjectId(id) => buf.extend_from_slice(&id.bytes()),
        Value::Bool(v) => buf.push(*v as u8),
        Value::DateTime(dt) => buf.extend_from_slice(&dt.timestamp_millis().to_le_bytes()),
        Value::Regexp(r) => {
            buf.extend_from_slice(r.pattern().as_bytes());
            buf.push(0);
            buf.extend_from_slice(r.options().as_bytes());
            buf.push(0);
        }
        Value::DbPointer(p) => {
            write_string(buf, &p.namespace)?;
            buf.extend_from_slice(&p.id.bytes());
        }
        Value::Code(c) => match &c.scope {
            Some(scope) if !scope.is_empty() => {
                let start = buf.len();
                buf.extend_from_slice(&[0; 4]);
                write_string(buf, &c.code)?;
                write_document(buf, scope, opts, depth + 1)?;
                patch_len(buf, start, "code with scope")?;
            }
            _ => write_string(buf, &c.code)?,
        },
        Value::Int32(v) => write_i32(buf, *v),
        Value::Timestamp(ts) => buf.extend_from_slice(&ts.as_u64().to_le_bytes()),
        Value::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::BigInt(n) => buf.extend_from_slice(&bigint_low64(n).to_le_bytes()),
        Value::Decimal128(d) => buf.extend_from_slice(&d.bytes()),
        Value::DbRef(r) => write_document(buf, &r.to_document(), opts, depth + 1)?,
        Value::RawDocument(span) => {
            check_raw(span, "raw document")?;
            buf.extend_from_slice(span);
        }
        Value::RawArray(span) => {
            check_raw(span, "raw array")?;
            buf.extend_from_slice(span);
        }
    }
    Ok(())
}

/// `int32 length | utf8 bytes | 0x00`, length counting the terminator.
fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    write_i32(buf, wire_len(s.len() + 1, "string")?);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

fn write_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Back-patch the 4-byte length placeholder at `start` with the span from
/// `start` through the current end of the buffer.
fn patch_len(buf: &mut Vec<u8>, start: usize, step: &'static str) -> Result<()> {
    let len = wire_len(buf.len() - start, step)?;
    buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
    Ok(())
}

fn validate_key(key: &str, check_keys: bool) -> Result<()> {
    if key.as_bytes().contains(&0) {
        return Err(Error::BadKey(key.to_string()));
    }
    if check_keys && !RESERVED_KEYS.contains(&key) {
        if key.starts_with('$') {
            return Err(Error::BadKey(key.to_string()));
        }
        if key.contains('.') {
            return Err(Error::BadKey(key.to_string()));
        }
    }
    Ok(())
}

/// An unparsed span must at least frame itself consistently before it is
/// spliced into the output.
fn check_raw(span: &[u8], what: &'static str) -> Result<()> {
    if span.len() < 5 {
        return Err(Error::BadEncode(format!(
            "{} span of {} bytes is below the 5-byte minimum",
            what,
            span.len()
        )));
    }
    let declared = i32::from_le_bytes([span[0], span[1], span[2], span[3]]);
    if declared < 5 || declared as usize != span.len() {
        return Err(Error::BadEncode(format!(
            "{} span declares {} bytes but holds {}",
            what,
            declared,
            span.len()
        )));
    }
    if span[span.len() - 1] != 0 {
        return Err(Error::BadEncode(format!("{} span is unterminated", what)));
    }
    Ok(())
}

/// Low 64 bits of the integer, two's complement.
fn bigint_low64(n: &BigInt) -> i64 {
    use num_traits::ToPrimitive;
    if let Some(v) = n.to_i64() {
        return v;
    }
    let (sign, digits) = n.to_u64_digits();
    let low = digits.first().copied().unwrap_or(0);
    let low = if sign == Sign::Minus {
        low.wrapping_neg()
    } else {
        low
    };
    low as i64
}

fn push_index(out: &mut String, index: usize) {
    use std::fmt::Write;
    // Writing an integer into a String cannot fail.
    let _ = write!(out, "{}", index);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::binary::Binary;
    use crate::code::Code;
    use crate::datetime::DateTime;
    use crate::dbref::DbRef;
    use crate::oid::ObjectId;
    use crate::regexp::Regexp;
    use crate::timestamp::Timestamp;

    fn one(key: &str, value: impl Into<Value>) -> Document {
        let mut doc = Document::new();
        doc.insert(key, value);
        doc
    }

    #[test]
    fn empty_document() {
        let bytes = to_vec(&Document::new(), &EncodeOptions::new()).unwrap();
        assert_eq!(bytes, [0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn hello_world_exact_bytes() {
        let bytes = to_vec(&one("hello", "world"), &EncodeOptions::new()).unwrap();
        assert_eq!(
            bytes,
            [
                0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00,
                0x00, 0x00, b'w', b'o', b'r', b'l', b'd', 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn integer_tags_at_the_boundary() {
        let opts = EncodeOptions::new();
        let bytes = to_vec(&one("n", Value::number(2147483647.0)), &opts).unwrap();
        assert_eq!(bytes[4], 0x10);
        assert_eq!(bytes.len(), 5 + 1 + 2 + 4);
        let bytes = to_vec(&one("n", Value::number(2147483648.0)), &opts).unwrap();
        assert_eq!(bytes[4], 0x01);
        assert_eq!(bytes.len(), 5 + 1 + 2 + 8);
        let bytes = to_vec(&one("n", Value::number(-0.0)), &opts).unwrap();
        assert_eq!(bytes[4], 0x01);
    }

    #[test]
    fn accented_string_length_field() {
        let bytes = to_vec(&one("s", "\u{e9}"), &EncodeOptions::new()).unwrap();
        // tag, "s", NUL, then the int32 length field: 2 utf8 bytes + NUL = 3
        assert_eq!(&bytes[7..11], &[0x03, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[11..13], "\u{e9}".as_bytes());
        assert_eq!(bytes[13], 0x00);
    }

    #[test]
    fn size_calculator_agrees() {
        let mut doc = Document::new();
        doc.insert("double", 3.25f64);
        doc.insert("text", "liberté");
        doc.insert("int", 17i32);
        doc.insert("long", 1i64 << 40);
        doc.insert("flag", false);
        doc.insert("none", Value::Null);
        doc.insert("gone", Value::Undefined);
        doc.insert("oid", ObjectId::from_bytes([7; 12]));
        doc.insert("when", DateTime::from_millis(1_700_000_000_000));
        doc.insert("ts", Timestamp::new(8, 3));
        doc.insert("re", Regexp::new("^a.*z$", "im").unwrap());
        doc.insert("code", Code::new("return 1;"));
        doc.insert(
            "scoped",
            Code::with_scope("f(x)", one("x", 5i32)),
        );
        doc.insert("bin", Binary::new(BinarySubtype::Uuid, vec![0xAB; 16]));
        doc.insert("old", Binary::new(BinarySubtype::BinaryOld, vec![1, 2]));
        doc.insert("blob", vec![9u8, 8, 7]);
        doc.insert("min", Value::MinKey);
        doc.insert("max", Value::MaxKey);
        doc.insert("arr", vec![Value::Int32(1), Value::Str("two".into())]);
        doc.insert("sub", one("inner", true));
        doc.insert("ref", DbRef::new("things", ObjectId::from_bytes([1; 12])));

        for ignore in [false, true] {
            let opts = EncodeOptions {
                ignore_undefined: ignore,
                ..EncodeOptions::new()
            };
            let bytes = to_vec(&doc, &opts).unwrap();
            assert_eq!(bytes.len(), document_size(&doc, &opts).unwrap());
            // Declared size matches too.
            let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            assert_eq!(declared as usize, bytes.len());
        }
    }

    #[test]
    fn code_with_scope_total_length() {
        let bytes = to_vec(
            &one("c", Code::with_scope("x", one("a", 1i32))),
            &EncodeOptions::new(),
        )
        .unwrap();
        // payload starts after tag + "c" + NUL
        let payload = &bytes[7..bytes.len() - 1];
        let total = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        assert_eq!(total as usize, payload.len());
        // code string length field
        let code_len = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        assert_eq!(code_len, 2);
    }

    #[test]
    fn legacy_binary_inner_length() {
        let bytes = to_vec(
            &one("b", Binary::new(BinarySubtype::BinaryOld, vec![1, 2, 3])),
            &EncodeOptions::new(),
        )
        .unwrap();
        let payload = &bytes[7..bytes.len() - 1];
        let outer = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        assert_eq!(outer, 7);
        assert_eq!(payload[4], 0x02);
        let inner = i32::from_le_bytes([payload[5], payload[6], payload[7], payload[8]]);
        assert_eq!(inner, 3);
        assert_eq!(&payload[9..], &[1, 2, 3]);
    }

    #[test]
    fn check_keys() {
        let opts = EncodeOptions {
            check_keys: true,
            ..EncodeOptions::new()
        };
        assert!(matches!(
            to_vec(&one("$where", 1i32), &opts),
            Err(Error::BadKey(_))
        ));
        assert!(matches!(
            to_vec(&one("a.b", 1i32), &opts),
            Err(Error::BadKey(_))
        ));
        assert!(to_vec(&one("$ref", "ns"), &opts).is_ok());
        assert!(to_vec(&one("$clusterTime", 1i64), &opts).is_ok());
        // Without check_keys both shapes pass, but NUL never does.
        assert!(to_vec(&one("$where", 1i32), &EncodeOptions::new()).is_ok());
        assert!(matches!(
            to_vec(&one("a\0b", 1i32), &EncodeOptions::new()),
            Err(Error::BadKey(_))
        ));
    }

    #[test]
    fn undefined_outside_and_inside_arrays() {
        let opts = EncodeOptions {
            ignore_undefined: true,
            ..EncodeOptions::new()
        };
        let bytes = to_vec(&one("gone", Value::Undefined), &opts).unwrap();
        assert_eq!(bytes, [0x05, 0x00, 0x00, 0x00, 0x00]);
        // Kept and written with the null tag when not ignored.
        let bytes = to_vec(&one("kept", Value::Undefined), &EncodeOptions::new()).unwrap();
        assert_eq!(bytes[4], 0x0A);
        // Array slots always survive.
        let bytes = to_vec(&one("a", vec![Value::Undefined]), &opts).unwrap();
        let array = &bytes[7..bytes.len() - 1];
        assert_eq!(array[4], 0x0A);
        assert_eq!(&array[5..7], &[b'0', 0x00]);
    }

    #[test]
    fn array_index_keys_are_decimal_strings() {
        let items: Vec<Value> = (0..11).map(Value::Int32).collect();
        let bytes = to_vec(&one("a", items), &EncodeOptions::new()).unwrap();
        // Int32 tag followed by the key "10" for the eleventh slot.
        assert!(bytes
            .windows(4)
            .any(|w| w == [0x10, b'1', b'0', 0x00]));
    }

    #[test]
    fn bigint_truncates_to_low_64_bits() {
        let huge = (BigInt::from(1) << 80) + 9;
        let bytes = to_vec(&one("n", Value::BigInt(huge)), &EncodeOptions::new()).unwrap();
        assert_eq!(bytes[4], 0x12);
        let v = i64::from_le_bytes(bytes[7..15].try_into().unwrap());
        assert_eq!(v, 9);
        let bytes = to_vec(
            &one("n", Value::BigInt(BigInt::from(-1))),
            &EncodeOptions::new(),
        )
        .unwrap();
        let v = i64::from_le_bytes(bytes[7..15].try_into().unwrap());
        assert_eq!(v, -1);
    }

    #[test]
    fn encode_into_appends_and_restores_on_error() {
        let mut buf = vec![0xEE, 0xEE];
        let written = encode_into(&mut buf, &one("a", 1i32), &EncodeOptions::new()).unwrap();
        assert_eq!(written, buf.len() - 2);
        assert_eq!(&buf[..2], &[0xEE, 0xEE]);
        assert_eq!(buf[2], written as u8);

        let before = buf.clone();
        let err = encode_into(&mut buf, &one("a\0b", 1i32), &EncodeOptions::new());
        assert!(err.is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn raw_span_framing_is_checked() {
        let good = to_vec(&one("x", 1i32), &EncodeOptions::new()).unwrap();
        let doc = one("raw", Value::RawDocument(good.clone()));
        let bytes = to_vec(&doc, &EncodeOptions::new()).unwrap();
        assert_eq!(&bytes[9..9 + good.len()], good.as_slice());

        let mut bad = good;
        bad[0] ^= 0x01;
        assert!(matches!(
            to_vec(&one("raw", Value::RawDocument(bad)), &EncodeOptions::new()),
            Err(Error::BadEncode(_))
        ));
    }

    #[test]
    fn dbref_encodes_as_its_document_form() {
        let mut r = DbRef::new("things", ObjectId::from_bytes([2; 12])).with_db("main");
        r.extra.insert("note", "x");
        let bytes = to_vec(&one("r", r.clone()), &EncodeOptions::new()).unwrap();
        let direct = to_vec(&one("r", r.to_document()), &EncodeOptions::new()).unwrap();
        assert_eq!(bytes, direct);
    }
}
