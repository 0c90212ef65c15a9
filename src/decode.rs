//! Document decoder.
//!
//! The core parser is borrowing: it produces [`ValueRef`] values whose
//! strings and byte spans point into the input buffer wherever the UTF-8
//! policy allows. [`from_slice`] is the owned wrapper; [`from_slice_ref`]
//! exposes the zero-copy form, whose result lives no longer than the
//! buffer it was decoded from.

use std::borrow::Cow;
use std::collections::HashMap;

use byteorder::{LittleEndian, ReadBytesExt};
use num_bigint::BigInt;

use crate::binary::{BinaryRef, BinarySubtype};
use crate::error::{Error, Result};
use crate::oid::ObjectId;
use crate::options::DecodeOptions;
use crate::tag::ElementType;
use crate::timestamp::Timestamp;
use crate::value::Value;
use crate::value_ref::{
    CodeRef, DbPointerRef, DbRefRef, DocumentRef, RegexpRef, ValueRef,
};
use crate::datetime::DateTime;
use crate::decimal128::Decimal128;
use crate::MAX_DEPTH;

type Entries<'a> = Vec<(Cow<'a, str>, ValueRef<'a>)>;

/// Decode a document into an owned [`Value`]: a `Value::Document`, or a
/// `Value::DbRef` when the root structurally matches the reference-triple
/// convention.
pub fn from_slice(buf: &[u8], opts: &DecodeOptions) -> Result<Value> {
    Ok(from_slice_ref(buf, opts)?.into_owned())
}

/// Zero-copy decode. Strings and raw spans in the result borrow from
/// `buf`.
pub fn from_slice_ref<'a>(buf: &'a [u8], opts: &DecodeOptions) -> Result<ValueRef<'a>> {
    opts.validate()?;
    let (validate, keys) = opts.utf8.resolve()?;
    let region = root_region(buf, opts)?;
    let dec = Decoder { opts, keys };
    let entries = dec.parse_document(region, validate, 0)?;
    Ok(dec.promote(entries))
}

/// Decode-as-array variant: the root document's entries are read as array
/// slots with synthesized index keys.
pub fn array_from_slice(buf: &[u8], opts: &DecodeOptions) -> Result<Vec<Value>> {
    opts.validate()?;
    let (validate, keys) = opts.utf8.resolve()?;
    let region = root_region(buf, opts)?;
    let dec = Decoder { opts, keys };
    let items = dec.parse_array(region, validate, 0)?;
    Ok(items.into_iter().map(ValueRef::into_owned).collect())
}

/// Validate the top-level frame and cut the document's exact span out of
/// the buffer: minimum 5 bytes, sane declared size, terminator in place.
fn root_region<'a>(buf: &'a [u8], opts: &DecodeOptions) -> Result<&'a [u8]> {
    if opts.offset > buf.len() {
        return Err(Error::TooShort {
            step: "start offset",
            expected: opts.offset,
            actual: buf.len(),
        });
    }
    let buf = &buf[opts.offset..];
    if buf.len() < 5 {
        return Err(Error::TooShort {
            step: "document",
            expected: 5,
            actual: buf.len(),
        });
    }
    let declared = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let fits = declared >= 5 && declared as usize <= buf.len();
    let exact = declared as usize == buf.len();
    if !fits || (!opts.allow_shorter_buffer && !exact) {
        return Err(Error::BadSize {
            step: "document",
            declared: declared as i64,
            actual: buf.len(),
        });
    }
    let region = &buf[..declared as usize];
    if region[region.len() - 1] != 0 {
        return Err(Error::BadTerminator {
            offset: opts.offset + region.len() - 1,
        });
    }
    Ok(region)
}

/// Bounds-checked little-endian reader over one document region.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize, step: &'static str) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::TooShort {
                step,
                expected: n,
                actual: self.remaining(),
            });
        }
        Ok(())
    }

    fn read_u8(&mut self, step: &'static str) -> Result<u8> {
        self.need(1, step)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_i32(&mut self, step: &'static str) -> Result<i32> {
        self.need(4, step)?;
        let v = (&self.buf[self.pos..])
            .read_i32::<LittleEndian>()
            .map_err(|_| self.short(4, step))?;
        self.pos += 4;
        Ok(v)
    }

    fn read_i64(&mut self, step: &'static str) -> Result<i64> {
        self.need(8, step)?;
        let v = (&self.buf[self.pos..])
            .read_i64::<LittleEndian>()
            .map_err(|_| self.short(8, step))?;
        self.pos += 8;
        Ok(v)
    }

    fn read_u64(&mut self, step: &'static str) -> Result<u64> {
        self.need(8, step)?;
        let v = (&self.buf[self.pos..])
            .read_u64::<LittleEndian>()
            .map_err(|_| self.short(8, step))?;
        self.pos += 8;
        Ok(v)
    }

    fn read_f64(&mut self, step: &'static str) -> Result<f64> {
        self.need(8, step)?;
        let v = (&self.buf[self.pos..])
            .read_f64::<LittleEndian>()
            .map_err(|_| self.short(8, step))?;
        self.pos += 8;
        Ok(v)
    }

    fn read_bytes(&mut self, n: usize, step: &'static str) -> Result<&'a [u8]> {
        self.need(n, step)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Bytes up to the next NUL, consuming the NUL.
    fn read_cstring(&mut self, step: &'static str) -> Result<&'a [u8]> {
        match self.buf[self.pos..].iter().position(|b| *b == 0) {
            Some(end) => {
                let bytes = &self.buf[self.pos..self.pos + end];
                self.pos += end + 1;
                Ok(bytes)
            }
            None => Err(Error::BadString(format!("unterminated {}", step))),
        }
    }

    /// The full span of an embedded document or array at the cursor,
    /// length prefix and terminator included, after framing checks.
    fn read_span(&mut self, step: &'static str) -> Result<&'a [u8]> {
        let start = self.pos;
        let declared = self.read_i32(step)?;
        let available = self.buf.len() - start;
        if declared < 5 || declared as usize > available {
            return Err(Error::BadSize {
                step,
                declared: declared as i64,
                actual: available,
            });
        }
        let end = start + declared as usize;
        if self.buf[end - 1] != 0 {
            return Err(Error::BadTerminator { offset: end - 1 });
        }
        self.pos = end;
        Ok(&self.buf[start..end])
    }

    fn short(&self, expected: usize, step: &'static str) -> Error {
        Error::TooShort {
            step,
            expected,
            actual: self.remaining(),
        }
    }
}

fn decode_str(bytes: &[u8], validate: bool) -> Result<Cow<str>> {
    if validate {
        std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| Error::BadString(format!("invalid UTF-8: {}", e)))
    } else {
        Ok(String::from_utf8_lossy(bytes))
    }
}

struct Decoder<'o> {
    opts: &'o DecodeOptions,
    keys: Option<&'o HashMap<String, bool>>,
}

impl<'o> Decoder<'o> {
    /// Parse one document span into its entries. The span's framing has
    /// already been checked; here the element loop must consume the span
    /// exactly, ending on the terminator tag.
    fn parse_document<'a>(
        &self,
        span: &'a [u8],
        validate: bool,
        depth: usize,
    ) -> Result<Entries<'a>> {
        if depth >= MAX_DEPTH {
            return Err(Error::DepthLimit(MAX_DEPTH));
        }
        let mut r = Reader::new(span);
        r.pos = 4;
        let mut entries = Entries::new();
        loop {
            let tag = r.read_u8("element tag")?;
            if tag == 0 {
                if r.pos != span.len() {
                    return Err(Error::BadSize {
                        step: "document body",
                        declared: span.len() as i64,
                        actual: r.pos,
                    });
                }
                return Ok(entries);
            }
            let key = decode_str(r.read_cstring("element key")?, validate)?;
            let child = self.child_validate(&key, validate);
            let value = self.read_value(tag, &key, &mut r, child, depth)?;
            entries.push((key, value));
        }
    }

    /// Parse one array span. Wire keys are present but their content is
    /// ignored; slots are numbered by position.
    fn parse_array<'a>(
        &self,
        span: &'a [u8],
        validate: bool,
        depth: usize,
    ) -> Result<Vec<ValueRef<'a>>> {
        if depth >= MAX_DEPTH {
            return Err(Error::DepthLimit(MAX_DEPTH));
        }
        let mut r = Reader::new(span);
        r.pos = 4;
        let mut items = Vec::new();
        loop {
            let tag = r.read_u8("element tag")?;
            if tag == 0 {
                if r.pos != span.len() {
                    return Err(Error::BadSize {
                        step: "array body",
                        declared: span.len() as i64,
                        actual: r.pos,
                    });
                }
                return Ok(items);
            }
            r.read_cstring("array index key")?;
            let key = items.len().to_string();
            let child = self.child_validate(&key, validate);
            let value = self.read_value(tag, &key, &mut r, child, depth)?;
            items.push(value);
        }
    }

    fn read_value<'a>(
        &self,
        tag: u8,
        key: &str,
        r: &mut Reader<'a>,
        validate: bool,
        depth: usize,
    ) -> Result<ValueRef<'a>> {
        let tag = ElementType::from_u8(tag).ok_or_else(|| Error::UnknownTag {
            tag,
            key: key.to_string(),
        })?;
        Ok(match tag {
            ElementType::Double => ValueRef::Double(r.read_f64("double")?),
            ElementType::String => ValueRef::Str(self.read_wire_string(r, validate, "string")?),
            ElementType::EmbeddedDocument => {
                let span = r.read_span("embedded document")?;
                if self.keep_raw(key) {
                    ValueRef::RawDocument(span)
                } else {
                    let entries = self.parse_document(span, validate, depth + 1)?;
                    self.promote(entries)
                }
            }
            ElementType::Array => {
                let span = r.read_span("embedded array")?;
                if self.keep_raw(key) {
                    ValueRef::RawArray(span)
                } else {
                    ValueRef::Array(self.parse_array(span, validate, depth + 1)?)
                }
            }
            ElementType::Binary => self.read_binary(r)?,
            ElementType::Undefined => ValueRef::Undefined,
            ElementType::ObjectId => {
                let bytes = r.read_bytes(12, "object id")?;
                let mut id = [0u8; 12];
                id.copy_from_slice(bytes);
                ValueRef::ObjectId(ObjectId::from_bytes(id))
            }
            ElementType::Boolean => match r.read_u8("boolean")? {
                0 => ValueRef::Bool(false),
                1 => ValueRef::Bool(true),
                byte => return Err(Error::BadBool(byte)),
            },
            ElementType::DateTime => {
                ValueRef::DateTime(DateTime::from_millis(r.read_i64("datetime")?))
            }
            ElementType::Null => ValueRef::Null,
            ElementType::Regexp => {
                let pattern = decode_str(r.read_cstring("regex pattern")?, validate)?;
                let options = decode_str(r.read_cstring("regex options")?, validate)?;
                if !self.opts.bson_regexp {
                    regex::Regex::new(&pattern).map_err(|e| Error::BadRegex(e.to_string()))?;
                }
                ValueRef::Regexp(RegexpRef { pattern, options })
            }
            ElementType::DbPointer => {
                let namespace = self.read_wire_string(r, validate, "dbpointer namespace")?;
                let bytes = r.read_bytes(12, "dbpointer id")?;
                let mut id = [0u8; 12];
                id.copy_from_slice(bytes);
                ValueRef::DbPointer(DbPointerRef {
                    namespace,
                    id: ObjectId::from_bytes(id),
                })
            }
            ElementType::Code => ValueRef::Code(CodeRef {
                code: self.read_wire_string(r, validate, "code")?,
                scope: None,
            }),
            ElementType::Symbol => {
                ValueRef::Symbol(self.read_wire_string(r, validate, "symbol")?)
            }
            ElementType::CodeWithScope => {
                let start = r.pos;
                let total = r.read_i32("code with scope")?;
                let code = self.read_wire_string(r, validate, "code")?;
                let span = r.read_span("code scope")?;
                let entries = self.parse_document(span, validate, depth + 1)?;
                // Too short would clip the scope, too long would clip the
                // enclosing document. Both are fatal.
                let consumed = r.pos - start;
                if total as i64 != consumed as i64 {
                    return Err(Error::BadSize {
                        step: "code with scope",
                        declared: total as i64,
                        actual: consumed,
                    });
                }
                ValueRef::Code(CodeRef {
                    code,
                    scope: Some(DocumentRef { entries }),
                })
            }
            ElementType::Int32 => ValueRef::Int32(r.read_i32("int32")?),
            ElementType::Timestamp => {
                ValueRef::Timestamp(Timestamp::from_u64(r.read_u64("timestamp")?))
            }
            ElementType::Int64 => {
                let v = r.read_i64("int64")?;
                if self.opts.use_big_int64 {
                    ValueRef::BigInt(BigInt::from(v))
                } else {
                    ValueRef::Int64(v)
                }
            }
            ElementType::Decimal128 => {
                let bytes = r.read_bytes(16, "decimal128")?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(bytes);
                ValueRef::Decimal128(Decimal128::from_bytes(raw))
            }
            ElementType::MinKey => ValueRef::MinKey,
            ElementType::MaxKey => ValueRef::MaxKey,
        })
    }

    /// `int32 len | utf8 bytes | 0x00`, the length counting the
    /// terminator. A zero or negative length, a length past the end of the
    /// region, and a missing terminator are all string errors.
    fn read_wire_string<'a>(
        &self,
        r: &mut Reader<'a>,
        validate: bool,
        step: &'static str,
    ) -> Result<Cow<'a, str>> {
        let declared = r.read_i32(step)?;
        if declared <= 0 || declared as usize > r.remaining() {
            return Err(Error::BadString(format!(
                "bad {} length {} with {} bytes left",
                step,
                declared,
                r.remaining()
            )));
        }
        let bytes = r.read_bytes(declared as usize, step)?;
        if bytes[bytes.len() - 1] != 0 {
            return Err(Error::BadString(format!("{} is missing its terminator", step)));
        }
        decode_str(&bytes[..bytes.len() - 1], validate)
    }

    fn read_binary<'a>(&self, r: &mut Reader<'a>) -> Result<ValueRef<'a>> {
        let outer = r.read_i32("binary length")?;
        if outer < 0 {
            return Err(Error::BadBinary(format!("negative length {}", outer)));
        }
        let subtype = BinarySubtype::from_u8(r.read_u8("binary subtype")?);
        let payload = r.read_bytes(outer as usize, "binary payload")?;
        let bytes = if subtype == BinarySubtype::BinaryOld {
            // The deprecated byte-array form carries a redundant inner
            // length that must equal the outer length minus 4, exactly.
            if payload.len() < 4 {
                return Err(Error::BadBinary(format!(
                    "legacy binary of {} bytes cannot hold its inner length",
                    payload.len()
                )));
            }
            let inner = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            if inner as i64 != outer as i64 - 4 {
                return Err(Error::BadBinary(format!(
                    "legacy inner length {} does not match outer length {}",
                    inner, outer
                )));
            }
            &payload[4..]
        } else {
            payload
        };
        if self.opts.promote_buffers {
            Ok(ValueRef::Bytes(bytes))
        } else {
            Ok(ValueRef::Binary(BinaryRef { subtype, bytes }))
        }
    }

    /// Reference-triple promotion: a document whose `$`-prefixed keys are
    /// exactly drawn from `$ref`/`$id`/`$db`, with `$ref` a string and
    /// `$id` present, becomes a `DbRef`. Any other `$`-key keeps it a
    /// plain document. Each document is judged by its own immediate keys.
    fn promote<'a>(&self, entries: Entries<'a>) -> ValueRef<'a> {
        if !dbref_shape(&entries) {
            return ValueRef::Document(DocumentRef { entries });
        }
        let mut collection = None;
        let mut id = None;
        let mut db = None;
        let mut extra = Entries::with_capacity(entries.len());
        for (k, v) in entries {
            if k == "$ref" {
                if let ValueRef::Str(s) = v {
                    collection = Some(s);
                }
            } else if k == "$id" {
                id = Some(v);
            } else if k == "$db" {
                if let ValueRef::Str(s) = v {
                    db = Some(s);
                }
            } else {
                extra.push((k, v));
            }
        }
        match (collection, id) {
            (Some(collection), Some(id)) => ValueRef::DbRef(Box::new(DbRefRef {
                collection,
                id,
                db,
                extra: DocumentRef { entries: extra },
            })),
            _ => ValueRef::Document(DocumentRef { entries: extra }),
        }
    }

    fn keep_raw(&self, key: &str) -> bool {
        self.opts.raw_documents || self.opts.fields_to_keep_raw.iter().any(|k| k == key)
    }

    /// Per-key UTF-8 override: a listed key's setting governs its whole
    /// subtree; unlisted keys inherit.
    fn child_validate(&self, key: &str, current: bool) -> bool {
        match self.keys {
            Some(map) => map.get(key).copied().unwrap_or(current),
            None => current,
        }
    }
}

fn dbref_shape(entries: &Entries<'_>) -> bool {
    let mut has_ref = false;
    let mut has_id = false;
    for (k, v) in entries {
        match k.as_ref() {
            "$ref" => {
                if !matches!(v, ValueRef::Str(_)) {
                    return false;
                }
                has_ref = true;
            }
            "$id" => has_id = true,
            "$db" => {
                if !matches!(v, ValueRef::Str(_)) {
                    return false;
                }
            }
            other if other.starts_with('$') => return false,
            _ => {}
        }
    }
    has_ref && has_id
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::binary::Binary;
    use crate::code::Code;
    use crate::dbref::DbRef;
    use crate::document::Document;
    use crate::encode::to_vec;
    use crate::options::{EncodeOptions, Utf8Policy};
    use crate::regexp::Regexp;

    fn encode(doc: &Document) -> Vec<u8> {
        to_vec(doc, &EncodeOptions::new()).unwrap()
    }

    fn decode_doc(bytes: &[u8], opts: &DecodeOptions) -> Document {
        match from_slice(bytes, opts).unwrap() {
            Value::Document(doc) => doc,
            other => panic!("expected a document, got {:?}", other),
        }
    }

    #[test]
    fn empty_document() {
        let doc = decode_doc(&[0x05, 0, 0, 0, 0], &DecodeOptions::new());
        assert!(doc.is_empty());
    }

    #[test]
    fn hello_world() {
        let bytes = [
            0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00, 0x00,
            0x00, b'w', b'o', b'r', b'l', b'd', 0x00, 0x00,
        ];
        let doc = decode_doc(&bytes, &DecodeOptions::new());
        assert_eq!(doc["hello"], Value::Str("world".into()));
    }

    #[test]
    fn round_trip() {
        let mut inner = Document::new();
        inner.insert("deep", vec![Value::Null, Value::Bool(true)]);
        let mut scope = Document::new();
        scope.insert("x", 2i32);
        let mut doc = Document::new();
        doc.insert("double", -1.5f64);
        doc.insert("text", "caf\u{e9}");
        doc.insert("i32", -7i32);
        doc.insert("i64", (1i64 << 40) + 3);
        doc.insert("flag", true);
        doc.insert("nothing", Value::Null);
        doc.insert("oid", ObjectId::from_bytes([3; 12]));
        doc.insert("when", DateTime::from_millis(-5));
        doc.insert("ts", Timestamp::new(100, 2));
        doc.insert("re", Regexp::new("^x", "is").unwrap());
        doc.insert("sym", Value::Symbol("legacy".into()));
        doc.insert("code", Code::new("f()"));
        doc.insert("scoped", Code::with_scope("g()", scope));
        doc.insert("bin", Binary::new(BinarySubtype::UserDefined(0x85), vec![1, 2]));
        doc.insert("old", Binary::new(BinarySubtype::BinaryOld, vec![9]));
        doc.insert("dec", Decimal128::from_bytes([0x11; 16]));
        doc.insert("min", Value::MinKey);
        doc.insert("max", Value::MaxKey);
        doc.insert("sub", inner);
        doc.insert(
            "ref",
            DbRef::new("things", ObjectId::from_bytes([4; 12])).with_db("main"),
        );

        let bytes = encode(&doc);
        let back = decode_doc(&bytes, &DecodeOptions::new());
        assert_eq!(back, doc);
    }

    #[test]
    fn decode_is_idempotent() {
        let mut doc = Document::new();
        doc.insert("a", vec![Value::Int32(1), Value::Str("x".into())]);
        let bytes = encode(&doc);
        let opts = DecodeOptions::new();
        assert_eq!(
            from_slice(&bytes, &opts).unwrap(),
            from_slice(&bytes, &opts).unwrap()
        );
    }

    #[test]
    fn declared_size_must_match_exactly_by_default() {
        let mut bytes = encode(&Document::new());
        bytes.push(0xAA);
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadSize { .. })
        ));
        let opts = DecodeOptions {
            allow_shorter_buffer: true,
            ..DecodeOptions::new()
        };
        assert!(from_slice(&bytes, &opts).is_ok());
    }

    #[test]
    fn truncated_and_undersized_buffers() {
        assert!(matches!(
            from_slice(&[5, 0], &DecodeOptions::new()),
            Err(Error::TooShort { .. })
        ));
        // Declared size larger than the buffer.
        assert!(matches!(
            from_slice(&[9, 0, 0, 0, 0], &DecodeOptions::new()),
            Err(Error::BadSize { .. })
        ));
        // Declared size below the minimum.
        assert!(matches!(
            from_slice(&[3, 0, 0, 0, 0], &DecodeOptions::new()),
            Err(Error::BadSize { .. })
        ));
    }

    #[test]
    fn missing_terminator() {
        assert!(matches!(
            from_slice(&[5, 0, 0, 0, 1], &DecodeOptions::new()),
            Err(Error::BadTerminator { offset: 4 })
        ));
    }

    #[test]
    fn early_terminator_is_corrupt() {
        let mut doc = Document::new();
        doc.insert("a", 1i32);
        let mut bytes = encode(&doc);
        // Overwrite the element tag with the end-of-document marker.
        bytes[4] = 0;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadSize {
                step: "document body",
                ..
            })
        ));
    }

    #[test]
    fn array_length_mismatch_is_corrupt() {
        let mut doc = Document::new();
        doc.insert("a", vec![Value::Int32(1), Value::Int32(2)]);
        let mut bytes = encode(&doc);
        // The array span starts at 7; plant an early terminator where the
        // second slot's tag should be.
        let first_slot_end = 7 + 4 + 1 + 2 + 4;
        bytes[first_slot_end] = 0;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadSize {
                step: "array body",
                ..
            })
        ));
    }

    #[test]
    fn bad_string_lengths() {
        let mut doc = Document::new();
        doc.insert("s", "hi");
        let mut bytes = encode(&doc);
        // length field of the string payload sits after tag + "s\0"
        bytes[7] = 0;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadString(_))
        ));
        bytes[7] = 100;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadString(_))
        ));
    }

    #[test]
    fn illegal_boolean_byte() {
        let mut doc = Document::new();
        doc.insert("b", true);
        let mut bytes = encode(&doc);
        bytes[7] = 2;
        assert_eq!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadBool(2))
        );
    }

    #[test]
    fn unknown_tag() {
        let mut doc = Document::new();
        doc.insert("k", 1i32);
        let mut bytes = encode(&doc);
        bytes[4] = 0x20;
        assert_eq!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::UnknownTag {
                tag: 0x20,
                key: "k".into()
            })
        );
    }

    #[test]
    fn legacy_binary_inner_length_must_agree() {
        let mut doc = Document::new();
        doc.insert("b", Binary::new(BinarySubtype::BinaryOld, vec![1, 2, 3]));
        let mut bytes = encode(&doc);
        // inner length field sits after tag + "b\0" + outer(4) + subtype(1)
        bytes[12] = 5;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadBinary(_))
        ));
    }

    #[test]
    fn code_with_scope_size_arithmetic() {
        let mut scope = Document::new();
        scope.insert("a", 1i32);
        let mut doc = Document::new();
        doc.insert("c", Code::with_scope("x", scope));
        let good = encode(&doc);
        assert!(from_slice(&good, &DecodeOptions::new()).is_ok());
        for delta in [-1i32, 1] {
            let mut bytes = good.clone();
            // total-size field of the code-with-scope payload
            let total = i32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) + delta;
            bytes[7..11].copy_from_slice(&total.to_le_bytes());
            assert!(
                matches!(
                    from_slice(&bytes, &DecodeOptions::new()),
                    Err(Error::BadSize {
                        step: "code with scope",
                        ..
                    }) | Err(Error::BadSize { step: "code scope", .. })
                        | Err(Error::BadString(_))
                ),
                "delta {} was accepted",
                delta
            );
        }
    }

    #[test]
    fn utf8_validation_modes() {
        let mut doc = Document::new();
        doc.insert("s", "ok");
        let mut bytes = encode(&doc);
        bytes[11] = 0xFF;
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadString(_))
        ));
        let opts = DecodeOptions {
            utf8: Utf8Policy::All(false),
            ..DecodeOptions::new()
        };
        let doc = decode_doc(&bytes, &opts);
        assert_eq!(doc["s"], Value::Str("\u{fffd}k".into()));
    }

    #[test]
    fn utf8_key_map_lists_exceptions() {
        let mut sub = Document::new();
        sub.insert("inner", "xx");
        let mut doc = Document::new();
        doc.insert("loose", sub.clone());
        doc.insert("strict", sub);
        let mut bytes = encode(&doc);
        // Corrupt both "xx" payloads.
        let mut corrupted = 0;
        for i in 0..bytes.len() - 1 {
            if &bytes[i..i + 2] == b"xx" {
                bytes[i] = 0xFF;
                corrupted += 1;
            }
        }
        assert_eq!(corrupted, 2);

        let mut map = HashMap::new();
        map.insert("loose".to_string(), false);
        let opts = DecodeOptions {
            utf8: Utf8Policy::Keys(map),
            ..DecodeOptions::new()
        };
        // "strict" is unlisted, so it gets the inverse of the map value
        // and fails on the bad byte first.
        assert!(matches!(
            from_slice(&bytes, &opts),
            Err(Error::BadString(_))
        ));

        let mut map = HashMap::new();
        map.insert("loose".to_string(), false);
        map.insert("strict".to_string(), false);
        let opts = DecodeOptions {
            utf8: Utf8Policy::Keys(map),
            ..DecodeOptions::new()
        };
        let doc = decode_doc(&bytes, &opts);
        let strict = doc["strict"].as_document().unwrap();
        assert_eq!(strict["inner"], Value::Str("\u{fffd}x".into()));
    }

    #[test]
    fn dbref_promotion() {
        let mut doc = Document::new();
        doc.insert("$ref", "ns");
        doc.insert("$id", 1i32);
        let value = from_slice(&encode(&doc), &DecodeOptions::new()).unwrap();
        match value {
            Value::DbRef(r) => {
                assert_eq!(r.collection, "ns");
                assert_eq!(r.id, Value::Int32(1));
                assert_eq!(r.db, None);
                assert!(r.extra.is_empty());
            }
            other => panic!("expected a DbRef, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_dollar_key_blocks_promotion() {
        let mut doc = Document::new();
        doc.insert("$ref", "ns");
        doc.insert("$weird", 1i32);
        let back = decode_doc(&encode(&doc), &DecodeOptions::new());
        assert_eq!(back, doc);
    }

    #[test]
    fn dbref_needs_a_string_ref_and_db() {
        let mut doc = Document::new();
        doc.insert("$ref", 1i32);
        doc.insert("$id", 2i32);
        assert_eq!(decode_doc(&encode(&doc), &DecodeOptions::new()), doc);

        let mut doc = Document::new();
        doc.insert("$ref", "ns");
        doc.insert("$id", 2i32);
        doc.insert("$db", 3i32);
        assert_eq!(decode_doc(&encode(&doc), &DecodeOptions::new()), doc);
    }

    #[test]
    fn dbref_extra_fields_survive() {
        let mut doc = Document::new();
        doc.insert("$ref", "ns");
        doc.insert("$id", "k");
        doc.insert("$db", "main");
        doc.insert("note", "hi");
        let value = from_slice(&encode(&doc), &DecodeOptions::new()).unwrap();
        match value {
            Value::DbRef(r) => {
                assert_eq!(r.db.as_deref(), Some("main"));
                assert_eq!(r.extra["note"], Value::Str("hi".into()));
            }
            other => panic!("expected a DbRef, got {:?}", other),
        }
    }

    #[test]
    fn nested_dbref_promotion() {
        let mut doc = Document::new();
        doc.insert("link", DbRef::new("ns", 5i32));
        let back = decode_doc(&encode(&doc), &DecodeOptions::new());
        assert_eq!(back, doc);
    }

    #[test]
    fn promote_buffers() {
        let mut doc = Document::new();
        doc.insert("b", Binary::new(BinarySubtype::Uuid, vec![7; 16]));
        let opts = DecodeOptions {
            promote_buffers: true,
            ..DecodeOptions::new()
        };
        let back = decode_doc(&encode(&doc), &opts);
        assert_eq!(back["b"], Value::Bytes(vec![7; 16]));
    }

    #[test]
    fn big_int64_mode() {
        let mut doc = Document::new();
        doc.insert("n", -42i64);
        let opts = DecodeOptions {
            use_big_int64: true,
            ..DecodeOptions::new()
        };
        let back = decode_doc(&encode(&doc), &opts);
        assert_eq!(back["n"], Value::BigInt(BigInt::from(-42)));
    }

    #[test]
    fn raw_passthrough() {
        let mut sub = Document::new();
        sub.insert("x", 1i32);
        let mut doc = Document::new();
        doc.insert("sub", sub.clone());
        doc.insert("arr", vec![Value::Int32(9)]);
        let bytes = encode(&doc);

        let opts = DecodeOptions {
            raw_documents: true,
            ..DecodeOptions::new()
        };
        let back = decode_doc(&bytes, &opts);
        match (&back["sub"], &back["arr"]) {
            (Value::RawDocument(d), Value::RawArray(a)) => {
                assert_eq!(d, &encode(&sub));
                assert_eq!(a[a.len() - 1], 0);
                assert_eq!(
                    i32::from_le_bytes([a[0], a[1], a[2], a[3]]) as usize,
                    a.len()
                );
            }
            other => panic!("expected raw spans, got {:?}", other),
        }

        let opts = DecodeOptions {
            fields_to_keep_raw: vec!["sub".to_string()],
            ..DecodeOptions::new()
        };
        let back = decode_doc(&bytes, &opts);
        assert!(matches!(back["sub"], Value::RawDocument(_)));
        assert!(matches!(back["arr"], Value::Array(_)));
    }

    #[test]
    fn raw_spans_round_trip() {
        let mut sub = Document::new();
        sub.insert("x", 1i32);
        let mut doc = Document::new();
        doc.insert("sub", sub);
        let bytes = encode(&doc);
        let opts = DecodeOptions {
            raw_documents: true,
            ..DecodeOptions::new()
        };
        let raw = decode_doc(&bytes, &opts);
        assert_eq!(encode(&raw), bytes);
    }

    #[test]
    fn start_offset() {
        let mut doc = Document::new();
        doc.insert("k", 3i32);
        let mut bytes = vec![0xDE, 0xAD, 0xBE];
        let body = encode(&doc);
        bytes.extend_from_slice(&body);
        let opts = DecodeOptions {
            offset: 3,
            ..DecodeOptions::new()
        };
        assert_eq!(decode_doc(&bytes, &opts), doc);
    }

    #[test]
    fn decode_as_array() {
        let mut doc = Document::new();
        doc.insert("0", 1i32);
        doc.insert("1", "two");
        let items = array_from_slice(&encode(&doc), &DecodeOptions::new()).unwrap();
        assert_eq!(items, vec![Value::Int32(1), Value::Str("two".into())]);
    }

    #[test]
    fn regex_compile_check() {
        let mut doc = Document::new();
        doc.insert("re", Regexp::from_parts("(unclosed".into(), String::new()));
        let bytes = encode(&doc);
        assert!(matches!(
            from_slice(&bytes, &DecodeOptions::new()),
            Err(Error::BadRegex(_))
        ));
        let opts = DecodeOptions {
            bson_regexp: true,
            ..DecodeOptions::new()
        };
        let back = decode_doc(&bytes, &opts);
        assert_eq!(back["re"].as_regexp().unwrap().pattern(), "(unclosed");
    }

    #[test]
    fn undefined_tag_decodes() {
        // Built by hand; the encoder never emits tag 0x06 itself.
        let bytes = [0x08, 0, 0, 0, 0x06, b'u', 0, 0];
        let doc = decode_doc(&bytes, &DecodeOptions::new());
        assert_eq!(doc["u"], Value::Undefined);
    }

    #[test]
    fn nesting_past_limit_is_rejected() {
        let mut body = vec![5u8, 0, 0, 0, 0];
        for _ in 0..=MAX_DEPTH {
            let mut outer = Vec::with_capacity(body.len() + 8);
            outer.extend_from_slice(&(body.len() as i32 + 8).to_le_bytes());
            outer.push(0x03);
            outer.extend_from_slice(b"d\0");
            outer.extend_from_slice(&body);
            outer.push(0);
            body = outer;
        }
        assert_eq!(
            from_slice(&body, &DecodeOptions::new()),
            Err(Error::DepthLimit(MAX_DEPTH))
        );
    }

    #[test]
    fn randomized_round_trip_and_size() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xB1_D0C);
        let enc = EncodeOptions::new();
        let dec = DecodeOptions {
            promote_buffers: true,
            ..DecodeOptions::new()
        };
        for _ in 0..256 {
            let mut doc = Document::new();
            for i in 0..rng.gen_range(0..8) {
                let value = match rng.gen_range(0..6) {
                    0 => Value::Int32(rng.gen()),
                    1 => Value::Int64(rng.gen()),
                    2 => Value::Double(rng.gen_range(-1.0e9..1.0e9)),
                    3 => Value::Bool(rng.gen()),
                    4 => Value::Str(format!("s{:x}", rng.gen::<u64>())),
                    _ => Value::Bytes((0..rng.gen_range(0..16)).map(|_| rng.gen()).collect()),
                };
                doc.insert(format!("k{}", i), value);
            }
            let bytes = to_vec(&doc, &enc).unwrap();
            assert_eq!(bytes.len(), crate::size::document_size(&doc, &enc).unwrap());
            assert_eq!(decode_doc(&bytes, &dec), doc);
        }
    }

    #[test]
    fn zero_copy_borrows() {
        let mut doc = Document::new();
        doc.insert("s", "borrowed");
        let bytes = encode(&doc);
        let value = from_slice_ref(&bytes, &DecodeOptions::new()).unwrap();
        match &value {
            ValueRef::Document(d) => match d.get("s").unwrap() {
                ValueRef::Str(Cow::Borrowed(s)) => assert_eq!(*s, "borrowed"),
                other => panic!("expected a borrowed string, got {:?}", other),
            },
            other => panic!("expected a document, got {:?}", other),
        }
    }
}
