use num_bigint::BigInt;

use crate::binary::Binary;
use crate::code::Code;
use crate::datetime::DateTime;
use crate::dbref::{DbPointer, DbRef};
use crate::decimal128::Decimal128;
use crate::document::Document;
use crate::oid::ObjectId;
use crate::regexp::Regexp;
use crate::tag::ElementType;
use crate::timestamp::Timestamp;
use crate::value_ref::ValueRef;

/// Any value a document entry can hold. One variant per wire kind, plus
/// the convention-level shapes (`DbRef`) and the raw/promoted decode
/// targets (`RawDocument`, `RawArray`, `Bytes`, `BigInt`).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// 64-bit IEEE-754 double. Always encodes with the double tag; for
    /// dynamic numeric input use [`Value::number`].
    Double(f64),
    Str(String),
    Document(Document),
    Array(Vec<Value>),
    Binary(Binary),
    /// A plain blob with no subtype of its own; encodes as generic-subtype
    /// binary. Produced by the buffer-promotion decode option.
    Bytes(Vec<u8>),
    /// Present-but-absent marker. Distinct from a missing key. Encodes
    /// with the null tag (or is dropped entirely, outside arrays, when the
    /// encoder is told to ignore undefined fields).
    Undefined,
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Null,
    Regexp(Regexp),
    DbPointer(DbPointer),
    Code(Code),
    /// Legacy string variant, kept distinct so old payloads round-trip.
    Symbol(String),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    /// Arbitrary-precision integer, produced only by the big-integer
    /// decode mode. Encodes as its low 64 bits, two's complement.
    BigInt(BigInt),
    Decimal128(Decimal128),
    MinKey,
    MaxKey,
    /// Reference triple recognized from a document's `$ref`/`$id`/`$db`
    /// keys. Encodes as its document form.
    DbRef(Box<DbRef>),
    /// An unparsed embedded document, complete with length prefix and
    /// terminator. Splices verbatim on encode.
    RawDocument(Vec<u8>),
    /// An unparsed embedded array region.
    RawArray(Vec<u8>),
}

impl Value {
    /// Classify a dynamically-typed number the way the wire wants it: a
    /// 32-bit integer when the value is integral, inside the 32-bit range,
    /// and not negative zero; a double otherwise. Explicit `Int32`,
    /// `Int64`, and `Double` values bypass this and keep their own tags.
    pub fn number(n: f64) -> Value {
        let integral = n.fract() == 0.0 && n.is_finite();
        let in_range = n >= i32::MIN as f64 && n <= i32::MAX as f64;
        let neg_zero = n == 0.0 && n.is_sign_negative();
        if integral && in_range && !neg_zero {
            Value::Int32(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// The tag this value carries on the wire. `Undefined` reports the
    /// legacy undefined tag even though the encoder writes it as null.
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::Str(_) => ElementType::String,
            Value::Document(_) | Value::DbRef(_) | Value::RawDocument(_) => {
                ElementType::EmbeddedDocument
            }
            Value::Array(_) | Value::RawArray(_) => ElementType::Array,
            Value::Binary(_) | Value::Bytes(_) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Bool(_) => ElementType::Boolean,
            Value::DateTime(_) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::Regexp(_) => ElementType::Regexp,
            Value::DbPointer(_) => ElementType::DbPointer,
            Value::Code(c) => {
                if c.has_wire_scope() {
                    ElementType::CodeWithScope
                } else {
                    ElementType::Code
                }
            }
            Value::Symbol(_) => ElementType::Symbol,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp(_) => ElementType::Timestamp,
            Value::Int64(_) | Value::BigInt(_) => ElementType::Int64,
            Value::Decimal128(_) => ElementType::Decimal128,
            Value::MinKey => ElementType::MinKey,
            Value::MaxKey => ElementType::MaxKey,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int64(v) => Some(v),
            Value::Int32(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            Value::Binary(b) => Some(&b.bytes),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match *self {
            Value::ObjectId(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime> {
        match *self {
            Value::DateTime(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_regexp(&self) -> Option<&Regexp> {
        match self {
            Value::Regexp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&Code> {
        match self {
            Value::Code(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dbref(&self) -> Option<&DbRef> {
        match self {
            Value::DbRef(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match *self {
            Value::Decimal128(v) => Some(v),
            _ => None,
        }
    }

    /// Borrowed view of this value, the zero-copy counterpart type.
    pub fn as_ref(&self) -> ValueRef {
        ValueRef::from_value(self)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::Array(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Value {
        Value::Document(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Value {
        Value::Binary(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Value {
        Value::ObjectId(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Value {
        Value::Timestamp(v)
    }
}

impl From<Decimal128> for Value {
    fn from(v: Decimal128) -> Value {
        Value::Decimal128(v)
    }
}

impl From<Regexp> for Value {
    fn from(v: Regexp) -> Value {
        Value::Regexp(v)
    }
}

impl From<Code> for Value {
    fn from(v: Code) -> Value {
        Value::Code(v)
    }
}

impl From<DbRef> for Value {
    fn from(v: DbRef) -> Value {
        Value::DbRef(Box::new(v))
    }
}

impl From<DbPointer> for Value {
    fn from(v: DbPointer) -> Value {
        Value::DbPointer(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Value {
        Value::BigInt(v)
    }
}
