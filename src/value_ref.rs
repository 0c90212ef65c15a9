use std::borrow::Cow;

use num_bigint::BigInt;

use crate::binary::BinaryRef;
use crate::code::Code;
use crate::datetime::DateTime;
use crate::dbref::{DbPointer, DbRef};
use crate::decimal128::Decimal128;
use crate::document::Document;
use crate::oid::ObjectId;
use crate::regexp::Regexp;
use crate::timestamp::Timestamp;
use crate::value::Value;

/// A value borrowed out of a decode buffer (or out of an owned [`Value`]).
///
/// Strings are `Cow` because the non-validating UTF-8 policy substitutes
/// replacement characters for invalid sequences, which forces an owned
/// copy; well-formed input stays borrowed.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueRef<'a> {
    Double(f64),
    Str(Cow<'a, str>),
    Document(DocumentRef<'a>),
    Array(Vec<ValueRef<'a>>),
    Binary(BinaryRef<'a>),
    Bytes(&'a [u8]),
    Undefined,
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Null,
    Regexp(RegexpRef<'a>),
    DbPointer(DbPointerRef<'a>),
    Code(CodeRef<'a>),
    Symbol(Cow<'a, str>),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    BigInt(BigInt),
    Decimal128(Decimal128),
    MinKey,
    MaxKey,
    DbRef(Box<DbRefRef<'a>>),
    RawDocument(&'a [u8]),
    RawArray(&'a [u8]),
}

/// Borrowed document: ordered (key, value) pairs pointing into the buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentRef<'a> {
    pub(crate) entries: Vec<(Cow<'a, str>, ValueRef<'a>)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegexpRef<'a> {
    pub pattern: Cow<'a, str>,
    pub options: Cow<'a, str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeRef<'a> {
    pub code: Cow<'a, str>,
    pub scope: Option<DocumentRef<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DbPointerRef<'a> {
    pub namespace: Cow<'a, str>,
    pub id: ObjectId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DbRefRef<'a> {
    pub collection: Cow<'a, str>,
    pub id: ValueRef<'a>,
    pub db: Option<Cow<'a, str>>,
    pub extra: DocumentRef<'a>,
}

impl<'a> DocumentRef<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ValueRef<'a>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueRef<'a>)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    pub fn to_document(&self) -> Document {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone().into_owned(), v.clone().into_owned()))
            .collect()
    }

    fn into_document(self) -> Document {
        self.entries
            .into_iter()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn from_document(doc: &'a Document) -> DocumentRef<'a> {
        DocumentRef {
            entries: doc
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k), ValueRef::from_value(v)))
                .collect(),
        }
    }
}

impl<'a> ValueRef<'a> {
    /// Copy everything out of the buffer into an owned [`Value`].
    pub fn into_owned(self) -> Value {
        match self {
            ValueRef::Double(v) => Value::Double(v),
            ValueRef::Str(v) => Value::Str(v.into_owned()),
            ValueRef::Document(d) => Value::Document(d.into_document()),
            ValueRef::Array(items) => {
                Value::Array(items.into_iter().map(ValueRef::into_owned).collect())
            }
            ValueRef::Binary(b) => Value::Binary(b.to_binary()),
            ValueRef::Bytes(b) => Value::Bytes(b.to_vec()),
            ValueRef::Undefined => Value::Undefined,
            ValueRef::ObjectId(v) => Value::ObjectId(v),
            ValueRef::Bool(v) => Value::Bool(v),
            ValueRef::DateTime(v) => Value::DateTime(v),
            ValueRef::Null => Value::Null,
            ValueRef::Regexp(r) => Value::Regexp(Regexp::from_parts(
                r.pattern.into_owned(),
                r.options.into_owned(),
            )),
            ValueRef::DbPointer(p) => Value::DbPointer(DbPointer {
                namespace: p.namespace.into_owned(),
                id: p.id,
            }),
            ValueRef::Code(c) => Value::Code(Code {
                code: c.code.into_owned(),
                scope: c.scope.map(DocumentRef::into_document),
            }),
            ValueRef::Symbol(v) => Value::Symbol(v.into_owned()),
            ValueRef::Int32(v) => Value::Int32(v),
            ValueRef::Timestamp(v) => Value::Timestamp(v),
            ValueRef::Int64(v) => Value::Int64(v),
            ValueRef::BigInt(v) => Value::BigInt(v),
            ValueRef::Decimal128(v) => Value::Decimal128(v),
            ValueRef::MinKey => Value::MinKey,
            ValueRef::MaxKey => Value::MaxKey,
            ValueRef::DbRef(r) => Value::DbRef(Box::new(DbRef {
                collection: r.collection.into_owned(),
                id: r.id.into_owned(),
                db: r.db.map(Cow::into_owned),
                extra: r.extra.into_document(),
            })),
            ValueRef::RawDocument(b) => Value::RawDocument(b.to_vec()),
            ValueRef::RawArray(b) => Value::RawArray(b.to_vec()),
        }
    }

    /// Borrowed view of an owned value.
    pub fn from_value(value: &'a Value) -> ValueRef<'a> {
        match value {
            Value::Double(v) => ValueRef::Double(*v),
            Value::Str(v) => ValueRef::Str(Cow::Borrowed(v.as_str())),
            Value::Document(d) => ValueRef::Document(DocumentRef::from_document(d)),
            Value::Array(items) => {
                ValueRef::Array(items.iter().map(ValueRef::from_value).collect())
            }
            Value::Binary(b) => ValueRef::Binary(BinaryRef {
                subtype: b.subtype,
                bytes: &b.bytes,
            }),
            Value::Bytes(b) => ValueRef::Bytes(b),
            Value::Undefined => ValueRef::Undefined,
            Value::ObjectId(v) => ValueRef::ObjectId(*v),
            Value::Bool(v) => ValueRef::Bool(*v),
            Value::DateTime(v) => ValueRef::DateTime(*v),
            Value::Null => ValueRef::Null,
            Value::Regexp(r) => ValueRef::Regexp(RegexpRef {
                pattern: Cow::Borrowed(r.pattern()),
                options: Cow::Borrowed(r.options()),
            }),
            Value::DbPointer(p) => ValueRef::DbPointer(DbPointerRef {
                namespace: Cow::Borrowed(p.namespace.as_str()),
                id: p.id,
            }),
            Value::Code(c) => ValueRef::Code(CodeRef {
                code: Cow::Borrowed(c.code.as_str()),
                scope: c.scope.as_ref().map(DocumentRef::from_document),
            }),
            Value::Symbol(v) => ValueRef::Symbol(Cow::Borrowed(v.as_str())),
            Value::Int32(v) => ValueRef::Int32(*v),
            Value::Timestamp(v) => ValueRef::Timestamp(*v),
            Value::Int64(v) => ValueRef::Int64(*v),
            Value::BigInt(v) => ValueRef::BigInt(v.clone()),
            Value::Decimal128(v) => ValueRef::Decimal128(*v),
            Value::MinKey => ValueRef::MinKey,
            Value::MaxKey => ValueRef::MaxKey,
            Value::DbRef(r) => ValueRef::DbRef(Box::new(DbRefRef {
                collection: Cow::Borrowed(r.collection.as_str()),
                id: ValueRef::from_value(&r.id),
                db: r.db.as_deref().map(Cow::Borrowed),
                extra: DocumentRef::from_document(&r.extra),
            })),
            Value::RawDocument(b) => ValueRef::RawDocument(b),
            Value::RawArray(b) => ValueRef::RawArray(b),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueRef::Str(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&DocumentRef<'a>> {
        match self {
            ValueRef::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ValueRef<'a>]> {
        match self {
            ValueRef::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ValueRef::Int64(v) => Some(v),
            ValueRef::Int32(v) => Some(v as i64),
            _ => None,
        }
    }
}
