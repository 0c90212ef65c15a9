//! serde `Serialize` impls for [`Value`] and [`Document`], the bridge to
//! generic tooling such as `serde_json`. Wire-only detail that the target
//! data model cannot carry (binary subtypes, raw spans) degrades to the
//! nearest generic shape.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::document::Document;
use crate::value::Value;

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Str(v) | Value::Symbol(v) => serializer.serialize_str(v),
            Value::Document(doc) => doc.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Binary(b) => serde_bytes::Bytes::new(&b.bytes).serialize(serializer),
            Value::Bytes(b) => serde_bytes::Bytes::new(b).serialize(serializer),
            Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => {
                serializer.serialize_unit()
            }
            Value::ObjectId(id) => id.serialize(serializer),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::DateTime(dt) => dt.serialize(serializer),
            Value::Regexp(r) => serializer.serialize_str(&r.to_string()),
            Value::DbPointer(p) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("namespace", &p.namespace)?;
                map.serialize_entry("id", &p.id)?;
                map.end()
            }
            Value::Code(c) => match &c.scope {
                Some(scope) => {
                    let mut map = serializer.serialize_map(Some(2))?;
                    map.serialize_entry("code", &c.code)?;
                    map.serialize_entry("scope", scope)?;
                    map.end()
                }
                None => serializer.serialize_str(&c.code),
            },
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::BigInt(n) => serializer.serialize_str(&n.to_string()),
            Value::Decimal128(d) => d.serialize(serializer),
            Value::DbRef(r) => r.to_document().serialize(serializer),
            Value::RawDocument(b) | Value::RawArray(b) => {
                serde_bytes::Bytes::new(b).serialize(serializer)
            }
        }
    }
}
