use std::fmt;
use std::ops::Index;

use crate::value::Value;

/// An ordered sequence of unique (key, value) pairs.
///
/// Insertion order is preserved and is the order entries hit the wire.
/// Re-inserting an existing key replaces the value in place without moving
/// the entry. Every decoded key becomes a plain, independent entry here;
/// no key name is ever special.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

static NULL: Value = Value::Null;

impl Document {
    pub fn new() -> Document {
        Document {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Document {
        Document {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing and returning any previous value under
    /// the same key. A replaced entry keeps its position.
    ///
    /// Uniqueness costs a linear key scan here and in the lookup methods,
    /// so very wide documents pay quadratic time to build one entry at a
    /// time.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, old)) => Some(std::mem::replace(old, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove an entry, returning its value. Later entries shift up.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

/// Missing keys index to null, so lookups chain without panicking.
impl Index<&str> for Document {
    type Output = Value;
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Document {
        let iter = iter.into_iter();
        let mut doc = Document::with_capacity(iter.size_hint().0);
        // Duplicate keys collapse, last value wins.
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, Value)>,
        fn(&'a (String, Value)) -> (&'a String, &'a Value),
    >;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}
