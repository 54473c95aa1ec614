//! Ordered, keyed container of entities.
//!
//! # Design
//! Entries are `(Key, T)` pairs in insertion order with unique keys.
//! Positional appends take the next integer after the largest integer key,
//! so a collection keyed by remote ids keeps growing past them. Overwriting
//! an existing key keeps the entry's position.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::client::Client;
use crate::entity::Entity;
use crate::error::{OrmError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Key for a JSON value: integers and numeric strings become `Int`.
    fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Number(n) => n.as_i64().map(Key::Int),
            Value::String(s) => Some(match s.parse::<i64>() {
                Ok(n) if n.to_string() == *s => Key::Int(n),
                _ => Key::Str(s.clone()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<(Key, T)>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.items.iter().position(|(k, _)| k == key)
    }

    fn next_index(&self) -> i64 {
        self.items
            .iter()
            .filter_map(|(k, _)| match k {
                Key::Int(n) => Some(*n),
                Key::Str(_) => None,
            })
            .max()
            .map_or(Some(0), |max| max.checked_add(1).map(|n| n.max(0)))
            // i64::MAX is taken: reuse the lowest free non-negative index.
            .unwrap_or_else(|| {
                (0..i64::MAX)
                    .find(|n| self.position(&Key::Int(*n)).is_none())
                    .unwrap_or(i64::MAX)
            })
    }

    /// Append at the next positional index and return that key.
    pub fn add(&mut self, value: T) -> Key {
        let key = Key::Int(self.next_index());
        self.items.push((key.clone(), value));
        key
    }

    /// Insert at an explicit key, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<Key>, value: T) -> Option<T> {
        let key = key.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.items[index].1, value)),
            None => {
                self.items.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&T> {
        let key = key.into();
        self.position(&key).map(|index| &self.items[index].1)
    }

    pub fn get_mut(&mut self, key: impl Into<Key>) -> Option<&mut T> {
        let key = key.into();
        self.position(&key).map(move |index| &mut self.items[index].1)
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.position(&key.into()).is_some()
    }

    pub fn remove(&mut self, key: impl Into<Key>) -> Result<T> {
        let key = key.into();
        match self.position(&key) {
            Some(index) => Ok(self.items.remove(index).1),
            None => Err(OrmError::OffsetMissing(key)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &T)> {
        self.items.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Key, &mut T)> {
        self.items.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn keys(&self) -> Vec<Key> {
        self.items.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<&T> {
        self.items.iter().map(|(_, v)| v).collect()
    }

    pub fn into_values(self) -> Vec<T> {
        self.items.into_iter().map(|(_, v)| v).collect()
    }
}

impl<T> FromIterator<(Key, T)> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = (Key, T)>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for (key, value) in iter {
            collection.insert(key, value);
        }
        collection
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = (Key, T);
    type IntoIter = std::vec::IntoIter<(Key, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Entity> Collection<T> {
    /// Project one field of every entity.
    ///
    /// Entities without `column` are skipped. With `index_key`, an entity's
    /// value for that field becomes its key when it is an integer or a
    /// string; otherwise the next positional index is used.
    pub fn column(&self, column: &str, index_key: Option<&str>) -> Collection<Value> {
        let mut projected = Collection::new();
        for (_, item) in &self.items {
            let mapping = item.to_mapping();
            let Some(value) = mapping.get(column).cloned() else {
                continue;
            };
            match index_key
                .and_then(|name| mapping.get(name))
                .and_then(Key::from_value)
            {
                Some(key) => {
                    projected.insert(key, value);
                }
                None => {
                    projected.add(value);
                }
            }
        }
        projected
    }

    /// Delete the entity remotely, then drop it locally if the remote
    /// delete reported success.
    pub fn delete_remote(&mut self, key: impl Into<Key>, client: &Client) -> Result<bool> {
        let key = key.into();
        let index = self.position(&key).ok_or(OrmError::OffsetMissing(key))?;
        let deleted = self.items[index].1.delete(client)?;
        if deleted {
            self.items.remove(index);
        }
        Ok(deleted)
    }

    /// Save every entity in order, stopping at the first failure.
    pub fn save_all(&mut self, client: &Client) -> Result<&mut Self> {
        for (_, item) in &mut self.items {
            item.save(client)?;
        }
        Ok(self)
    }

    /// Sort by one field. The first entity must carry the field; keys stay
    /// with their entities.
    pub fn sort_by_field(&mut self, field: &str) -> Result<&mut Self> {
        let has_field = self
            .items
            .first()
            .is_some_and(|(_, item)| item.field(field).is_some());
        if !has_field {
            return Err(OrmError::UnknownField(field.to_string()));
        }

        let mut keyed: Vec<(Value, (Key, T))> = self
            .items
            .drain(..)
            .map(|entry| (entry.1.field(field).unwrap_or(Value::Null), entry))
            .collect();
        keyed.sort_by(|a, b| compare_values(&a.0, &b.0));
        self.items = keyed.into_iter().map(|(_, entry)| entry).collect();
        Ok(self)
    }

    /// Nested mapping of every entity under its key; empty when the
    /// collection is empty.
    pub fn to_mapping(&self) -> Map<String, Value> {
        self.items
            .iter()
            .map(|(key, item)| (key.to_string(), Value::Object(item.to_mapping())))
            .collect()
    }

    /// JSON form of the collection; `null` when the collection is empty.
    pub fn to_json(&self) -> Value {
        if self.items.is_empty() {
            Value::Null
        } else {
            Value::Object(self.to_mapping())
        }
    }
}

impl<T: Entity> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Three-way comparison of JSON scalars. Numbers and numeric strings compare
/// numerically, strings lexically; values of unrelated types order by kind.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn numeric(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => x.cmp(y),
        },
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}
