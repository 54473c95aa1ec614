//! Wire DTOs for the list operations.
//!
//! The vendor is loose about id types: the same field arrives as `"42"` from
//! one method and `42` from another, so ids decode through `IdValue`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Str(String),
}

impl IdValue {
    /// Integer value of the id; non-numeric strings read as 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            IdValue::Int(id) => *id,
            IdValue::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

impl Default for IdValue {
    fn default() -> Self {
        IdValue::Int(0)
    }
}

/// One record of a `getLists` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    #[serde(default)]
    pub id: IdValue,
    #[serde(default)]
    pub title: String,
}

/// The `createList` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedList {
    #[serde(default)]
    pub id: Option<IdValue>,
}

impl CreatedList {
    /// The assigned id, or `None` when the vendor returned an empty one.
    pub fn id(&self) -> Option<i64> {
        self.id.as_ref().map(IdValue::as_i64).filter(|id| *id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_string_and_numeric_ids() {
        let records: Vec<ListRecord> =
            serde_json::from_str(r#"[{"id":"1","title":"A"},{"id":2,"title":"B"}]"#).unwrap();
        assert_eq!(records[0].id.as_i64(), 1);
        assert_eq!(records[1].id.as_i64(), 2);
        assert_eq!(records[1].title, "B");
    }

    #[test]
    fn record_without_title_defaults_to_empty() {
        let record: ListRecord = serde_json::from_str(r#"{"id":"7"}"#).unwrap();
        assert_eq!(record.title, "");
    }

    #[test]
    fn created_list_requires_non_zero_id() {
        let created: CreatedList = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        assert_eq!(created.id(), Some(42));
        let created: CreatedList = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(created.id(), None);
        let created: CreatedList = serde_json::from_str(r#"{"id":"0"}"#).unwrap();
        assert_eq!(created.id(), None);
        let created: CreatedList = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert_eq!(created.id(), None);
    }
}
