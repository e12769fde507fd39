//! Records as returned by the backing service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::ids::RecordId;

/// Name of the identifier field in the wire representation.
pub const ID_FIELD: &str = "Id";

/// One business record: an identifier plus its raw field values.
///
/// Field values are kept exactly as the service returned them, including
/// nested relationship objects such as `{"Account": {"Name": "Acme"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Parse a record from a JSON object carrying an `Id` member.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ModelError::NotAnObject);
        };
        let id = match fields.remove(ID_FIELD) {
            Some(Value::String(id)) => RecordId::new(id)?,
            Some(other) => return Err(ModelError::InvalidRecordId(other.to_string())),
            None => return Err(ModelError::MissingId { field: ID_FIELD }),
        };
        Ok(Self { id, fields })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Resolve a dotted path (`Account.Name`) through nested objects.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path == ID_FIELD {
            return None;
        }
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Displayable text for a path; absent and null values render empty.
    pub fn display(&self, path: &str) -> String {
        if path == ID_FIELD {
            return self.id.to_string();
        }
        self.lookup(path).map(display_value).unwrap_or_default()
    }
}

/// Render a raw JSON value the way a list cell shows it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_splits_id_from_fields() {
        let record = Record::from_value(json!({"Id": "006A", "Name": "Big deal"})).unwrap();
        assert_eq!(record.id.as_str(), "006A");
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.get("Name"), Some(&json!("Big deal")));
    }

    #[test]
    fn from_value_requires_string_id() {
        assert_eq!(
            Record::from_value(json!({"Name": "x"})),
            Err(ModelError::MissingId { field: ID_FIELD })
        );
        assert!(matches!(
            Record::from_value(json!({"Id": 7})),
            Err(ModelError::InvalidRecordId(_))
        ));
        assert_eq!(Record::from_value(json!([1])), Err(ModelError::NotAnObject));
    }

    #[test]
    fn lookup_follows_relationship_objects() {
        let record = Record::new(RecordId::new("1").unwrap())
            .with_field("Account", json!({"Name": "Acme"}))
            .with_field("Amount", json!(1250.5));
        assert_eq!(record.display("Account.Name"), "Acme");
        assert_eq!(record.display("Account.Owner"), "");
        assert_eq!(record.display("Amount"), "1250.5");
        assert_eq!(record.display("Id"), "1");
    }
}
