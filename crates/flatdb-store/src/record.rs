//! Table rows.
//!
//! A record is its `ID` plus one value per declared column, in column
//! order. On disk it is a single JSON object whose first key is `"ID"`:
//!
//! ```text
//! {"ID": 1, "name": "Ann", "age": 30}
//! ```

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use flatdb_common::ID_COLUMN;

use crate::value::Value;

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: u64,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates a record from its ID and ordered fields.
    pub fn new(id: u64, fields: Vec<(String, Value)>) -> Self {
        Self { id, fields }
    }

    /// Returns the record ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the fields in column order (the ID excluded).
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Returns the value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the string representation of a column, `ID` included.
    pub fn rendered(&self, column: &str) -> Option<String> {
        if column == ID_COLUMN {
            Some(self.id.to_string())
        } else {
            self.get(column).map(Value::to_string)
        }
    }

    /// Replaces a column's value, appending the column if the record lacks
    /// it. Returns the previous value.
    pub fn set(&mut self, column: &str, value: Value) -> Option<Value> {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((column.to_string(), value));
                None
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_COLUMN, &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a record object with an \"ID\" key")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut id: Option<u64> = None;
        let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some(key) = access.next_key::<String>()? {
            if key == ID_COLUMN {
                if id.is_some() {
                    return Err(de::Error::duplicate_field(ID_COLUMN));
                }
                id = Some(access.next_value()?);
            } else {
                let value: Value = access.next_value()?;
                fields.push((key, value));
            }
        }

        let id = id.ok_or_else(|| de::Error::missing_field(ID_COLUMN))?;
        Ok(Record { id, fields })
    }
}
