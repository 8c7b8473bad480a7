use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::services::{Gender, TalkTable};

/// One field of a structured resource record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Record>),
    Struct(Record),
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Field::Bool(value)
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Int(value)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Field::Int(value.into())
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Float(value)
    }
}

impl From<f32> for Field {
    fn from(value: f32) -> Self {
        Field::Float(value.into())
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::String(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::String(value)
    }
}

impl From<Vec<Record>> for Field {
    fn from(value: Vec<Record>) -> Self {
        Field::List(value)
    }
}

impl From<Record> for Field {
    fn from(value: Record) -> Self {
        Field::Struct(value)
    }
}

/// Named fields of a blueprint, instance, area or table row.
///
/// Getters never fail: a missing or mistyped field yields the caller's
/// default, matching how the game data is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Field>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Field>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.fields.get(name) {
            Some(Field::String(value)) => value.clone(),
            Some(Field::Int(value)) => value.to_string(),
            Some(Field::Float(value)) => value.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.fields.get(name) {
            Some(Field::Int(value)) => *value,
            Some(Field::Bool(value)) => *value as i64,
            Some(Field::Float(value)) => *value as i64,
            Some(Field::String(value)) => value.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_uint(&self, name: &str, default: u32) -> u32 {
        u32::try_from(self.get_int(name, default.into())).unwrap_or(default)
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.fields.get(name) {
            Some(Field::Bool(value)) => *value,
            Some(Field::Int(value)) => *value != 0,
            _ => default,
        }
    }

    pub fn get_double(&self, name: &str, default: f64) -> f64 {
        match self.fields.get(name) {
            Some(Field::Float(value)) => *value,
            Some(Field::Int(value)) => *value as f64,
            Some(Field::String(value)) => value.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        self.get_double(name, default.into()) as f32
    }

    pub fn get_list(&self, name: &str) -> &[Record] {
        match self.fields.get(name) {
            Some(Field::List(list)) => list,
            _ => &[],
        }
    }

    pub fn get_struct(&self, name: &str) -> Option<&Record> {
        match self.fields.get(name) {
            Some(Field::Struct(record)) => Some(record),
            _ => None,
        }
    }

    /// Localized string: a literal, a talk table reference, or a struct
    /// carrying either.
    pub fn get_loc_string(&self, name: &str, talk: &dyn TalkTable) -> Option<String> {
        match self.fields.get(name)? {
            Field::String(value) => Some(value.clone()),
            Field::Int(strref) => u32::try_from(*strref)
                .ok()
                .map(|strref| talk.get_string(strref, Gender::Male)),
            Field::Struct(record) => {
                if record.has_field("string") {
                    Some(record.get_string("string", ""))
                } else {
                    record.get_loc_string("strref", talk)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Record};
    use crate::services::TalkStrings;

    #[test]
    fn getters_fall_back_to_defaults() {
        let record = Record::new().with("Tag", "door1").with("HP", 12);
        assert_eq!(record.get_string("Tag", ""), "door1");
        assert_eq!(record.get_string("Missing", "x"), "x");
        assert_eq!(record.get_int("HP", 0), 12);
        assert_eq!(record.get_int("Tag", 7), 7);
        assert!(record.get_list("Creature List").is_empty());
        assert!(!record.get_bool("Static", false));
    }

    #[test]
    fn json_records_deserialize_by_shape() {
        let record: Record = serde_json::from_str(
            r#"{"Tag":"wp_a","Static":true,"X":1.5,"Appearance":3,"List":[{"A":1}]}"#,
        )
        .expect("record parses");
        assert_eq!(record.field("Static"), Some(&Field::Bool(true)));
        assert_eq!(record.get_float("X", 0.0), 1.5);
        assert_eq!(record.get_uint("Appearance", 0), 3);
        assert_eq!(record.get_list("List").len(), 1);
    }

    #[test]
    fn loc_strings_resolve_through_talk_table() {
        let talk = TalkStrings::new(vec!["Bad Strref".into(), "Goblin".into()]);
        let record = Record::new()
            .with("LocName", 1)
            .with("FirstName", "Aribeth")
            .with("Description", Record::new().with("strref", 1));
        assert_eq!(record.get_loc_string("LocName", &talk).as_deref(), Some("Goblin"));
        assert_eq!(
            record.get_loc_string("FirstName", &talk).as_deref(),
            Some("Aribeth")
        );
        assert_eq!(
            record.get_loc_string("Description", &talk).as_deref(),
            Some("Goblin")
        );
        assert_eq!(record.get_loc_string("Missing", &talk), None);
    }
}
