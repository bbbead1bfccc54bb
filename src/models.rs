//! Domain models
//!
//! The research loop deliberately avoids raw JSON trees for model output.
//! Everything a model returns is normalized into [`StructuredRecord`]: an
//! ordered map of named fields where each field is either `Present` with a
//! typed value or `Missing`. A `Missing` field always reads back as the
//! literal degraded marker, so downstream code never has to branch on
//! absence.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Marker substituted for any field the model did not provide.
pub const NO_INFORMATION: &str = "No information provided.";

/// A paper returned by the search index. The title is the de-duplication
/// identity for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub pdf_url: String,
}

/// A single structured value parsed out of a model response.
///
/// Non-string scalars coerce to `Text` and `null` is dropped entirely, so a
/// `FieldValue` tree is always printable without further case analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn list_of_text<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(|s| FieldValue::Text(s.into())).collect())
    }

    /// Convert from an arbitrary JSON value. Returns `None` for `null`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
            serde_json::Value::Number(n) => Some(FieldValue::Text(n.to_string())),
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Array(items) => Some(FieldValue::List(
                items.iter().filter_map(FieldValue::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(FieldValue::Map(
                map.iter()
                    .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
                    .collect(),
            )),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", rendered.join("; "))
            }
            FieldValue::Map(_) => {
                write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
            }
        }
    }
}

/// A named field of a structured model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Present(FieldValue),
    Missing,
}

impl Field {
    /// Read the field, degrading `Missing` to the marker text.
    pub fn value(&self) -> FieldValue {
        match self {
            Field::Present(v) => v.clone(),
            Field::Missing => FieldValue::Text(NO_INFORMATION.to_string()),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Present(v) => v.serialize(serializer),
            Field::Missing => serializer.serialize_str(NO_INFORMATION),
        }
    }
}

/// An ordered set of named fields recovered from one model response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuredRecord {
    fields: BTreeMap<String, Field>,
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert every non-null field of a parsed JSON object.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = object
            .iter()
            .map(|(name, value)| {
                let field = match FieldValue::from_json(value) {
                    Some(v) => Field::Present(v),
                    None => Field::Missing,
                };
                (name.clone(), field)
            })
            .collect();
        Self { fields }
    }

    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        self.fields.insert(name.into(), field);
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Read a field, degrading absent or `Missing` entries to the marker.
    pub fn field(&self, name: &str) -> FieldValue {
        self.fields
            .get(name)
            .map(Field::value)
            .unwrap_or_else(|| FieldValue::Text(NO_INFORMATION.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for StructuredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

/// The evolving record of everything the run has learned so far.
///
/// Owned exclusively by the iteration controller and replaced wholesale by
/// the state updater's success path; no sub-component ever mutates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ResearchState {
    fields: BTreeMap<String, FieldValue>,
}

impl ResearchState {
    /// The seed state used before the first iteration.
    pub fn seed() -> Self {
        let mut state = Self::default();
        state.set(
            "current_focus",
            FieldValue::text("Identifying cutting-edge advancements and potential breakthroughs in AI"),
        );
        state.set("key_concepts", FieldValue::List(vec![]));
        state.set("emerging_theories", FieldValue::List(vec![]));
        state.set("potential_breakthroughs", FieldValue::List(vec![]));
        state.set(
            "knowledge_gaps",
            FieldValue::list_of_text(["Comprehensive understanding of latest AI paradigms"]),
        );
        state.set(
            "research_direction",
            FieldValue::text(
                "Explore recent AI papers to uncover revolutionary ideas and formulate novel hypotheses",
            ),
        );
        state
    }

    /// Build a replacement state from the `Present` fields of a record.
    pub fn from_record(record: &StructuredRecord) -> Self {
        let fields = record
            .iter()
            .filter_map(|(name, field)| match field {
                Field::Present(v) => Some((name.to_string(), v.clone())),
                Field::Missing => None,
            })
            .collect();
        Self { fields }
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_state_has_conventional_fields() {
        let state = ResearchState::seed();
        assert!(state.get("current_focus").is_some());
        assert!(state.get("knowledge_gaps").is_some());
        assert_eq!(
            state.field_names(),
            vec![
                "current_focus",
                "emerging_theories",
                "key_concepts",
                "knowledge_gaps",
                "potential_breakthroughs",
                "research_direction",
            ]
        );
    }

    #[test]
    fn field_value_from_json_coerces_scalars() {
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(42)),
            Some(FieldValue::text("42"))
        );
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(true)),
            Some(FieldValue::text("true"))
        );
        assert_eq!(FieldValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn field_value_from_json_drops_nested_nulls() {
        let value = serde_json::json!({"a": null, "b": ["x", null]});
        let converted = FieldValue::from_json(&value).unwrap();
        match converted {
            FieldValue::Map(map) => {
                assert!(!map.contains_key("a"));
                assert_eq!(map["b"], FieldValue::list_of_text(["x"]));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn missing_field_serializes_as_marker() {
        let mut record = StructuredRecord::new();
        record.insert("summary", Field::Missing);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["summary"], NO_INFORMATION);
    }

    #[test]
    fn record_field_degrades_to_marker() {
        let record = StructuredRecord::new();
        assert_eq!(record.field("absent"), FieldValue::text(NO_INFORMATION));
    }

    #[test]
    fn state_from_record_keeps_only_present_fields() {
        let mut record = StructuredRecord::new();
        record.insert("current_focus", Field::Present(FieldValue::text("graph learning")));
        record.insert("knowledge_gaps", Field::Missing);
        let state = ResearchState::from_record(&record);
        assert_eq!(state.get("current_focus"), Some(&FieldValue::text("graph learning")));
        assert!(state.get("knowledge_gaps").is_none());
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = ResearchState::seed();
        let json = state.to_pretty_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        let record = StructuredRecord::from_json_object(object);
        assert_eq!(ResearchState::from_record(&record), state);
    }
}
