//! Typed property values.
//!
//! Node properties in a descriptor have no fixed schema. Rather than hand
//! consumers a raw YAML tree, each value is lifted into [`PropertyValue`]
//! so that a block of shell script, a flavor name and a nested
//! monitoring policy can be told apart without string inspection.

use serde::Serialize;
use serde_yaml::Value;

/// A single scalar leaf
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the scalar the way it would appear in the template
    pub fn to_plain_string(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }
}

/// A property value: scalar, multi-line text block, list or nested mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(Scalar),
    TextBlock(String),
    Sequence(Vec<PropertyValue>),
    Mapping(PropertyMap),
}

impl PropertyValue {
    /// Lift a parsed YAML value.
    ///
    /// Strings spanning several lines become [`PropertyValue::TextBlock`].
    /// Non-string mapping keys are rendered to their plain form.
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Null => PropertyValue::Scalar(Scalar::Null),
            Value::Bool(b) => PropertyValue::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Scalar(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    PropertyValue::Scalar(Scalar::Float(f))
                } else {
                    PropertyValue::Scalar(Scalar::String(n.to_string()))
                }
            }
            Value::String(s) if s.contains('\n') => PropertyValue::TextBlock(s.clone()),
            Value::String(s) => PropertyValue::Scalar(Scalar::String(s.clone())),
            Value::Sequence(items) => {
                PropertyValue::Sequence(items.iter().map(PropertyValue::from_yaml).collect())
            }
            Value::Mapping(map) => PropertyValue::Mapping(
                map.iter()
                    .map(|(k, v)| (key_to_string(k), PropertyValue::from_yaml(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => PropertyValue::from_yaml(&tagged.value),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(Scalar::String(s)) => Some(s),
            PropertyValue::TextBlock(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_text_block(&self) -> bool {
        matches!(self, PropertyValue::TextBlock(_))
    }
}

/// Render a YAML mapping key as a string
pub(crate) fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => match PropertyValue::from_yaml(other) {
            PropertyValue::Scalar(s) => s.to_plain_string(),
            _ => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        },
    }
}

/// Ordered property mapping; keeps the key order of the source template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyValue)>,
}

impl Serialize for PropertyMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lift a YAML mapping; `None` when the value is not a mapping
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match PropertyValue::from_yaml(value) {
            PropertyValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
