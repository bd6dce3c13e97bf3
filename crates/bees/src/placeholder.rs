//! Typed, named fields carried by events and actions.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Type tag of a [`PlaceholderValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderType {
    String,
    Integer,
    Float,
    Boolean,
    Url,
    Timestamp,
}

impl PlaceholderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Url => "url",
            Self::Timestamp => "timestamp",
        }
    }

    /// Convert a loosely typed JSON value into a value of this type.
    ///
    /// Strings are parsed for numeric, boolean and timestamp types; numbers
    /// and booleans are stringified for string-like types.
    pub fn convert(self, value: &Value) -> Option<PlaceholderValue> {
        match (self, value) {
            (Self::String, Value::String(s)) => Some(PlaceholderValue::String(s.clone())),
            (Self::String, Value::Number(_) | Value::Bool(_)) => {
                Some(PlaceholderValue::String(value.to_string()))
            },
            (Self::Url, Value::String(s)) => Some(PlaceholderValue::Url(s.clone())),
            (Self::Integer, Value::Number(n)) => n.as_i64().map(PlaceholderValue::Integer),
            (Self::Integer, Value::String(s)) => {
                s.trim().parse().ok().map(PlaceholderValue::Integer)
            },
            (Self::Float, Value::Number(n)) => n.as_f64().map(PlaceholderValue::Float),
            (Self::Float, Value::String(s)) => s.trim().parse().ok().map(PlaceholderValue::Float),
            (Self::Boolean, Value::Bool(b)) => Some(PlaceholderValue::Boolean(*b)),
            (Self::Boolean, Value::String(s)) => s.trim().parse().ok().map(PlaceholderValue::Boolean),
            (Self::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| PlaceholderValue::Timestamp(t.with_timezone(&Utc))),
            (Self::Timestamp, Value::Number(n)) => n
                .as_i64()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .map(PlaceholderValue::Timestamp),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a placeholder. A closed set so consumers can match
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Url(String),
    Timestamp(DateTime<Utc>),
}

impl PlaceholderValue {
    pub fn kind(&self) -> PlaceholderType {
        match self {
            Self::String(_) => PlaceholderType::String,
            Self::Integer(_) => PlaceholderType::Integer,
            Self::Float(_) => PlaceholderType::Float,
            Self::Boolean(_) => PlaceholderType::Boolean,
            Self::Url(_) => PlaceholderType::Url,
            Self::Timestamp(_) => PlaceholderType::Timestamp,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Url(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) | Self::Url(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Timestamp(t) => Value::String(t.to_rfc3339()),
        }
    }
}

impl std::fmt::Display for PlaceholderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) | Self::Url(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Timestamp(t) => f.write_str(&t.to_rfc3339()),
        }
    }
}

impl From<&str> for PlaceholderValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PlaceholderValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PlaceholderValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PlaceholderValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PlaceholderValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for PlaceholderValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// One named, typed field of an event or action.
///
/// Serialized as `{"name": .., "type": .., "value": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlaceholder", into = "RawPlaceholder")]
pub struct Placeholder {
    pub name: String,
    pub value: PlaceholderValue,
}

impl Placeholder {
    pub fn new(name: impl Into<String>, value: impl Into<PlaceholderValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> PlaceholderType {
        self.value.kind()
    }
}

#[derive(Serialize, Deserialize)]
struct RawPlaceholder {
    name: String,
    #[serde(rename = "type")]
    kind: PlaceholderType,
    value: Value,
}

impl TryFrom<RawPlaceholder> for Placeholder {
    type Error = String;

    fn try_from(raw: RawPlaceholder) -> Result<Self, Self::Error> {
        let value = raw.kind.convert(&raw.value).ok_or_else(|| {
            format!(
                "placeholder {}: {} is not a valid {}",
                raw.name, raw.value, raw.kind
            )
        })?;
        Ok(Self {
            name: raw.name,
            value,
        })
    }
}

impl From<Placeholder> for RawPlaceholder {
    fn from(p: Placeholder) -> Self {
        Self {
            kind: p.value.kind(),
            value: p.value.to_json(),
            name: p.name,
        }
    }
}

/// Ordered list of placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholders(Vec<Placeholder>);

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the first placeholder called `name`.
    pub fn value(&self, name: &str) -> Option<&PlaceholderValue> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Replace the value of `name` in place, or append it.
    pub fn set_value(&mut self, name: &str, value: impl Into<PlaceholderValue>) {
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Placeholder {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Builder-style [`Placeholders::set_value`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<PlaceholderValue>) -> Self {
        self.set_value(name, value);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Placeholder> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Placeholder> {
        self.0
    }
}

impl From<Vec<Placeholder>> for Placeholders {
    fn from(value: Vec<Placeholder>) -> Self {
        Self(value)
    }
}

impl FromIterator<Placeholder> for Placeholders {
    fn from_iter<I: IntoIterator<Item = Placeholder>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Placeholders {
    type IntoIter = std::vec::IntoIter<Placeholder>;
    type Item = Placeholder;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Placeholders {
    type IntoIter = std::slice::Iter<'a, Placeholder>;
    type Item = &'a Placeholder;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
