//! Bee configuration values and the typed `bind` protocol.

use {
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    serde_json::Value,
};

use crate::{
    descriptor::BeeOptionDescriptor,
    error::{Error, Result},
    placeholder::PlaceholderType,
};

/// A single configured option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeOption {
    pub name: String,
    pub value: Value,
}

/// Configuration of one bee instance, in the order it was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeeOptions(Vec<BeeOption>);

/// A mismatch between configured options and a factory's declared options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionIssue {
    /// A mandatory option without a default is not configured.
    Missing { name: String },
    /// The option is not declared by the factory and will be ignored.
    Unknown { name: String },
    /// The value cannot be converted to the declared type.
    Mistyped {
        name: String,
        expected: PlaceholderType,
    },
}

impl std::fmt::Display for OptionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { name } => write!(f, "missing mandatory option {name}"),
            Self::Unknown { name } => write!(f, "unknown option {name}"),
            Self::Mistyped { name, expected } => {
                write!(f, "option {name} is not a valid {expected}")
            },
        }
    }
}

impl BeeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of the first option called `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|o| o.name == name).map(|o| &o.value)
    }

    /// Replace the value of `name`, or append it.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|o| o.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(BeeOption {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Builder-style [`BeeOptions::set`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind the option `name` into `target`.
    ///
    /// Returns `Ok(true)` when the value was written, `Ok(false)` when the
    /// option is absent. A value that cannot be converted yields
    /// [`Error::InvalidOption`]. In both non-`Ok(true)` cases `target` keeps
    /// its previous value.
    ///
    /// Besides plain deserialization, a string value is parsed as JSON
    /// (`"5"` binds to integers, `"true"` to booleans) and numbers or
    /// booleans bind to string targets through their textual form.
    pub fn bind<T: DeserializeOwned>(&self, name: &str, target: &mut T) -> Result<bool> {
        let Some(value) = self.value(name) else {
            return Ok(false);
        };
        match convert(value) {
            Some(v) => {
                *target = v;
                Ok(true)
            },
            None => Err(Error::invalid_option(
                name,
                format!(
                    "cannot convert {value} to {}",
                    std::any::type_name::<T>()
                ),
            )),
        }
    }

    /// Fill in declared defaults for options that are not configured.
    #[must_use]
    pub fn with_defaults(mut self, descriptors: &[BeeOptionDescriptor]) -> Self {
        for descriptor in descriptors {
            if self.value(&descriptor.name).is_none()
                && let Some(default) = &descriptor.default
            {
                self.set(&descriptor.name, default.clone());
            }
        }
        self
    }

    /// Compare the configured options against a factory's declarations.
    pub fn check(&self, descriptors: &[BeeOptionDescriptor]) -> Vec<OptionIssue> {
        let mut issues = Vec::new();
        for descriptor in descriptors {
            match self.value(&descriptor.name) {
                None if descriptor.mandatory && descriptor.default.is_none() => {
                    issues.push(OptionIssue::Missing {
                        name: descriptor.name.clone(),
                    });
                },
                None => {},
                Some(value) => {
                    if descriptor.kind.convert(value).is_none() {
                        issues.push(OptionIssue::Mistyped {
                            name: descriptor.name.clone(),
                            expected: descriptor.kind,
                        });
                    }
                },
            }
        }
        for option in &self.0 {
            if !descriptors.iter().any(|d| d.name == option.name) {
                issues.push(OptionIssue::Unknown {
                    name: option.name.clone(),
                });
            }
        }
        issues
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|o| o.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BeeOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn convert<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if let Ok(v) = T::deserialize(value) {
        return Some(v);
    }
    match value {
        Value::String(s) => serde_json::from_str(s.trim()).ok(),
        Value::Number(_) | Value::Bool(_) => T::deserialize(&Value::String(value.to_string())).ok(),
        _ => None,
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BeeOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            options.set(&name, value);
        }
        options
    }
}

impl IntoIterator for BeeOptions {
    type IntoIter = std::vec::IntoIter<BeeOption>;
    type Item = BeeOption;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
