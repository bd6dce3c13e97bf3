//! Structural checks that need no factory knowledge.

use std::collections::HashSet;

use crate::schema::HiveConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "bees[2].class"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: String, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path,
            message: message.into(),
        }
    }

    fn warning(path: String, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.path, self.message)
    }
}

pub fn validate(config: &HiveConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if config.event_buffer == 0 {
        diagnostics.push(Diagnostic::warning(
            "event_buffer".into(),
            "must be at least 1, using 1",
        ));
    }

    let mut seen = HashSet::new();
    for (i, bee) in config.bees.iter().enumerate() {
        if bee.name.trim().is_empty() {
            diagnostics.push(Diagnostic::error(format!("bees[{i}].name"), "is empty"));
        } else if !seen.insert(bee.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("bees[{i}].name"),
                format!("duplicate bee name {:?}", bee.name),
            ));
        }
        if bee.class.trim().is_empty() {
            diagnostics.push(Diagnostic::error(format!("bees[{i}].class"), "is empty"));
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use {super::*, crate::schema::BeeConfig, serde_json::Map};

    fn bee(name: &str, class: &str) -> BeeConfig {
        BeeConfig {
            name: name.into(),
            class: class.into(),
            description: String::new(),
            options: Map::new(),
        }
    }

    #[test]
    fn clean_config_has_no_diagnostics() {
        let config = HiveConfig {
            bees: vec![bee("a", "mixcloudbee"), bee("b", "mixcloudbee")],
            ..HiveConfig::default()
        };
        assert!(validate(&config).is_empty());
    }

    #[test]
    fn reports_duplicates_and_blanks() {
        let config = HiveConfig {
            event_buffer: 0,
            bees: vec![bee("a", "x"), bee("a", ""), bee(" ", "x")],
        };
        let paths: Vec<_> = validate(&config)
            .into_iter()
            .map(|d| (d.severity, d.path))
            .collect();
        assert_eq!(paths, vec![
            (Severity::Warning, "event_buffer".to_string()),
            (Severity::Error, "bees[1].name".to_string()),
            (Severity::Error, "bees[1].class".to_string()),
            (Severity::Error, "bees[2].name".to_string()),
        ]);
    }
}
