use std::path::Path;

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    hive_bees::{FactoryRegistry, OptionIssue},
    hive_config::{Diagnostic, HiveConfig, Severity, find_config_file, validate},
    hive_runtime::builtin_registry,
    tracing::{error, warn},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors and warnings.
    Check,
    /// Print the effective configuration as JSON.
    Show,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>, config: &HiveConfig) -> Result<()> {
    match action {
        ConfigAction::Check => check(path, config),
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Structural diagnostics plus per-bee checks against the factories'
/// declared options.
pub fn diagnose(config: &HiveConfig, registry: &FactoryRegistry) -> Vec<Diagnostic> {
    let mut diagnostics = validate(config);
    for (i, bee) in config.bees.iter().enumerate() {
        let Some(factory) = registry.get(&bee.class) else {
            if !bee.class.trim().is_empty() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    path: format!("bees[{i}].class"),
                    message: format!("unknown bee factory {:?}", bee.class),
                });
            }
            continue;
        };
        let descriptors = factory.options();
        for issue in bee.bee_options().with_defaults(&descriptors).check(&descriptors) {
            let (severity, name) = match &issue {
                OptionIssue::Missing { name } | OptionIssue::Mistyped { name, .. } => {
                    (Severity::Error, name)
                },
                OptionIssue::Unknown { name } => (Severity::Warning, name),
            };
            diagnostics.push(Diagnostic {
                severity,
                path: format!("bees[{i}].options.{name}"),
                message: issue.to_string(),
            });
        }
    }
    diagnostics
}

/// Fail when the config has errors; warnings are only logged.
pub fn ensure_valid(config: &HiveConfig, registry: &FactoryRegistry) -> Result<()> {
    let diagnostics = diagnose(config, registry);
    let mut errors = 0;
    for d in &diagnostics {
        match d.severity {
            Severity::Error => {
                error!(path = %d.path, "{}", d.message);
                errors += 1;
            },
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
        }
    }
    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

fn check(path: Option<&Path>, config: &HiveConfig) -> Result<()> {
    match path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let diagnostics = diagnose(config, &builtin_registry());
    for d in &diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;
    if !diagnostics.is_empty() {
        eprintln!();
    }
    if diagnostics.is_empty() {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}
