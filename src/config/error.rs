//! Config loading errors and validation diagnostics.

use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("`{}` is not valid TOML", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    // not #[from]: the diagnostics render themselves, a source would repeat them
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One invalid field.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Dotted key, e.g. `build.entry`.
    pub field: &'static str,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Attach a suggestion shown under the message.
    pub fn hint(&mut self, hint: impl Into<String>) {
        self.hint = Some(hint.into());
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}", format_args!("{}:", self.field).cyan(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

/// Validation problems collected across every section, so one run reports
/// all of them.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<Diagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`; the returned entry can take a hint.
    pub fn error(&mut self, field: &'static str, message: impl Into<String>) -> &mut Diagnostic {
        self.errors.push(Diagnostic {
            field,
            message: message.into(),
            hint: None,
        });
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let noun = if count == 1 { "problem" } else { "problems" };
        write!(f, "{}", format_args!("kiln.toml has {count} {noun}:").red().bold())?;
        for error in &self.errors {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
