//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use coursecraft_lifecycle::{CourseField, WizardStep};
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Wizard step number outside 1-7
    pub fn invalid_step(step: u8) -> Self {
        let steps = WizardStep::ALL
            .iter()
            .map(|s| format!("{} = {}", s.number(), s.title()))
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(format!("Invalid wizard step: {}", step))
            .with_context("The wizard has seven steps, numbered from 1")
            .with_suggestion(format!("TRY: Use one of: {}", steps))
    }

    /// Step action that is not next/previous/draft/publish
    pub fn invalid_action(action: &str) -> Self {
        Self::new(format!("Invalid step action: '{}'", action))
            .with_context("Each submission says what the instructor clicked")
            .with_suggestions([
                "TRY: Use one of: next, previous, draft, publish",
                "TRY: 'draft' saves without validation",
            ])
    }

    /// Field name the auto-save endpoint does not know
    pub fn unknown_field(name: &str) -> Self {
        let known = WizardStep::ALL
            .iter()
            .flat_map(|step| CourseField::owned_by(*step))
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(format!("Unknown course field: '{}'", name))
            .with_context("Auto-save writes one wizard field at a time")
            .with_suggestion(format!("TRY: Known fields: {}", known))
    }

    /// Value that does not fit the field's kind
    pub fn invalid_value(field: CourseField, details: &str) -> Self {
        Self::new(format!("Invalid value for {}: {}", field, details))
            .with_context(format!("{} expects a {} value", field, field.kind()))
            .with_suggestions([
                "TRY: Pass the value as JSON, e.g. '\"A title\"', '4900', 'true' or '[\"one\",\"two\"]'",
                "TRY: Pass 'null' to clear the field",
            ])
    }

    /// Malformed identifier
    pub fn invalid_id(label: &str, value: &str, reason: &str) -> Self {
        Self::new(format!("Invalid {}: '{}'", label, value))
            .with_context(reason.to_string())
            .with_suggestion("TRY: Copy the id from `coursecraft courses` or a previous command's output")
    }

    /// Input file or stdin could not be read
    pub fn cannot_read_input(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read input: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check the file exists: ls -la {}", path.display()),
                "TRY: Pass '-' to read the payload from stdin".to_string(),
            ])
    }

    /// Input was not the JSON shape the command expects
    pub fn json_parse_error(what: &str, details: &str) -> Self {
        Self::new(format!("JSON parse error: {}", details))
            .with_context(format!("Failed to parse {}", what))
            .with_suggestions([
                "TRY: Validate the JSON: cat FILE | python -m json.tool",
                "TRY: Check field names are camelCase and tags match the expected variants",
            ])
    }

    /// Course store could not be opened
    pub fn database_open_failed(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot open course store: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check permissions: ls -la {}", path.display()),
                "TRY: Point --db (or COURSECRAFT_DB) at a writable location".to_string(),
            ])
    }

    /// Lifecycle config file is unreadable or invalid
    pub fn config_invalid(path: &Path, reason: &str) -> Self {
        Self::new(format!("Invalid lifecycle config: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Every key is optional; remove unknown keys or fix their types",
                "TRY: Run `coursecraft config` to see the effective thresholds",
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
