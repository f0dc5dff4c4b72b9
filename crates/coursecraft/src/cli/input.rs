//! Argument and payload parsing shared by the engine commands.

use crate::cli::error::HelpfulError;
use coursecraft_ids::InstructorId;
use coursecraft_lifecycle::{StepAction, WizardStep};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Read a JSON payload from `source`; `-` means stdin.
pub fn read_json<T: DeserializeOwned>(source: &Path, what: &str) -> Result<T, HelpfulError> {
    let raw = if source.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| HelpfulError::cannot_read_input(source, &e.to_string()))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| HelpfulError::cannot_read_input(source, &e.to_string()))?
    };
    parse_json(&raw, what)
}

pub fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, HelpfulError> {
    serde_json::from_str(raw).map_err(|e| HelpfulError::json_parse_error(what, &e.to_string()))
}

pub fn actor(raw: &str) -> Result<InstructorId, HelpfulError> {
    InstructorId::parse(raw).map_err(|e| HelpfulError::invalid_id("instructor id", raw, &e.to_string()))
}

/// Parse any id type whose `FromStr` error is displayable.
pub fn id<T>(label: &str, raw: &str) -> Result<T, HelpfulError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| HelpfulError::invalid_id(label, raw, &e.to_string()))
}

pub fn step(number: u8) -> Result<WizardStep, HelpfulError> {
    WizardStep::from_number(number).ok_or_else(|| HelpfulError::invalid_step(number))
}

pub fn action(raw: &str) -> Result<StepAction, HelpfulError> {
    StepAction::parse(raw).ok_or_else(|| HelpfulError::invalid_action(raw))
}
