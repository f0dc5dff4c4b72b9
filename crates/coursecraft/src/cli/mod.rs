//! CLI module for Coursecraft
//!
//! Thin adapters between clap arguments and the lifecycle engine. Parsing and
//! input errors surface as [`HelpfulError`]; engine outcomes surface as JSON
//! envelopes.

pub mod error;
pub mod input;
pub mod output;

// Engine commands
pub mod content;
pub mod wizard;

// Catalog and tooling
pub mod catalog;

// Configuration and context
pub mod config;
pub mod context;

pub use error::HelpfulError;
