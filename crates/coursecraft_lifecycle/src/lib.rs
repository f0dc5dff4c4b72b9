//! Content lifecycle engine for Coursecraft course authoring.
//!
//! Drives a course aggregate (course → modules → lessons → quizzes,
//! assignments, resources, drip rules) from first draft to publication and,
//! eventually, deletion:
//!
//! - [`wizard`], [`fields`], [`forms`] and [`merge`]: the seven-step authoring
//!   wizard and the reconciliation of partial step submissions with persisted
//!   state
//! - [`validation`] and [`gate`]: per-step rules and the publication gate,
//!   sharing one set of rule functions
//! - [`mutation`]: add, edit, delete and reorder of aggregate children
//! - [`deletion`]: two-phase eligibility planning and cascading removal
//! - [`service`]: [`CourseLifecycle`], one store transaction per operation
//! - [`response`]: flat JSON envelopes for every result
//!
//! # Usage
//!
//! ```rust,ignore
//! use coursecraft_lifecycle::{CourseLifecycle, LifecycleConfig, StepAction, StepForm, WizardStep};
//!
//! let engine = CourseLifecycle::new(db, LifecycleConfig::default());
//! let result = engine
//!     .save_step(&actor, None, WizardStep::BasicInfo, StepAction::Draft, &form)
//!     .await?;
//! ```

pub mod aggregate;
pub mod config;
pub mod deletion;
pub mod error;
pub mod fields;
pub mod forms;
pub mod gate;
pub mod merge;
pub mod mutation;
pub mod response;
pub mod service;
pub mod slug;
pub mod validation;
pub mod wizard;

pub use aggregate::{CourseSnapshot, ModuleNode};
pub use config::{ConfigError, LifecycleConfig};
pub use deletion::{CascadeStep, DeleteTarget, DeletionPlan, DeletionReport};
pub use error::{LifecycleError, Result};
pub use fields::{CourseField, CourseFields, FieldKind, FieldValue};
pub use forms::StepForm;
pub use gate::ChecklistItem;
pub use mutation::{ChildKind, ChildMutation, ChildSummary, MutationResult};
pub use response::ApiResponse;
pub use service::{
    AutoSaveResult, CourseLifecycle, DeleteResult, PublishState, PublishTarget, StepResult,
    ToggleResult, WizardState,
};
pub use validation::{Rule, ValidationContext, Violation};
pub use wizard::{determine_best_starting_step, StepAction, WizardStep};
