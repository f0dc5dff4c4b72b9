//! Wizard steps, actions and resumption.
//!
//! The wizard walks an instructor through seven steps. Each step owns a set of
//! course fields (see [`crate::fields`]); the step validator decides whether a
//! forward move is allowed, and [`determine_best_starting_step`] decides where
//! a returning instructor should land.

use crate::aggregate::ModuleNode;
use crate::config::LifecycleConfig;
use crate::fields::CourseFields;
use crate::validation::{self, ValidationContext};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Steps
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    BasicInfo,
    LearningContent,
    CourseContent,
    Media,
    Pricing,
    Settings,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::BasicInfo,
        WizardStep::LearningContent,
        WizardStep::CourseContent,
        WizardStep::Media,
        WizardStep::Pricing,
        WizardStep::Settings,
        WizardStep::Review,
    ];

    /// 1-based position shown to the instructor.
    pub fn number(&self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::LearningContent => 2,
            Self::CourseContent => 3,
            Self::Media => 4,
            Self::Pricing => 5,
            Self::Settings => 6,
            Self::Review => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::LearningContent => "Learning Content",
            Self::CourseContent => "Course Content",
            Self::Media => "Media",
            Self::Pricing => "Pricing",
            Self::Settings => "Settings",
            Self::Review => "Review & Publish",
        }
    }

    /// The following step; Review is terminal.
    pub fn next(&self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(Self::Review)
    }

    /// The preceding step; Basic Info is the floor.
    pub fn previous(&self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(Self::BasicInfo)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("wizard step must be 1-7, got {}", n))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> u8 {
        step.number()
    }
}

// ============================================================================
// Actions
// ============================================================================

/// What the instructor asked for when submitting a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// Validate, persist, advance.
    Next,
    /// Persist without validation and step back.
    Previous,
    /// Persist without validation and stay.
    Draft,
    /// Validate the whole aggregate and submit for review.
    Publish,
}

impl StepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Draft => "draft",
            Self::Publish => "publish",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "next" => Some(Self::Next),
            "previous" | "prev" | "back" => Some(Self::Previous),
            "draft" => Some(Self::Draft),
            "publish" | "submit" => Some(Self::Publish),
            _ => None,
        }
    }

    /// The action actually carried out at `step`. Moving forward from the
    /// last step is a submission.
    pub fn effective_at(self, step: WizardStep) -> Self {
        match (self, step) {
            (Self::Next, WizardStep::Review) => Self::Publish,
            (action, _) => action,
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Resumption
// ============================================================================

/// Pick the step a returning instructor should land on.
///
/// Checks Basic Info, Learning Content, Course Content, Media and Pricing in
/// that order with the same predicates the step validator and publication
/// gate use, and returns the first incomplete one, or Review when all hold.
/// Pure: the result depends only on the arguments.
pub fn determine_best_starting_step(
    fields: &CourseFields,
    modules: &[ModuleNode],
    ctx: &ValidationContext,
    config: &LifecycleConfig,
) -> WizardStep {
    const CHECKED: [WizardStep; 5] = [
        WizardStep::BasicInfo,
        WizardStep::LearningContent,
        WizardStep::CourseContent,
        WizardStep::Media,
        WizardStep::Pricing,
    ];

    for step in CHECKED {
        let complete = match step {
            // The media step has no validator minimum; the gate needs a thumbnail.
            WizardStep::Media => validation::thumbnail_violations(fields).is_empty(),
            _ => validation::validate_step(step, fields, modules, ctx, config).is_empty(),
        };
        if !complete {
            return step;
        }
    }

    WizardStep::Review
}
