//! Outward response envelopes.
//!
//! Every operation result converts into one flat JSON shape; absent parts are
//! omitted. Storage faults never leak details: they surface as a generic
//! reason and the caller's log carries the rest.

use crate::deletion::{DeleteTarget, DeletionReport};
use crate::error::LifecycleError;
use crate::mutation::{ChildKind, ChildSummary, MutationResult};
use crate::service::{AutoSaveResult, DeleteResult, PublishState, StepResult, ToggleResult};
use crate::validation::Violation;
use crate::wizard::WizardStep;
use coursecraft_db::CourseStatus;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<WizardStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_status: Option<CourseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_summary: Option<ChildSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<Removed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<PublishState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Violation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// What a delete took away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removed {
    pub kind: String,
    pub id: String,
    pub rows_deleted: u64,
    pub rows_detached: u64,
}

impl ApiResponse {
    fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn rejected(errors: Vec<Violation>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    fn refused(reason: String) -> Self {
        Self {
            reason: Some(reason),
            ..Self::default()
        }
    }

    /// Envelope for an operation that failed outright.
    pub fn from_error(err: &LifecycleError) -> Self {
        match err {
            LifecycleError::NotFoundOrUnauthorized => Self::refused("not found".to_string()),
            LifecycleError::ConstraintConflict(reason) => Self::refused(reason.clone()),
            LifecycleError::TransientStorage(_) => {
                Self::refused("the course store is busy; please retry".to_string())
            }
            LifecycleError::Unexpected(_) => {
                Self::refused("something went wrong; no changes were saved".to_string())
            }
        }
    }
}

impl From<StepResult> for ApiResponse {
    fn from(result: StepResult) -> Self {
        match result {
            StepResult::Saved {
                course_id,
                next_step,
                course_status,
            } => Self {
                course_id: Some(course_id.to_string()),
                next_step: Some(next_step),
                course_status: Some(course_status),
                ..Self::ok()
            },
            StepResult::Rejected { errors } => Self::rejected(errors),
        }
    }
}

impl From<AutoSaveResult> for ApiResponse {
    fn from(result: AutoSaveResult) -> Self {
        match result {
            AutoSaveResult::Saved { course_id } => Self {
                course_id: Some(course_id.to_string()),
                ..Self::ok()
            },
            AutoSaveResult::Rejected { errors } => Self::rejected(errors),
        }
    }
}

impl From<MutationResult> for ApiResponse {
    fn from(result: MutationResult) -> Self {
        match result {
            MutationResult::Applied(summary) => Self {
                child_summary: Some(summary),
                ..Self::ok()
            },
            MutationResult::Reordered { order, .. } => Self {
                order: Some(order),
                ..Self::ok()
            },
            MutationResult::Removed {
                kind,
                id,
                rows_deleted,
                rows_detached,
            } => Self {
                removed: Some(Removed {
                    kind: kind.as_str().to_string(),
                    id,
                    rows_deleted,
                    rows_detached,
                }),
                ..Self::ok()
            },
            MutationResult::Rejected { errors } => Self::rejected(errors),
            MutationResult::Refused { reason } => Self::refused(reason),
        }
    }
}

impl From<DeletionReport> for Removed {
    fn from(report: DeletionReport) -> Self {
        Self {
            kind: match report.target {
                DeleteTarget::Course(_) => "course",
                DeleteTarget::Module(_) => ChildKind::Module.as_str(),
                DeleteTarget::Lesson(_) => ChildKind::Lesson.as_str(),
            }
            .to_string(),
            id: report.target.id().to_string(),
            rows_deleted: report.rows_deleted,
            rows_detached: report.rows_detached,
        }
    }
}

impl From<DeleteResult> for ApiResponse {
    fn from(result: DeleteResult) -> Self {
        match result {
            DeleteResult::Deleted(report) => Self {
                removed: Some(report.into()),
                ..Self::ok()
            },
            DeleteResult::Refused { reason } => Self::refused(reason),
        }
    }
}

impl From<ToggleResult> for ApiResponse {
    fn from(result: ToggleResult) -> Self {
        match result {
            ToggleResult::Toggled { new_state, warnings } => Self {
                new_state: Some(new_state),
                warnings,
                ..Self::ok()
            },
            ToggleResult::Refused { reason, errors } => Self {
                reason: Some(reason),
                errors,
                ..Self::default()
            },
        }
    }
}

impl<T: Into<ApiResponse>> From<Result<T, LifecycleError>> for ApiResponse {
    fn from(result: Result<T, LifecycleError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => Self::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;
    use coursecraft_db::DbError;
    use coursecraft_ids::CourseId;

    #[test]
    fn saved_step_envelope() {
        let response: ApiResponse = StepResult::Saved {
            course_id: CourseId::new(),
            next_step: WizardStep::LearningContent,
            course_status: CourseStatus::Draft,
        }
        .into();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["nextStep"], 2);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn rejected_step_envelope_lists_errors() {
        let response: ApiResponse = StepResult::Rejected {
            errors: vec![Violation::new(Rule::TitleLength, "title must be ≥10 characters")],
        }
        .into();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["message"], "title must be ≥10 characters");
        assert_eq!(json["errors"][0]["rule"], "title_length");
    }

    #[test]
    fn storage_faults_are_generic() {
        let err = LifecycleError::Unexpected(DbError::invalid_state("row 42 has status 'zzz'"));
        let response = ApiResponse::from_error(&err);
        assert!(!response.success);
        assert!(!response.reason.unwrap().contains("zzz"));
    }

    #[test]
    fn toggle_envelope_carries_new_state() {
        let response: ApiResponse = ToggleResult::Toggled {
            new_state: PublishState::Course {
                status: CourseStatus::Draft,
            },
            warnings: vec!["course has 2 active enrollments; currently enrolled learners retain access".into()],
        }
        .into();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["newState"]["kind"], "course");
        assert_eq!(json["newState"]["status"], "draft");
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }
}
