//! Merge reconciler.
//!
//! Builds the candidate state of a step submission: fields owned by the
//! submitted step come from the request, everything else is reloaded from
//! the store. Review owns nothing, so it always sees persisted state.

use crate::fields::{CourseField, CourseFields, FieldValue, MergePolicy, FIELD_OWNERS};
use crate::wizard::WizardStep;

pub fn merge(
    step: WizardStep,
    submitted: &[(CourseField, Option<FieldValue>)],
    persisted: &CourseFields,
) -> CourseFields {
    let mut candidate = persisted.clone();

    for &(field, owner, policy) in FIELD_OWNERS {
        if owner != step {
            continue;
        }

        let value = submitted
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, v)| v.clone())
            .filter(|v| v.kind() == field.kind());

        match policy {
            MergePolicy::Overwrite => {
                candidate.set(field, value);
            }
            MergePolicy::FallbackReload => {
                if let Some(value) = value.filter(FieldValue::is_usable) {
                    candidate.set(field, Some(value));
                }
            }
        }
    }

    candidate
}
