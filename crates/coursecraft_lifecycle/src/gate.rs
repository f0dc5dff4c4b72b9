//! Publication gate.
//!
//! Evaluated over the live aggregate before a course moves to PendingReview
//! or Published. The same rules drive the readiness checklist shown by the
//! wizard, so "what is missing" and "why was I refused" never disagree.

use crate::aggregate::ModuleNode;
use crate::config::LifecycleConfig;
use crate::fields::CourseFields;
use crate::validation::{self, Rule, Violation};
use serde::Serialize;

/// One line of the readiness checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub rule: Rule,
    pub label: &'static str,
    pub satisfied: bool,
}

const GATE_RULES: [(Rule, &str); 7] = [
    (Rule::ModulesRequired, "Course has modules"),
    (Rule::LessonsRequired, "Course has enough lessons"),
    (Rule::ThumbnailRequired, "Thumbnail uploaded"),
    (Rule::PriceRequired, "Pricing is valid"),
    (Rule::LearningOutcomes, "Learning outcomes listed"),
    (Rule::Requirements, "Requirements listed"),
    (Rule::EmptyModule, "Every module has lessons"),
];

/// Every failing gate rule, in checklist order.
pub fn publication_violations(
    fields: &CourseFields,
    modules: &[ModuleNode],
    config: &LifecycleConfig,
) -> Vec<Violation> {
    let mut found = Vec::new();
    found.extend(validation::curriculum_violations(modules, config));
    found.extend(validation::thumbnail_violations(fields));
    found.extend(validation::pricing_violations(fields));
    found.extend(validation::learning_content_violations(fields, config));

    let mut ordered = Vec::with_capacity(found.len());
    for (rule, _) in GATE_RULES {
        ordered.extend(found.iter().filter(|v| reported_under(rule, v)).cloned());
    }
    ordered
}

/// Sale price problems are reported under the pricing line.
fn reported_under(rule: Rule, violation: &Violation) -> bool {
    violation.rule == rule || (rule == Rule::PriceRequired && violation.rule == Rule::SalePrice)
}

pub fn readiness_checklist(
    fields: &CourseFields,
    modules: &[ModuleNode],
    config: &LifecycleConfig,
) -> Vec<ChecklistItem> {
    let violations = publication_violations(fields, modules, config);
    GATE_RULES
        .into_iter()
        .map(|(rule, label)| ChecklistItem {
            rule,
            label,
            satisfied: !violations.iter().any(|v| reported_under(rule, v)),
        })
        .collect()
}

/// Share of satisfied checklist items, 0-100.
pub fn completion_percent(checklist: &[ChecklistItem]) -> u8 {
    if checklist.is_empty() {
        return 0;
    }
    let satisfied = checklist.iter().filter(|item| item.satisfied).count();
    ((satisfied * 100) / checklist.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_course_fails_every_rule_but_empty_modules() {
        let checklist = readiness_checklist(&CourseFields::default(), &[], &LifecycleConfig::default());
        let unsatisfied: Vec<Rule> = checklist.iter().filter(|i| !i.satisfied).map(|i| i.rule).collect();
        assert_eq!(
            unsatisfied,
            vec![
                Rule::ModulesRequired,
                Rule::LessonsRequired,
                Rule::ThumbnailRequired,
                Rule::PriceRequired,
                Rule::LearningOutcomes,
                Rule::Requirements,
            ]
        );
        assert_eq!(completion_percent(&checklist), 14);
    }

    #[test]
    fn violations_follow_checklist_order() {
        let mut fields = CourseFields::default();
        fields.details.is_free = true;
        fields.learning_outcomes = vec!["a".into(), "b".into(), "c".into()];
        fields.requirements = vec!["r".into()];

        let rules: Vec<Rule> = publication_violations(&fields, &[], &LifecycleConfig::default())
            .into_iter()
            .map(|v| v.rule)
            .collect();
        assert_eq!(rules, vec![Rule::ModulesRequired, Rule::LessonsRequired, Rule::ThumbnailRequired]);
    }
}
