//! Step validator.
//!
//! Pure functions from a merged candidate to an ordered list of violations.
//! Nothing here fails fast: every broken rule is reported so the instructor
//! sees all problems in one round-trip. The rule helpers are shared with the
//! publication gate and the resume heuristic.

use crate::aggregate::{lesson_count, ModuleNode};
use crate::config::LifecycleConfig;
use crate::fields::CourseFields;
use crate::wizard::WizardStep;
use coursecraft_db::{QuestionInput, QuestionKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    TitleLength,
    ShortDescriptionLength,
    DescriptionLength,
    CategoryMissing,
    CategoryUnknown,
    LearningOutcomes,
    Requirements,
    ModulesRequired,
    LessonsRequired,
    EmptyModule,
    ThumbnailRequired,
    PriceRequired,
    SalePrice,
    EnrollmentCap,
    FieldKind,
    StepMismatch,
    CourseStatus,
    ModuleVideoLesson,
    QuestionPrompt,
    QuestionPoints,
    QuestionOptions,
    QuestionCorrectOption,
    /// Malformed module, lesson, resource, assignment or drip rule input.
    ChildInput,
}

/// One broken rule with a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Facts the validator needs from outside the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationContext {
    /// The selected category exists in the category table.
    pub category_exists: bool,
}

/// Validate the candidate state for `step`.
pub fn validate_step(
    step: WizardStep,
    fields: &CourseFields,
    modules: &[ModuleNode],
    ctx: &ValidationContext,
    config: &LifecycleConfig,
) -> Vec<Violation> {
    match step {
        WizardStep::BasicInfo => basic_info_violations(fields, ctx, config),
        WizardStep::LearningContent => learning_content_violations(fields, config),
        WizardStep::CourseContent => curriculum_violations(modules, config),
        WizardStep::Media => Vec::new(),
        WizardStep::Pricing => pricing_violations(fields),
        WizardStep::Settings => settings_violations(fields),
        WizardStep::Review => validate_all_steps(fields, modules, ctx, config),
    }
}

/// Every step validator in wizard order.
pub fn validate_all_steps(
    fields: &CourseFields,
    modules: &[ModuleNode],
    ctx: &ValidationContext,
    config: &LifecycleConfig,
) -> Vec<Violation> {
    WizardStep::ALL
        .iter()
        .filter(|step| **step != WizardStep::Review)
        .flat_map(|step| validate_step(*step, fields, modules, ctx, config))
        .collect()
}

fn char_len(value: &Option<String>) -> usize {
    value.as_deref().map(|s| s.trim().chars().count()).unwrap_or(0)
}

fn non_blank(items: &[String]) -> usize {
    items.iter().filter(|item| !item.trim().is_empty()).count()
}

pub(crate) fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

pub fn basic_info_violations(
    fields: &CourseFields,
    ctx: &ValidationContext,
    config: &LifecycleConfig,
) -> Vec<Violation> {
    let d = &fields.details;
    let mut violations = Vec::new();

    if char_len(&d.title) < config.min_title_chars {
        violations.push(Violation::new(
            Rule::TitleLength,
            format!("title must be ≥{} characters", config.min_title_chars),
        ));
    }
    if char_len(&d.short_description) < config.min_short_description_chars {
        violations.push(Violation::new(
            Rule::ShortDescriptionLength,
            format!(
                "short description must be ≥{} characters",
                config.min_short_description_chars
            ),
        ));
    }
    if char_len(&d.description) < config.min_description_chars {
        violations.push(Violation::new(
            Rule::DescriptionLength,
            format!("description must be ≥{} characters", config.min_description_chars),
        ));
    }
    match &d.category_id {
        None => violations.push(Violation::new(Rule::CategoryMissing, "a category must be selected")),
        Some(category) if !ctx.category_exists => violations.push(Violation::new(
            Rule::CategoryUnknown,
            format!("category \"{}\" does not exist", category),
        )),
        Some(_) => {}
    }

    violations
}

pub fn learning_content_violations(fields: &CourseFields, config: &LifecycleConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if non_blank(&fields.learning_outcomes) < config.min_learning_outcomes {
        violations.push(Violation::new(
            Rule::LearningOutcomes,
            format!(
                "at least {} are required",
                plural(config.min_learning_outcomes, "learning outcome", "learning outcomes")
            ),
        ));
    }
    if non_blank(&fields.requirements) < config.min_requirements {
        violations.push(Violation::new(
            Rule::Requirements,
            format!(
                "at least {} required",
                plural(config.min_requirements, "requirement is", "requirements are")
            ),
        ));
    }

    violations
}

pub fn curriculum_violations(modules: &[ModuleNode], config: &LifecycleConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if modules.len() < config.min_modules {
        violations.push(Violation::new(
            Rule::ModulesRequired,
            format!("course must have at least {}", plural(config.min_modules, "module", "modules")),
        ));
    }
    if lesson_count(modules) < config.min_lessons {
        violations.push(Violation::new(
            Rule::LessonsRequired,
            format!("course must have at least {}", plural(config.min_lessons, "lesson", "lessons")),
        ));
    }
    for node in modules.iter().filter(|m| m.lessons.is_empty()) {
        violations.push(Violation::new(
            Rule::EmptyModule,
            format!("module \"{}\" has no lessons", node.module.title),
        ));
    }

    violations
}

pub fn thumbnail_violations(fields: &CourseFields) -> Vec<Violation> {
    let present = fields
        .details
        .thumbnail_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    if present {
        Vec::new()
    } else {
        vec![Violation::new(Rule::ThumbnailRequired, "a course thumbnail is required")]
    }
}

pub fn pricing_violations(fields: &CourseFields) -> Vec<Violation> {
    let d = &fields.details;
    let mut violations = Vec::new();
    if d.is_free {
        return violations;
    }

    let price = d.price_cents.unwrap_or(0);
    if price <= 0 {
        violations.push(Violation::new(
            Rule::PriceRequired,
            "price must be greater than 0 unless the course is free",
        ));
    }
    if let Some(sale) = d.sale_price_cents {
        if sale < 0 || (price > 0 && sale >= price) {
            violations.push(Violation::new(Rule::SalePrice, "sale price must be lower than the price"));
        }
    }

    violations
}

pub fn settings_violations(fields: &CourseFields) -> Vec<Violation> {
    match fields.details.max_students {
        Some(cap) if cap <= 0 => vec![Violation::new(Rule::EnrollmentCap, "enrollment cap must be positive")],
        _ => Vec::new(),
    }
}

/// A module may go live only with lessons (and, per policy, a video lesson).
pub fn module_publish_violations(node: &ModuleNode, config: &LifecycleConfig) -> Vec<Violation> {
    if node.lessons.is_empty() {
        return vec![Violation::new(
            Rule::EmptyModule,
            format!("module \"{}\" has no lessons", node.module.title),
        )];
    }
    if config.require_video_lesson_per_module && !node.has_video_lesson() {
        return vec![Violation::new(
            Rule::ModuleVideoLesson,
            format!("module \"{}\" needs at least 1 video lesson", node.module.title),
        )];
    }
    Vec::new()
}

pub fn question_violations(input: &QuestionInput) -> Vec<Violation> {
    let mut violations = Vec::new();

    if input.prompt.trim().is_empty() {
        violations.push(Violation::new(Rule::QuestionPrompt, "question prompt must not be empty"));
    }
    if input.points <= 0 {
        violations.push(Violation::new(Rule::QuestionPoints, "question points must be positive"));
    }

    if input.kind.is_choice() {
        let options = input.options.iter().filter(|o| !o.body.trim().is_empty()).count();
        let correct = input.options.iter().filter(|o| o.is_correct).count();

        if options < 2 || options != input.options.len() {
            violations.push(Violation::new(
                Rule::QuestionOptions,
                "choice questions need at least 2 non-empty options",
            ));
        }
        if input.kind.single_correct() && correct != 1 {
            violations.push(Violation::new(
                Rule::QuestionCorrectOption,
                "exactly one option must be marked correct",
            ));
        } else if input.kind == QuestionKind::MultipleChoice && correct == 0 {
            violations.push(Violation::new(
                Rule::QuestionCorrectOption,
                "at least one option must be marked correct",
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_db::{Lesson, Module, OptionInput};
    use coursecraft_ids::{CategoryId, CourseId, LessonId, ModuleId};

    fn module(title: &str, lessons: usize) -> ModuleNode {
        let module = Module {
            id: ModuleId::new(),
            course_id: CourseId::new(),
            title: title.into(),
            description: None,
            order_index: 1,
            is_published: false,
        };
        let lessons = (0..lessons)
            .map(|i| Lesson {
                id: LessonId::new(),
                module_id: module.id.clone(),
                title: format!("Lesson {}", i + 1),
                kind: coursecraft_db::LessonKind::Text,
                content: None,
                video_url: None,
                duration_secs: None,
                is_preview: false,
                order_index: i as i64 + 1,
            })
            .collect();
        ModuleNode { module, lessons }
    }

    fn messages(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.message.as_str()).collect()
    }

    #[test]
    fn short_title_is_reported_with_all_other_problems() {
        let mut fields = CourseFields::default();
        fields.details.title = Some("A".into());

        let violations = validate_step(
            WizardStep::BasicInfo,
            &fields,
            &[],
            &ValidationContext::default(),
            &LifecycleConfig::default(),
        );

        assert_eq!(
            messages(&violations),
            vec![
                "title must be ≥10 characters",
                "short description must be ≥20 characters",
                "description must be ≥100 characters",
                "a category must be selected",
            ]
        );
    }

    #[test]
    fn unknown_category_is_flagged() {
        let mut fields = CourseFields::default();
        fields.details.category_id = Some(CategoryId::parse("ghost").unwrap());

        let violations = basic_info_violations(&fields, &ValidationContext::default(), &LifecycleConfig::default());
        assert!(violations.iter().any(|v| v.rule == Rule::CategoryUnknown));

        let ok = basic_info_violations(
            &fields,
            &ValidationContext { category_exists: true },
            &LifecycleConfig::default(),
        );
        assert!(!ok.iter().any(|v| v.rule == Rule::CategoryUnknown || v.rule == Rule::CategoryMissing));
    }

    #[test]
    fn blank_outcomes_do_not_count() {
        let mut fields = CourseFields::default();
        fields.learning_outcomes = vec!["one".into(), "  ".into(), "three".into()];
        fields.requirements = vec!["laptop".into()];

        let violations = learning_content_violations(&fields, &LifecycleConfig::default());
        assert_eq!(messages(&violations), vec!["at least 3 learning outcomes are required"]);
    }

    #[test]
    fn empty_module_is_named() {
        let modules = vec![module("Basics", 3), module("Advanced", 0)];
        let violations = curriculum_violations(&modules, &LifecycleConfig::default());
        assert_eq!(messages(&violations), vec!["module \"Advanced\" has no lessons"]);
    }

    #[test]
    fn free_courses_skip_price_checks() {
        let mut fields = CourseFields::default();
        assert_eq!(pricing_violations(&fields).len(), 1);

        fields.details.is_free = true;
        assert!(pricing_violations(&fields).is_empty());

        fields.details.is_free = false;
        fields.details.price_cents = Some(1_000);
        fields.details.sale_price_cents = Some(1_000);
        assert_eq!(pricing_violations(&fields)[0].rule, Rule::SalePrice);
    }

    #[test]
    fn module_publish_needs_video_per_policy() {
        let text_only = module("Reading", 2);
        let config = LifecycleConfig::default();
        assert_eq!(module_publish_violations(&text_only, &config)[0].rule, Rule::ModuleVideoLesson);

        let relaxed = LifecycleConfig {
            require_video_lesson_per_module: false,
            ..LifecycleConfig::default()
        };
        assert!(module_publish_violations(&text_only, &relaxed).is_empty());
        assert_eq!(module_publish_violations(&module("Empty", 0), &relaxed)[0].rule, Rule::EmptyModule);
    }

    #[test]
    fn question_rules() {
        let mut input = QuestionInput {
            prompt: "Is Rust memory safe?".into(),
            kind: QuestionKind::TrueFalse,
            points: 1,
            explanation: None,
            options: vec![OptionInput::correct("True"), OptionInput::wrong("False")],
        };
        assert!(question_violations(&input).is_empty());

        input.options = vec![OptionInput::correct("True"), OptionInput::correct("False")];
        assert_eq!(question_violations(&input)[0].rule, Rule::QuestionCorrectOption);

        input.kind = QuestionKind::MultipleChoice;
        assert!(question_violations(&input).is_empty());

        input.kind = QuestionKind::ShortAnswer;
        input.options.clear();
        input.points = 0;
        input.prompt = " ".into();
        let rules: Vec<Rule> = question_violations(&input).into_iter().map(|v| v.rule).collect();
        assert_eq!(rules, vec![Rule::QuestionPrompt, Rule::QuestionPoints]);
    }
}
