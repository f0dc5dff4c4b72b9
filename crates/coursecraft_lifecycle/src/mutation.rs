//! Content mutation service.
//!
//! Add, edit, delete and reorder the children of a course aggregate. Every
//! mutation re-derives ownership through the full parent chain inside the
//! caller's transaction; an absent or foreign entity is reported as
//! [`LifecycleError::NotFoundOrUnauthorized`] either way.
//!
//! Business refusals and input problems come back as [`MutationResult`]
//! values. The caller commits only on success.

use crate::aggregate::load_owned_course;
use crate::deletion::{self, owned_lesson, owned_module, DeleteTarget};
use crate::error::{LifecycleError, Result};
use crate::validation::{self, plural, Rule, Violation};
use coursecraft_db::{
    AssignmentInput, CourseTx, DripSchedule, DripTarget, LessonInput, LessonKind, LessonOwner,
    ModuleInput, QuestionInput, QuestionOwner, QuizSettings, ResourceInput,
};
use coursecraft_ids::{CourseId, DripRuleId, InstructorId, LessonId, ModuleId, QuestionId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// One requested change to a course's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChildMutation {
    AddModule { course_id: CourseId, input: ModuleInput },
    EditModule { module_id: ModuleId, input: ModuleInput },
    DeleteModule { module_id: ModuleId },
    ReorderModules { course_id: CourseId, ordered: Vec<ModuleId> },

    AddLesson { module_id: ModuleId, input: LessonInput },
    EditLesson { lesson_id: LessonId, input: LessonInput },
    DeleteLesson { lesson_id: LessonId },
    ReorderLessons { module_id: ModuleId, ordered: Vec<LessonId> },

    /// Questions are addressed through the quiz lesson that owns them.
    AddQuestion { lesson_id: LessonId, input: QuestionInput },
    EditQuestion { question_id: QuestionId, input: QuestionInput },
    DeleteQuestion { question_id: QuestionId },
    ReorderQuestions { lesson_id: LessonId, ordered: Vec<QuestionId> },
    UpdateQuizSettings { lesson_id: LessonId, settings: QuizSettings },

    SetAssignment { lesson_id: LessonId, input: AssignmentInput },
    DeleteAssignment { lesson_id: LessonId },

    AddResource { lesson_id: LessonId, input: ResourceInput },
    EditResource { resource_id: ResourceId, input: ResourceInput },
    DeleteResource { resource_id: ResourceId },
    ReorderResources { lesson_id: LessonId, ordered: Vec<ResourceId> },

    SetDripRule { course_id: CourseId, target: DripTarget, schedule: DripSchedule },
    DeleteDripRule { drip_rule_id: DripRuleId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Module,
    Lesson,
    Question,
    Quiz,
    Assignment,
    Resource,
    DripRule,
}

impl ChildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Lesson => "lesson",
            Self::Question => "question",
            Self::Quiz => "quiz",
            Self::Assignment => "assignment",
            Self::Resource => "resource",
            Self::DripRule => "drip_rule",
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an applied mutation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSummary {
    pub kind: ChildKind,
    pub id: String,
    pub parent_id: String,
    /// Position among siblings, for ordered children.
    pub order_index: Option<i64>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutationResult {
    Applied(ChildSummary),
    Reordered {
        kind: ChildKind,
        parent_id: String,
        order: Vec<String>,
    },
    Removed {
        kind: ChildKind,
        id: String,
        rows_deleted: u64,
        rows_detached: u64,
    },
    /// The input broke one or more rules.
    Rejected { errors: Vec<Violation> },
    /// A business gate blocked the change.
    Refused { reason: String },
}

impl MutationResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected { .. } | Self::Refused { .. })
    }

    fn refused(reason: impl Into<String>) -> Self {
        Self::Refused { reason: reason.into() }
    }

    fn rejected(errors: Vec<Violation>) -> Self {
        Self::Rejected { errors }
    }
}

/// Apply one mutation inside `tx` on behalf of `actor`.
pub async fn apply(tx: &mut CourseTx, actor: &InstructorId, mutation: &ChildMutation) -> Result<MutationResult> {
    debug!(op = mutation_name(mutation), "applying child mutation");

    match mutation {
        ChildMutation::AddModule { course_id, input } => add_module(tx, actor, course_id, input).await,
        ChildMutation::EditModule { module_id, input } => edit_module(tx, actor, module_id, input).await,
        ChildMutation::DeleteModule { module_id } => {
            remove_subtree(tx, actor, ChildKind::Module, DeleteTarget::Module(module_id.clone())).await
        }
        ChildMutation::ReorderModules { course_id, ordered } => {
            load_owned_course(tx, actor, course_id).await?;
            let current = tx.module_ids(course_id).await?;
            if let Some(refusal) = permutation_refusal(ChildKind::Module, &current, ordered) {
                return Ok(refusal);
            }
            tx.reorder_modules(course_id, ordered).await?;
            Ok(reordered(ChildKind::Module, course_id.as_str(), ordered))
        }

        ChildMutation::AddLesson { module_id, input } => add_lesson(tx, actor, module_id, input).await,
        ChildMutation::EditLesson { lesson_id, input } => edit_lesson(tx, actor, lesson_id, input).await,
        ChildMutation::DeleteLesson { lesson_id } => {
            remove_subtree(tx, actor, ChildKind::Lesson, DeleteTarget::Lesson(lesson_id.clone())).await
        }
        ChildMutation::ReorderLessons { module_id, ordered } => {
            owned_module(tx, actor, module_id).await?;
            let current = tx.lesson_ids(module_id).await?;
            if let Some(refusal) = permutation_refusal(ChildKind::Lesson, &current, ordered) {
                return Ok(refusal);
            }
            tx.reorder_lessons(module_id, ordered).await?;
            Ok(reordered(ChildKind::Lesson, module_id.as_str(), ordered))
        }

        ChildMutation::AddQuestion { lesson_id, input } => add_question(tx, actor, lesson_id, input).await,
        ChildMutation::EditQuestion { question_id, input } => {
            let owner = owned_question(tx, actor, question_id).await?;
            let errors = validation::question_violations(input);
            if !errors.is_empty() {
                return Ok(MutationResult::rejected(errors));
            }
            tx.update_question(question_id, input).await?;
            let question = tx
                .get_question(question_id)
                .await?
                .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
            Ok(MutationResult::Applied(ChildSummary {
                kind: ChildKind::Question,
                id: question.id.to_string(),
                parent_id: owner.quiz_id.to_string(),
                order_index: Some(question.order_index),
                label: question.prompt,
            }))
        }
        ChildMutation::DeleteQuestion { question_id } => {
            let owner = owned_question(tx, actor, question_id).await?;
            let attempts = tx.lesson_activity(&owner.lesson_id).await?.quiz_attempts;
            if attempts > 0 {
                return Ok(MutationResult::refused(format!(
                    "cannot delete question: quiz has {}",
                    plural(attempts as usize, "existing student attempt", "existing student attempts")
                )));
            }
            let mut rows = tx.delete_where("question_options", "question_id", question_id.as_str()).await?;
            rows += tx.delete_where("quiz_questions", "id", question_id.as_str()).await?;
            Ok(removed(ChildKind::Question, question_id.as_str(), rows))
        }
        ChildMutation::ReorderQuestions { lesson_id, ordered } => {
            let (_, quiz) = owned_quiz(tx, actor, lesson_id).await?;
            let Some(quiz) = quiz else {
                return Ok(not_a_quiz(lesson_id));
            };
            let current = tx.question_ids(&quiz.id).await?;
            if let Some(refusal) = permutation_refusal(ChildKind::Question, &current, ordered) {
                return Ok(refusal);
            }
            tx.reorder_questions(&quiz.id, ordered).await?;
            Ok(reordered(ChildKind::Question, quiz.id.as_str(), ordered))
        }
        ChildMutation::UpdateQuizSettings { lesson_id, settings } => {
            let (_, quiz) = owned_quiz(tx, actor, lesson_id).await?;
            let Some(quiz) = quiz else {
                return Ok(not_a_quiz(lesson_id));
            };
            let errors = quiz_settings_violations(settings);
            if !errors.is_empty() {
                return Ok(MutationResult::rejected(errors));
            }
            tx.update_quiz_settings(&quiz.id, settings).await?;
            Ok(MutationResult::Applied(ChildSummary {
                kind: ChildKind::Quiz,
                id: quiz.id.to_string(),
                parent_id: lesson_id.to_string(),
                order_index: None,
                label: format!("pass mark {}%", settings.pass_mark_percent),
            }))
        }

        ChildMutation::SetAssignment { lesson_id, input } => {
            let owner = owned_lesson(tx, actor, lesson_id).await?;
            if owner.kind != LessonKind::Assignment {
                return Ok(MutationResult::refused(format!("lesson {} is not an assignment lesson", lesson_id)));
            }
            let errors = assignment_violations(input);
            if !errors.is_empty() {
                return Ok(MutationResult::rejected(errors));
            }
            let assignment = tx.upsert_assignment(lesson_id, input).await?;
            Ok(MutationResult::Applied(ChildSummary {
                kind: ChildKind::Assignment,
                id: assignment.id.to_string(),
                parent_id: lesson_id.to_string(),
                order_index: None,
                label: format!("{} points", assignment.max_points),
            }))
        }
        ChildMutation::DeleteAssignment { lesson_id } => {
            owned_lesson(tx, actor, lesson_id).await?;
            let assignment = tx
                .get_assignment_for_lesson(lesson_id)
                .await?
                .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
            let submissions = tx.lesson_activity(lesson_id).await?.submissions;
            if submissions > 0 {
                return Ok(MutationResult::refused(format!(
                    "cannot delete assignment: {}",
                    plural(submissions as usize, "existing student submission", "existing student submissions")
                )));
            }
            let mut steps = Vec::new();
            deletion::push_assignment_steps(&assignment, &mut steps);
            let (rows, _) = deletion::run_steps(tx, &steps).await?;
            Ok(removed(ChildKind::Assignment, assignment.id.as_str(), rows))
        }

        ChildMutation::AddResource { lesson_id, input } => {
            owned_lesson(tx, actor, lesson_id).await?;
            let errors = resource_violations(input);
            if !errors.is_empty() {
                return Ok(MutationResult::rejected(errors));
            }
            let resource = tx.insert_resource(lesson_id, input).await?;
            Ok(MutationResult::Applied(ChildSummary {
                kind: ChildKind::Resource,
                id: resource.id.to_string(),
                parent_id: lesson_id.to_string(),
                order_index: Some(resource.order_index),
                label: resource.title,
            }))
        }
        ChildMutation::EditResource { resource_id, input } => {
            let resource = owned_resource(tx, actor, resource_id).await?;
            let errors = resource_violations(input);
            if !errors.is_empty() {
                return Ok(MutationResult::rejected(errors));
            }
            tx.update_resource(resource_id, input).await?;
            Ok(MutationResult::Applied(ChildSummary {
                kind: ChildKind::Resource,
                id: resource_id.to_string(),
                parent_id: resource.lesson_id.to_string(),
                order_index: Some(resource.order_index),
                label: input.title.trim().to_string(),
            }))
        }
        ChildMutation::DeleteResource { resource_id } => {
            owned_resource(tx, actor, resource_id).await?;
            let rows = tx.delete_where("lesson_resources", "id", resource_id.as_str()).await?;
            Ok(removed(ChildKind::Resource, resource_id.as_str(), rows))
        }
        ChildMutation::ReorderResources { lesson_id, ordered } => {
            owned_lesson(tx, actor, lesson_id).await?;
            let current = tx.resource_ids(lesson_id).await?;
            if let Some(refusal) = permutation_refusal(ChildKind::Resource, &current, ordered) {
                return Ok(refusal);
            }
            tx.reorder_resources(lesson_id, ordered).await?;
            Ok(reordered(ChildKind::Resource, lesson_id.as_str(), ordered))
        }

        ChildMutation::SetDripRule { course_id, target, schedule } => {
            set_drip_rule(tx, actor, course_id, target, *schedule).await
        }
        ChildMutation::DeleteDripRule { drip_rule_id } => {
            let rule = tx
                .get_drip_rule(drip_rule_id)
                .await?
                .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
            load_owned_course(tx, actor, &rule.course_id).await?;
            let rows = tx.delete_where("drip_rules", "id", drip_rule_id.as_str()).await?;
            Ok(removed(ChildKind::DripRule, drip_rule_id.as_str(), rows))
        }
    }
}

fn mutation_name(mutation: &ChildMutation) -> &'static str {
    match mutation {
        ChildMutation::AddModule { .. } => "add_module",
        ChildMutation::EditModule { .. } => "edit_module",
        ChildMutation::DeleteModule { .. } => "delete_module",
        ChildMutation::ReorderModules { .. } => "reorder_modules",
        ChildMutation::AddLesson { .. } => "add_lesson",
        ChildMutation::EditLesson { .. } => "edit_lesson",
        ChildMutation::DeleteLesson { .. } => "delete_lesson",
        ChildMutation::ReorderLessons { .. } => "reorder_lessons",
        ChildMutation::AddQuestion { .. } => "add_question",
        ChildMutation::EditQuestion { .. } => "edit_question",
        ChildMutation::DeleteQuestion { .. } => "delete_question",
        ChildMutation::ReorderQuestions { .. } => "reorder_questions",
        ChildMutation::UpdateQuizSettings { .. } => "update_quiz_settings",
        ChildMutation::SetAssignment { .. } => "set_assignment",
        ChildMutation::DeleteAssignment { .. } => "delete_assignment",
        ChildMutation::AddResource { .. } => "add_resource",
        ChildMutation::EditResource { .. } => "edit_resource",
        ChildMutation::DeleteResource { .. } => "delete_resource",
        ChildMutation::ReorderResources { .. } => "reorder_resources",
        ChildMutation::SetDripRule { .. } => "set_drip_rule",
        ChildMutation::DeleteDripRule { .. } => "delete_drip_rule",
    }
}

// ============================================================================
// Modules and lessons
// ============================================================================

async fn add_module(
    tx: &mut CourseTx,
    actor: &InstructorId,
    course_id: &CourseId,
    input: &ModuleInput,
) -> Result<MutationResult> {
    load_owned_course(tx, actor, course_id).await?;
    if let Some(error) = blank("module title", &input.title) {
        return Ok(MutationResult::rejected(vec![error]));
    }

    let module = tx.insert_module(course_id, input).await?;
    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::Module,
        id: module.id.to_string(),
        parent_id: course_id.to_string(),
        order_index: Some(module.order_index),
        label: module.title,
    }))
}

async fn edit_module(
    tx: &mut CourseTx,
    actor: &InstructorId,
    module_id: &ModuleId,
    input: &ModuleInput,
) -> Result<MutationResult> {
    let owner = owned_module(tx, actor, module_id).await?;
    if let Some(error) = blank("module title", &input.title) {
        return Ok(MutationResult::rejected(vec![error]));
    }

    tx.update_module(module_id, input).await?;
    let module = tx
        .get_module(module_id)
        .await?
        .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::Module,
        id: module.id.to_string(),
        parent_id: owner.course_id.to_string(),
        order_index: Some(module.order_index),
        label: module.title,
    }))
}

async fn add_lesson(
    tx: &mut CourseTx,
    actor: &InstructorId,
    module_id: &ModuleId,
    input: &LessonInput,
) -> Result<MutationResult> {
    owned_module(tx, actor, module_id).await?;
    let errors = lesson_violations(input);
    if !errors.is_empty() {
        return Ok(MutationResult::rejected(errors));
    }

    let lesson = tx.insert_lesson(module_id, input).await?;
    create_specialization(tx, &lesson.id, lesson.kind).await?;

    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::Lesson,
        id: lesson.id.to_string(),
        parent_id: module_id.to_string(),
        order_index: Some(lesson.order_index),
        label: lesson.title,
    }))
}

async fn edit_lesson(
    tx: &mut CourseTx,
    actor: &InstructorId,
    lesson_id: &LessonId,
    input: &LessonInput,
) -> Result<MutationResult> {
    let owner = owned_lesson(tx, actor, lesson_id).await?;
    let errors = lesson_violations(input);
    if !errors.is_empty() {
        return Ok(MutationResult::rejected(errors));
    }

    if owner.kind != input.kind {
        if let Some(refusal) = drop_specialization(tx, &owner).await? {
            return Ok(refusal);
        }
        create_specialization(tx, lesson_id, input.kind).await?;
        debug!(lesson = %lesson_id, from = %owner.kind, to = %input.kind, "lesson type changed");
    }

    tx.update_lesson(lesson_id, input).await?;
    let lesson = tx
        .get_lesson(lesson_id)
        .await?
        .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::Lesson,
        id: lesson.id.to_string(),
        parent_id: owner.module_id.to_string(),
        order_index: Some(lesson.order_index),
        label: lesson.title,
    }))
}

/// Quiz and assignment lessons carry their specialization from birth.
async fn create_specialization(tx: &mut CourseTx, lesson_id: &LessonId, kind: LessonKind) -> Result<()> {
    match kind {
        LessonKind::Quiz => {
            tx.insert_quiz(lesson_id, &QuizSettings::default()).await?;
        }
        LessonKind::Assignment => {
            tx.upsert_assignment(lesson_id, &AssignmentInput::default()).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Remove the specialization of a lesson whose type is changing. Graded
/// learner work blocks the change.
async fn drop_specialization(tx: &mut CourseTx, owner: &LessonOwner) -> Result<Option<MutationResult>> {
    let activity = tx.lesson_activity(&owner.lesson_id).await?;
    let mut steps = Vec::new();

    if let Some(quiz) = tx.get_quiz_for_lesson(&owner.lesson_id).await? {
        if activity.quiz_attempts > 0 {
            return Ok(Some(MutationResult::refused(format!(
                "cannot change lesson type: quiz has {}",
                plural(activity.quiz_attempts as usize, "existing student attempt", "existing student attempts")
            ))));
        }
        deletion::push_quiz_steps(tx, &quiz, &mut steps).await?;
    }
    if let Some(assignment) = tx.get_assignment_for_lesson(&owner.lesson_id).await? {
        if activity.submissions > 0 {
            return Ok(Some(MutationResult::refused(format!(
                "cannot change lesson type: assignment has {}",
                plural(activity.submissions as usize, "existing student submission", "existing student submissions")
            ))));
        }
        deletion::push_assignment_steps(&assignment, &mut steps);
    }

    deletion::run_steps(tx, &steps).await?;
    Ok(None)
}

async fn remove_subtree(
    tx: &mut CourseTx,
    actor: &InstructorId,
    kind: ChildKind,
    target: DeleteTarget,
) -> Result<MutationResult> {
    let plan = deletion::plan(tx, actor, &target).await?;
    if let Some(reason) = plan.refusal_reason() {
        return Ok(MutationResult::Refused { reason });
    }
    let report = deletion::apply(tx, &plan).await?;
    Ok(MutationResult::Removed {
        kind,
        id: target.id().to_string(),
        rows_deleted: report.rows_deleted,
        rows_detached: report.rows_detached,
    })
}

// ============================================================================
// Quizzes, resources, drip rules
// ============================================================================

async fn owned_quiz(
    tx: &mut CourseTx,
    actor: &InstructorId,
    lesson_id: &LessonId,
) -> Result<(LessonOwner, Option<coursecraft_db::Quiz>)> {
    let owner = owned_lesson(tx, actor, lesson_id).await?;
    let quiz = tx.get_quiz_for_lesson(lesson_id).await?;
    Ok((owner, quiz))
}

fn not_a_quiz(lesson_id: &LessonId) -> MutationResult {
    MutationResult::refused(format!("lesson {} has no quiz", lesson_id))
}

async fn add_question(
    tx: &mut CourseTx,
    actor: &InstructorId,
    lesson_id: &LessonId,
    input: &QuestionInput,
) -> Result<MutationResult> {
    let (_, quiz) = owned_quiz(tx, actor, lesson_id).await?;
    let Some(quiz) = quiz else {
        return Ok(not_a_quiz(lesson_id));
    };
    let errors = validation::question_violations(input);
    if !errors.is_empty() {
        return Ok(MutationResult::rejected(errors));
    }

    let question = tx.insert_question(&quiz.id, input).await?;
    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::Question,
        id: question.id.to_string(),
        parent_id: quiz.id.to_string(),
        order_index: Some(question.order_index),
        label: question.prompt,
    }))
}

async fn owned_question(tx: &mut CourseTx, actor: &InstructorId, id: &QuestionId) -> Result<QuestionOwner> {
    match tx.question_owner(id).await? {
        Some(owner) if &owner.instructor_id == actor => Ok(owner),
        _ => Err(LifecycleError::NotFoundOrUnauthorized),
    }
}

async fn owned_resource(
    tx: &mut CourseTx,
    actor: &InstructorId,
    id: &ResourceId,
) -> Result<coursecraft_db::Resource> {
    let resource = tx
        .get_resource(id)
        .await?
        .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
    owned_lesson(tx, actor, &resource.lesson_id).await?;
    Ok(resource)
}

async fn set_drip_rule(
    tx: &mut CourseTx,
    actor: &InstructorId,
    course_id: &CourseId,
    target: &DripTarget,
    schedule: DripSchedule,
) -> Result<MutationResult> {
    load_owned_course(tx, actor, course_id).await?;

    // The target must sit inside the same course.
    let target_course = match target {
        DripTarget::Module(id) => tx.module_owner(id).await?.map(|o| o.course_id),
        DripTarget::Lesson(id) => tx.lesson_owner(id).await?.map(|o| o.course_id),
    };
    if target_course.as_ref() != Some(course_id) {
        return Err(LifecycleError::NotFoundOrUnauthorized);
    }

    if let DripSchedule::AfterEnrollment { days } = schedule {
        if days < 0 {
            return Ok(MutationResult::rejected(vec![Violation::new(
                Rule::ChildInput,
                "drip delay must not be negative",
            )]));
        }
    }

    let rule = tx.upsert_drip_rule(course_id, target, schedule).await?;
    let label = match schedule {
        DripSchedule::AfterEnrollment { days } => format!("{} after enrollment", plural(days as usize, "day", "days")),
        DripSchedule::OnDate { at_millis } => {
            format!("on {}", coursecraft_db::CourseDb::millis_to_datetime(at_millis).to_rfc3339())
        }
    };
    Ok(MutationResult::Applied(ChildSummary {
        kind: ChildKind::DripRule,
        id: rule.id.to_string(),
        parent_id: course_id.to_string(),
        order_index: None,
        label,
    }))
}

// ============================================================================
// Input checks
// ============================================================================

fn blank(label: &str, value: &str) -> Option<Violation> {
    value
        .trim()
        .is_empty()
        .then(|| Violation::new(Rule::ChildInput, format!("{} must not be empty", label)))
}

fn lesson_violations(input: &LessonInput) -> Vec<Violation> {
    let mut errors: Vec<Violation> = blank("lesson title", &input.title).into_iter().collect();
    if input.duration_secs.is_some_and(|secs| secs < 0) {
        errors.push(Violation::new(Rule::ChildInput, "lesson duration must not be negative"));
    }
    errors
}

fn resource_violations(input: &ResourceInput) -> Vec<Violation> {
    blank("resource title", &input.title)
        .into_iter()
        .chain(blank("resource url", &input.url))
        .collect()
}

fn assignment_violations(input: &AssignmentInput) -> Vec<Violation> {
    let mut errors: Vec<Violation> = blank("assignment instructions", &input.instructions).into_iter().collect();
    if input.max_points <= 0 {
        errors.push(Violation::new(Rule::ChildInput, "assignment points must be positive"));
    }
    if input.due_days.is_some_and(|days| days < 0) {
        errors.push(Violation::new(Rule::ChildInput, "assignment due days must not be negative"));
    }
    errors
}

fn quiz_settings_violations(settings: &QuizSettings) -> Vec<Violation> {
    let mut errors = Vec::new();
    if !(0..=100).contains(&settings.pass_mark_percent) {
        errors.push(Violation::new(Rule::ChildInput, "pass mark must be between 0 and 100"));
    }
    if settings.time_limit_secs.is_some_and(|secs| secs <= 0) {
        errors.push(Violation::new(Rule::ChildInput, "time limit must be positive"));
    }
    if settings.max_attempts.is_some_and(|n| n <= 0) {
        errors.push(Violation::new(Rule::ChildInput, "attempt limit must be positive"));
    }
    errors
}

/// `ordered` must name every current child exactly once.
fn permutation_refusal<T>(kind: ChildKind, current: &[T], ordered: &[T]) -> Option<MutationResult>
where
    T: Eq + std::hash::Hash,
{
    let wanted: HashSet<&T> = ordered.iter().collect();
    let present: HashSet<&T> = current.iter().collect();
    let exact = ordered.len() == current.len() && wanted.len() == ordered.len() && wanted == present;
    (!exact).then(|| {
        MutationResult::refused(format!(
            "reorder must list each of the {} current {}s exactly once",
            current.len(),
            kind
        ))
    })
}

fn reordered<T: fmt::Display>(kind: ChildKind, parent_id: &str, ordered: &[T]) -> MutationResult {
    MutationResult::Reordered {
        kind,
        parent_id: parent_id.to_string(),
        order: ordered.iter().map(ToString::to_string).collect(),
    }
}

fn removed(kind: ChildKind, id: &str, rows_deleted: u64) -> MutationResult {
    MutationResult::Removed {
        kind,
        id: id.to_string(),
        rows_deleted,
        rows_detached: 0,
    }
}
