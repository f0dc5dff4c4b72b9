//! Deletion planner and cascade deleter.
//!
//! Deleting a course, module or lesson is a two-phase protocol:
//!
//! 1. [`plan`] resolves ownership, evaluates the eligibility gates and walks
//!    the aggregate to produce the full, ordered list of cascade steps. It
//!    never writes.
//! 2. [`apply`] executes a permitted plan step by step inside the caller's
//!    transaction. The caller commits only if every step succeeded; dropping
//!    the transaction on error rolls back every removal.
//!
//! Strictly owned descendants are deleted. Records that merely point at a
//! deleted course or lesson through a nullable column are detached.

use crate::error::{LifecycleError, Result};
use crate::validation::plural;
use coursecraft_db::{
    Assignment, BackReference, BulletList, CourseStatus, CourseTx, LessonArtifact, LessonOwner,
    ModuleOwner, Quiz,
};
use coursecraft_ids::{CourseId, InstructorId, LessonId, ModuleId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// An entity a caller can ask to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DeleteTarget {
    Course(CourseId),
    Module(ModuleId),
    Lesson(LessonId),
}

impl DeleteTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::Course(id) => id.as_str(),
            Self::Module(id) => id.as_str(),
            Self::Lesson(id) => id.as_str(),
        }
    }
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(id) => write!(f, "course {}", id),
            Self::Module(id) => write!(f, "module {}", id),
            Self::Lesson(id) => write!(f, "lesson {}", id),
        }
    }
}

/// One statement of a cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CascadeStep {
    /// Remove every row of `table` whose `column` equals `key`.
    Delete {
        table: &'static str,
        column: &'static str,
        key: String,
    },
    /// Null out `column` on every row of `table` that equals `key`.
    Detach {
        table: &'static str,
        column: &'static str,
        key: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionPlan {
    pub target: DeleteTarget,
    /// Why the delete is not allowed; empty when it is.
    pub blockers: Vec<String>,
    pub steps: Vec<CascadeStep>,
}

impl DeletionPlan {
    pub fn is_allowed(&self) -> bool {
        self.blockers.is_empty()
    }

    pub fn refusal_reason(&self) -> Option<String> {
        (!self.blockers.is_empty()).then(|| {
            format!("cannot delete {}: {}", self.target_label(), self.blockers.join("; "))
        })
    }

    fn target_label(&self) -> &'static str {
        match self.target {
            DeleteTarget::Course(_) => "course",
            DeleteTarget::Module(_) => "module",
            DeleteTarget::Lesson(_) => "lesson",
        }
    }
}

/// What a cascade did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub target: DeleteTarget,
    pub rows_deleted: u64,
    pub rows_detached: u64,
}

// ============================================================================
// Planning
// ============================================================================

/// Resolve, gate and expand a delete request.
pub async fn plan(tx: &mut CourseTx, actor: &InstructorId, target: &DeleteTarget) -> Result<DeletionPlan> {
    let mut blockers = Vec::new();
    let mut steps = Vec::new();

    match target {
        DeleteTarget::Course(course_id) => {
            let course = crate::aggregate::load_owned_course(tx, actor, course_id).await?;
            if course.status != CourseStatus::Draft {
                blockers.push(format!("course is {}; only drafts can be deleted", course.status));
            }
            let enrollments = tx.count_enrollments(course_id, false).await?;
            if enrollments > 0 {
                blockers.push(format!("course has {}", plural(enrollments as usize, "enrollment", "enrollments")));
            }
            let reviews = tx.count_reviews(course_id).await?;
            if reviews > 0 {
                blockers.push(format!("course has {}", plural(reviews as usize, "review", "reviews")));
            }
            let activity = tx.course_activity(course_id).await?;
            push_graded_work_blockers(&mut blockers, activity.quiz_attempts, activity.submissions);

            push_course_steps(tx, course_id, &mut steps).await?;
        }
        DeleteTarget::Module(module_id) => {
            let owner = owned_module(tx, actor, module_id).await?;
            let activity = tx.module_activity(module_id).await?;
            if owner.is_live() && activity.progress > 0 {
                blockers.push(format!(
                    "live module has {}",
                    plural(activity.progress as usize, "learner progress record", "learner progress records")
                ));
            }
            push_graded_work_blockers(&mut blockers, activity.quiz_attempts, activity.submissions);

            push_module_steps(tx, module_id, &mut steps).await?;
        }
        DeleteTarget::Lesson(lesson_id) => {
            let owner = owned_lesson(tx, actor, lesson_id).await?;
            let activity = tx.lesson_activity(lesson_id).await?;
            if owner.is_live() && activity.progress > 0 {
                blockers.push(format!(
                    "live lesson has {}",
                    plural(activity.progress as usize, "learner progress record", "learner progress records")
                ));
            }
            push_graded_work_blockers(&mut blockers, activity.quiz_attempts, activity.submissions);

            push_lesson_steps(tx, lesson_id, &mut steps).await?;
        }
    }

    debug!(%target, steps = steps.len(), blockers = blockers.len(), "deletion planned");

    Ok(DeletionPlan {
        target: target.clone(),
        blockers,
        steps,
    })
}

fn push_graded_work_blockers(blockers: &mut Vec<String>, attempts: u64, submissions: u64) {
    if attempts > 0 {
        blockers.push(format!(
            "quiz has {}",
            plural(attempts as usize, "existing student attempt", "existing student attempts")
        ));
    }
    if submissions > 0 {
        blockers.push(format!(
            "assignment has {}",
            plural(submissions as usize, "existing student submission", "existing student submissions")
        ));
    }
}

pub(crate) async fn owned_module(tx: &mut CourseTx, actor: &InstructorId, id: &ModuleId) -> Result<ModuleOwner> {
    match tx.module_owner(id).await? {
        Some(owner) if &owner.instructor_id == actor => Ok(owner),
        _ => Err(LifecycleError::NotFoundOrUnauthorized),
    }
}

pub(crate) async fn owned_lesson(tx: &mut CourseTx, actor: &InstructorId, id: &LessonId) -> Result<LessonOwner> {
    match tx.lesson_owner(id).await? {
        Some(owner) if &owner.instructor_id == actor => Ok(owner),
        _ => Err(LifecycleError::NotFoundOrUnauthorized),
    }
}

/// Options → questions → quiz.
pub(crate) async fn push_quiz_steps(tx: &mut CourseTx, quiz: &Quiz, steps: &mut Vec<CascadeStep>) -> Result<()> {
    for question_id in tx.question_ids(&quiz.id).await? {
        steps.push(delete("question_options", "question_id", question_id.as_str()));
    }
    steps.push(delete("quiz_questions", "quiz_id", quiz.id.as_str()));
    steps.push(delete("quizzes", "id", quiz.id.as_str()));
    Ok(())
}

/// Submissions → assignment.
pub(crate) fn push_assignment_steps(assignment: &Assignment, steps: &mut Vec<CascadeStep>) {
    steps.push(delete("assignment_submissions", "assignment_id", assignment.id.as_str()));
    steps.push(delete("assignments", "id", assignment.id.as_str()));
}

async fn push_lesson_steps(tx: &mut CourseTx, lesson_id: &LessonId, steps: &mut Vec<CascadeStep>) -> Result<()> {
    let key = lesson_id.as_str();

    if let Some(quiz) = tx.get_quiz_for_lesson(lesson_id).await? {
        push_quiz_steps(tx, &quiz, steps).await?;
    }
    if let Some(assignment) = tx.get_assignment_for_lesson(lesson_id).await? {
        push_assignment_steps(&assignment, steps);
    }

    steps.push(delete("lesson_resources", "lesson_id", key));
    steps.push(delete("lesson_progress", "lesson_id", key));
    steps.push(delete("drip_rules", "lesson_id", key));
    for artifact in LessonArtifact::ALL {
        steps.push(delete(artifact.table(), "lesson_id", key));
    }
    for reference in BackReference::ALL {
        steps.push(detach(reference.table(), "lesson_id", key));
    }

    steps.push(delete("lessons", "id", key));
    Ok(())
}

async fn push_module_steps(tx: &mut CourseTx, module_id: &ModuleId, steps: &mut Vec<CascadeStep>) -> Result<()> {
    for lesson_id in tx.lesson_ids(module_id).await? {
        push_lesson_steps(tx, &lesson_id, steps).await?;
    }
    steps.push(delete("drip_rules", "module_id", module_id.as_str()));
    steps.push(delete("modules", "id", module_id.as_str()));
    Ok(())
}

async fn push_course_steps(tx: &mut CourseTx, course_id: &CourseId, steps: &mut Vec<CascadeStep>) -> Result<()> {
    let key = course_id.as_str();

    for module_id in tx.module_ids(course_id).await? {
        push_module_steps(tx, &module_id, steps).await?;
    }
    for list in BulletList::ALL {
        steps.push(delete(list.table(), "course_id", key));
    }
    steps.push(delete("drip_rules", "course_id", key));
    for reference in BackReference::ALL {
        steps.push(detach(reference.table(), "course_id", key));
    }

    steps.push(delete("courses", "id", key));
    Ok(())
}

fn delete(table: &'static str, column: &'static str, key: &str) -> CascadeStep {
    CascadeStep::Delete {
        table,
        column,
        key: key.to_string(),
    }
}

fn detach(table: &'static str, column: &'static str, key: &str) -> CascadeStep {
    CascadeStep::Detach {
        table,
        column,
        key: key.to_string(),
    }
}

// ============================================================================
// Applying
// ============================================================================

/// Execute a permitted plan inside `tx`.
///
/// A refused plan is a conflict and touches nothing.
pub async fn apply(tx: &mut CourseTx, plan: &DeletionPlan) -> Result<DeletionReport> {
    if let Some(reason) = plan.refusal_reason() {
        return Err(LifecycleError::ConstraintConflict(reason));
    }

    let (rows_deleted, rows_detached) = run_steps(tx, &plan.steps).await?;

    info!(
        target = %plan.target,
        rows_deleted,
        rows_detached,
        "cascade applied"
    );

    Ok(DeletionReport {
        target: plan.target.clone(),
        rows_deleted,
        rows_detached,
    })
}

/// Run cascade steps in order; returns (deleted, detached) row counts.
pub(crate) async fn run_steps(tx: &mut CourseTx, steps: &[CascadeStep]) -> Result<(u64, u64)> {
    let mut deleted = 0;
    let mut detached = 0;
    for step in steps {
        match step {
            CascadeStep::Delete { table, column, key } => {
                deleted += tx.delete_where(table, column, key).await?;
            }
            CascadeStep::Detach { table, column, key } => {
                detached += tx.detach_where(table, column, key).await?;
            }
        }
    }
    Ok((deleted, detached))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_db::{
        CourseDb, CourseDetails, LessonInput, LessonKind, ModuleInput, OptionInput, QuestionInput,
        QuestionKind, QuizSettings,
    };
    use coursecraft_ids::LearnerId;

    struct Seed {
        actor: InstructorId,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
        quiz: Quiz,
    }

    async fn seed(tx: &mut CourseTx) -> Seed {
        let actor = InstructorId::parse("inst").unwrap();
        let course_id = CourseId::new();
        tx.insert_course(&course_id, &actor, "c", &CourseDetails::default()).await.unwrap();
        let module = tx
            .insert_module(&course_id, &ModuleInput { title: "M".into(), description: None })
            .await
            .unwrap();
        let lesson = tx
            .insert_lesson(&module.id, &LessonInput::new("Check", LessonKind::Quiz))
            .await
            .unwrap();
        let quiz = tx.insert_quiz(&lesson.id, &QuizSettings::default()).await.unwrap();
        tx.insert_question(
            &quiz.id,
            &QuestionInput {
                prompt: "?".into(),
                kind: QuestionKind::TrueFalse,
                points: 1,
                explanation: None,
                options: vec![OptionInput::correct("T"), OptionInput::wrong("F")],
            },
        )
        .await
        .unwrap();

        Seed {
            actor,
            course_id,
            module_id: module.id,
            lesson_id: lesson.id,
            quiz,
        }
    }

    #[tokio::test]
    async fn lesson_plan_orders_quiz_before_lesson() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let s = seed(&mut tx).await;

        let plan = plan(&mut tx, &s.actor, &DeleteTarget::Lesson(s.lesson_id.clone())).await.unwrap();
        assert!(plan.is_allowed());

        let tables: Vec<&str> = plan
            .steps
            .iter()
            .filter_map(|step| match step {
                CascadeStep::Delete { table, .. } => Some(*table),
                CascadeStep::Detach { .. } => None,
            })
            .collect();
        let pos = |t: &str| tables.iter().position(|x| *x == t).unwrap();
        assert!(pos("question_options") < pos("quiz_questions"));
        assert!(pos("quiz_questions") < pos("quizzes"));
        assert!(pos("quizzes") < pos("lessons"));
        assert_eq!(tables.last(), Some(&"lessons"));
    }

    #[tokio::test]
    async fn attempts_block_and_plan_touches_nothing() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let s = seed(&mut tx).await;
        tx.record_quiz_attempt(&s.quiz.id, &LearnerId::parse("l1").unwrap(), 50).await.unwrap();

        let plan = plan(&mut tx, &s.actor, &DeleteTarget::Module(s.module_id.clone())).await.unwrap();
        assert!(!plan.is_allowed());
        let reason = plan.refusal_reason().unwrap();
        assert!(reason.contains("1 existing student attempt"), "{}", reason);

        let err = apply(&mut tx, &plan).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ConstraintConflict(_)));
        assert!(tx.get_lesson(&s.lesson_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn foreign_actor_cannot_plan() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let s = seed(&mut tx).await;

        let stranger = InstructorId::parse("someone-else").unwrap();
        let err = plan(&mut tx, &stranger, &DeleteTarget::Course(s.course_id.clone())).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFoundOrUnauthorized));
    }

    #[tokio::test]
    async fn course_cascade_removes_everything() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let s = seed(&mut tx).await;

        let plan = plan(&mut tx, &s.actor, &DeleteTarget::Course(s.course_id.clone())).await.unwrap();
        let report = apply(&mut tx, &plan).await.unwrap();

        // course + module + lesson + quiz + question + 2 options
        assert_eq!(report.rows_deleted, 7);
        assert!(tx.get_course(&s.course_id).await.unwrap().is_none());
        assert!(tx.get_quiz_for_lesson(&s.lesson_id).await.unwrap().is_none());
    }
}
