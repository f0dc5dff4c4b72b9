//! Read views over one course aggregate.

use crate::error::{LifecycleError, Result};
use crate::fields::CourseFields;
use coursecraft_db::{BulletList, Course, CourseTx, Lesson, LessonKind, Module};
use coursecraft_ids::{CourseId, InstructorId};
use serde::Serialize;

/// A module with its lessons in presentation order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

impl ModuleNode {
    pub fn has_video_lesson(&self) -> bool {
        self.lessons.iter().any(|l| l.kind == LessonKind::Video)
    }
}

/// A course as persisted right now: row, wizard fields and curriculum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    pub course: Course,
    pub fields: CourseFields,
    pub modules: Vec<ModuleNode>,
}

impl CourseSnapshot {
    pub fn lesson_count(&self) -> usize {
        lesson_count(&self.modules)
    }
}

pub fn lesson_count(modules: &[ModuleNode]) -> usize {
    modules.iter().map(|m| m.lessons.len()).sum()
}

/// Load the course row and its wizard fields.
pub async fn load_fields(tx: &mut CourseTx, course_id: &CourseId) -> Result<Option<(Course, CourseFields)>> {
    let Some(course) = tx.get_course(course_id).await? else {
        return Ok(None);
    };

    let fields = CourseFields {
        details: course.details.clone(),
        learning_outcomes: tx.list_bullets(course_id, BulletList::LearningOutcomes).await?,
        requirements: tx.list_bullets(course_id, BulletList::Requirements).await?,
        target_audience: tx.list_bullets(course_id, BulletList::TargetAudience).await?,
    };
    Ok(Some((course, fields)))
}

pub async fn load_curriculum(tx: &mut CourseTx, course_id: &CourseId) -> Result<Vec<ModuleNode>> {
    let modules = tx.list_modules(course_id).await?;
    let mut nodes = Vec::with_capacity(modules.len());
    for module in modules {
        let lessons = tx.list_lessons(&module.id).await?;
        nodes.push(ModuleNode { module, lessons });
    }
    Ok(nodes)
}

pub async fn load_snapshot(tx: &mut CourseTx, course_id: &CourseId) -> Result<Option<CourseSnapshot>> {
    let Some((course, fields)) = load_fields(tx, course_id).await? else {
        return Ok(None);
    };
    let modules = load_curriculum(tx, course_id).await?;
    Ok(Some(CourseSnapshot { course, fields, modules }))
}

/// Load a snapshot the actor owns. Absent and foreign courses are
/// indistinguishable to the caller.
pub async fn load_owned_snapshot(
    tx: &mut CourseTx,
    actor: &InstructorId,
    course_id: &CourseId,
) -> Result<CourseSnapshot> {
    match load_snapshot(tx, course_id).await? {
        Some(snapshot) if &snapshot.course.instructor_id == actor => Ok(snapshot),
        _ => Err(LifecycleError::NotFoundOrUnauthorized),
    }
}

/// Load a course row the actor owns.
pub async fn load_owned_course(
    tx: &mut CourseTx,
    actor: &InstructorId,
    course_id: &CourseId,
) -> Result<Course> {
    match tx.get_course(course_id).await? {
        Some(course) if &course.instructor_id == actor => Ok(course),
        _ => Err(LifecycleError::NotFoundOrUnauthorized),
    }
}
