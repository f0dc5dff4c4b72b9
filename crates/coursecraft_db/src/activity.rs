//! Learner activity lookups.
//!
//! Authoring never writes these tables except through the cascade deleter.
//! The `record_*` methods exist for seeding and tooling.

use crate::error::Result;
use crate::types::*;
use crate::{CourseDb, CourseTx};
use coursecraft_ids::{AssignmentId, CourseId, LearnerId, LessonId, ModuleId, QuizId};
use sqlx::Row;

/// Activity rows joined up to the lesson they belong to.
const LESSON_ACTIVITY: &str = r#"
    SELECT
        (SELECT COUNT(*) FROM lesson_progress p WHERE p.lesson_id IN ({lessons})) AS progress,
        (SELECT COUNT(*) FROM quiz_attempts a JOIN quizzes z ON z.id = a.quiz_id
            WHERE z.lesson_id IN ({lessons})) AS attempts,
        (SELECT COUNT(*) FROM assignment_submissions s JOIN assignments g ON g.id = s.assignment_id
            WHERE g.lesson_id IN ({lessons})) AS submissions
"#;

impl CourseTx {
    // ========================================================================
    // Counts
    // ========================================================================

    /// Enrollments of a course, optionally only the active ones.
    pub async fn count_enrollments(&mut self, course_id: &CourseId, active_only: bool) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM enrollments WHERE course_id = ? AND (? = 0 OR status = 'active')",
        )
        .bind(course_id.as_str())
        .bind(active_only)
        .fetch_one(&mut *self.inner)
        .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    pub async fn count_reviews(&mut self, course_id: &CourseId) -> Result<u64> {
        self.count_where("course_reviews", "course_id", course_id.as_str())
            .await
    }

    /// Activity recorded against a single lesson.
    pub async fn lesson_activity(&mut self, lesson_id: &LessonId) -> Result<ActivityCounts> {
        self.activity_within("?", lesson_id.as_str()).await
    }

    /// Activity recorded against any lesson of a module.
    pub async fn module_activity(&mut self, module_id: &ModuleId) -> Result<ActivityCounts> {
        self.activity_within("SELECT id FROM lessons WHERE module_id = ?", module_id.as_str())
            .await
    }

    /// Activity recorded against any lesson of a course.
    pub async fn course_activity(&mut self, course_id: &CourseId) -> Result<ActivityCounts> {
        self.activity_within(
            "SELECT l.id FROM lessons l JOIN modules m ON m.id = l.module_id WHERE m.course_id = ?",
            course_id.as_str(),
        )
        .await
    }

    async fn activity_within(&mut self, lessons: &'static str, key: &str) -> Result<ActivityCounts> {
        let sql = LESSON_ACTIVITY.replace("{lessons}", lessons);
        let row = sqlx::query(&sql)
            .bind(key)
            .bind(key)
            .bind(key)
            .fetch_one(&mut *self.inner)
            .await?;

        Ok(ActivityCounts {
            progress: row.get::<i64, _>("progress") as u64,
            quiz_attempts: row.get::<i64, _>("attempts") as u64,
            submissions: row.get::<i64, _>("submissions") as u64,
        })
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    pub async fn record_enrollment(
        &mut self,
        course_id: &CourseId,
        learner_id: &LearnerId,
        status: EnrollmentStatus,
    ) -> Result<()> {
        sqlx::query("INSERT INTO enrollments (course_id, learner_id, status, enrolled_at) VALUES (?, ?, ?, ?)")
            .bind(course_id.as_str())
            .bind(learner_id.as_str())
            .bind(status.as_str())
            .bind(CourseDb::now_millis())
            .execute(&mut *self.inner)
            .await?;
        Ok(())
    }

    pub async fn record_review(&mut self, course_id: &CourseId, learner_id: &LearnerId, rating: i64) -> Result<()> {
        sqlx::query("INSERT INTO course_reviews (course_id, learner_id, rating, created_at) VALUES (?, ?, ?, ?)")
            .bind(course_id.as_str())
            .bind(learner_id.as_str())
            .bind(rating)
            .bind(CourseDb::now_millis())
            .execute(&mut *self.inner)
            .await?;
        Ok(())
    }

    pub async fn record_progress(&mut self, lesson_id: &LessonId, learner_id: &LearnerId, completed: bool) -> Result<()> {
        sqlx::query("INSERT INTO lesson_progress (lesson_id, learner_id, completed, updated_at) VALUES (?, ?, ?, ?)")
            .bind(lesson_id.as_str())
            .bind(learner_id.as_str())
            .bind(completed)
            .bind(CourseDb::now_millis())
            .execute(&mut *self.inner)
            .await?;
        Ok(())
    }

    pub async fn record_quiz_attempt(&mut self, quiz_id: &QuizId, learner_id: &LearnerId, score: i64) -> Result<()> {
        sqlx::query("INSERT INTO quiz_attempts (quiz_id, learner_id, score, attempted_at) VALUES (?, ?, ?, ?)")
            .bind(quiz_id.as_str())
            .bind(learner_id.as_str())
            .bind(score)
            .bind(CourseDb::now_millis())
            .execute(&mut *self.inner)
            .await?;
        Ok(())
    }

    pub async fn record_submission(
        &mut self,
        assignment_id: &AssignmentId,
        learner_id: &LearnerId,
        grade: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO assignment_submissions (assignment_id, learner_id, grade, submitted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(assignment_id.as_str())
        .bind(learner_id.as_str())
        .bind(grade)
        .bind(CourseDb::now_millis())
        .execute(&mut *self.inner)
        .await?;
        Ok(())
    }

    /// Attach an operational record (comment, note, chapter, log...) to a lesson.
    pub async fn record_lesson_artifact(
        &mut self,
        artifact: LessonArtifact,
        lesson_id: &LessonId,
        body: &str,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (lesson_id, body, created_at) VALUES (?, ?, ?)",
            artifact.table()
        );
        sqlx::query(&sql)
            .bind(lesson_id.as_str())
            .bind(body)
            .bind(CourseDb::now_millis())
            .execute(&mut *self.inner)
            .await?;
        Ok(())
    }

    /// Store a record that points into the aggregate; returns its row id.
    pub async fn record_back_reference(
        &mut self,
        reference: BackReference,
        owner_id: &str,
        course_id: Option<&CourseId>,
        lesson_id: Option<&LessonId>,
    ) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (owner_id, course_id, lesson_id, created_at) VALUES (?, ?, ?, ?) RETURNING id",
            reference.table()
        );
        let row = sqlx::query(&sql)
            .bind(owner_id)
            .bind(course_id.map(|id| id.as_str()))
            .bind(lesson_id.map(|id| id.as_str()))
            .bind(CourseDb::now_millis())
            .fetch_one(&mut *self.inner)
            .await?;
        Ok(row.get("id"))
    }

    pub async fn get_back_reference(
        &mut self,
        reference: BackReference,
        id: i64,
    ) -> Result<Option<BackReferenceRow>> {
        let sql = format!(
            "SELECT id, course_id, lesson_id FROM {} WHERE id = ?",
            reference.table()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.inner)
            .await?;

        Ok(row.map(|row| BackReferenceRow {
            id: row.get("id"),
            course_id: row.get("course_id"),
            lesson_id: row.get("lesson_id"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_ids::InstructorId;

    #[tokio::test]
    async fn activity_rolls_up_from_lesson_to_course() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();

        let course_id = CourseId::new();
        tx.insert_course(&course_id, &InstructorId::parse("inst").unwrap(), "c", &CourseDetails::default())
            .await
            .unwrap();
        let module = tx
            .insert_module(&course_id, &ModuleInput { title: "M".into(), description: None })
            .await
            .unwrap();
        let quiet = tx.insert_lesson(&module.id, &LessonInput::new("quiet", LessonKind::Text)).await.unwrap();
        let busy = tx.insert_lesson(&module.id, &LessonInput::new("busy", LessonKind::Quiz)).await.unwrap();
        let quiz = tx.insert_quiz(&busy.id, &QuizSettings::default()).await.unwrap();

        let learner = LearnerId::parse("learner-1").unwrap();
        tx.record_progress(&busy.id, &learner, true).await.unwrap();
        tx.record_quiz_attempt(&quiz.id, &learner, 80).await.unwrap();

        assert!(tx.lesson_activity(&quiet.id).await.unwrap().is_empty());
        let busy_counts = tx.lesson_activity(&busy.id).await.unwrap();
        assert_eq!(busy_counts.progress, 1);
        assert_eq!(busy_counts.quiz_attempts, 1);
        assert_eq!(tx.module_activity(&module.id).await.unwrap(), busy_counts);
        assert_eq!(tx.course_activity(&course_id).await.unwrap(), busy_counts);
    }

    #[tokio::test]
    async fn enrollment_counts_respect_status() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let course_id = CourseId::new();
        tx.insert_course(&course_id, &InstructorId::parse("inst").unwrap(), "c", &CourseDetails::default())
            .await
            .unwrap();

        tx.record_enrollment(&course_id, &LearnerId::parse("a").unwrap(), EnrollmentStatus::Active)
            .await
            .unwrap();
        tx.record_enrollment(&course_id, &LearnerId::parse("b").unwrap(), EnrollmentStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(tx.count_enrollments(&course_id, false).await.unwrap(), 2);
        assert_eq!(tx.count_enrollments(&course_id, true).await.unwrap(), 1);
    }
}
