//! Database schema creation for all course aggregate tables.
//!
//! All CREATE TABLE statements live here - single source of truth.
//! Child rows reference parents without ON DELETE CASCADE: the lifecycle
//! engine removes descendants explicitly, and foreign keys catch anything it
//! misses.

use crate::error::Result;
use crate::types::{BackReference, LessonArtifact};
use crate::CourseDb;
use tracing::info;

impl CourseDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        self.create_course_tables().await?;
        self.create_curriculum_tables().await?;
        self.create_assessment_tables().await?;
        self.create_activity_tables().await?;
        self.create_reference_tables().await?;

        info!("Course schema verified");
        Ok(())
    }

    async fn run_all(&self, statements: &[&str]) -> Result<()> {
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Categories, courses and the course bullet lists
    async fn create_course_tables(&self) -> Result<()> {
        self.run_all(&[
            // Administered elsewhere; read for existence checks only
            r#"CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                instructor_id TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'draft',
                title TEXT,
                subtitle TEXT,
                short_description TEXT,
                description TEXT,
                category_id TEXT,
                level TEXT,
                language TEXT,
                thumbnail_url TEXT,
                promo_video_url TEXT,
                price_cents INTEGER,
                sale_price_cents INTEGER,
                is_free INTEGER NOT NULL DEFAULT 0,
                currency TEXT,
                has_certificate INTEGER NOT NULL DEFAULT 0,
                max_students INTEGER,
                drip_enabled INTEGER NOT NULL DEFAULT 0,
                meta_title TEXT,
                meta_keywords TEXT,
                submitted_at INTEGER,
                published_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                CHECK(status IN ('draft', 'pending_review', 'published', 'archived'))
            )"#,
            r#"CREATE TABLE IF NOT EXISTS course_learning_outcomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id TEXT NOT NULL REFERENCES courses(id),
                body TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                UNIQUE(course_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS course_requirements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id TEXT NOT NULL REFERENCES courses(id),
                body TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                UNIQUE(course_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS course_target_audience (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id TEXT NOT NULL REFERENCES courses(id),
                body TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                UNIQUE(course_id, order_index)
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_courses_instructor ON courses(instructor_id)",
        ])
        .await
    }

    /// Modules, lessons, resources and drip rules
    async fn create_curriculum_tables(&self) -> Result<()> {
        self.run_all(&[
            r#"CREATE TABLE IF NOT EXISTS modules (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL REFERENCES courses(id),
                title TEXT NOT NULL,
                description TEXT,
                order_index INTEGER NOT NULL,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(course_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                module_id TEXT NOT NULL REFERENCES modules(id),
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                content TEXT,
                video_url TEXT,
                duration_secs INTEGER,
                is_preview INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(module_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS lesson_resources (
                id TEXT PRIMARY KEY,
                lesson_id TEXT NOT NULL REFERENCES lessons(id),
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                kind TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                UNIQUE(lesson_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS drip_rules (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL REFERENCES courses(id),
                module_id TEXT REFERENCES modules(id),
                lesson_id TEXT REFERENCES lessons(id),
                delay_days INTEGER,
                available_at INTEGER,
                CHECK((module_id IS NULL) != (lesson_id IS NULL)),
                CHECK((delay_days IS NULL) != (available_at IS NULL))
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_modules_course ON modules(course_id)",
            "CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_drip_rules_module ON drip_rules(module_id) WHERE module_id IS NOT NULL",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_drip_rules_lesson ON drip_rules(lesson_id) WHERE lesson_id IS NOT NULL",
        ])
        .await
    }

    /// Quizzes, questions, options and assignments
    async fn create_assessment_tables(&self) -> Result<()> {
        self.run_all(&[
            r#"CREATE TABLE IF NOT EXISTS quizzes (
                id TEXT PRIMARY KEY,
                lesson_id TEXT NOT NULL UNIQUE REFERENCES lessons(id),
                pass_mark_percent INTEGER NOT NULL DEFAULT 70,
                time_limit_secs INTEGER,
                max_attempts INTEGER,
                shuffle_questions INTEGER NOT NULL DEFAULT 0
            )"#,
            r#"CREATE TABLE IF NOT EXISTS quiz_questions (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL REFERENCES quizzes(id),
                prompt TEXT NOT NULL,
                kind TEXT NOT NULL,
                points INTEGER NOT NULL,
                explanation TEXT,
                order_index INTEGER NOT NULL,
                UNIQUE(quiz_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS question_options (
                id TEXT PRIMARY KEY,
                question_id TEXT NOT NULL REFERENCES quiz_questions(id),
                body TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL,
                UNIQUE(question_id, order_index)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                lesson_id TEXT NOT NULL UNIQUE REFERENCES lessons(id),
                instructions TEXT NOT NULL,
                max_points INTEGER NOT NULL,
                due_days INTEGER,
                allow_resubmission INTEGER NOT NULL DEFAULT 0
            )"#,
        ])
        .await
    }

    /// Learner activity plus per-lesson operational records
    async fn create_activity_tables(&self) -> Result<()> {
        self.run_all(&[
            r#"CREATE TABLE IF NOT EXISTS enrollments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id TEXT NOT NULL REFERENCES courses(id),
                learner_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                enrolled_at INTEGER NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS course_reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id TEXT NOT NULL REFERENCES courses(id),
                learner_id TEXT NOT NULL,
                rating INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS lesson_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lesson_id TEXT NOT NULL REFERENCES lessons(id),
                learner_id TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS quiz_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id TEXT NOT NULL REFERENCES quizzes(id),
                learner_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                attempted_at INTEGER NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS assignment_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                assignment_id TEXT NOT NULL REFERENCES assignments(id),
                learner_id TEXT NOT NULL,
                grade INTEGER,
                submitted_at INTEGER NOT NULL
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id)",
            "CREATE INDEX IF NOT EXISTS idx_progress_lesson ON lesson_progress(lesson_id)",
            "CREATE INDEX IF NOT EXISTS idx_attempts_quiz ON quiz_attempts(quiz_id)",
        ])
        .await?;

        for artifact in LessonArtifact::ALL {
            let sql = format!(
                r#"CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    lesson_id TEXT NOT NULL REFERENCES lessons(id),
                    author_id TEXT,
                    body TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL
                )"#,
                artifact.table()
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Records holding optional pointers into the aggregate
    async fn create_reference_tables(&self) -> Result<()> {
        for reference in BackReference::ALL {
            let sql = format!(
                r#"CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id TEXT NOT NULL,
                    course_id TEXT REFERENCES courses(id),
                    lesson_id TEXT REFERENCES lessons(id),
                    label TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL
                )"#,
                reference.table()
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }
}
