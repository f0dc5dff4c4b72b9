//! Curriculum operations (modules and lessons)

use crate::error::{DbError, Result};
use crate::tx::ordering_conflict;
use crate::types::*;
use crate::{CourseDb, CourseTx};
use coursecraft_ids::{CourseId, InstructorId, LessonId, ModuleId};
use sqlx::Row;

impl CourseTx {
    // ========================================================================
    // Module Operations
    // ========================================================================

    /// Append a module after the course's current last module.
    pub async fn insert_module(&mut self, course_id: &CourseId, input: &ModuleInput) -> Result<Module> {
        let id = ModuleId::new();
        let now = CourseDb::now_millis();

        // max+1 is computed inside the insert so SQLite's write lock covers it
        let row = sqlx::query(
            r#"
            INSERT INTO modules (id, course_id, title, description, order_index, is_published, created_at, updated_at)
            SELECT ?, ?, ?, ?, COALESCE(MAX(order_index), 0) + 1, 0, ?, ?
            FROM modules WHERE course_id = ?
            RETURNING order_index
            "#,
        )
        .bind(id.as_str())
        .bind(course_id.as_str())
        .bind(&input.title)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .bind(course_id.as_str())
        .fetch_one(&mut *self.inner)
        .await
        .map_err(|err| ordering_conflict(err, "modules"))?;

        Ok(Module {
            id,
            course_id: course_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            order_index: row.get("order_index"),
            is_published: false,
        })
    }

    /// Edit a module's title and description.
    pub async fn update_module(&mut self, id: &ModuleId, input: &ModuleInput) -> Result<()> {
        let result = sqlx::query(
            "UPDATE modules SET title = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(CourseDb::now_millis())
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("module {}", id)));
        }
        Ok(())
    }

    /// Flip a module's published flag.
    pub async fn set_module_published(&mut self, id: &ModuleId, published: bool) -> Result<()> {
        let result = sqlx::query("UPDATE modules SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(published)
            .bind(CourseDb::now_millis())
            .bind(id.as_str())
            .execute(&mut *self.inner)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("module {}", id)));
        }
        Ok(())
    }

    /// Get a module by ID
    pub async fn get_module(&mut self, id: &ModuleId) -> Result<Option<Module>> {
        let row = sqlx::query(
            "SELECT id, course_id, title, description, order_index, is_published FROM modules WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        Ok(row.as_ref().map(row_to_module))
    }

    /// List a course's modules in presentation order
    pub async fn list_modules(&mut self, course_id: &CourseId) -> Result<Vec<Module>> {
        let rows = sqlx::query(
            "SELECT id, course_id, title, description, order_index, is_published FROM modules WHERE course_id = ? ORDER BY order_index",
        )
        .bind(course_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        Ok(rows.iter().map(row_to_module).collect())
    }

    /// Module ids of a course in presentation order.
    pub async fn module_ids(&mut self, course_id: &CourseId) -> Result<Vec<ModuleId>> {
        let ids = self.child_ids("modules", "course_id", course_id.as_str()).await?;
        Ok(ids.into_iter().map(ModuleId::from_stored).collect())
    }

    /// Rewrite module positions to follow `ordered`.
    pub async fn reorder_modules(&mut self, course_id: &CourseId, ordered: &[ModuleId]) -> Result<()> {
        let ids: Vec<&str> = ordered.iter().map(|id| id.as_str()).collect();
        self.reorder_children("modules", "course_id", course_id.as_str(), &ids)
            .await
    }

    /// Resolve module → course → instructor.
    pub async fn module_owner(&mut self, id: &ModuleId) -> Result<Option<ModuleOwner>> {
        let row = sqlx::query(
            r#"
            SELECT m.id AS module_id, m.is_published, c.id AS course_id, c.instructor_id, c.status
            FROM modules m
            JOIN courses c ON c.id = m.course_id
            WHERE m.id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ModuleOwner {
            module_id: ModuleId::from_stored(row.get("module_id")),
            course_id: CourseId::from_stored(row.get("course_id")),
            instructor_id: InstructorId::from_stored(row.get("instructor_id")),
            module_published: row.get("is_published"),
            course_status: parse_status(&row)?,
        }))
    }

    // ========================================================================
    // Lesson Operations
    // ========================================================================

    /// Append a lesson after the module's current last lesson.
    pub async fn insert_lesson(&mut self, module_id: &ModuleId, input: &LessonInput) -> Result<Lesson> {
        let id = LessonId::new();
        let now = CourseDb::now_millis();

        let row = sqlx::query(
            r#"
            INSERT INTO lessons (id, module_id, title, kind, content, video_url, duration_secs, is_preview, order_index, created_at, updated_at)
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(MAX(order_index), 0) + 1, ?, ?
            FROM lessons WHERE module_id = ?
            RETURNING order_index
            "#,
        )
        .bind(id.as_str())
        .bind(module_id.as_str())
        .bind(&input.title)
        .bind(input.kind.as_str())
        .bind(&input.content)
        .bind(&input.video_url)
        .bind(input.duration_secs)
        .bind(input.is_preview)
        .bind(now)
        .bind(now)
        .bind(module_id.as_str())
        .fetch_one(&mut *self.inner)
        .await
        .map_err(|err| ordering_conflict(err, "lessons"))?;

        Ok(Lesson {
            id,
            module_id: module_id.clone(),
            title: input.title.clone(),
            kind: input.kind,
            content: input.content.clone(),
            video_url: input.video_url.clone(),
            duration_secs: input.duration_secs,
            is_preview: input.is_preview,
            order_index: row.get("order_index"),
        })
    }

    /// Overwrite a lesson's editable fields, including its kind.
    pub async fn update_lesson(&mut self, id: &LessonId, input: &LessonInput) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE lessons SET
                title = ?, kind = ?, content = ?, video_url = ?, duration_secs = ?, is_preview = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(input.kind.as_str())
        .bind(&input.content)
        .bind(&input.video_url)
        .bind(input.duration_secs)
        .bind(input.is_preview)
        .bind(CourseDb::now_millis())
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("lesson {}", id)));
        }
        Ok(())
    }

    /// Get a lesson by ID
    pub async fn get_lesson(&mut self, id: &LessonId) -> Result<Option<Lesson>> {
        let row = sqlx::query(
            "SELECT id, module_id, title, kind, content, video_url, duration_secs, is_preview, order_index FROM lessons WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        row.as_ref().map(row_to_lesson).transpose()
    }

    /// List a module's lessons in presentation order
    pub async fn list_lessons(&mut self, module_id: &ModuleId) -> Result<Vec<Lesson>> {
        let rows = sqlx::query(
            "SELECT id, module_id, title, kind, content, video_url, duration_secs, is_preview, order_index FROM lessons WHERE module_id = ? ORDER BY order_index",
        )
        .bind(module_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        rows.iter().map(row_to_lesson).collect()
    }

    /// Every lesson of a course, ordered by module then lesson position.
    pub async fn list_course_lessons(&mut self, course_id: &CourseId) -> Result<Vec<Lesson>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.module_id, l.title, l.kind, l.content, l.video_url, l.duration_secs, l.is_preview, l.order_index
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = ?
            ORDER BY m.order_index, l.order_index
            "#,
        )
        .bind(course_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        rows.iter().map(row_to_lesson).collect()
    }

    /// Lesson ids of a module in presentation order.
    pub async fn lesson_ids(&mut self, module_id: &ModuleId) -> Result<Vec<LessonId>> {
        let ids = self.child_ids("lessons", "module_id", module_id.as_str()).await?;
        Ok(ids.into_iter().map(LessonId::from_stored).collect())
    }

    /// Rewrite lesson positions to follow `ordered`.
    pub async fn reorder_lessons(&mut self, module_id: &ModuleId, ordered: &[LessonId]) -> Result<()> {
        let ids: Vec<&str> = ordered.iter().map(|id| id.as_str()).collect();
        self.reorder_children("lessons", "module_id", module_id.as_str(), &ids)
            .await
    }

    /// Resolve lesson → module → course → instructor.
    pub async fn lesson_owner(&mut self, id: &LessonId) -> Result<Option<LessonOwner>> {
        let row = sqlx::query(
            r#"
            SELECT l.id AS lesson_id, l.kind, m.id AS module_id, m.is_published,
                   c.id AS course_id, c.instructor_id, c.status
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE l.id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let kind_str: String = row.get("kind");
        let kind = LessonKind::parse(&kind_str)
            .ok_or_else(|| DbError::invalid_state(format!("Unknown lesson kind: {}", kind_str)))?;

        Ok(Some(LessonOwner {
            lesson_id: LessonId::from_stored(row.get("lesson_id")),
            kind,
            module_id: ModuleId::from_stored(row.get("module_id")),
            course_id: CourseId::from_stored(row.get("course_id")),
            instructor_id: InstructorId::from_stored(row.get("instructor_id")),
            module_published: row.get("is_published"),
            course_status: parse_status(&row)?,
        }))
    }
}

fn parse_status(row: &sqlx::sqlite::SqliteRow) -> Result<CourseStatus> {
    let status_str: String = row.get("status");
    CourseStatus::parse(&status_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown course status: {}", status_str)))
}

fn row_to_module(row: &sqlx::sqlite::SqliteRow) -> Module {
    Module {
        id: ModuleId::from_stored(row.get("id")),
        course_id: CourseId::from_stored(row.get("course_id")),
        title: row.get("title"),
        description: row.get("description"),
        order_index: row.get("order_index"),
        is_published: row.get("is_published"),
    }
}

fn row_to_lesson(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson> {
    let kind_str: String = row.get("kind");
    let kind = LessonKind::parse(&kind_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown lesson kind: {}", kind_str)))?;

    Ok(Lesson {
        id: LessonId::from_stored(row.get("id")),
        module_id: ModuleId::from_stored(row.get("module_id")),
        title: row.get("title"),
        kind,
        content: row.get("content"),
        video_url: row.get("video_url"),
        duration_secs: row.get("duration_secs"),
        is_preview: row.get("is_preview"),
        order_index: row.get("order_index"),
    })
}
