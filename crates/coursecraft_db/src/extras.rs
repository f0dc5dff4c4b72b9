//! Lesson resources and drip rules

use crate::error::{DbError, Result};
use crate::tx::ordering_conflict;
use crate::types::*;
use crate::CourseTx;
use coursecraft_ids::{CourseId, DripRuleId, LessonId, ModuleId, ResourceId};
use sqlx::Row;

impl CourseTx {
    // ========================================================================
    // Resource Operations
    // ========================================================================

    /// Append a resource to a lesson.
    pub async fn insert_resource(&mut self, lesson_id: &LessonId, input: &ResourceInput) -> Result<Resource> {
        let id = ResourceId::new();

        let row = sqlx::query(
            r#"
            INSERT INTO lesson_resources (id, lesson_id, title, url, kind, order_index)
            SELECT ?, ?, ?, ?, ?, COALESCE(MAX(order_index), 0) + 1
            FROM lesson_resources WHERE lesson_id = ?
            RETURNING order_index
            "#,
        )
        .bind(id.as_str())
        .bind(lesson_id.as_str())
        .bind(&input.title)
        .bind(&input.url)
        .bind(input.kind.as_str())
        .bind(lesson_id.as_str())
        .fetch_one(&mut *self.inner)
        .await
        .map_err(|err| ordering_conflict(err, "lesson_resources"))?;

        Ok(Resource {
            id,
            lesson_id: lesson_id.clone(),
            title: input.title.clone(),
            url: input.url.clone(),
            kind: input.kind,
            order_index: row.get("order_index"),
        })
    }

    pub async fn update_resource(&mut self, id: &ResourceId, input: &ResourceInput) -> Result<()> {
        let result = sqlx::query("UPDATE lesson_resources SET title = ?, url = ?, kind = ? WHERE id = ?")
            .bind(&input.title)
            .bind(&input.url)
            .bind(input.kind.as_str())
            .bind(id.as_str())
            .execute(&mut *self.inner)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("resource {}", id)));
        }
        Ok(())
    }

    /// Get a resource by ID
    pub async fn get_resource(&mut self, id: &ResourceId) -> Result<Option<Resource>> {
        let row = sqlx::query(
            "SELECT id, lesson_id, title, url, kind, order_index FROM lesson_resources WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        row.as_ref().map(row_to_resource).transpose()
    }

    pub async fn list_resources(&mut self, lesson_id: &LessonId) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            "SELECT id, lesson_id, title, url, kind, order_index FROM lesson_resources WHERE lesson_id = ? ORDER BY order_index",
        )
        .bind(lesson_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    pub async fn resource_ids(&mut self, lesson_id: &LessonId) -> Result<Vec<ResourceId>> {
        let ids = self.child_ids("lesson_resources", "lesson_id", lesson_id.as_str()).await?;
        Ok(ids.into_iter().map(ResourceId::from_stored).collect())
    }

    pub async fn reorder_resources(&mut self, lesson_id: &LessonId, ordered: &[ResourceId]) -> Result<()> {
        let ids: Vec<&str> = ordered.iter().map(|id| id.as_str()).collect();
        self.reorder_children("lesson_resources", "lesson_id", lesson_id.as_str(), &ids)
            .await
    }

    // ========================================================================
    // Drip Rules
    // ========================================================================

    /// Create or replace the drip rule of one target.
    ///
    /// A target carries at most one rule; setting it again keeps the rule id.
    pub async fn upsert_drip_rule(
        &mut self,
        course_id: &CourseId,
        target: &DripTarget,
        schedule: DripSchedule,
    ) -> Result<DripRule> {
        let (module_id, lesson_id) = target_columns(target);
        let (delay_days, available_at) = match schedule {
            DripSchedule::AfterEnrollment { days } => (Some(days), None),
            DripSchedule::OnDate { at_millis } => (None, Some(at_millis)),
        };

        let existing = sqlx::query(
            "SELECT id FROM drip_rules WHERE module_id IS ? AND lesson_id IS ?",
        )
        .bind(module_id)
        .bind(lesson_id)
        .fetch_optional(&mut *self.inner)
        .await?;

        let id = match existing {
            Some(row) => {
                let id = DripRuleId::from_stored(row.get("id"));
                sqlx::query("UPDATE drip_rules SET delay_days = ?, available_at = ? WHERE id = ?")
                    .bind(delay_days)
                    .bind(available_at)
                    .bind(id.as_str())
                    .execute(&mut *self.inner)
                    .await?;
                id
            }
            None => {
                let id = DripRuleId::new();
                sqlx::query(
                    r#"
                    INSERT INTO drip_rules (id, course_id, module_id, lesson_id, delay_days, available_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.as_str())
                .bind(course_id.as_str())
                .bind(module_id)
                .bind(lesson_id)
                .bind(delay_days)
                .bind(available_at)
                .execute(&mut *self.inner)
                .await?;
                id
            }
        };

        Ok(DripRule {
            id,
            course_id: course_id.clone(),
            target: target.clone(),
            schedule,
        })
    }

    /// Get a drip rule by ID
    pub async fn get_drip_rule(&mut self, id: &DripRuleId) -> Result<Option<DripRule>> {
        let row = sqlx::query(
            "SELECT id, course_id, module_id, lesson_id, delay_days, available_at FROM drip_rules WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        row.as_ref().map(row_to_drip_rule).transpose()
    }

    pub async fn list_drip_rules(&mut self, course_id: &CourseId) -> Result<Vec<DripRule>> {
        let rows = sqlx::query(
            "SELECT id, course_id, module_id, lesson_id, delay_days, available_at FROM drip_rules WHERE course_id = ? ORDER BY rowid",
        )
        .bind(course_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        rows.iter().map(row_to_drip_rule).collect()
    }
}

fn target_columns(target: &DripTarget) -> (Option<&str>, Option<&str>) {
    match target {
        DripTarget::Module(id) => (Some(id.as_str()), None),
        DripTarget::Lesson(id) => (None, Some(id.as_str())),
    }
}

fn row_to_resource(row: &sqlx::sqlite::SqliteRow) -> Result<Resource> {
    let kind_str: String = row.get("kind");
    let kind = ResourceKind::parse(&kind_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown resource kind: {}", kind_str)))?;

    Ok(Resource {
        id: ResourceId::from_stored(row.get("id")),
        lesson_id: LessonId::from_stored(row.get("lesson_id")),
        title: row.get("title"),
        url: row.get("url"),
        kind,
        order_index: row.get("order_index"),
    })
}

fn row_to_drip_rule(row: &sqlx::sqlite::SqliteRow) -> Result<DripRule> {
    let module_id: Option<String> = row.get("module_id");
    let lesson_id: Option<String> = row.get("lesson_id");
    let target = match (module_id, lesson_id) {
        (Some(m), None) => DripTarget::Module(ModuleId::from_stored(m)),
        (None, Some(l)) => DripTarget::Lesson(LessonId::from_stored(l)),
        _ => return Err(DbError::invalid_state("drip rule must target exactly one of module or lesson")),
    };

    let delay_days: Option<i64> = row.get("delay_days");
    let available_at: Option<i64> = row.get("available_at");
    let schedule = match (delay_days, available_at) {
        (Some(days), None) => DripSchedule::AfterEnrollment { days },
        (None, Some(at_millis)) => DripSchedule::OnDate { at_millis },
        _ => return Err(DbError::invalid_state("drip rule must carry exactly one schedule")),
    };

    Ok(DripRule {
        id: DripRuleId::from_stored(row.get("id")),
        course_id: CourseId::from_stored(row.get("course_id")),
        target,
        schedule,
    })
}
