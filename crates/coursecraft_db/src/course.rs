//! Course operations (root of the aggregate, side-lists, status)

use crate::error::{DbError, Result};
use crate::types::*;
use crate::{CourseDb, CourseTx};
use coursecraft_ids::{CategoryId, CourseId, InstructorId};
use sqlx::Row;

const COURSE_COLUMNS: &str = "id, instructor_id, slug, status, title, subtitle, short_description, \
     description, category_id, level, language, thumbnail_url, promo_video_url, price_cents, \
     sale_price_cents, is_free, currency, has_certificate, max_students, drip_enabled, meta_title, \
     meta_keywords, submitted_at, published_at, created_at, updated_at";

impl CourseTx {
    // ========================================================================
    // Categories
    // ========================================================================

    /// Whether a category with this id exists.
    pub async fn category_exists(&mut self, id: &CategoryId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM categories WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *self.inner)
            .await?;
        Ok(row.is_some())
    }

    /// Register a category. Category administration lives elsewhere; this
    /// exists for seeding and tooling.
    pub async fn insert_category(&mut self, id: &CategoryId, name: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(id.as_str())
        .bind(name)
        .execute(&mut *self.inner)
        .await?;
        Ok(())
    }

    // ========================================================================
    // Course rows
    // ========================================================================

    /// Insert a new draft course.
    pub async fn insert_course(
        &mut self,
        id: &CourseId,
        instructor_id: &InstructorId,
        slug: &str,
        details: &CourseDetails,
    ) -> Result<Course> {
        let now = CourseDb::now_millis();

        sqlx::query(
            r#"
            INSERT INTO courses (id, instructor_id, slug, status, created_at, updated_at)
            VALUES (?, ?, ?, 'draft', ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(instructor_id.as_str())
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(&mut *self.inner)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::constraint(format!("slug already taken: {}", slug))
            }
            _ => DbError::from(err),
        })?;

        self.update_course_details(id, details).await?;

        self.get_course(id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("course {}", id)))
    }

    /// Get a course by ID
    pub async fn get_course(&mut self, id: &CourseId) -> Result<Option<Course>> {
        let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.inner)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_course(&row)?)),
            None => Ok(None),
        }
    }

    /// List the courses of one instructor, newest first.
    pub async fn list_courses_for_instructor(
        &mut self,
        instructor_id: &InstructorId,
    ) -> Result<Vec<Course>> {
        let sql = format!(
            "SELECT {} FROM courses WHERE instructor_id = ? ORDER BY created_at DESC",
            COURSE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(instructor_id.as_str())
            .fetch_all(&mut *self.inner)
            .await?;

        rows.iter().map(row_to_course).collect()
    }

    /// Overwrite every scalar wizard field.
    pub async fn update_course_details(
        &mut self,
        id: &CourseId,
        details: &CourseDetails,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE courses SET
                title = ?,
                subtitle = ?,
                short_description = ?,
                description = ?,
                category_id = ?,
                level = ?,
                language = ?,
                thumbnail_url = ?,
                promo_video_url = ?,
                price_cents = ?,
                sale_price_cents = ?,
                is_free = ?,
                currency = ?,
                has_certificate = ?,
                max_students = ?,
                drip_enabled = ?,
                meta_title = ?,
                meta_keywords = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&details.title)
        .bind(&details.subtitle)
        .bind(&details.short_description)
        .bind(&details.description)
        .bind(details.category_id.as_ref().map(|c| c.as_str()))
        .bind(&details.level)
        .bind(&details.language)
        .bind(&details.thumbnail_url)
        .bind(&details.promo_video_url)
        .bind(details.price_cents)
        .bind(details.sale_price_cents)
        .bind(details.is_free)
        .bind(&details.currency)
        .bind(details.has_certificate)
        .bind(details.max_students)
        .bind(details.drip_enabled)
        .bind(&details.meta_title)
        .bind(&details.meta_keywords)
        .bind(CourseDb::now_millis())
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("course {}", id)));
        }
        Ok(())
    }

    /// Move a course to a new status, stamping submission/publication times.
    pub async fn set_course_status(&mut self, id: &CourseId, status: CourseStatus) -> Result<()> {
        let now = CourseDb::now_millis();
        let result = sqlx::query(
            r#"
            UPDATE courses SET
                status = ?,
                submitted_at = CASE WHEN ? = 'pending_review' THEN ? ELSE submitted_at END,
                published_at = CASE WHEN ? = 'published' THEN ? ELSE published_at END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(status.as_str())
        .bind(now)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("course {}", id)));
        }
        Ok(())
    }

    /// Whether any course already uses this slug.
    pub async fn slug_exists(&mut self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM courses WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *self.inner)
            .await?;
        Ok(row.is_some())
    }

    // ========================================================================
    // Bullet side-lists
    // ========================================================================

    /// Load one ordered bullet list.
    pub async fn list_bullets(&mut self, id: &CourseId, list: BulletList) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT body FROM {} WHERE course_id = ? ORDER BY order_index",
            list.table()
        );
        let rows = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_all(&mut *self.inner)
            .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("body")).collect())
    }

    /// Replace one bullet list with `items`, indexed 1..=n.
    pub async fn replace_bullets(
        &mut self,
        id: &CourseId,
        list: BulletList,
        items: &[String],
    ) -> Result<()> {
        self.delete_where(list.table(), "course_id", id.as_str()).await?;

        let sql = format!(
            "INSERT INTO {} (course_id, body, order_index) VALUES (?, ?, ?)",
            list.table()
        );
        for (position, body) in items.iter().enumerate() {
            sqlx::query(&sql)
                .bind(id.as_str())
                .bind(body)
                .bind(position as i64 + 1)
                .execute(&mut *self.inner)
                .await?;
        }
        Ok(())
    }
}

fn row_to_course(row: &sqlx::sqlite::SqliteRow) -> Result<Course> {
    let status_str: String = row.get("status");
    let status = CourseStatus::parse(&status_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown course status: {}", status_str)))?;

    let details = CourseDetails {
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        short_description: row.get("short_description"),
        description: row.get("description"),
        category_id: row
            .get::<Option<String>, _>("category_id")
            .map(CategoryId::from_stored),
        level: row.get("level"),
        language: row.get("language"),
        thumbnail_url: row.get("thumbnail_url"),
        promo_video_url: row.get("promo_video_url"),
        price_cents: row.get("price_cents"),
        sale_price_cents: row.get("sale_price_cents"),
        is_free: row.get("is_free"),
        currency: row.get("currency"),
        has_certificate: row.get("has_certificate"),
        max_students: row.get("max_students"),
        drip_enabled: row.get("drip_enabled"),
        meta_title: row.get("meta_title"),
        meta_keywords: row.get("meta_keywords"),
    };

    Ok(Course {
        id: CourseId::from_stored(row.get("id")),
        instructor_id: InstructorId::from_stored(row.get("instructor_id")),
        slug: row.get("slug"),
        status,
        details,
        submitted_at: row
            .get::<Option<i64>, _>("submitted_at")
            .map(CourseDb::millis_to_datetime),
        published_at: row
            .get::<Option<i64>, _>("published_at")
            .map(CourseDb::millis_to_datetime),
        created_at: CourseDb::millis_to_datetime(row.get("created_at")),
        updated_at: CourseDb::millis_to_datetime(row.get("updated_at")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instructor() -> InstructorId {
        InstructorId::parse("inst-1").unwrap()
    }

    #[tokio::test]
    async fn insert_and_reload_course_details() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();

        let id = CourseId::new();
        let details = CourseDetails {
            title: Some("Rust for Data Engineers".into()),
            price_cents: Some(4_900),
            has_certificate: true,
            ..Default::default()
        };
        let course = tx.insert_course(&id, &instructor(), "rust-for-data", &details).await.unwrap();

        assert_eq!(course.status, CourseStatus::Draft);
        assert_eq!(course.details, details);
        assert!(course.submitted_at.is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_constraint_error() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();

        tx.insert_course(&CourseId::new(), &instructor(), "same", &CourseDetails::default())
            .await
            .unwrap();
        let err = tx
            .insert_course(&CourseId::new(), &instructor(), "same", &CourseDetails::default())
            .await
            .unwrap_err();

        assert!(err.is_unique_violation());
        assert!(tx.slug_exists("same").await.unwrap());
    }

    #[tokio::test]
    async fn status_change_stamps_timestamps() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let id = CourseId::new();
        tx.insert_course(&id, &instructor(), "c", &CourseDetails::default()).await.unwrap();

        tx.set_course_status(&id, CourseStatus::PendingReview).await.unwrap();
        tx.set_course_status(&id, CourseStatus::Published).await.unwrap();

        let course = tx.get_course(&id).await.unwrap().unwrap();
        assert_eq!(course.status, CourseStatus::Published);
        assert!(course.submitted_at.is_some());
        assert!(course.published_at.is_some());
    }

    #[tokio::test]
    async fn replace_bullets_rewrites_order() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let id = CourseId::new();
        tx.insert_course(&id, &instructor(), "c", &CourseDetails::default()).await.unwrap();

        let first = vec!["a".to_string(), "b".to_string()];
        tx.replace_bullets(&id, BulletList::Requirements, &first).await.unwrap();
        let second = vec!["c".to_string(), "a".to_string(), "d".to_string()];
        tx.replace_bullets(&id, BulletList::Requirements, &second).await.unwrap();

        assert_eq!(tx.list_bullets(&id, BulletList::Requirements).await.unwrap(), second);
        assert!(tx.list_bullets(&id, BulletList::LearningOutcomes).await.unwrap().is_empty());
    }
}
