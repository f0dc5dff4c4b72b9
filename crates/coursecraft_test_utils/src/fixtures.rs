//! Aggregate builders that seed the store directly, bypassing the lifecycle
//! engine.

use anyhow::{Context, Result};
use coursecraft_db::{
    AssignmentInput, BulletList, CourseDb, CourseDetails, CourseStatus, LessonInput, LessonKind,
    ModuleInput, QuizSettings,
};
use coursecraft_ids::{CategoryId, CourseId, InstructorId, LessonId, ModuleId, QuizId};
use tracing::debug;

/// Category every builder registers before seeding.
pub const FIXTURE_CATEGORY: &str = "programming";

/// Ids of everything a builder created.
#[derive(Debug, Clone)]
pub struct SeededCourse {
    pub instructor: InstructorId,
    pub course_id: CourseId,
    pub modules: Vec<SeededModule>,
}

#[derive(Debug, Clone)]
pub struct SeededModule {
    pub id: ModuleId,
    pub lessons: Vec<LessonId>,
    /// Quizzes created for quiz lessons, in lesson order.
    pub quizzes: Vec<QuizId>,
}

impl SeededCourse {
    pub fn module(&self, index: usize) -> &ModuleId {
        &self.modules[index].id
    }

    pub fn lesson(&self, module: usize, lesson: usize) -> &LessonId {
        &self.modules[module].lessons[lesson]
    }

    pub fn lesson_ids(&self) -> Vec<LessonId> {
        self.modules.iter().flat_map(|m| m.lessons.iter().cloned()).collect()
    }
}

/// Builder for one course aggregate.
#[derive(Debug, Clone)]
pub struct CourseBuilder {
    instructor: InstructorId,
    details: CourseDetails,
    learning_outcomes: Vec<String>,
    requirements: Vec<String>,
    target_audience: Vec<String>,
    modules: Vec<(String, Vec<LessonInput>)>,
    status: CourseStatus,
    publish_modules: bool,
}

impl CourseBuilder {
    /// An empty draft.
    pub fn new(instructor: &str) -> Self {
        Self {
            instructor: InstructorId::from_stored(instructor.to_string()),
            details: CourseDetails::default(),
            learning_outcomes: Vec::new(),
            requirements: Vec::new(),
            target_audience: Vec::new(),
            modules: Vec::new(),
            status: CourseStatus::Draft,
            publish_modules: false,
        }
    }

    /// A draft that passes every step validator and the publication gate:
    /// two modules, four lessons, one video lesson per module.
    pub fn publishable(instructor: &str) -> Self {
        let mut builder = Self::new(instructor)
            .outcomes(&[
                "Write idiomatic Rust services",
                "Model errors with Result",
                "Reason about ownership",
            ])
            .requirements(&["Comfortable with one programming language"])
            .module(
                "Getting Started",
                &[("Welcome", LessonKind::Video), ("Installing the toolchain", LessonKind::Text)],
            )
            .module(
                "Ownership",
                &[("Borrowing explained", LessonKind::Video), ("Ownership check", LessonKind::Quiz)],
            );

        let d = &mut builder.details;
        d.title = Some("Rust for Backend Developers".to_string());
        d.short_description = Some("Build fast, reliable services in Rust".to_string());
        d.description = Some(
            "A practical course on building backend services in Rust: ownership, error handling, \
             async IO, testing and deployment, with a project in every module."
                .to_string(),
        );
        d.category_id = Some(CategoryId::from_stored(FIXTURE_CATEGORY.to_string()));
        d.thumbnail_url = Some("https://cdn.example.com/rust-backend.png".to_string());
        d.price_cents = Some(4_900);
        d.currency = Some("USD".to_string());
        builder
    }

    pub fn details(mut self, edit: impl FnOnce(&mut CourseDetails)) -> Self {
        edit(&mut self.details);
        self
    }

    pub fn outcomes(mut self, items: &[&str]) -> Self {
        self.learning_outcomes = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn requirements(mut self, items: &[&str]) -> Self {
        self.requirements = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn audience(mut self, items: &[&str]) -> Self {
        self.target_audience = items.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append a module with lessons in the given order.
    pub fn module(mut self, title: &str, lessons: &[(&str, LessonKind)]) -> Self {
        let lessons = lessons
            .iter()
            .map(|(title, kind)| LessonInput::new(*title, *kind))
            .collect();
        self.modules.push((title.to_string(), lessons));
        self
    }

    pub fn without_modules(mut self) -> Self {
        self.modules.clear();
        self
    }

    pub fn status(mut self, status: CourseStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark every module published.
    pub fn published_modules(mut self) -> Self {
        self.publish_modules = true;
        self
    }

    pub async fn seed(self, db: &CourseDb) -> Result<SeededCourse> {
        let mut tx = db.begin("fixture").await?;

        tx.insert_category(&CategoryId::from_stored(FIXTURE_CATEGORY.to_string()), "Programming")
            .await?;

        let course_id = CourseId::new();
        let slug = format!("fixture-{}", course_id);
        tx.insert_course(&course_id, &self.instructor, &slug, &self.details)
            .await
            .context("seeding course row")?;
        tx.replace_bullets(&course_id, BulletList::LearningOutcomes, &self.learning_outcomes)
            .await?;
        tx.replace_bullets(&course_id, BulletList::Requirements, &self.requirements)
            .await?;
        tx.replace_bullets(&course_id, BulletList::TargetAudience, &self.target_audience)
            .await?;

        let mut modules = Vec::with_capacity(self.modules.len());
        for (title, lessons) in &self.modules {
            let module = tx
                .insert_module(
                    &course_id,
                    &ModuleInput {
                        title: title.clone(),
                        description: None,
                    },
                )
                .await?;

            let mut seeded = SeededModule {
                id: module.id.clone(),
                lessons: Vec::with_capacity(lessons.len()),
                quizzes: Vec::new(),
            };
            for input in lessons {
                let lesson = tx.insert_lesson(&module.id, input).await?;
                match lesson.kind {
                    LessonKind::Quiz => {
                        let quiz = tx.insert_quiz(&lesson.id, &QuizSettings::default()).await?;
                        seeded.quizzes.push(quiz.id);
                    }
                    LessonKind::Assignment => {
                        tx.upsert_assignment(&lesson.id, &AssignmentInput::default()).await?;
                    }
                    _ => {}
                }
                seeded.lessons.push(lesson.id);
            }

            if self.publish_modules {
                tx.set_module_published(&module.id, true).await?;
            }
            modules.push(seeded);
        }

        if self.status != CourseStatus::Draft {
            tx.set_course_status(&course_id, self.status).await?;
        }
        tx.commit().await?;

        debug!(course = %course_id, modules = modules.len(), "Seeded fixture course");

        Ok(SeededCourse {
            instructor: self.instructor,
            course_id,
            modules,
        })
    }
}
