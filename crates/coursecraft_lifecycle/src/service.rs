//! The lifecycle engine's public surface.
//!
//! [`CourseLifecycle`] opens exactly one store transaction per operation.
//! Success commits; a validation failure, business refusal or storage error
//! drops the transaction, which rolls back every write made inside it.

use crate::aggregate::{self, load_owned_course, load_owned_snapshot, CourseSnapshot, ModuleNode};
use crate::config::LifecycleConfig;
use crate::deletion::{self, owned_module, DeleteTarget, DeletionReport};
use crate::error::{LifecycleError, Result};
use crate::fields::{CourseField, CourseFields, FieldValue};
use crate::forms::StepForm;
use crate::gate::{self, ChecklistItem};
use crate::merge::merge;
use crate::mutation::{self, ChildMutation, MutationResult};
use crate::slug::unique_slug;
use crate::validation::{self, plural, Rule, ValidationContext, Violation};
use crate::wizard::{determine_best_starting_step, StepAction, WizardStep};
use coursecraft_db::{BulletList, Course, CourseDb, CourseStatus, CourseTx};
use coursecraft_ids::{CourseId, InstructorId, ModuleId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Results
// ============================================================================

/// Everything the wizard needs to render one step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    /// `None` until the first save creates the course.
    pub course: Option<Course>,
    pub fields: CourseFields,
    pub modules: Vec<ModuleNode>,
    pub current_step: WizardStep,
    pub best_step: WizardStep,
    pub completion_percent: u8,
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Saved {
        course_id: CourseId,
        next_step: WizardStep,
        course_status: CourseStatus,
    },
    Rejected {
        errors: Vec<Violation>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutoSaveResult {
    Saved { course_id: CourseId },
    Rejected { errors: Vec<Violation> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteResult {
    Deleted(DeletionReport),
    Refused { reason: String },
}

/// What `toggle_publish` can flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PublishTarget {
    Course(CourseId),
    Module(ModuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PublishState {
    Course { status: CourseStatus },
    Module { published: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToggleResult {
    Toggled {
        new_state: PublishState,
        /// Non-fatal notes, e.g. learners still enrolled in an unpublished course.
        warnings: Vec<String>,
    },
    Refused {
        reason: String,
        errors: Vec<Violation>,
    },
}

impl ToggleResult {
    fn course(status: CourseStatus, warnings: Vec<String>) -> Self {
        Self::Toggled {
            new_state: PublishState::Course { status },
            warnings,
        }
    }

    fn refused(reason: impl Into<String>, errors: Vec<Violation>) -> Self {
        Self::Refused {
            reason: reason.into(),
            errors,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct CourseLifecycle {
    db: CourseDb,
    config: LifecycleConfig,
}

impl CourseLifecycle {
    pub fn new(db: CourseDb, config: LifecycleConfig) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &CourseDb {
        &self.db
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Snapshot, resume step and readiness of a course. A missing id yields
    /// an empty course starting at Basic Info.
    pub async fn load_wizard_state(
        &self,
        actor: &InstructorId,
        course_id: Option<&CourseId>,
        step: Option<WizardStep>,
    ) -> Result<WizardState> {
        let mut tx = self.db.begin("load_wizard_state").await?;

        let (course, fields, modules) = match course_id {
            Some(id) => {
                let snapshot = load_owned_snapshot(&mut tx, actor, id).await?;
                (Some(snapshot.course), snapshot.fields, snapshot.modules)
            }
            None => (None, CourseFields::default(), Vec::new()),
        };
        let ctx = self.context_for(&mut tx, &fields).await?;
        tx.rollback().await?;

        let best_step = match course {
            Some(_) => determine_best_starting_step(&fields, &modules, &ctx, &self.config),
            None => WizardStep::BasicInfo,
        };
        let checklist = gate::readiness_checklist(&fields, &modules, &self.config);

        Ok(WizardState {
            course,
            current_step: step.unwrap_or(best_step),
            best_step,
            completion_percent: gate::completion_percent(&checklist),
            checklist,
            fields,
            modules,
        })
    }

    /// Submit one wizard step.
    ///
    /// The candidate is the persisted state with the step's own fields taken
    /// from `form`. `next` validates the step, `previous` and `draft` save
    /// as-is, and `publish` (or `next` on Review) gates the whole aggregate
    /// and moves a draft to PendingReview.
    pub async fn save_step(
        &self,
        actor: &InstructorId,
        course_id: Option<&CourseId>,
        step: WizardStep,
        action: StepAction,
        form: &StepForm,
    ) -> Result<StepResult> {
        if form.step() != step {
            return Ok(StepResult::Rejected {
                errors: vec![Violation::new(
                    Rule::StepMismatch,
                    format!("form for step {} submitted as step {}", form.step().number(), step.number()),
                )],
            });
        }
        let action = action.effective_at(step);

        let mut tx = self.db.begin("save_step").await?;
        let persisted = match course_id {
            Some(id) => Some(load_owned_snapshot(&mut tx, actor, id).await?),
            None => None,
        };
        let (persisted_fields, modules) = match &persisted {
            Some(snapshot) => (snapshot.fields.clone(), snapshot.modules.clone()),
            None => (CourseFields::default(), Vec::new()),
        };
        let candidate = merge(step, &form.submitted(), &persisted_fields);

        if action == StepAction::Next {
            let ctx = self.context_for(&mut tx, &candidate).await?;
            let errors = validation::validate_step(step, &candidate, &modules, &ctx, &self.config);
            if !errors.is_empty() {
                info!(step = step.number(), errors = errors.len(), "Step rejected");
                return Ok(StepResult::Rejected { errors });
            }
        }

        let course_id = self
            .persist_fields(&mut tx, actor, persisted.as_ref().map(|s| &s.course.id), &candidate)
            .await?;

        let next_step = match action {
            StepAction::Next => step.next(),
            StepAction::Previous => step.previous(),
            StepAction::Draft => step,
            StepAction::Publish => return self.submit_for_review(tx, &course_id).await,
        };

        let status = persisted.map(|s| s.course.status).unwrap_or(CourseStatus::Draft);
        tx.commit().await?;
        info!(course = %course_id, step = step.number(), action = %action, "Step saved");

        Ok(StepResult::Saved {
            course_id,
            next_step,
            course_status: status,
        })
    }

    /// Re-validate the persisted aggregate and move a draft to PendingReview.
    async fn submit_for_review(&self, mut tx: CourseTx, course_id: &CourseId) -> Result<StepResult> {
        let snapshot = aggregate::load_snapshot(&mut tx, course_id)
            .await?
            .ok_or(LifecycleError::NotFoundOrUnauthorized)?;

        match snapshot.course.status {
            CourseStatus::Draft => {}
            CourseStatus::PendingReview => {
                tx.commit().await?;
                return Ok(StepResult::Saved {
                    course_id: course_id.clone(),
                    next_step: WizardStep::Review,
                    course_status: CourseStatus::PendingReview,
                });
            }
            status @ (CourseStatus::Published | CourseStatus::Archived) => {
                return Ok(StepResult::Rejected {
                    errors: vec![Violation::new(
                        Rule::CourseStatus,
                        format!("a {} course cannot be submitted for review", status),
                    )],
                });
            }
        }

        let errors = self.full_validation(&mut tx, &snapshot).await?;
        if !errors.is_empty() {
            info!(course = %course_id, errors = errors.len(), "Submission rejected");
            return Ok(StepResult::Rejected { errors });
        }

        tx.set_course_status(course_id, CourseStatus::PendingReview).await?;
        tx.commit().await?;
        info!(course = %course_id, "Course submitted for review");

        Ok(StepResult::Saved {
            course_id: course_id.clone(),
            next_step: WizardStep::Review,
            course_status: CourseStatus::PendingReview,
        })
    }

    /// Every step validator plus the publication gate, deduplicated.
    async fn full_validation(&self, tx: &mut CourseTx, snapshot: &CourseSnapshot) -> Result<Vec<Violation>> {
        let ctx = self.context_for(tx, &snapshot.fields).await?;
        let mut errors =
            validation::validate_all_steps(&snapshot.fields, &snapshot.modules, &ctx, &self.config);
        for violation in gate::publication_violations(&snapshot.fields, &snapshot.modules, &self.config) {
            if !errors.contains(&violation) {
                errors.push(violation);
            }
        }
        Ok(errors)
    }

    /// Write one field without validation, creating the draft if needed.
    pub async fn auto_save(
        &self,
        actor: &InstructorId,
        course_id: Option<&CourseId>,
        field: CourseField,
        value: Option<FieldValue>,
    ) -> Result<AutoSaveResult> {
        let mut tx = self.db.begin("auto_save").await?;
        let mut fields = match course_id {
            Some(id) => aggregate::load_fields(&mut tx, id)
                .await?
                .filter(|(course, _)| &course.instructor_id == actor)
                .map(|(_, fields)| fields)
                .ok_or(LifecycleError::NotFoundOrUnauthorized)?,
            None => CourseFields::default(),
        };

        if !fields.set(field, value) {
            return Ok(AutoSaveResult::Rejected {
                errors: vec![Violation::new(
                    Rule::FieldKind,
                    format!("{} expects a {} value", field, field.kind()),
                )],
            });
        }

        let course_id = self.persist_fields(&mut tx, actor, course_id, &fields).await?;
        tx.commit().await?;
        info!(course = %course_id, field = %field, "Field auto-saved");

        Ok(AutoSaveResult::Saved { course_id })
    }

    pub async fn mutate_child(&self, actor: &InstructorId, change: &ChildMutation) -> Result<MutationResult> {
        let mut tx = self.db.begin("mutate_child").await?;
        let result = mutation::apply(&mut tx, actor, change).await?;

        match &result {
            MutationResult::Refused { reason } => warn!(%reason, "Child mutation refused"),
            MutationResult::Rejected { errors } => info!(errors = errors.len(), "Child mutation rejected"),
            _ => {
                tx.commit().await?;
                info!(?result, "Child mutation applied");
            }
        }
        Ok(result)
    }

    /// Plan and, when permitted, run a cascading delete.
    pub async fn delete_entity(&self, actor: &InstructorId, target: &DeleteTarget) -> Result<DeleteResult> {
        let mut tx = self.db.begin("delete_entity").await?;
        let plan = deletion::plan(&mut tx, actor, target).await?;

        if let Some(reason) = plan.refusal_reason() {
            warn!(%target, %reason, "Delete refused");
            return Ok(DeleteResult::Refused { reason });
        }

        let report = deletion::apply(&mut tx, &plan).await?;
        tx.commit().await?;
        Ok(DeleteResult::Deleted(report))
    }

    /// Flip a course between Draft and Published, or a module's published flag.
    ///
    /// A course pending review is treated as unpublished: the first toggle
    /// publishes it through the gate and later toggles alternate between
    /// Published and Draft. Toggling twice restores the state for Draft and
    /// Published courses; PendingReview is never re-entered by a toggle.
    pub async fn toggle_publish(&self, actor: &InstructorId, target: &PublishTarget) -> Result<ToggleResult> {
        let mut tx = self.db.begin("toggle_publish").await?;

        let result = match target {
            PublishTarget::Course(course_id) => {
                let course = load_owned_course(&mut tx, actor, course_id).await?;
                match course.status {
                    CourseStatus::Published => {
                        let warnings = self.enrollment_warnings(&mut tx, course_id).await?;
                        tx.set_course_status(course_id, CourseStatus::Draft).await?;
                        ToggleResult::course(CourseStatus::Draft, warnings)
                    }
                    CourseStatus::Draft | CourseStatus::PendingReview => {
                        self.publish_gated(&mut tx, course_id).await?
                    }
                    CourseStatus::Archived => {
                        ToggleResult::refused("archived courses cannot be published", Vec::new())
                    }
                }
            }
            PublishTarget::Module(module_id) => {
                let owner = owned_module(&mut tx, actor, module_id).await?;
                if owner.module_published {
                    let warnings = if owner.course_status.is_live() {
                        self.enrollment_warnings(&mut tx, &owner.course_id).await?
                    } else {
                        Vec::new()
                    };
                    tx.set_module_published(module_id, false).await?;
                    ToggleResult::Toggled {
                        new_state: PublishState::Module { published: false },
                        warnings,
                    }
                } else {
                    let module = tx
                        .get_module(module_id)
                        .await?
                        .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
                    let lessons = tx.list_lessons(module_id).await?;
                    let node = ModuleNode { module, lessons };
                    let errors = validation::module_publish_violations(&node, &self.config);
                    if errors.is_empty() {
                        tx.set_module_published(module_id, true).await?;
                        ToggleResult::Toggled {
                            new_state: PublishState::Module { published: true },
                            warnings: Vec::new(),
                        }
                    } else {
                        ToggleResult::refused("module is not ready to publish", errors)
                    }
                }
            }
        };

        self.finish_toggle(tx, &result, "publish toggled").await?;
        Ok(result)
    }

    /// Reviewer approval: PendingReview → Published under the publication gate.
    pub async fn approve_course(&self, course_id: &CourseId) -> Result<ToggleResult> {
        let mut tx = self.db.begin("approve_course").await?;
        let course = tx
            .get_course(course_id)
            .await?
            .ok_or(LifecycleError::NotFoundOrUnauthorized)?;

        let result = if course.status == CourseStatus::PendingReview {
            self.publish_gated(&mut tx, course_id).await?
        } else {
            ToggleResult::refused(
                format!("only courses pending review can be approved (course is {})", course.status),
                Vec::new(),
            )
        };

        self.finish_toggle(tx, &result, "approval").await?;
        Ok(result)
    }

    /// Retire a course from the catalogue. Archiving twice is a no-op.
    pub async fn archive_course(&self, actor: &InstructorId, course_id: &CourseId) -> Result<ToggleResult> {
        let mut tx = self.db.begin("archive_course").await?;
        let course = load_owned_course(&mut tx, actor, course_id).await?;

        let mut warnings = Vec::new();
        if course.status != CourseStatus::Archived {
            if course.status.is_live() {
                warnings = self.enrollment_warnings(&mut tx, course_id).await?;
            }
            tx.set_course_status(course_id, CourseStatus::Archived).await?;
        }
        let result = ToggleResult::course(CourseStatus::Archived, warnings);

        self.finish_toggle(tx, &result, "archive").await?;
        Ok(result)
    }

    async fn publish_gated(&self, tx: &mut CourseTx, course_id: &CourseId) -> Result<ToggleResult> {
        let snapshot = aggregate::load_snapshot(tx, course_id)
            .await?
            .ok_or(LifecycleError::NotFoundOrUnauthorized)?;
        let errors = gate::publication_violations(&snapshot.fields, &snapshot.modules, &self.config);
        if !errors.is_empty() {
            return Ok(ToggleResult::refused("course is not ready to publish", errors));
        }
        tx.set_course_status(course_id, CourseStatus::Published).await?;
        Ok(ToggleResult::course(CourseStatus::Published, Vec::new()))
    }

    async fn finish_toggle(&self, tx: CourseTx, result: &ToggleResult, what: &str) -> Result<()> {
        match result {
            ToggleResult::Toggled { new_state, warnings } => {
                tx.commit().await?;
                info!(state = ?new_state, "{} applied", what);
                for warning in warnings {
                    warn!("{}", warning);
                }
            }
            ToggleResult::Refused { reason, .. } => {
                tx.rollback().await?;
                warn!(%reason, "{} refused", what);
            }
        }
        Ok(())
    }

    async fn enrollment_warnings(&self, tx: &mut CourseTx, course_id: &CourseId) -> Result<Vec<String>> {
        let active = tx.count_enrollments(course_id, true).await?;
        Ok(if active > 0 {
            vec![format!(
                "course has {}; currently enrolled learners retain access",
                plural(active as usize, "active enrollment", "active enrollments")
            )]
        } else {
            Vec::new()
        })
    }

    async fn context_for(&self, tx: &mut CourseTx, fields: &CourseFields) -> Result<ValidationContext> {
        let category_exists = match &fields.details.category_id {
            Some(category) => tx.category_exists(category).await?,
            None => false,
        };
        Ok(ValidationContext { category_exists })
    }

    /// Write the candidate fields, creating the draft course on first save.
    async fn persist_fields(
        &self,
        tx: &mut CourseTx,
        actor: &InstructorId,
        course_id: Option<&CourseId>,
        fields: &CourseFields,
    ) -> Result<CourseId> {
        let course_id = match course_id {
            Some(id) => {
                tx.update_course_details(id, &fields.details).await?;
                id.clone()
            }
            None => {
                let id = CourseId::new();
                let slug = unique_slug(tx, fields.details.title.as_deref()).await?;
                tx.insert_course(&id, actor, &slug, &fields.details).await?;
                info!(course = %id, %slug, "Draft course created");
                id
            }
        };

        for list in BulletList::ALL {
            tx.replace_bullets(&course_id, list, fields.bullets(list)).await?;
        }
        Ok(course_id)
    }
}
