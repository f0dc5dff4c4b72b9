//! End-to-end tests of the lifecycle engine against a real in-memory store.
//!
//! Covers the authoring scenarios (wizard validation, publication, cascading
//! deletion, atomic reordering) plus the mutation service's ownership and
//! gating rules.

use coursecraft_db::{
    BackReference, CourseDb, CourseStatus, DripSchedule, DripTarget, EnrollmentStatus, LessonArtifact,
    LessonInput, LessonKind, ModuleInput, OptionInput, QuestionInput, QuestionKind, ResourceInput,
    ResourceKind,
};
use coursecraft_ids::{CourseId, InstructorId, LearnerId};
use coursecraft_lifecycle::forms::{BasicInfoForm, PricingForm};
use coursecraft_lifecycle::{
    ChildKind, ChildMutation, CourseField, CourseLifecycle, DeleteResult, DeleteTarget, FieldValue,
    LifecycleConfig, LifecycleError, MutationResult, PublishState, PublishTarget, Rule, StepAction,
    StepForm, StepResult, ToggleResult, WizardStep,
};
use coursecraft_test_utils::{CourseBuilder, DbSnapshot, FailureTrigger, SeededCourse};

const INSTRUCTOR: &str = "inst-1";

async fn engine() -> CourseLifecycle {
    let db = CourseDb::in_memory().await.unwrap();
    CourseLifecycle::new(db, LifecycleConfig::default())
}

fn actor() -> InstructorId {
    InstructorId::parse(INSTRUCTOR).unwrap()
}

fn stranger() -> InstructorId {
    InstructorId::parse("someone-else").unwrap()
}

fn learner() -> LearnerId {
    LearnerId::parse("learner-1").unwrap()
}

fn true_false(prompt: &str) -> QuestionInput {
    QuestionInput {
        prompt: prompt.to_string(),
        kind: QuestionKind::TrueFalse,
        points: 1,
        explanation: None,
        options: vec![OptionInput::correct("True"), OptionInput::wrong("False")],
    }
}

fn messages(errors: &[coursecraft_lifecycle::Violation]) -> Vec<&str> {
    errors.iter().map(|e| e.message.as_str()).collect()
}

/// Publishable course whose quiz lesson carries two questions.
async fn course_with_quiz_questions(engine: &CourseLifecycle) -> SeededCourse {
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();
    for prompt in ["Ownership moves on assignment", "Borrows outlive owners"] {
        let result = engine
            .mutate_child(
                &actor(),
                &ChildMutation::AddQuestion {
                    lesson_id: seeded.lesson(1, 1).clone(),
                    input: true_false(prompt),
                },
            )
            .await
            .unwrap();
        assert!(result.is_success(), "{:?}", result);
    }
    seeded
}

// ============================================================================
// Wizard
// ============================================================================

/// A one-letter title is refused on `next` and nothing is created.
#[tokio::test]
async fn test_short_title_rejected_on_next() {
    let engine = engine().await;
    let form = StepForm::BasicInfo(BasicInfoForm {
        title: Some("A".into()),
        ..Default::default()
    });

    let result = engine
        .save_step(&actor(), None, WizardStep::BasicInfo, StepAction::Next, &form)
        .await
        .unwrap();

    let StepResult::Rejected { errors } = result else {
        panic!("expected rejection, got {:?}", result);
    };
    assert!(messages(&errors).contains(&"title must be ≥10 characters"));

    let mut tx = engine.db().begin("check").await.unwrap();
    assert!(tx.list_courses_for_instructor(&actor()).await.unwrap().is_empty());
}

/// The same submission as a draft creates the course verbatim.
#[tokio::test]
async fn test_short_title_saved_as_draft() {
    let engine = engine().await;
    let form = StepForm::BasicInfo(BasicInfoForm {
        title: Some("A".into()),
        ..Default::default()
    });

    let result = engine
        .save_step(&actor(), None, WizardStep::BasicInfo, StepAction::Draft, &form)
        .await
        .unwrap();

    let StepResult::Saved {
        course_id,
        next_step,
        course_status,
    } = result
    else {
        panic!("expected save, got {:?}", result);
    };
    assert_eq!(next_step, WizardStep::BasicInfo);
    assert_eq!(course_status, CourseStatus::Draft);

    let state = engine
        .load_wizard_state(&actor(), Some(&course_id), None)
        .await
        .unwrap();
    let course = state.course.unwrap();
    assert_eq!(course.details.title.as_deref(), Some("A"));
    assert_eq!(course.status, CourseStatus::Draft);
    assert_eq!(state.best_step, WizardStep::BasicInfo);
}

/// `next` persists owned fields, keeps other steps' fields, and advances.
#[tokio::test]
async fn test_next_merges_and_advances() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let form = StepForm::Pricing(PricingForm {
        price_cents: Some(-5),
        sale_price_cents: Some(2_900),
        currency: Some("EUR".into()),
        ..Default::default()
    });
    let result = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Pricing, StepAction::Next, &form)
        .await
        .unwrap();
    assert!(matches!(result, StepResult::Saved { next_step: WizardStep::Settings, .. }), "{:?}", result);

    let state = engine
        .load_wizard_state(&actor(), Some(&seeded.course_id), None)
        .await
        .unwrap();
    // Invalid price falls back to the persisted one
    assert_eq!(state.fields.details.price_cents, Some(4_900));
    assert_eq!(state.fields.details.sale_price_cents, Some(2_900));
    assert_eq!(state.fields.details.currency.as_deref(), Some("EUR"));
    assert_eq!(state.fields.learning_outcomes.len(), 3);
    assert_eq!(state.best_step, WizardStep::Review);
    assert_eq!(state.completion_percent, 100);
}

/// Lowering the price and dropping the discount in one Pricing save works.
#[tokio::test]
async fn test_pricing_step_clears_sale_price() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let discounted = StepForm::Pricing(PricingForm {
        price_cents: Some(1_000),
        sale_price_cents: Some(500),
        ..Default::default()
    });
    let result = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Pricing, StepAction::Next, &discounted)
        .await
        .unwrap();
    assert!(matches!(result, StepResult::Saved { .. }), "{:?}", result);

    let cheaper = StepForm::Pricing(PricingForm {
        price_cents: Some(400),
        sale_price_cents: None,
        ..Default::default()
    });
    let result = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Pricing, StepAction::Next, &cheaper)
        .await
        .unwrap();
    assert!(matches!(result, StepResult::Saved { next_step: WizardStep::Settings, .. }), "{:?}", result);

    let state = engine
        .load_wizard_state(&actor(), Some(&seeded.course_id), None)
        .await
        .unwrap();
    assert_eq!(state.fields.details.price_cents, Some(400));
    assert_eq!(state.fields.details.sale_price_cents, None);
}

/// `previous` saves without validation and steps back.
#[tokio::test]
async fn test_previous_saves_without_validation() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let form = StepForm::BasicInfo(BasicInfoForm {
        title: Some("Short".into()),
        ..Default::default()
    });
    let result = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::BasicInfo, StepAction::Previous, &form)
        .await
        .unwrap();
    assert!(matches!(result, StepResult::Saved { next_step: WizardStep::BasicInfo, .. }));

    let state = engine
        .load_wizard_state(&actor(), Some(&seeded.course_id), None)
        .await
        .unwrap();
    assert_eq!(state.fields.details.title.as_deref(), Some("Short"));
    assert_eq!(state.best_step, WizardStep::BasicInfo);
}

#[tokio::test]
async fn test_form_for_wrong_step_is_rejected() {
    let engine = engine().await;
    let result = engine
        .save_step(
            &actor(),
            None,
            WizardStep::Media,
            StepAction::Draft,
            &StepForm::empty(WizardStep::Pricing),
        )
        .await
        .unwrap();

    let StepResult::Rejected { errors } = result else {
        panic!("expected rejection");
    };
    assert_eq!(errors[0].rule, Rule::StepMismatch);
}

#[tokio::test]
async fn test_foreign_course_is_not_found() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let err = engine
        .load_wizard_state(&stranger(), Some(&seeded.course_id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFoundOrUnauthorized));

    let missing = engine
        .load_wizard_state(&actor(), Some(&CourseId::new()), None)
        .await
        .unwrap_err();
    assert!(matches!(missing, LifecycleError::NotFoundOrUnauthorized));
}

#[tokio::test]
async fn test_auto_save_creates_draft_and_checks_kind() {
    let engine = engine().await;

    let result = engine
        .auto_save(
            &actor(),
            None,
            CourseField::Title,
            Some(FieldValue::Text("Working title".into())),
        )
        .await
        .unwrap();
    let coursecraft_lifecycle::AutoSaveResult::Saved { course_id } = result else {
        panic!("expected save");
    };

    let mismatch = engine
        .auto_save(&actor(), Some(&course_id), CourseField::Price, Some(FieldValue::Text("ten".into())))
        .await
        .unwrap();
    let coursecraft_lifecycle::AutoSaveResult::Rejected { errors } = mismatch else {
        panic!("expected rejection");
    };
    assert_eq!(errors[0].rule, Rule::FieldKind);

    engine
        .auto_save(
            &actor(),
            Some(&course_id),
            CourseField::LearningOutcomes,
            Some(FieldValue::List(vec!["one".into(), " ".into(), "two".into()])),
        )
        .await
        .unwrap();

    let state = engine.load_wizard_state(&actor(), Some(&course_id), None).await.unwrap();
    assert_eq!(state.fields.details.title.as_deref(), Some("Working title"));
    assert_eq!(state.fields.details.price_cents, None);
    assert_eq!(state.fields.learning_outcomes, vec!["one", "two"]);
}

// ============================================================================
// Publication
// ============================================================================

/// An empty module fails both Step 3 and the publication gate.
#[tokio::test]
async fn test_empty_module_blocks_step_and_publish() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .module("Advanced", &[])
        .seed(engine.db())
        .await
        .unwrap();
    let expected = "module \"Advanced\" has no lessons";

    let step = engine
        .save_step(
            &actor(),
            Some(&seeded.course_id),
            WizardStep::CourseContent,
            StepAction::Next,
            &StepForm::CourseContent,
        )
        .await
        .unwrap();
    let StepResult::Rejected { errors } = step else {
        panic!("expected step rejection");
    };
    assert_eq!(messages(&errors), vec![expected]);

    let publish = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Review, StepAction::Publish, &StepForm::Review)
        .await
        .unwrap();
    let StepResult::Rejected { errors } = publish else {
        panic!("expected publish rejection");
    };
    assert!(messages(&errors).contains(&expected));

    let toggle = engine
        .toggle_publish(&actor(), &PublishTarget::Course(seeded.course_id.clone()))
        .await
        .unwrap();
    let ToggleResult::Refused { errors, .. } = toggle else {
        panic!("expected toggle refusal");
    };
    assert!(messages(&errors).contains(&expected));

    let state = engine
        .load_wizard_state(&actor(), Some(&seeded.course_id), None)
        .await
        .unwrap();
    assert_eq!(state.course.unwrap().status, CourseStatus::Draft);
}

/// A refused submission leaves storage untouched, including the submitted form.
#[tokio::test]
async fn test_refused_publish_leaves_storage_unchanged() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .details(|d| d.thumbnail_url = None)
        .seed(engine.db())
        .await
        .unwrap();
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    let form = StepForm::BasicInfo(BasicInfoForm {
        title: Some("A completely different title".into()),
        ..Default::default()
    });
    let result = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::BasicInfo, StepAction::Publish, &form)
        .await
        .unwrap();
    let StepResult::Rejected { errors } = result else {
        panic!("expected rejection");
    };
    assert!(errors.iter().any(|e| e.rule == Rule::ThumbnailRequired));

    assert_eq!(before, DbSnapshot::capture(engine.db()).await.unwrap());
}

/// Review + next submits, a reviewer approves, and the toggle round-trips.
#[tokio::test]
async fn test_submit_approve_and_toggle_round_trip() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();
    let target = PublishTarget::Course(seeded.course_id.clone());

    let submitted = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Review, StepAction::Next, &StepForm::Review)
        .await
        .unwrap();
    assert!(matches!(
        submitted,
        StepResult::Saved {
            course_status: CourseStatus::PendingReview,
            next_step: WizardStep::Review,
            ..
        }
    ));

    let approved = engine.approve_course(&seeded.course_id).await.unwrap();
    assert_eq!(
        approved,
        ToggleResult::Toggled {
            new_state: PublishState::Course {
                status: CourseStatus::Published
            },
            warnings: vec![],
        }
    );

    // Published courses cannot be resubmitted
    let resubmit = engine
        .save_step(&actor(), Some(&seeded.course_id), WizardStep::Review, StepAction::Publish, &StepForm::Review)
        .await
        .unwrap();
    let StepResult::Rejected { errors } = resubmit else {
        panic!("expected rejection");
    };
    assert_eq!(errors[0].rule, Rule::CourseStatus);

    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_enrollment(&seeded.course_id, &learner(), EnrollmentStatus::Active)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    let off = engine.toggle_publish(&actor(), &target).await.unwrap();
    let ToggleResult::Toggled { new_state, warnings } = off else {
        panic!("unpublish is always permitted");
    };
    assert_eq!(new_state, PublishState::Course { status: CourseStatus::Draft });
    assert_eq!(
        warnings,
        vec!["course has 1 active enrollment; currently enrolled learners retain access".to_string()]
    );

    let on = engine.toggle_publish(&actor(), &target).await.unwrap();
    assert!(matches!(
        on,
        ToggleResult::Toggled {
            new_state: PublishState::Course {
                status: CourseStatus::Published
            },
            ..
        }
    ));
}

/// A course pending review leaves review on its first toggle; from then on
/// toggling twice restores the state.
#[tokio::test]
async fn test_pending_review_toggle_joins_publish_cycle() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .status(CourseStatus::PendingReview)
        .seed(engine.db())
        .await
        .unwrap();
    let target = PublishTarget::Course(seeded.course_id.clone());

    let mut states = Vec::new();
    for _ in 0..3 {
        let ToggleResult::Toggled { new_state, .. } = engine.toggle_publish(&actor(), &target).await.unwrap() else {
            panic!("publishable course toggles");
        };
        states.push(new_state);
    }
    let course = |status| PublishState::Course { status };
    assert_eq!(
        states,
        vec![
            course(CourseStatus::Published),
            course(CourseStatus::Draft),
            course(CourseStatus::Published),
        ]
    );
}

/// Toggling a module twice restores its flag; publishing needs a video lesson.
#[tokio::test]
async fn test_module_toggle_is_an_involution() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .module("Reading list", &[("Further reading", LessonKind::Text)])
        .seed(engine.db())
        .await
        .unwrap();

    let target = PublishTarget::Module(seeded.module(0).clone());
    let first = engine.toggle_publish(&actor(), &target).await.unwrap();
    assert!(matches!(
        first,
        ToggleResult::Toggled {
            new_state: PublishState::Module { published: true },
            ..
        }
    ));
    let second = engine.toggle_publish(&actor(), &target).await.unwrap();
    assert!(matches!(
        second,
        ToggleResult::Toggled {
            new_state: PublishState::Module { published: false },
            ..
        }
    ));

    let text_only = engine
        .toggle_publish(&actor(), &PublishTarget::Module(seeded.module(2).clone()))
        .await
        .unwrap();
    let ToggleResult::Refused { errors, .. } = text_only else {
        panic!("expected refusal");
    };
    assert_eq!(errors[0].rule, Rule::ModuleVideoLesson);
}

#[tokio::test]
async fn test_archived_course_cannot_be_published() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let archived = engine.archive_course(&actor(), &seeded.course_id).await.unwrap();
    assert!(matches!(
        archived,
        ToggleResult::Toggled {
            new_state: PublishState::Course {
                status: CourseStatus::Archived
            },
            ..
        }
    ));

    let toggle = engine
        .toggle_publish(&actor(), &PublishTarget::Course(seeded.course_id.clone()))
        .await
        .unwrap();
    assert!(matches!(toggle, ToggleResult::Refused { .. }));

    let approve = engine.approve_course(&seeded.course_id).await.unwrap();
    assert!(matches!(approve, ToggleResult::Refused { .. }));
}

// ============================================================================
// Deletion
// ============================================================================

/// A quiz without attempts goes away with its lesson, questions and options.
#[tokio::test]
async fn test_delete_lesson_removes_quiz_tree() {
    let engine = engine().await;
    let seeded = course_with_quiz_questions(&engine).await;
    let lesson_id = seeded.lesson(1, 1).clone();

    let bookmark = {
        let mut tx = engine.db().begin("seed").await.unwrap();
        let id = tx
            .record_back_reference(BackReference::Bookmark, "learner-1", Some(&seeded.course_id), Some(&lesson_id))
            .await
            .unwrap();
        tx.record_lesson_artifact(LessonArtifact::Note, &lesson_id, "remember this")
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    };

    let before = DbSnapshot::capture(engine.db()).await.unwrap();
    assert_eq!(before.row_count("quiz_questions"), 2);
    assert_eq!(before.row_count("question_options"), 4);

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Lesson(lesson_id.clone()))
        .await
        .unwrap();
    let DeleteResult::Deleted(report) = result else {
        panic!("expected deletion, got {:?}", result);
    };
    // lesson + quiz + 2 questions + 4 options + note
    assert_eq!(report.rows_deleted, 9);
    assert_eq!(report.rows_detached, 1);

    let after = DbSnapshot::capture(engine.db()).await.unwrap();
    assert_eq!(after.row_count("quizzes"), 0);
    assert_eq!(after.row_count("quiz_questions"), 0);
    assert_eq!(after.row_count("question_options"), 0);
    assert_eq!(after.row_count("lesson_notes"), 0);
    assert_eq!(after.row_count("lessons"), before.row_count("lessons") - 1);

    let mut tx = engine.db().begin("check").await.unwrap();
    let row = tx.get_back_reference(BackReference::Bookmark, bookmark).await.unwrap().unwrap();
    assert_eq!(row.lesson_id, None);
    assert_eq!(row.course_id.as_deref(), Some(seeded.course_id.as_str()));
}

/// One attempt blocks the delete and nothing changes.
#[tokio::test]
async fn test_quiz_attempt_blocks_lesson_delete() {
    let engine = engine().await;
    let seeded = course_with_quiz_questions(&engine).await;
    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_quiz_attempt(&seeded.modules[1].quizzes[0], &learner(), 80)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Lesson(seeded.lesson(1, 1).clone()))
        .await
        .unwrap();
    let DeleteResult::Refused { reason } = result else {
        panic!("expected refusal");
    };
    assert!(reason.contains("existing student attempt"), "{}", reason);

    assert_eq!(before, DbSnapshot::capture(engine.db()).await.unwrap());
}

/// A failure partway through a course cascade restores every removed row.
#[tokio::test]
async fn test_course_cascade_failure_rolls_back() {
    let engine = engine().await;
    let seeded = course_with_quiz_questions(&engine).await;
    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_back_reference(BackReference::Bookmark, "learner-1", None, Some(seeded.lesson(0, 0)))
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    // Lessons, quizzes and detachments of the first module run before this fires
    let trigger = FailureTrigger::install(engine.db(), "fail_module_delete", "BEFORE DELETE ON modules", None)
        .await
        .unwrap();

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Course(seeded.course_id.clone()))
        .await;
    assert!(result.is_err(), "{:?}", result);

    trigger.remove(engine.db()).await.unwrap();
    let after = DbSnapshot::capture(engine.db()).await.unwrap();
    assert!(before.changed_tables(&after).is_empty(), "{:?}", before.changed_tables(&after));
    assert_eq!(before, after);
}

/// Course delete empties the aggregate and detaches outside references.
#[tokio::test]
async fn test_delete_course_cascades_and_detaches() {
    let engine = engine().await;
    let seeded = course_with_quiz_questions(&engine).await;
    let lesson_id = seeded.lesson(0, 0).clone();

    for mutation in [
        ChildMutation::AddResource {
            lesson_id: lesson_id.clone(),
            input: ResourceInput {
                title: "Slides".into(),
                url: "https://cdn.example.com/slides.pdf".into(),
                kind: ResourceKind::File,
            },
        },
        ChildMutation::SetDripRule {
            course_id: seeded.course_id.clone(),
            target: DripTarget::Module(seeded.module(1).clone()),
            schedule: DripSchedule::AfterEnrollment { days: 7 },
        },
    ] {
        assert!(engine.mutate_child(&actor(), &mutation).await.unwrap().is_success());
    }

    let (faq, reminder) = {
        let mut tx = engine.db().begin("seed").await.unwrap();
        let faq = tx
            .record_back_reference(BackReference::Faq, "support", Some(&seeded.course_id), None)
            .await
            .unwrap();
        let reminder = tx
            .record_back_reference(BackReference::Reminder, "learner-1", Some(&seeded.course_id), Some(&lesson_id))
            .await
            .unwrap();
        tx.record_progress(&lesson_id, &learner(), true).await.unwrap();
        tx.commit().await.unwrap();
        (faq, reminder)
    };

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Course(seeded.course_id.clone()))
        .await
        .unwrap();
    assert!(matches!(result, DeleteResult::Deleted(_)), "{:?}", result);

    let after = DbSnapshot::capture(engine.db()).await.unwrap();
    for table in [
        "courses",
        "course_learning_outcomes",
        "course_requirements",
        "modules",
        "lessons",
        "lesson_resources",
        "lesson_progress",
        "drip_rules",
        "quizzes",
        "quiz_questions",
        "question_options",
    ] {
        assert_eq!(after.row_count(table), 0, "{} not emptied", table);
    }

    let mut tx = engine.db().begin("check").await.unwrap();
    let faq = tx.get_back_reference(BackReference::Faq, faq).await.unwrap().unwrap();
    assert_eq!(faq.course_id, None);
    let reminder = tx.get_back_reference(BackReference::Reminder, reminder).await.unwrap().unwrap();
    assert_eq!((reminder.course_id, reminder.lesson_id), (None, None));
}

#[tokio::test]
async fn test_course_delete_gates() {
    let engine = engine().await;
    let enrolled = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();
    let live = CourseBuilder::publishable(INSTRUCTOR)
        .status(CourseStatus::Published)
        .seed(engine.db())
        .await
        .unwrap();
    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_enrollment(&enrolled.course_id, &learner(), EnrollmentStatus::Cancelled)
            .await
            .unwrap();
        tx.record_review(&enrolled.course_id, &learner(), 5).await.unwrap();
        tx.commit().await.unwrap();
    }
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Course(enrolled.course_id.clone()))
        .await
        .unwrap();
    let DeleteResult::Refused { reason } = result else {
        panic!("expected refusal");
    };
    assert!(reason.contains("1 enrollment"), "{}", reason);
    assert!(reason.contains("1 review"), "{}", reason);

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Course(live.course_id.clone()))
        .await
        .unwrap();
    let DeleteResult::Refused { reason } = result else {
        panic!("expected refusal");
    };
    assert!(reason.contains("only drafts"), "{}", reason);

    assert_eq!(before, DbSnapshot::capture(engine.db()).await.unwrap());

    let err = engine
        .delete_entity(&stranger(), &DeleteTarget::Course(enrolled.course_id.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFoundOrUnauthorized));
}

/// Progress only blocks deleting content learners can currently reach.
#[tokio::test]
async fn test_progress_blocks_only_live_content() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .status(CourseStatus::Published)
        .published_modules()
        .seed(engine.db())
        .await
        .unwrap();
    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_progress(seeded.lesson(0, 1), &learner(), false).await.unwrap();
        tx.commit().await.unwrap();
    }

    let live = engine
        .delete_entity(&actor(), &DeleteTarget::Lesson(seeded.lesson(0, 1).clone()))
        .await
        .unwrap();
    assert!(matches!(live, DeleteResult::Refused { .. }));
    let live_module = engine
        .delete_entity(&actor(), &DeleteTarget::Module(seeded.module(0).clone()))
        .await
        .unwrap();
    assert!(matches!(live_module, DeleteResult::Refused { .. }));

    // Unpublish the module: the lesson is no longer live
    engine
        .toggle_publish(&actor(), &PublishTarget::Module(seeded.module(0).clone()))
        .await
        .unwrap();
    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Lesson(seeded.lesson(0, 1).clone()))
        .await
        .unwrap();
    assert!(matches!(result, DeleteResult::Deleted(_)), "{:?}", result);
}

/// Module and lesson gates agree: progress in a draft course never blocks.
#[tokio::test]
async fn test_progress_in_draft_course_does_not_block_module_delete() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR)
        .published_modules()
        .seed(engine.db())
        .await
        .unwrap();
    {
        let mut tx = engine.db().begin("seed").await.unwrap();
        tx.record_progress(seeded.lesson(0, 0), &learner(), true).await.unwrap();
        tx.commit().await.unwrap();
    }

    let result = engine
        .delete_entity(&actor(), &DeleteTarget::Module(seeded.module(0).clone()))
        .await
        .unwrap();
    assert!(matches!(result, DeleteResult::Deleted(_)), "{:?}", result);
}

// ============================================================================
// Mutations
// ============================================================================

/// Reordering [1,2,3] to [3,1,2] assigns contiguous indices.
#[tokio::test]
async fn test_reorder_modules() {
    let engine = engine().await;
    let seeded = CourseBuilder::new(INSTRUCTOR)
        .module("One", &[])
        .module("Two", &[])
        .module("Three", &[])
        .seed(engine.db())
        .await
        .unwrap();
    let (m1, m2, m3) = (seeded.module(0).clone(), seeded.module(1).clone(), seeded.module(2).clone());

    let result = engine
        .mutate_child(
            &actor(),
            &ChildMutation::ReorderModules {
                course_id: seeded.course_id.clone(),
                ordered: vec![m3.clone(), m1.clone(), m2.clone()],
            },
        )
        .await
        .unwrap();
    assert!(matches!(result, MutationResult::Reordered { kind: ChildKind::Module, .. }));

    let mut tx = engine.db().begin("check").await.unwrap();
    let order: Vec<_> = tx
        .list_modules(&seeded.course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.id, m.order_index))
        .collect();
    assert_eq!(order, vec![(m3, 1), (m1, 2), (m2, 3)]);
}

/// A failure on the third write leaves the original order in place.
#[tokio::test]
async fn test_reorder_failure_is_atomic() {
    let engine = engine().await;
    let seeded = CourseBuilder::new(INSTRUCTOR)
        .module("One", &[])
        .module("Two", &[])
        .module("Three", &[])
        .seed(engine.db())
        .await
        .unwrap();
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    let trigger = FailureTrigger::install(
        engine.db(),
        "fail_third_position",
        "BEFORE UPDATE OF order_index ON modules",
        Some("NEW.order_index = 3"),
    )
    .await
    .unwrap();

    let result = engine
        .mutate_child(
            &actor(),
            &ChildMutation::ReorderModules {
                course_id: seeded.course_id.clone(),
                ordered: vec![seeded.module(2).clone(), seeded.module(0).clone(), seeded.module(1).clone()],
            },
        )
        .await;
    assert!(result.is_err());

    trigger.remove(engine.db()).await.unwrap();
    assert_eq!(before, DbSnapshot::capture(engine.db()).await.unwrap());
}

#[tokio::test]
async fn test_reorder_requires_exact_permutation() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let result = engine
        .mutate_child(
            &actor(),
            &ChildMutation::ReorderLessons {
                module_id: seeded.module(0).clone(),
                ordered: vec![seeded.lesson(0, 0).clone()],
            },
        )
        .await
        .unwrap();
    assert!(matches!(result, MutationResult::Refused { .. }));

    // A lesson from another module is not a child of this one
    let result = engine
        .mutate_child(
            &actor(),
            &ChildMutation::ReorderLessons {
                module_id: seeded.module(0).clone(),
                ordered: vec![seeded.lesson(0, 0).clone(), seeded.lesson(1, 0).clone()],
            },
        )
        .await
        .unwrap();
    assert!(matches!(result, MutationResult::Refused { .. }));
}

/// Appends land after the current maximum, gaps included.
#[tokio::test]
async fn test_new_children_append_after_max() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    engine
        .delete_entity(&actor(), &DeleteTarget::Lesson(seeded.lesson(0, 0).clone()))
        .await
        .unwrap();

    let result = engine
        .mutate_child(
            &actor(),
            &ChildMutation::AddLesson {
                module_id: seeded.module(0).clone(),
                input: LessonInput::new("Recap", LessonKind::Video),
            },
        )
        .await
        .unwrap();
    let MutationResult::Applied(summary) = result else {
        panic!("expected append");
    };
    assert_eq!(summary.order_index, Some(3));
}

#[tokio::test]
async fn test_foreign_actor_cannot_mutate() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();
    let before = DbSnapshot::capture(engine.db()).await.unwrap();

    for mutation in [
        ChildMutation::AddModule {
            course_id: seeded.course_id.clone(),
            input: ModuleInput {
                title: "Intruder".into(),
                description: None,
            },
        },
        ChildMutation::EditLesson {
            lesson_id: seeded.lesson(0, 0).clone(),
            input: LessonInput::new("Hijacked", LessonKind::Text),
        },
        ChildMutation::AddQuestion {
            lesson_id: seeded.lesson(1, 1).clone(),
            input: true_false("Is this mine?"),
        },
    ] {
        let err = engine.mutate_child(&stranger(), &mutation).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFoundOrUnauthorized));
    }

    assert_eq!(before, DbSnapshot::capture(engine.db()).await.unwrap());
}

/// Quiz lessons get a quiz on creation; changing the type drops it.
#[tokio::test]
async fn test_lesson_type_change_swaps_specialization() {
    let engine = engine().await;
    let seeded = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let added = engine
        .mutate_child(
            &actor(),
            &ChildMutation::AddLesson {
                module_id: seeded.module(0).clone(),
                input: LessonInput::new("Checkpoint", LessonKind::Quiz),
            },
        )
        .await
        .unwrap();
    let MutationResult::Applied(summary) = added else {
        panic!("expected lesson");
    };
    let lesson_id = coursecraft_ids::LessonId::parse(&summary.id).unwrap();

    engine
        .mutate_child(
            &actor(),
            &ChildMutation::AddQuestion {
                lesson_id: lesson_id.clone(),
                input: true_false("Checkpoint question"),
            },
        )
        .await
        .unwrap();

    let changed = engine
        .mutate_child(
            &actor(),
            &ChildMutation::EditLesson {
                lesson_id: lesson_id.clone(),
                input: LessonInput::new("Checkpoint", LessonKind::Assignment),
            },
        )
        .await
        .unwrap();
    assert!(changed.is_success(), "{:?}", changed);

    let mut tx = engine.db().begin("check").await.unwrap();
    assert!(tx.get_quiz_for_lesson(&lesson_id).await.unwrap().is_none());
    assert!(tx.get_assignment_for_lesson(&lesson_id).await.unwrap().is_some());
    assert_eq!(tx.count_where("quiz_questions", "prompt", "Checkpoint question").await.unwrap(), 0);
}

#[tokio::test]
async fn test_question_rules_and_attempt_gate() {
    let engine = engine().await;
    let seeded = course_with_quiz_questions(&engine).await;

    let mut bad = true_false("");
    bad.options = vec![OptionInput::correct("True"), OptionInput::correct("False")];
    let rejected = engine
        .mutate_child(
            &actor(),
            &ChildMutation::AddQuestion {
                lesson_id: seeded.lesson(1, 1).clone(),
                input: bad,
            },
        )
        .await
        .unwrap();
    let MutationResult::Rejected { errors } = rejected else {
        panic!("expected rejection");
    };
    let rules: Vec<Rule> = errors.iter().map(|e| e.rule).collect();
    assert_eq!(rules, vec![Rule::QuestionPrompt, Rule::QuestionCorrectOption]);

    let question_id = {
        let mut tx = engine.db().begin("seed").await.unwrap();
        let quiz = &seeded.modules[1].quizzes[0];
        let id = tx.question_ids(quiz).await.unwrap().remove(0);
        tx.record_quiz_attempt(quiz, &learner(), 100).await.unwrap();
        tx.commit().await.unwrap();
        id
    };

    let refused = engine
        .mutate_child(&actor(), &ChildMutation::DeleteQuestion { question_id })
        .await
        .unwrap();
    let MutationResult::Refused { reason } = refused else {
        panic!("expected refusal");
    };
    assert!(reason.contains("existing student attempt"), "{}", reason);

    // Changing the lesson type would drop attempted questions too
    let type_change = engine
        .mutate_child(
            &actor(),
            &ChildMutation::EditLesson {
                lesson_id: seeded.lesson(1, 1).clone(),
                input: LessonInput::new("Ownership check", LessonKind::Text),
            },
        )
        .await
        .unwrap();
    assert!(matches!(type_change, MutationResult::Refused { .. }));
}

#[tokio::test]
async fn test_drip_rule_target_must_belong_to_course() {
    let engine = engine().await;
    let mine = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();
    let other = CourseBuilder::publishable(INSTRUCTOR).seed(engine.db()).await.unwrap();

    let err = engine
        .mutate_child(
            &actor(),
            &ChildMutation::SetDripRule {
                course_id: mine.course_id.clone(),
                target: DripTarget::Lesson(other.lesson(0, 0).clone()),
                schedule: DripSchedule::AfterEnrollment { days: 3 },
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFoundOrUnauthorized));

    let set = |days| ChildMutation::SetDripRule {
        course_id: mine.course_id.clone(),
        target: DripTarget::Lesson(mine.lesson(0, 1).clone()),
        schedule: DripSchedule::AfterEnrollment { days },
    };
    let MutationResult::Applied(first) = engine.mutate_child(&actor(), &set(3)).await.unwrap() else {
        panic!("expected drip rule");
    };
    let MutationResult::Applied(second) = engine.mutate_child(&actor(), &set(5)).await.unwrap() else {
        panic!("expected drip rule");
    };
    // One rule per target; setting it again updates in place
    assert_eq!(first.id, second.id);
    assert_eq!(second.label, "5 days after enrollment");
}
