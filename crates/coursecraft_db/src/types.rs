//! Entity types for the course aggregate.
//!
//! These types are the single source of truth for what the store persists.
//! The lifecycle crate builds its views (snapshots, summaries) on top of them.

use chrono::{DateTime, Utc};
use coursecraft_ids::{
    AssignmentId, CategoryId, CourseId, DripRuleId, InstructorId, LessonId, ModuleId, OptionId,
    QuestionId, QuizId, ResourceId,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Course
// ============================================================================

/// Publication status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    PendingReview,
    Published,
    Archived,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending_review" => Some(Self::PendingReview),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Learners can see the course.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scalar wizard fields of a course.
///
/// Every field is optional so a draft can be persisted in any state of
/// completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    // Basic info
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub level: Option<String>,
    pub language: Option<String>,
    // Media
    pub thumbnail_url: Option<String>,
    pub promo_video_url: Option<String>,
    // Pricing (minor currency units)
    pub price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub is_free: bool,
    pub currency: Option<String>,
    // Settings
    pub has_certificate: bool,
    pub max_students: Option<i64>,
    pub drip_enabled: bool,
    pub meta_title: Option<String>,
    pub meta_keywords: Option<String>,
}

/// A persisted course row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub instructor_id: InstructorId,
    pub slug: String,
    pub status: CourseStatus,
    pub details: CourseDetails,
    pub submitted_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The ordered bullet side-lists a course owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletList {
    LearningOutcomes,
    Requirements,
    TargetAudience,
}

impl BulletList {
    pub const ALL: [BulletList; 3] = [
        BulletList::LearningOutcomes,
        BulletList::Requirements,
        BulletList::TargetAudience,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::LearningOutcomes => "course_learning_outcomes",
            Self::Requirements => "course_requirements",
            Self::TargetAudience => "course_target_audience",
        }
    }
}

// ============================================================================
// Curriculum
// ============================================================================

/// A module row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i64,
    pub is_published: bool,
}

/// Fields for creating or editing a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Declared type of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Video,
    Text,
    Quiz,
    Assignment,
    Download,
    Live,
}

impl LessonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Quiz => "quiz",
            Self::Assignment => "assignment",
            Self::Download => "download",
            Self::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "quiz" => Some(Self::Quiz),
            "assignment" => Some(Self::Assignment),
            "download" => Some(Self::Download),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

impl std::fmt::Display for LessonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lesson row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    pub kind: LessonKind,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub is_preview: bool,
    pub order_index: i64,
}

/// Fields for creating or editing a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub title: String,
    pub kind: LessonKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub is_preview: bool,
}

impl LessonInput {
    pub fn new(title: impl Into<String>, kind: LessonKind) -> Self {
        Self {
            title: title.into(),
            kind,
            content: None,
            video_url: None,
            duration_secs: None,
            is_preview: false,
        }
    }
}

/// Ownership chain of a module, resolved through its course.
#[derive(Debug, Clone)]
pub struct ModuleOwner {
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub instructor_id: InstructorId,
    pub module_published: bool,
    pub course_status: CourseStatus,
}

impl ModuleOwner {
    /// Learners can reach the module right now.
    pub fn is_live(&self) -> bool {
        self.module_published && self.course_status.is_live()
    }
}

/// Ownership chain of a lesson, resolved through module and course.
#[derive(Debug, Clone)]
pub struct LessonOwner {
    pub lesson_id: LessonId,
    pub kind: LessonKind,
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub instructor_id: InstructorId,
    pub module_published: bool,
    pub course_status: CourseStatus,
}

impl LessonOwner {
    /// Learners can reach the lesson right now.
    pub fn is_live(&self) -> bool {
        self.module_published && self.course_status.is_live()
    }
}

// ============================================================================
// Assessments
// ============================================================================

/// Quiz settings; the quiz itself is created together with its lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    pub pass_mark_percent: i64,
    #[serde(default)]
    pub time_limit_secs: Option<i64>,
    #[serde(default)]
    pub max_attempts: Option<i64>,
    #[serde(default)]
    pub shuffle_questions: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            pass_mark_percent: 70,
            time_limit_secs: None,
            max_attempts: None,
            shuffle_questions: false,
        }
    }
}

/// A quiz row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub settings: QuizSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_choice" => Some(Self::SingleChoice),
            "multiple_choice" => Some(Self::MultipleChoice),
            "true_false" => Some(Self::TrueFalse),
            "short_answer" => Some(Self::ShortAnswer),
            _ => None,
        }
    }

    /// Answered by picking options.
    pub fn is_choice(&self) -> bool {
        !matches!(self, Self::ShortAnswer)
    }

    /// Exactly one option may be marked correct.
    pub fn single_correct(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::TrueFalse)
    }
}

/// A question row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub prompt: String,
    pub kind: QuestionKind,
    pub points: i64,
    pub explanation: Option<String>,
    pub order_index: i64,
}

/// An answer option row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub body: String,
    pub is_correct: bool,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub body: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl OptionInput {
    pub fn correct(body: impl Into<String>) -> Self {
        Self { body: body.into(), is_correct: true }
    }

    pub fn wrong(body: impl Into<String>) -> Self {
        Self { body: body.into(), is_correct: false }
    }
}

/// Fields for creating or editing a question; options are replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub prompt: String,
    pub kind: QuestionKind,
    pub points: i64,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionInput>,
}

/// Ownership chain of a question.
#[derive(Debug, Clone)]
pub struct QuestionOwner {
    pub question_id: QuestionId,
    pub quiz_id: QuizId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub instructor_id: InstructorId,
}

/// Fields for creating or editing an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub instructions: String,
    pub max_points: i64,
    #[serde(default)]
    pub due_days: Option<i64>,
    #[serde(default)]
    pub allow_resubmission: bool,
}

impl Default for AssignmentInput {
    fn default() -> Self {
        Self {
            instructions: String::new(),
            max_points: 100,
            due_days: None,
            allow_resubmission: false,
        }
    }
}

/// An assignment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub lesson_id: LessonId,
    pub instructions: String,
    pub max_points: i64,
    pub due_days: Option<i64>,
    pub allow_resubmission: bool,
}

// ============================================================================
// Resources and drip rules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Link,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Link => "link",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

/// A downloadable or linked resource attached to a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub lesson_id: LessonId,
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
}

/// What a drip rule delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum DripTarget {
    Module(ModuleId),
    Lesson(LessonId),
}

/// When the target becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DripSchedule {
    /// Days after the learner enrolled.
    AfterEnrollment { days: i64 },
    /// Fixed calendar instant (unix millis).
    OnDate { at_millis: i64 },
}

/// A drip rule row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DripRule {
    pub id: DripRuleId,
    pub course_id: CourseId,
    pub target: DripTarget,
    pub schedule: DripSchedule,
}

// ============================================================================
// Learner activity (read-only for authoring)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Operational records a lesson strictly owns beyond resources, progress and
/// drip rules. All share one table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonArtifact {
    Comment,
    Note,
    VideoChapter,
    VideoMetadata,
    PlaybackLog,
    SecurityLog,
    Discussion,
}

impl LessonArtifact {
    pub const ALL: [LessonArtifact; 7] = [
        LessonArtifact::Comment,
        LessonArtifact::Note,
        LessonArtifact::VideoChapter,
        LessonArtifact::VideoMetadata,
        LessonArtifact::PlaybackLog,
        LessonArtifact::SecurityLog,
        LessonArtifact::Discussion,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Comment => "lesson_comments",
            Self::Note => "lesson_notes",
            Self::VideoChapter => "video_chapters",
            Self::VideoMetadata => "video_metadata",
            Self::PlaybackLog => "video_playback_logs",
            Self::SecurityLog => "video_security_logs",
            Self::Discussion => "lesson_discussions",
        }
    }
}

/// Records that point at a course or lesson through a nullable column.
/// Deleting the target detaches them instead of deleting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackReference {
    Bookmark,
    FlashcardDeck,
    Faq,
    Reminder,
    CalendarEvent,
    LastViewed,
}

impl BackReference {
    pub const ALL: [BackReference; 6] = [
        BackReference::Bookmark,
        BackReference::FlashcardDeck,
        BackReference::Faq,
        BackReference::Reminder,
        BackReference::CalendarEvent,
        BackReference::LastViewed,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Bookmark => "bookmarks",
            Self::FlashcardDeck => "flashcard_decks",
            Self::Faq => "course_faqs",
            Self::Reminder => "reminders",
            Self::CalendarEvent => "calendar_events",
            Self::LastViewed => "last_viewed",
        }
    }
}

/// The course/lesson pointers of one back-reference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackReferenceRow {
    pub id: i64,
    pub course_id: Option<String>,
    pub lesson_id: Option<String>,
}

/// Learner activity recorded under one module or lesson (or a whole course).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
    pub progress: u64,
    pub quiz_attempts: u64,
    pub submissions: u64,
}

impl ActivityCounts {
    pub fn is_empty(&self) -> bool {
        self.progress == 0 && self.quiz_attempts == 0 && self.submissions == 0
    }
}
