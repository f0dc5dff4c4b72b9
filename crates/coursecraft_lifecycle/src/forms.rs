//! Per-step form payloads.
//!
//! Every field is optional: clients usually send only what the visible step
//! shows, and the merge reconciler decides what an absent value means.

use crate::fields::{CourseField, FieldValue};
use crate::wizard::WizardStep;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfoForm {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub level: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningContentForm {
    pub learning_outcomes: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub target_audience: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaForm {
    pub thumbnail_url: Option<String>,
    pub promo_video_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingForm {
    pub price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub is_free: Option<bool>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsForm {
    pub has_certificate: Option<bool>,
    pub max_students: Option<i64>,
    pub drip_enabled: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_keywords: Option<String>,
}

/// The payload of one wizard step.
///
/// Course Content edits the curriculum through child mutations and Review
/// only reads, so neither carries fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepForm {
    BasicInfo(BasicInfoForm),
    LearningContent(LearningContentForm),
    CourseContent,
    Media(MediaForm),
    Pricing(PricingForm),
    Settings(SettingsForm),
    Review,
}

impl StepForm {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::BasicInfo(_) => WizardStep::BasicInfo,
            Self::LearningContent(_) => WizardStep::LearningContent,
            Self::CourseContent => WizardStep::CourseContent,
            Self::Media(_) => WizardStep::Media,
            Self::Pricing(_) => WizardStep::Pricing,
            Self::Settings(_) => WizardStep::Settings,
            Self::Review => WizardStep::Review,
        }
    }

    /// A form for `step` with nothing filled in.
    pub fn empty(step: WizardStep) -> Self {
        match step {
            WizardStep::BasicInfo => Self::BasicInfo(BasicInfoForm::default()),
            WizardStep::LearningContent => Self::LearningContent(LearningContentForm::default()),
            WizardStep::CourseContent => Self::CourseContent,
            WizardStep::Media => Self::Media(MediaForm::default()),
            WizardStep::Pricing => Self::Pricing(PricingForm::default()),
            WizardStep::Settings => Self::Settings(SettingsForm::default()),
            WizardStep::Review => Self::Review,
        }
    }

    /// The submitted value of every field this form carries, absent ones
    /// included as `None`.
    pub fn submitted(&self) -> Vec<(CourseField, Option<FieldValue>)> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let list = |v: &Option<Vec<String>>| v.clone().map(FieldValue::List);
        let flag = |v: &Option<bool>| v.map(FieldValue::Flag);

        match self {
            Self::BasicInfo(f) => vec![
                (CourseField::Title, text(&f.title)),
                (CourseField::Subtitle, text(&f.subtitle)),
                (CourseField::ShortDescription, text(&f.short_description)),
                (CourseField::Description, text(&f.description)),
                (CourseField::Category, text(&f.category_id)),
                (CourseField::Level, text(&f.level)),
                (CourseField::Language, text(&f.language)),
            ],
            Self::LearningContent(f) => vec![
                (CourseField::LearningOutcomes, list(&f.learning_outcomes)),
                (CourseField::Requirements, list(&f.requirements)),
                (CourseField::TargetAudience, list(&f.target_audience)),
            ],
            Self::Media(f) => vec![
                (CourseField::Thumbnail, text(&f.thumbnail_url)),
                (CourseField::PromoVideo, text(&f.promo_video_url)),
            ],
            Self::Pricing(f) => vec![
                (CourseField::Price, f.price_cents.map(FieldValue::Cents)),
                (CourseField::SalePrice, f.sale_price_cents.map(FieldValue::Cents)),
                (CourseField::IsFree, flag(&f.is_free)),
                (CourseField::Currency, text(&f.currency)),
            ],
            Self::Settings(f) => vec![
                (CourseField::HasCertificate, flag(&f.has_certificate)),
                (CourseField::MaxStudents, f.max_students.map(FieldValue::Count)),
                (CourseField::DripEnabled, flag(&f.drip_enabled)),
                (CourseField::MetaTitle, text(&f.meta_title)),
                (CourseField::MetaKeywords, text(&f.meta_keywords)),
            ],
            Self::CourseContent | Self::Review => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_covers_exactly_the_owned_fields() {
        for step in WizardStep::ALL {
            let form = StepForm::empty(step);
            assert_eq!(form.step(), step);

            let submitted: Vec<CourseField> = form.submitted().into_iter().map(|(f, _)| f).collect();
            let owned: Vec<CourseField> = CourseField::owned_by(step).collect();
            assert_eq!(submitted, owned, "step {}", step);
        }
    }

    #[test]
    fn forms_deserialize_with_missing_fields() {
        let form: StepForm =
            serde_json::from_str(r#"{"step":"basic_info","title":"Intro to Rust"}"#).unwrap();
        match form {
            StepForm::BasicInfo(f) => {
                assert_eq!(f.title.as_deref(), Some("Intro to Rust"));
                assert!(f.description.is_none());
            }
            other => panic!("unexpected form {:?}", other),
        }

        let review: StepForm = serde_json::from_str(r#"{"step":"review"}"#).unwrap();
        assert_eq!(review, StepForm::Review);
    }
}
