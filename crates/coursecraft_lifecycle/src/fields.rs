//! Wizard-editable course fields and their owning steps.
//!
//! [`FIELD_OWNERS`] is the single table the merge reconciler consults: each
//! field belongs to exactly one step and carries a merge policy. Adding a
//! field means adding a variant, a row in the table and a `get`/`set` arm.

use crate::wizard::WizardStep;
use coursecraft_db::{BulletList, CourseDetails};
use coursecraft_ids::CategoryId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CourseField {
    Title,
    Subtitle,
    ShortDescription,
    Description,
    Category,
    Level,
    Language,
    LearningOutcomes,
    Requirements,
    TargetAudience,
    Thumbnail,
    PromoVideo,
    Price,
    SalePrice,
    IsFree,
    Currency,
    HasCertificate,
    MaxStudents,
    DripEnabled,
    MetaTitle,
    MetaKeywords,
}

/// How submitted values of a field are reconciled with persisted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The submitted value wins; an absent value clears the field.
    Overwrite,
    /// The submitted value wins only when usable; otherwise the persisted
    /// value is kept.
    FallbackReload,
}

/// Field → (owning step, merge policy).
pub const FIELD_OWNERS: &[(CourseField, WizardStep, MergePolicy)] = &[
    (CourseField::Title, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::Subtitle, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::ShortDescription, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::Description, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::Category, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::Level, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::Language, WizardStep::BasicInfo, MergePolicy::Overwrite),
    (CourseField::LearningOutcomes, WizardStep::LearningContent, MergePolicy::FallbackReload),
    (CourseField::Requirements, WizardStep::LearningContent, MergePolicy::FallbackReload),
    (CourseField::TargetAudience, WizardStep::LearningContent, MergePolicy::FallbackReload),
    (CourseField::Thumbnail, WizardStep::Media, MergePolicy::Overwrite),
    (CourseField::PromoVideo, WizardStep::Media, MergePolicy::Overwrite),
    (CourseField::Price, WizardStep::Pricing, MergePolicy::FallbackReload),
    (CourseField::SalePrice, WizardStep::Pricing, MergePolicy::Overwrite),
    (CourseField::IsFree, WizardStep::Pricing, MergePolicy::FallbackReload),
    (CourseField::Currency, WizardStep::Pricing, MergePolicy::Overwrite),
    (CourseField::HasCertificate, WizardStep::Settings, MergePolicy::Overwrite),
    (CourseField::MaxStudents, WizardStep::Settings, MergePolicy::Overwrite),
    (CourseField::DripEnabled, WizardStep::Settings, MergePolicy::Overwrite),
    (CourseField::MetaTitle, WizardStep::Settings, MergePolicy::Overwrite),
    (CourseField::MetaKeywords, WizardStep::Settings, MergePolicy::Overwrite),
];

impl CourseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::ShortDescription => "shortDescription",
            Self::Description => "description",
            Self::Category => "category",
            Self::Level => "level",
            Self::Language => "language",
            Self::LearningOutcomes => "learningOutcomes",
            Self::Requirements => "requirements",
            Self::TargetAudience => "targetAudience",
            Self::Thumbnail => "thumbnail",
            Self::PromoVideo => "promoVideo",
            Self::Price => "price",
            Self::SalePrice => "salePrice",
            Self::IsFree => "isFree",
            Self::Currency => "currency",
            Self::HasCertificate => "hasCertificate",
            Self::MaxStudents => "maxStudents",
            Self::DripEnabled => "dripEnabled",
            Self::MetaTitle => "metaTitle",
            Self::MetaKeywords => "metaKeywords",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        FIELD_OWNERS
            .iter()
            .map(|(field, _, _)| *field)
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::LearningOutcomes | Self::Requirements | Self::TargetAudience => FieldKind::List,
            Self::Price | Self::SalePrice => FieldKind::Cents,
            Self::IsFree | Self::HasCertificate | Self::DripEnabled => FieldKind::Flag,
            Self::MaxStudents => FieldKind::Count,
            _ => FieldKind::Text,
        }
    }

    pub fn owner(&self) -> WizardStep {
        self.ownership().0
    }

    pub fn policy(&self) -> MergePolicy {
        self.ownership().1
    }

    fn ownership(&self) -> (WizardStep, MergePolicy) {
        FIELD_OWNERS
            .iter()
            .find(|(field, _, _)| field == self)
            .map(|(_, step, policy)| (*step, *policy))
            // Every variant has a row; the fallback is unreachable.
            .unwrap_or((WizardStep::Review, MergePolicy::Overwrite))
    }

    /// Fields owned by one step, in table order.
    pub fn owned_by(step: WizardStep) -> impl Iterator<Item = CourseField> {
        FIELD_OWNERS
            .iter()
            .filter(move |(_, owner, _)| *owner == step)
            .map(|(field, _, _)| *field)
    }

    fn bullet_list(&self) -> Option<BulletList> {
        match self {
            Self::LearningOutcomes => Some(BulletList::LearningOutcomes),
            Self::Requirements => Some(BulletList::Requirements),
            Self::TargetAudience => Some(BulletList::TargetAudience),
            _ => None,
        }
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    List,
    /// Money in minor currency units.
    Cents,
    Flag,
    Count,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::List => "list",
            Self::Cents => "cents",
            Self::Flag => "flag",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single field value as submitted by a form or auto-save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Cents(i64),
    Flag(bool),
    Count(i64),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::List(_) => FieldKind::List,
            Self::Cents(_) => FieldKind::Cents,
            Self::Flag(_) => FieldKind::Flag,
            Self::Count(_) => FieldKind::Count,
        }
    }

    /// Whether the value carries real content for fallback-reload fields.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::List(items) => items.iter().any(|item| !item.trim().is_empty()),
            Self::Cents(cents) => *cents >= 0,
            Self::Flag(_) => true,
            Self::Count(n) => *n > 0,
        }
    }

    /// Interpret a JSON value as a value of `kind`. `null` clears the field.
    pub fn from_json(kind: FieldKind, raw: &serde_json::Value) -> Result<Option<Self>, String> {
        use serde_json::Value;

        if raw.is_null() {
            return Ok(None);
        }
        let value = match (kind, raw) {
            (FieldKind::Text, Value::String(s)) => Self::Text(s.clone()),
            (FieldKind::List, Value::Array(items)) => Self::List(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| "list items must be strings".to_string())?,
            ),
            (FieldKind::Cents, Value::Number(n)) => {
                Self::Cents(n.as_i64().ok_or_else(|| "amount must be whole cents".to_string())?)
            }
            (FieldKind::Count, Value::Number(n)) => {
                Self::Count(n.as_i64().ok_or_else(|| "count must be an integer".to_string())?)
            }
            (FieldKind::Flag, Value::Bool(b)) => Self::Flag(*b),
            (kind, other) => return Err(format!("expected a {} value, got {}", kind, other)),
        };
        Ok(Some(value))
    }
}

/// The mergeable state of a course: its scalar details plus bullet lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFields {
    pub details: CourseDetails,
    pub learning_outcomes: Vec<String>,
    pub requirements: Vec<String>,
    pub target_audience: Vec<String>,
}

impl CourseFields {
    pub fn bullets(&self, list: BulletList) -> &[String] {
        match list {
            BulletList::LearningOutcomes => &self.learning_outcomes,
            BulletList::Requirements => &self.requirements,
            BulletList::TargetAudience => &self.target_audience,
        }
    }

    fn bullets_mut(&mut self, list: BulletList) -> &mut Vec<String> {
        match list {
            BulletList::LearningOutcomes => &mut self.learning_outcomes,
            BulletList::Requirements => &mut self.requirements,
            BulletList::TargetAudience => &mut self.target_audience,
        }
    }

    pub fn get(&self, field: CourseField) -> Option<FieldValue> {
        if let Some(list) = field.bullet_list() {
            let items = self.bullets(list);
            return (!items.is_empty()).then(|| FieldValue::List(items.to_vec()));
        }

        let d = &self.details;
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        match field {
            CourseField::Title => text(&d.title),
            CourseField::Subtitle => text(&d.subtitle),
            CourseField::ShortDescription => text(&d.short_description),
            CourseField::Description => text(&d.description),
            CourseField::Category => d.category_id.as_ref().map(|c| FieldValue::Text(c.to_string())),
            CourseField::Level => text(&d.level),
            CourseField::Language => text(&d.language),
            CourseField::Thumbnail => text(&d.thumbnail_url),
            CourseField::PromoVideo => text(&d.promo_video_url),
            CourseField::Price => d.price_cents.map(FieldValue::Cents),
            CourseField::SalePrice => d.sale_price_cents.map(FieldValue::Cents),
            CourseField::IsFree => Some(FieldValue::Flag(d.is_free)),
            CourseField::Currency => text(&d.currency),
            CourseField::HasCertificate => Some(FieldValue::Flag(d.has_certificate)),
            CourseField::MaxStudents => d.max_students.map(FieldValue::Count),
            CourseField::DripEnabled => Some(FieldValue::Flag(d.drip_enabled)),
            CourseField::MetaTitle => text(&d.meta_title),
            CourseField::MetaKeywords => text(&d.meta_keywords),
            CourseField::LearningOutcomes | CourseField::Requirements | CourseField::TargetAudience => None,
        }
    }

    /// Write one field. `None` clears it (flags become false, lists empty).
    ///
    /// Returns false and leaves the state untouched when the value's kind does
    /// not match the field.
    pub fn set(&mut self, field: CourseField, value: Option<FieldValue>) -> bool {
        if value.as_ref().is_some_and(|v| v.kind() != field.kind()) {
            return false;
        }

        if let Some(list) = field.bullet_list() {
            let items = match value {
                Some(FieldValue::List(items)) => items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
                _ => Vec::new(),
            };
            *self.bullets_mut(list) = items;
            return true;
        }

        let text = match &value {
            Some(FieldValue::Text(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };
        let number = match value {
            Some(FieldValue::Cents(n)) | Some(FieldValue::Count(n)) => Some(n),
            _ => None,
        };
        let flag = matches!(value, Some(FieldValue::Flag(true)));

        let d = &mut self.details;
        match field {
            CourseField::Title => d.title = text,
            CourseField::Subtitle => d.subtitle = text,
            CourseField::ShortDescription => d.short_description = text,
            CourseField::Description => d.description = text,
            CourseField::Category => {
                d.category_id = text.and_then(|raw| CategoryId::parse(&raw).ok())
            }
            CourseField::Level => d.level = text,
            CourseField::Language => d.language = text,
            CourseField::Thumbnail => d.thumbnail_url = text,
            CourseField::PromoVideo => d.promo_video_url = text,
            CourseField::Price => d.price_cents = number,
            CourseField::SalePrice => d.sale_price_cents = number,
            CourseField::IsFree => d.is_free = flag,
            CourseField::Currency => d.currency = text,
            CourseField::HasCertificate => d.has_certificate = flag,
            CourseField::MaxStudents => d.max_students = number,
            CourseField::DripEnabled => d.drip_enabled = flag,
            CourseField::MetaTitle => d.meta_title = text,
            CourseField::MetaKeywords => d.meta_keywords = text,
            CourseField::LearningOutcomes | CourseField::Requirements | CourseField::TargetAudience => {}
        }
        true
    }
}
