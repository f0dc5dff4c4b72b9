//! Wizard commands: state, step submission and auto-save.

use crate::cli::context::CliContext;
use crate::cli::error::HelpfulError;
use crate::cli::input;
use crate::cli::output::{format_price, print_json, print_response, print_table};
use anyhow::Result;
use coursecraft_ids::CourseId;
use coursecraft_lifecycle::{ApiResponse, CourseField, FieldValue, StepForm, WizardState};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct WizardArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// Course to load (omit for a new course)
    #[arg(long)]
    pub course: Option<String>,

    /// Step the client asked for (1-7)
    #[arg(long)]
    pub step: Option<u8>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct SaveStepArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// Course to update (omit to create a draft)
    #[arg(long)]
    pub course: Option<String>,

    /// Step being submitted (1-7)
    #[arg(long)]
    pub step: u8,

    /// next, previous, draft or publish
    #[arg(long, default_value = "next")]
    pub action: String,

    /// Step form as JSON; '-' reads stdin. Steps 3 and 7 need no form.
    #[arg(long)]
    pub form: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct AutoSaveArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// Course to update (omit to create a draft)
    #[arg(long)]
    pub course: Option<String>,

    /// Field name, e.g. title, price, learningOutcomes
    #[arg(long)]
    pub field: String,

    /// JSON value; 'null' clears the field
    #[arg(long)]
    pub value: String,
}

pub async fn run_wizard(ctx: &CliContext, args: WizardArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let course_id: Option<CourseId> = args.course.as_deref().map(|c| input::id("course id", c)).transpose()?;
    let requested = args.step.map(input::step).transpose()?;

    let engine = ctx.engine().await?;
    let state = match engine.load_wizard_state(&actor, course_id.as_ref(), requested).await {
        Ok(state) => state,
        Err(err) => return print_response(&ApiResponse::from_error(&err)),
    };

    if args.json {
        print_json(&state)?;
    } else {
        print_state(&state);
    }
    Ok(true)
}

fn print_state(state: &WizardState) {
    let (title, status, price) = match &state.course {
        Some(course) => (
            course.details.title.clone().unwrap_or_else(|| "(untitled)".to_string()),
            course.status.to_string(),
            format_price(&course.details),
        ),
        None => ("(new course)".to_string(), "-".to_string(), "-".to_string()),
    };
    println!("{}  [{}]  {}", title, status, price);
    println!(
        "Step {} of 7: {}  (resume at {}: {}, {}% ready)",
        state.current_step.number(),
        state.current_step.title(),
        state.best_step.number(),
        state.best_step.title(),
        state.completion_percent,
    );

    let checklist = state
        .checklist
        .iter()
        .map(|item| {
            let mark = if item.satisfied { "ok" } else { "missing" };
            vec![item.label.to_string(), mark.to_string()]
        })
        .collect();
    print_table(&["Publication checklist", ""], checklist);

    if !state.modules.is_empty() {
        let rows = state
            .modules
            .iter()
            .map(|node| {
                vec![
                    node.module.order_index.to_string(),
                    node.module.title.clone(),
                    node.lessons.len().to_string(),
                    if node.module.is_published { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        print_table(&["#", "Module", "Lessons", "Published"], rows);
    }
}

pub async fn run_save_step(ctx: &CliContext, args: SaveStepArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let course_id: Option<CourseId> = args.course.as_deref().map(|c| input::id("course id", c)).transpose()?;
    let step = input::step(args.step)?;
    let action = input::action(&args.action)?;

    let form = match &args.form {
        Some(path) => input::read_json(path, "step form")?,
        None => StepForm::empty(step),
    };

    let engine = ctx.engine().await?;
    let result = engine.save_step(&actor, course_id.as_ref(), step, action, &form).await;
    info!(step = step.number(), action = %action, ok = result.is_ok(), "save-step finished");
    print_response(&ApiResponse::from(result))
}

pub async fn run_auto_save(ctx: &CliContext, args: AutoSaveArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let course_id: Option<CourseId> = args.course.as_deref().map(|c| input::id("course id", c)).transpose()?;
    let field = CourseField::parse(&args.field).ok_or_else(|| HelpfulError::unknown_field(&args.field))?;

    let raw: serde_json::Value = input::parse_json(&args.value, "field value")?;
    let value = FieldValue::from_json(field.kind(), &raw).map_err(|e| HelpfulError::invalid_value(field, &e))?;

    let engine = ctx.engine().await?;
    let result = engine.auto_save(&actor, course_id.as_ref(), field, value).await;
    print_response(&ApiResponse::from(result))
}
