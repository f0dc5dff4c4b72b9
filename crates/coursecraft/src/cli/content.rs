//! Curriculum, deletion and publication commands.

use crate::cli::context::CliContext;
use crate::cli::input;
use crate::cli::output::print_response;
use anyhow::Result;
use coursecraft_ids::CourseId;
use coursecraft_lifecycle::{ApiResponse, ChildMutation, DeleteTarget, PublishTarget};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum EntityKind {
    Course,
    Module,
    Lesson,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PublishableKind {
    Course,
    Module,
}

#[derive(Debug, clap::Args)]
pub struct MutateArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// Mutation as JSON, e.g. {"op": "add_module", "course_id": "...", "input": {"title": "Intro"}};
    /// '-' reads stdin
    #[arg(long, default_value = "-")]
    pub input: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// What to delete
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Id of the course, module or lesson
    pub id: String,
}

#[derive(Debug, clap::Args)]
pub struct ToggleArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    #[arg(value_enum)]
    pub kind: PublishableKind,

    pub id: String,
}

#[derive(Debug, clap::Args)]
pub struct ApproveArgs {
    /// Course awaiting review
    pub course: String,
}

#[derive(Debug, clap::Args)]
pub struct ArchiveArgs {
    /// Instructor performing the request
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    pub course: String,
}

pub async fn run_mutate(ctx: &CliContext, args: MutateArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let mutation: ChildMutation = input::read_json(&args.input, "child mutation")?;

    let engine = ctx.engine().await?;
    let result = engine.mutate_child(&actor, &mutation).await;
    if let Err(err) = &result {
        warn!(error = %err, "mutation failed");
    }
    print_response(&ApiResponse::from(result))
}

pub async fn run_delete(ctx: &CliContext, args: DeleteArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let target = match args.kind {
        EntityKind::Course => DeleteTarget::Course(input::id("course id", &args.id)?),
        EntityKind::Module => DeleteTarget::Module(input::id("module id", &args.id)?),
        EntityKind::Lesson => DeleteTarget::Lesson(input::id("lesson id", &args.id)?),
    };

    let engine = ctx.engine().await?;
    print_response(&ApiResponse::from(engine.delete_entity(&actor, &target).await))
}

pub async fn run_toggle(ctx: &CliContext, args: ToggleArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let target = match args.kind {
        PublishableKind::Course => PublishTarget::Course(input::id("course id", &args.id)?),
        PublishableKind::Module => PublishTarget::Module(input::id("module id", &args.id)?),
    };

    let engine = ctx.engine().await?;
    print_response(&ApiResponse::from(engine.toggle_publish(&actor, &target).await))
}

pub async fn run_approve(ctx: &CliContext, args: ApproveArgs) -> Result<bool> {
    let course_id: CourseId = input::id("course id", &args.course)?;

    let engine = ctx.engine().await?;
    print_response(&ApiResponse::from(engine.approve_course(&course_id).await))
}

pub async fn run_archive(ctx: &CliContext, args: ArchiveArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let course_id: CourseId = input::id("course id", &args.course)?;

    let engine = ctx.engine().await?;
    print_response(&ApiResponse::from(engine.archive_course(&actor, &course_id).await))
}
