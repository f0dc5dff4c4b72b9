//! Catalog commands: course listing and category registration.

use crate::cli::context::CliContext;
use crate::cli::input;
use crate::cli::output::{format_price, print_json, print_table};
use anyhow::Result;
use clap::Subcommand;
use coursecraft_ids::CategoryId;
use serde::Serialize;
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct CoursesArgs {
    /// Instructor whose courses to list
    #[arg(long, env = "COURSECRAFT_ACTOR")]
    pub actor: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Subcommands for category management
#[derive(Subcommand, Debug, Clone)]
pub enum CategoryAction {
    /// Register or rename a category
    Add {
        /// Category id referenced by courses
        id: String,
        /// Display name
        name: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseListItem {
    id: String,
    title: Option<String>,
    slug: String,
    status: String,
    price: String,
    updated_at: String,
}

pub async fn run_courses(ctx: &CliContext, args: CoursesArgs) -> Result<bool> {
    let actor = input::actor(&args.actor)?;
    let db = ctx.open_db().await?;

    let mut tx = db.begin("list_courses").await?;
    let courses = tx.list_courses_for_instructor(&actor).await?;
    drop(tx);

    let items: Vec<CourseListItem> = courses
        .into_iter()
        .map(|course| CourseListItem {
            id: course.id.to_string(),
            price: format_price(&course.details),
            title: course.details.title,
            slug: course.slug,
            status: course.status.to_string(),
            updated_at: course.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    if args.json {
        print_json(&items)?;
        return Ok(true);
    }

    if items.is_empty() {
        println!("No courses for {}", actor);
        return Ok(true);
    }
    let rows = items
        .into_iter()
        .map(|item| {
            vec![
                item.id,
                item.title.unwrap_or_else(|| "(untitled)".to_string()),
                item.status,
                item.price,
                item.updated_at,
            ]
        })
        .collect();
    print_table(&["ID", "Title", "Status", "Price", "Updated"], rows);
    Ok(true)
}

pub async fn run_category(ctx: &CliContext, action: CategoryAction) -> Result<bool> {
    match action {
        CategoryAction::Add { id, name } => {
            let category: CategoryId = input::id("category id", &id)?;
            let db = ctx.open_db().await?;

            let mut tx = db.begin("add_category").await?;
            tx.insert_category(&category, name.trim()).await?;
            tx.commit().await?;

            info!(category = %category, "Category registered");
            print_json(&serde_json::json!({ "success": true, "categoryId": category.as_str() }))?;
            Ok(true)
        }
    }
}
