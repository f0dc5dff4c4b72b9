//! Config command: resolved paths and effective thresholds.

use crate::cli::context::CliContext;
use crate::cli::output::print_table;
use anyhow::Result;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &CliContext, args: ConfigArgs) -> Result<()> {
    let config = ctx.load_config()?;

    if args.json {
        let payload = serde_json::json!({
            "home": ctx.home.to_string_lossy(),
            "db": {
                "path": ctx.db_path.to_string_lossy(),
                "exists": ctx.db_path.exists(),
            },
            "config": {
                "path": ctx.config_path.to_string_lossy(),
                "exists": ctx.config_path.exists(),
                "effective": config,
            },
            "logs": ctx.logs_dir().to_string_lossy(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let exists = |found: bool| if found { "yes" } else { "no" }.to_string();
    print_table(
        &["Path", "Location", "Exists"],
        vec![
            vec!["home".into(), ctx.home.display().to_string(), exists(ctx.home.exists())],
            vec!["course store".into(), ctx.db_path.display().to_string(), exists(ctx.db_path.exists())],
            vec!["config".into(), ctx.config_path.display().to_string(), exists(ctx.config_path.exists())],
            vec!["logs".into(), ctx.logs_dir().display().to_string(), exists(ctx.logs_dir().exists())],
        ],
    );

    print_table(
        &["Threshold", "Value"],
        vec![
            vec!["min_title_chars".into(), config.min_title_chars.to_string()],
            vec!["min_short_description_chars".into(), config.min_short_description_chars.to_string()],
            vec!["min_description_chars".into(), config.min_description_chars.to_string()],
            vec!["min_learning_outcomes".into(), config.min_learning_outcomes.to_string()],
            vec!["min_requirements".into(), config.min_requirements.to_string()],
            vec!["min_modules".into(), config.min_modules.to_string()],
            vec!["min_lessons".into(), config.min_lessons.to_string()],
            vec![
                "require_video_lesson_per_module".into(),
                config.require_video_lesson_per_module.to_string(),
            ],
        ],
    );
    Ok(())
}
