use anyhow::Result;
use clap::Args;
use colored::Colorize;
use cpacs_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Document path mirrored by the tree
    #[arg(short, long)]
    pub root_path: Option<String>,

    /// Maximum number of undo steps (0 = unlimited)
    #[arg(short, long)]
    pub undo_limit: Option<usize>,

    /// Start in expert view
    #[arg(long)]
    pub expert: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, config_dir: &Path) -> Result<()> {
    let config_path = EditorConfig::path_in(config_dir);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = EditorConfig::default();
    if let Some(root_path) = args.root_path {
        config.root_path = root_path;
    }
    if let Some(undo_limit) = args.undo_limit {
        config.undo_limit = undo_limit;
    }
    config.filter.expert = args.expert;

    fs::create_dir_all(config_dir)?;
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    Ok(())
}
