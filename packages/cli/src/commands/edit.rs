use super::load_document;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use cpacs_editor::{EditorConfig, StructuralEdit, TreeController};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// CPACS file to edit
    pub file: PathBuf,

    /// JSON file holding a list of edits
    #[arg(short, long)]
    pub script: PathBuf,

    /// Undo this many steps after applying the script
    #[arg(short, long, default_value_t = 0)]
    pub undo: usize,

    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Apply the edits but do not write anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn edit(args: EditArgs, config_dir: &Path) -> Result<()> {
    let config = EditorConfig::load(config_dir)?;

    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("cannot read {}", args.script.display()))?;
    let edits: Vec<StructuralEdit> = serde_json::from_str(&script)
        .with_context(|| format!("invalid edit script {}", args.script.display()))?;

    let doc = load_document(&args.file)?;
    let mut controller = TreeController::new(config);
    let root_path = controller.config().root_path.clone();
    controller
        .attach(doc)
        .with_context(|| format!("{} does not resolve in {}", root_path, args.file.display()))?;

    println!("{}", "✏️  Applying edits...".bright_blue().bold());
    for edit in &edits {
        match controller.apply(edit) {
            Ok(result) => println!("  {} {} (row {})", "✓".green(), edit, result.row),
            Err(e) => {
                eprintln!("  {} {} - {}", "✗".red(), edit, e.to_string().red());
                return Err(anyhow!("edit script stopped, nothing was written"));
            }
        }
    }

    for _ in 0..args.undo {
        let description = controller.undo_stack().undo_description().map(str::to_string);
        if !controller.undo()? {
            println!("  {} nothing left to undo", "⚠️".yellow());
            break;
        }
        println!("  {} undid {}", "↩".green(), description.unwrap_or_default());
    }

    if args.dry_run {
        println!("{}", "(dry run, nothing written)".dimmed());
        return Ok(());
    }

    let mut doc = controller
        .detach()
        .ok_or_else(|| anyhow!("document was detached"))?;
    let written = match &args.output {
        Some(output) => {
            doc.save_as(output)?;
            output.clone()
        }
        None => {
            doc.save()?;
            args.file.clone()
        }
    };

    println!();
    println!(
        "{} Applied {} edits to {}",
        "✅".green(),
        edits.len(),
        written.display()
    );
    Ok(())
}
