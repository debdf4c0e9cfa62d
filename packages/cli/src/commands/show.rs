use super::load_document;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use cpacs_editor::{EditorConfig, FilterProjection, TreeController};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// CPACS file to show
    pub file: PathBuf,

    /// Show every element, starting at the mirror root
    #[arg(short, long)]
    pub expert: bool,

    /// Only show nodes whose type or uID contains this text, and their ancestors
    #[arg(short, long)]
    pub search: Option<String>,

    /// Document path to mirror (overrides config)
    #[arg(short, long)]
    pub root: Option<String>,

    /// Print the document path of every node
    #[arg(short, long)]
    pub paths: bool,
}

pub fn show(args: ShowArgs, config_dir: &Path) -> Result<()> {
    let mut config = EditorConfig::load(config_dir)?;
    if let Some(root) = args.root {
        config.root_path = root;
    }

    let doc = load_document(&args.file)?;
    let mut filter = FilterProjection::from_config(&config.filter);
    let mut controller = TreeController::new(config);
    let root_path = controller.config().root_path.clone();
    controller
        .attach(doc)
        .with_context(|| format!("{} does not resolve in {}", root_path, args.file.display()))?;

    if args.expert {
        filter.set_expert_view(true);
    }
    if let Some(pattern) = &args.search {
        filter.set_search_pattern(pattern);
    }

    let tree = controller.tree();
    let Some(start) = filter.display_root(tree) else {
        return Ok(());
    };

    let visible = filter.visible_preorder(tree, start);
    if visible.is_empty() {
        println!("{}", "No matching elements".yellow());
        return Ok(());
    }

    for (node, depth) in visible {
        let element_type = tree.element_type(node).unwrap_or_default();
        let uid = tree.uid(node).unwrap_or_default();
        let mut line = format!("{}{}", "  ".repeat(depth), element_type.bright_white());
        if !uid.is_empty() {
            line.push_str(&format!(" {}", uid.cyan()));
        }
        if args.paths {
            if let Some(path) = tree.derive_path(node) {
                line.push_str(&format!("  {}", path.dimmed()));
            }
        }
        println!("{}", line);
    }

    Ok(())
}
