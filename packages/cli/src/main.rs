mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, init, show, EditArgs, InitArgs, ShowArgs};
use std::path::PathBuf;

/// CPACS tree - browse and edit the component tree of a CPACS file
#[derive(Parser, Debug)]
#[command(name = "cpacs-tree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding cpacs-tree.config.json (defaults to current directory)
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file
    Init(InitArgs),

    /// Print the filtered component tree
    Show(ShowArgs),

    /// Apply an edit script to a document
    Edit(EditArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &config_dir),
        Command::Show(args) => show(args, &config_dir),
        Command::Edit(args) => edit(args, &config_dir),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
