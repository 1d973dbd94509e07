mod config;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use takeout_tools::organize::{Operation, Organizer};

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Organize photos and videos from a Google Photos takeout"
)]
pub struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Only print changes without moving files
    #[arg(short = 'p', long, global = true)]
    print: bool,

    /// List unreadable sidecar files at the end instead of aborting
    #[arg(short = 's', long, global = true)]
    skip_invalid: bool,

    /// Print debug information
    #[arg(short = 'D', long, global = true)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Move photos and videos to year-month subdirectories
    #[command(name = "group")]
    Group {
        /// Folder path to process
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        folder: Option<PathBuf>,
    },

    /// Rename photos and videos to a unified date-based format
    ///
    /// Run this after grouping, otherwise it will have a hard time finding the media files.
    #[command(name = "rename")]
    Rename {
        /// Folder path to process
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        folder: Option<PathBuf>,
    },

    /// Move photos and videos from subdirectories back to the folder
    #[command(name = "ungroup")]
    Ungroup {
        /// Folder path to process
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        folder: Option<PathBuf>,
    },
}

impl Command {
    const fn operation(&self) -> Operation {
        match self {
            Self::Group { .. } => Operation::Group,
            Self::Rename { .. } => Operation::Rename,
            Self::Ungroup { .. } => Operation::Ungroup,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Group { .. } => "group",
            Self::Rename { .. } => "rename",
            Self::Ungroup { .. } => "ungroup",
        }
    }

    const fn folder(&self) -> Option<&PathBuf> {
        match self {
            Self::Group { folder } | Self::Rename { folder } | Self::Ungroup { folder } => folder.as_ref(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        return takeout_tools::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"));
    }

    let Some(command) = &args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let Some(folder) = command.folder() else {
        let mut cli = Args::command();
        if let Some(subcommand) = cli.find_subcommand_mut(command.name()) {
            subcommand.print_help()?;
        }
        return Ok(());
    };

    let root = takeout_tools::resolve_folder_path(folder)?;
    let config = config::organize_config(&args)?;
    let summary = Organizer::new(root, config).run(command.operation())?;
    summary.print();
    Ok(())
}
