use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// context-file-export – pick files from a workspace and export them as XML
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace root; repeat for several roots. The first one is primary.
    #[arg(short, long = "root", value_name = "DIR", default_value = ".")]
    pub roots: Vec<PathBuf>,

    /// Hide files matched by the primary root's .gitignore
    #[arg(long, conflicts_with = "no_gitignore")]
    pub gitignore: bool,

    /// Show files matched by .gitignore
    #[arg(long)]
    pub no_gitignore: bool,

    /// Directory for per-workspace state (overrides the config file)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tree with [x] checked, [~] partial and [ ] unchecked markers
    Tree,

    /// Toggle the checkbox of one or more files or folders
    Toggle {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Uncheck everything
    Clear,

    /// Print the paths that would be exported
    List,

    /// Write the selected files as XML
    Export {
        /// Output file (defaults to the configured export file name)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Copy the selected files as XML to the clipboard
    Copy,
}

impl Cli {
    /// The requested ignore mode, if either flag was given.
    pub fn gitignore_override(&self) -> Option<bool> {
        match (self.gitignore, self.no_gitignore) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
