use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use taskline_core::TaskStatus;

#[derive(Parser)]
#[command(name = "taskline")]
#[command(about = "Offline-first task list with background sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: Vec<String>,
        /// Optional longer description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List tasks, newest first
    #[command(alias = "ls")]
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task
    Show {
        /// Task ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing task
    Edit {
        /// Task ID or unique ID prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Flip a task between pending and completed
    Toggle {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Delete a task (removed for good after the next sync)
    #[command(alias = "rm")]
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Run one sync pass against the configured remote
    Sync {
        /// Treat the network as unavailable; the pass is deferred
        #[arg(long)]
        offline: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe the remote and sync automatically whenever it comes back
    Watch,
    /// Show local sync status
    Status,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Inspect or update sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Completed,
}

impl From<StatusArg> for TaskStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Completed => Self::Completed,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings and where they come from
    Show,
    /// Set the remote task authority URL
    SetRemote {
        /// Base URL, e.g. <https://tasks.example.com>
        url: String,
    },
    /// Remove the configured remote URL
    ClearRemote,
}
