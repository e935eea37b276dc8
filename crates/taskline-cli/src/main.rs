//! Taskline CLI - offline-first task list from the terminal
//!
//! Edits are local and instant; `taskline sync` and `taskline watch`
//! reconcile them with a remote task authority.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use taskline_core::config::SyncSettings;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, EditArgs};
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::toggle::run_toggle;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskline=info,taskline_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let db_path = cli.db_path;
    match command {
        Commands::Add { title, description } => {
            run_add(&title, description.as_deref(), &resolve_db_path(db_path)?).await
        }
        Commands::List { all, json } => run_list(all, json, &resolve_db_path(db_path)?).await,
        Commands::Show { id, json } => run_show(&id, json, &resolve_db_path(db_path)?).await,
        Commands::Edit {
            id,
            title,
            description,
            status,
        } => {
            let args = EditArgs {
                title,
                description,
                status,
            };
            run_edit(&id, args, &resolve_db_path(db_path)?).await
        }
        Commands::Toggle { id } => run_toggle(&id, &resolve_db_path(db_path)?).await,
        Commands::Delete { id } => run_delete(&id, &resolve_db_path(db_path)?).await,
        Commands::Sync { offline, json } => {
            let settings = SyncSettings::load()?;
            run_sync(offline, json, &settings, &resolve_db_path(db_path)?).await
        }
        Commands::Watch => {
            let settings = SyncSettings::load()?;
            run_watch(&settings, &resolve_db_path(db_path)?).await
        }
        Commands::Status => {
            let settings = SyncSettings::load()?;
            run_status(&settings, &resolve_db_path(db_path)?).await
        }
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
        Commands::Config { command } => run_config(command),
    }
}
