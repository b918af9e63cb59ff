// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "gate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Configuration file; defaults to $GATEFS_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata of a path
    Stat {
        path: String,
    },
    /// List the direct children of a directory
    Ls {
        path: String,
    },
    /// List everything below a directory, depth first
    Walk {
        path: String,
        /// Skip subtrees with this name (repeatable)
        #[arg(long)]
        prune: Vec<String>,
    },
    /// Create a directory and any missing parents
    Mkdir {
        path: String,
    },
    /// Create an empty file, or update its modification time
    Touch {
        path: String,
    },
    /// Print file content
    Cat {
        path: String,
    },
    /// Remove a path recursively
    Rm {
        path: String,
        /// Keep entries with this name, and their parent directories (repeatable)
        #[arg(long)]
        keep: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Stat { path } => commands::stat_command(&path, &mut out).await?,
        Commands::Ls { path } => commands::ls_command(&path, &mut out).await?,
        Commands::Walk { path, prune } => commands::walk_command(&path, &prune, &mut out).await?,
        Commands::Mkdir { path } => commands::mkdir_command(&path, &mut out).await?,
        Commands::Touch { path } => commands::touch_command(&path).await?,
        Commands::Cat { path } => commands::cat_command(&path, &mut out).await?,
        Commands::Rm { path, keep } => commands::rm_command(&path, &keep).await?,
        Commands::Config => commands::config_command(cli.config, &mut out)?,
    }
    out.flush()?;
    Ok(())
}
