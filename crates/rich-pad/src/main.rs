use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rich_pad_config::AppConfig;
use rich_pad_core::{resolve_data_dir, Version};

mod app;

use app::{App, EditRequest};

/// A rich-text editor with version history.
#[derive(Parser, Debug)]
#[command(name = "rich-pad", version, about)]
struct Cli {
    /// Config file to use instead of rich-pad.json next to the executable.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the document and history databases.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current document.
    Show,
    /// Edit the document and save the result as a new version.
    Edit {
        /// Replace the document with this markup before applying actions.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Replace the document with the markup read from this file.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Toolbar action, repeatable: bold, h2, align:center, font:Georgia,
        /// size:18px, color:#ff0000, table, table:2x4, add-row-after, undo...
        #[arg(long = "action", value_name = "ACTION")]
        actions: Vec<String>,

        /// Throw the changes away instead of saving them.
        #[arg(long)]
        cancel: bool,
    },
    /// List versions grouped by day, newest first.
    History {
        /// Show timestamps in UTC instead of local time.
        #[arg(long)]
        utc: bool,
    },
    /// Print a past version without changing anything.
    View { id: String },
    /// Append a copy of a past version as the newest version.
    Restore {
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Delete the saved document and the whole version history.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir_override())
        .unwrap_or_else(resolve_data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "Starting rich-pad");

    let mut app = App::open(config, &data_dir);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => app.show(&mut out),
        Command::Edit {
            content,
            file,
            actions,
            cancel,
        } => {
            let content = match file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => content,
            };
            let request = EditRequest {
                content,
                actions,
                cancel,
            };
            app.edit(&request, &mut out)
        }
        Command::History { utc } => app.history(utc, &mut out),
        Command::View { id } => app.view(&id, &mut out),
        Command::Restore { id, yes } => {
            app.restore(&id, |v| if yes { Ok(true) } else { confirm_restore(v) }, &mut out)
        }
        Command::Reset { yes } => {
            if !yes && !ask("Delete the saved document and all versions?")? {
                writeln!(out, "Reset cancelled")?;
                return Ok(());
            }
            app.reset(&mut out)
        }
    }
}

fn confirm_restore(version: &Version) -> Result<bool> {
    let when = version.created_at().with_timezone(&Local);
    ask(&format!(
        "Restore version {} from {}? This adds it as the newest version.",
        version.id,
        when.format("%Y-%m-%d %H:%M:%S")
    ))
}

/// Asks a y/N question on the terminal. Anything but "y"/"yes" is a no.
fn ask(question: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{question} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
