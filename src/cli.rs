//! Command-line front end.
//!
//! Each `cmd_*` function performs one command against an open [`AppState`]
//! and returns the text to print, so commands can be exercised without a
//! terminal.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::budget::summary::format_amount;
use crate::budget::validate::parse_amount;
use crate::budget::{BudgetEntry, BudgetEntryType, EntryCategory};
use crate::storage::queue;
use crate::sync::http::HttpTransport;
use crate::sync::monitor::{Connectivity, ConnectivityMonitor, OFFLINE_MESSAGE};
use crate::sync::{self, SyncService};
use crate::AppState;

#[derive(Parser, Debug)]
#[clap(
    name = "budgeto",
    version = env!("CARGO_PKG_VERSION"),
    about = "Offline-first personal budgeting. Entries are stored locally and synced when an API is configured."
)]
pub struct Cli {
    /// Directory holding the database and settings (defaults to the platform data dir).
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record an entry: income, expense, savings_deposit or savings_withdrawal
    Add {
        entry_type: BudgetEntryType,
        #[clap(allow_hyphen_values = true)]
        amount: String,
        #[clap(short, long, default_value = "")]
        description: String,
    },
    /// Change the amount (and optionally description) of an entry
    Edit {
        id: String,
        #[clap(allow_hyphen_values = true)]
        amount: String,
        /// New description; the current one is kept when omitted
        #[clap(short, long)]
        description: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// List entries, optionally only one category (income, expense, savings)
    History {
        #[clap(long)]
        category: Option<EntryCategory>,
        #[clap(long)]
        json: bool,
    },
    /// Show totals and the spent/leftover donuts
    Summary {
        #[clap(long)]
        json: bool,
    },
    /// Show stored entries, pending sync operations and connectivity
    Status,
    /// Replay queued changes to the API and adopt the server snapshot
    Sync,
    /// Print pending sync operations as JSON lines
    Queue,
    /// Drop every pending sync operation without sending it
    DiscardQueue,
    /// Probe the API periodically and sync whenever it becomes reachable
    Watch,
    /// Inspect or change settings
    Settings {
        #[clap(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print current settings as JSON
    Show,
    /// Enable sync against the given API base URL
    SetApi { url: String },
    /// Disable sync; changes keep accumulating in the queue
    ClearApi,
}

pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(crate::get_app_data_dir);
    let mut app = AppState::open(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

    let output = match cli.command {
        Command::Add {
            entry_type,
            amount,
            description,
        } => cmd_add(&mut app, entry_type, &amount, &description)?,
        Command::Edit {
            id,
            amount,
            description,
        } => cmd_edit(&mut app, &id, &amount, description.as_deref())?,
        Command::Delete { id } => cmd_delete(&mut app, &id)?,
        Command::History { category, json } => cmd_history(&app, category, json)?,
        Command::Summary { json } => cmd_summary(&app, json)?,
        Command::Status => block_on(cmd_status(&app))?,
        Command::Sync => block_on(cmd_sync(&mut app))?,
        Command::Queue => cmd_queue(&app)?,
        Command::DiscardQueue => cmd_discard_queue(&app)?,
        Command::Watch => block_on(cmd_watch(&mut app))?,
        Command::Settings { command } => cmd_settings(&mut app, command)?,
    };

    if !output.is_empty() {
        println!("{}", output.trim_end());
    }
    Ok(())
}

fn block_on<F>(future: F) -> anyhow::Result<String>
where
    F: std::future::Future<Output = anyhow::Result<String>>,
{
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(future)
}

fn sync_service(app: &AppState) -> anyhow::Result<SyncService<HttpTransport>> {
    let transport = HttpTransport::from_settings(&app.settings)?;
    Ok(SyncService::new(transport))
}

fn describe(entry: &BudgetEntry) -> &str {
    if entry.description.is_empty() {
        "None"
    } else {
        &entry.description
    }
}

pub fn cmd_add(
    app: &mut AppState,
    entry_type: BudgetEntryType,
    amount: &str,
    description: &str,
) -> anyhow::Result<String> {
    let amount = parse_amount(amount)?;
    let entry = app.ledger.add_entry(entry_type, amount, description)?;
    Ok(format!(
        "Added {} {} ({})",
        entry.entry_type,
        format_amount(entry.amount),
        entry.id
    ))
}

pub fn cmd_edit(
    app: &mut AppState,
    id: &str,
    amount: &str,
    description: Option<&str>,
) -> anyhow::Result<String> {
    let amount = parse_amount(amount)?;
    let description = match description {
        Some(d) => d.to_string(),
        None => app
            .ledger
            .find(id)
            .map(|e| e.description.clone())
            .unwrap_or_default(),
    };
    let entry = app.ledger.update_entry(id, amount, &description)?;
    Ok(format!(
        "Updated {}: {} {}",
        entry.id,
        format_amount(entry.amount),
        describe(&entry)
    ))
}

pub fn cmd_delete(app: &mut AppState, id: &str) -> anyhow::Result<String> {
    app.ledger.delete_entry(id)?;
    Ok(format!("Deleted {}", id))
}

pub fn cmd_history(
    app: &AppState,
    category: Option<EntryCategory>,
    json: bool,
) -> anyhow::Result<String> {
    let entries: Vec<&BudgetEntry> = match category {
        Some(category) => app.ledger.entries_in(category),
        None => app.ledger.entries().iter().collect(),
    };

    if json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }

    let mut out = String::new();
    let title = category.map(|c| c.label()).unwrap_or("All entries");
    writeln!(out, "{}", title)?;
    if entries.is_empty() {
        writeln!(out, "No entries yet.")?;
        return Ok(out);
    }
    for entry in entries {
        writeln!(
            out,
            "{:<26}  {:<18}  {:>14}  {}",
            entry.id,
            entry.entry_type,
            format_amount(entry.amount),
            describe(entry)
        )?;
    }
    Ok(out)
}

pub fn cmd_summary(app: &AppState, json: bool) -> anyhow::Result<String> {
    let summary = app.ledger.summary();
    if json {
        return Ok(serde_json::to_string_pretty(&summary)?);
    }

    let mut out = String::new();
    writeln!(out, "Income    {:>14}", format_amount(summary.total_income))?;
    writeln!(out, "Expenses  {:>14}", format_amount(summary.total_expenses))?;
    writeln!(out, "Savings   {:>14}", format_amount(summary.total_savings))?;
    writeln!(out, "Leftover  {:>14}", format_amount(summary.leftover))?;
    writeln!(out, "Spent     {:>13.1}% of income", summary.spent.percent)?;
    writeln!(out, "Left      {:>13.1}% of income", summary.left.percent)?;
    Ok(out)
}

pub async fn cmd_status(app: &AppState) -> anyhow::Result<String> {
    let stats = app.db.get_stats()?;
    let service = sync_service(app)?;

    let mut out = String::new();
    writeln!(out, "Entries:        {}", stats.entry_count)?;
    writeln!(out, "Pending sync:   {}", stats.pending_sync_count)?;
    match app.settings.api_base() {
        Some(base) => {
            let mut state = Connectivity::Unknown;
            state.observe(service.probe().await);
            writeln!(out, "Sync API:       {}", base)?;
            writeln!(out, "Connectivity:   {}", state.as_str())?;
            if state == Connectivity::Offline {
                writeln!(out, "{}", OFFLINE_MESSAGE)?;
            }
        }
        None => writeln!(out, "Sync API:       not configured (changes stay queued locally)")?,
    }
    Ok(out)
}

pub async fn cmd_sync(app: &mut AppState) -> anyhow::Result<String> {
    let service = sync_service(app)?;
    if !service.is_api_available() {
        return Ok(format!(
            "Sync API not configured; {} operations queued",
            queue::queue_len(&app.db)?
        ));
    }

    let report = service.start_sync(&app.db).await?;
    if report.snapshot_applied {
        app.ledger.reload()?;
    }
    Ok(format!(
        "Replayed {} operations, {} remaining{}; snapshot {}",
        report.replayed,
        report.remaining,
        if report.stopped_early { " (stopped on failure)" } else { "" },
        if report.snapshot_applied { "applied" } else { "not applied" }
    ))
}

pub fn cmd_queue(app: &AppState) -> anyhow::Result<String> {
    let mut out = String::new();
    for op in queue::get_sync_queue(&app.db)? {
        writeln!(out, "{}", serde_json::to_string(&op)?)?;
    }
    Ok(out)
}

pub fn cmd_discard_queue(app: &AppState) -> anyhow::Result<String> {
    let pending = queue::queue_len(&app.db)?;
    sync::discard_queue(&app.db)?;
    Ok(format!("Discarded {} queued operations", pending))
}

pub async fn cmd_watch(app: &mut AppState) -> anyhow::Result<String> {
    let service = sync_service(app)?;
    if !service.is_api_available() {
        return Ok("Sync API not configured; nothing to watch".to_string());
    }

    let interval = Duration::from_secs(app.settings.probe_interval_secs.max(1));
    let mut monitor = ConnectivityMonitor::new(interval);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };
    monitor.run(&service, &app.db, shutdown).await?;
    app.ledger.reload()?;
    Ok(String::new())
}

pub fn cmd_settings(app: &mut AppState, command: SettingsCommand) -> anyhow::Result<String> {
    match command {
        SettingsCommand::Show => Ok(serde_json::to_string_pretty(&app.settings)?),
        SettingsCommand::SetApi { url } => {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("API base must start with http:// or https://");
            }
            app.settings.api_base = Some(url.clone());
            app.save_settings()?;
            Ok(format!("Sync API set to {}", url))
        }
        SettingsCommand::ClearApi => {
            app.settings.api_base = None;
            app.save_settings()?;
            Ok("Sync API cleared".to_string())
        }
    }
}
