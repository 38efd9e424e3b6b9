pub mod budget;
pub mod cli;
pub mod db;
pub mod error;
pub mod settings;
pub mod storage;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use budget::ledger::BudgetLedger;
use db::Database;
use settings::Settings;

/// Application state shared across commands.
pub struct AppState {
    pub db: Arc<Database>,
    pub ledger: BudgetLedger,
    pub settings: Settings,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load settings, open the database and load the ledger (running the
    /// legacy migration on first use).
    pub fn open(data_dir: &Path) -> error::Result<Self> {
        let settings = Settings::load(&settings_path(data_dir));
        tracing::debug!(
            "Settings loaded: sync {}",
            settings.api_base().unwrap_or("disabled")
        );

        let db_path = data_dir.join("budgeto.db");
        tracing::debug!("Database path: {}", db_path.display());
        let db = Arc::new(Database::open(&db_path)?);

        let mut ledger = BudgetLedger::new(db.clone());
        ledger.load(Some(&data_dir.join(&settings.legacy_entries_file)))?;

        Ok(Self {
            db,
            ledger,
            settings,
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn save_settings(&self) -> error::Result<()> {
        self.settings.save(&settings_path(&self.data_dir))
    }
}

/// Get the app data directory.
pub fn get_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("com.budgeto.app")
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

/// Install ring as the process-wide rustls provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (stderr, so command output stays clean on stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("budgeto_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting Budgeto v{}", env!("CARGO_PKG_VERSION"));
    install_crypto_provider();

    let args = cli::Cli::parse();
    cli::execute(args)
}
