use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line and environment configuration.
///
/// Values may also come from a `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pallet-shapes",
    version,
    about = "Assigns distinguishable shapes to open pallets"
)]
pub struct CliArgs {
    /// Path of the SQLite pallet database.
    ///
    /// Environment variable: `PALLET_DB_PATH`
    #[arg(long = "db", env = "PALLET_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error. Defaults to `debug` in
    /// debug builds and `info` in release builds.
    ///
    /// Environment variable: `PALLET_LOG_LEVEL`
    #[arg(long, env = "PALLET_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files. File logging is off when
    /// unset.
    ///
    /// Environment variable: `PALLET_LOG_DIR`
    #[arg(long, env = "PALLET_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Label every open pallet that has no shape (default).
    Backfill,
    /// Print open pallets and their shapes, oldest first.
    List,
    /// Print the core library version.
    Version,
}

impl CliArgs {
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => bail!("no database given; pass --db or set PALLET_DB_PATH"),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| pallet_core::default_log_level())
    }

    pub fn log_dir(&self) -> anyhow::Result<Option<String>> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        match dir.to_str() {
            Some(dir) => Ok(Some(dir.to_string())),
            None => bail!("log directory `{}` is not valid UTF-8", dir.display()),
        }
    }
}
