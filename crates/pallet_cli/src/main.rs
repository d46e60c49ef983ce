//! Operator entry point for pallet shape maintenance.
//!
//! # Responsibility
//! - Run the shape backfill as a one-shot job against a pallet database.
//! - Exit non-zero with the error chain on stderr when anything fails.

mod config;

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, Command};
use pallet_core::db::open_db;
use pallet_core::{BackfillJob, PalletService, ShapeAllocator};
use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    if let Some(log_dir) = args.log_dir()? {
        pallet_core::init_logging(args.log_level(), &log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    let command = args.command.unwrap_or(Command::Backfill);
    if let Command::Version = command {
        println!("pallet_core version={}", pallet_core::core_version());
        return Ok(());
    }

    let db_path = args.db_path()?;
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open pallet database `{}`", db_path.display()))?;
    let allocator = ShapeAllocator::default();

    match command {
        Command::Backfill => {
            let report = BackfillJob::new(&conn, allocator)
                .run()
                .context("shape backfill failed; no shapes were assigned")?;
            println!(
                "processed={} fallbacks={}",
                report.processed, report.fallbacks
            );
            if report.fallbacks > 0 {
                eprintln!(
                    "warning: {} pallet(s) received the exhaustion fallback shape",
                    report.fallbacks
                );
            }
        }
        Command::List => {
            let service = PalletService::new(&conn, allocator);
            for pallet in service
                .list_open_pallets()
                .context("failed to list open pallets")?
            {
                println!(
                    "{} created_at={} shape={}",
                    pallet.id,
                    pallet.created_at,
                    pallet.assigned_shape().unwrap_or("-")
                );
            }
        }
        Command::Version => {}
    }

    Ok(())
}
