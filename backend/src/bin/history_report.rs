//! Export one user's segment history for a month as a CSV report.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;
use segments_backend::domain::ports::{HistoryReportCommand, SegmentAssignmentQuery};
use segments_backend::domain::{
    HistoryPeriod, HistoryReportService, SegmentAssignmentService, UserId,
};
use segments_backend::outbound::persistence::{
    DbPool, DieselSegmentAssignmentRepository, PoolConfig,
};
use segments_backend::outbound::reports::CsvReportDirectory;
use tokio::runtime::Builder;

const DATABASE_URL_ENV: &str = "SEGMENTS_DATABASE_URL";

/// `history-report` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "history-report",
    about = "Write a user's monthly segment history to a CSV report",
    version
)]
struct CliArgs {
    /// User whose history is exported.
    #[arg(long = "user", value_name = "id", value_parser = parse_user_id)]
    user_id: UserId,
    /// Calendar year of the period.
    #[arg(long, value_name = "yyyy")]
    year: i32,
    /// Calendar month of the period, 1-12.
    #[arg(long, value_name = "mm")]
    month: u32,
    /// Output directory for the report.
    #[arg(long = "reports-dir", value_name = "path", default_value = "reports")]
    reports_dir: PathBuf,
    /// Database connection URL. Falls back to `SEGMENTS_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn parse_user_id(raw: &str) -> Result<UserId, String> {
    let id: i32 = raw
        .parse()
        .map_err(|error| format!("user id must be an integer: {error}"))?;
    UserId::new(id).map_err(|error| error.to_string())
}

fn resolve_database_url(arg: Option<String>) -> io::Result<String> {
    arg.or_else(|| env::var(DATABASE_URL_ENV).ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("pass --database-url or set {DATABASE_URL_ENV}"),
            )
        })
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let period = HistoryPeriod::new(args.year, args.month)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

    let database_url = resolve_database_url(args.database_url)?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let reports = CsvReportDirectory::open(&args.reports_dir)?;

    let query: Arc<dyn SegmentAssignmentQuery> = Arc::new(SegmentAssignmentService::new(
        Arc::new(DieselSegmentAssignmentRepository::new(pool)),
        Arc::new(DefaultClock),
    ));
    let command = HistoryReportService::new(query, Arc::new(reports));

    let report = command
        .generate(args.user_id, period)
        .await
        .map_err(|error| io::Error::other(format!("export failed: {error}")))?;

    println!("rows={}", report.rows);
    println!("path={}", args.reports_dir.join(&report.file_name).display());
    Ok(())
}
