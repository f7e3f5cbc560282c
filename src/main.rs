//! cardiofuzzy: cardiovascular risk screening from the command line.
//!
//! JSON results go to stdout; logs go to stderr or a file.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiofuzzy::adapters::sanitize::SanitizingMakeWriter;
use cardiofuzzy::adapters::SqliteStorage;
use cardiofuzzy::application::{DiagnosisRequest, DiagnosisService, StatisticsService};
use cardiofuzzy::config::{AppConfig, LogMode};
use cardiofuzzy::{CardioError, EngineConfig, FuzzyEngine};

const DEFAULT_HISTORY_LIMIT: usize = 10;

const USAGE: &str = "\
Usage: cardiofuzzy <command>

Commands:
  diagnose <file|->        Assess a JSON request and record the result
  history [limit]          Show the newest records (default 10)
  page <offset> <limit>    Show one page of records
  show <id>                Show one record
  stats                    Daily counts for the last 7 days and tier distribution

Environment:
  CARDIOFUZZY_DB              SQLite database path (default data/cardiofuzzy.db)
  CARDIOFUZZY_ENGINE_CONFIG   JSON file overriding engine parameters
  CARDIOFUZZY_LOG_MODE        file | stderr (default stderr)
  CARDIOFUZZY_LOG_FILE        Log file for file mode
  RUST_LOG                    Log filter (default info)";

fn main() -> Result<ExitCode> {
    let config = AppConfig::from_env();

    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces when opening the file.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    };
    if matches!(command.as_str(), "help" | "-h" | "--help") {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let engine_config = EngineConfig::load(config.engine_config.as_deref())?;
    let engine = Arc::new(FuzzyEngine::new(engine_config)?);
    let storage = Arc::new(open_storage(&config.db_path)?);

    let diagnosis = DiagnosisService::new(engine, Arc::clone(&storage));
    let statistics = StatisticsService::new(storage);

    match (command.as_str(), &args[1..]) {
        ("diagnose", [source]) => {
            let request = read_request(source)?;
            match diagnosis.diagnose(&request) {
                Ok(outcome) => print_json(&outcome)?,
                Err(CardioError::Validation(errors)) => {
                    print_json(&serde_json::json!({ "errors": errors }))?;
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            }
        }
        ("history", rest) => {
            let limit = match rest {
                [] => DEFAULT_HISTORY_LIMIT,
                [limit] => parse_count(limit, "limit")?,
                _ => bail!("history takes at most one argument"),
            };
            print_json(&diagnosis.recent_records(limit)?)?;
        }
        ("page", [offset, limit]) => {
            let page = diagnosis.records_page(
                parse_count(offset, "offset")?,
                parse_count(limit, "limit")?,
            )?;
            print_json(&serde_json::json!({
                "items": page.items,
                "total_count": page.total_count,
                "offset": page.offset,
                "limit": page.limit,
                "has_more": page.has_more,
                "next_offset": page.next_offset(),
                "prev_offset": page.prev_offset(),
            }))?;
        }
        ("show", [id]) => match diagnosis.record(id) {
            Ok(record) => print_json(&record)?,
            Err(CardioError::NotFound(_)) => {
                eprintln!("No record with that id");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        },
        ("stats", []) => {
            let today = chrono::Utc::now().date_naive();
            print_json(&serde_json::json!({
                "total": diagnosis.record_count()?,
                "daily": statistics.last_week(today)?,
                "tiers": statistics.tier_distribution()?,
            }))?;
        }
        _ => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_storage(path: &Path) -> Result<SqliteStorage> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let storage = SqliteStorage::new(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    tracing::debug!("Opened record store at {}", path.display());
    Ok(storage)
}

fn read_request(source: &str) -> Result<DiagnosisRequest> {
    let content = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))?
    };
    serde_json::from_str(&content).context("Request is not a valid diagnosis request")
}

fn parse_count(value: &str, name: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{name} must be a non-negative integer, got '{value}'"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
