//! Table pipeline scenario runner.
//!
//! Replays a JSON scenario against a table view and prints what the view
//! reported: every change notification, the decorated columns and the final
//! visible page.
//!
//! ## Usage
//!
//! ```bash
//! tableview scenario.json
//! tableview --log-stderr - < scenario.json
//! ```

mod error;
mod paths;
mod scenario;

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::error::CliError;
use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "tableview")]
#[command(about = "Replay table interactions and print the resulting state", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file, or `-` for stdin
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,

    /// Pretty-print the report
    #[arg(short, long)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    init_logging(cli.log_stderr)?;

    let json = read_scenario(&cli.scenario)?;
    let scenario = Scenario::from_json(&json)?;
    log::info!(
        "running scenario with {} records and {} events",
        scenario.data.len(),
        scenario.events.len()
    );
    let report = scenario.run();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, &report)?;
    } else {
        serde_json::to_writer(&mut out, &report)?;
    }
    writeln!(out)?;
    Ok(())
}

fn read_scenario(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut json = String::new();
        io::stdin().read_to_string(&mut json)?;
        return Ok(json);
    }
    if !path.is_file() {
        return Err(CliError::usage(format!(
            "scenario '{}' is not a file",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

/// Installs the logger: the rotated cache log file, or stderr on request.
fn init_logging(stderr: bool) -> Result<(), CliError> {
    if stderr {
        TermLogger::init(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )
        .map_err(|e| CliError::usage(format!("Failed to initialize logger: {}", e)))?;
        return Ok(());
    }

    let Some(dir) = paths::cache_dir() else {
        return Err(CliError::usage(
            "no cache directory available, run with --log-stderr",
        ));
    };
    fs::create_dir_all(&dir)?;
    paths::rotate_logs(&dir);
    let log_file = File::create(paths::log_file(&dir))?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .map_err(|e| CliError::usage(format!("Failed to initialize logger: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        fs::write(&path, r#"{"data": [], "columns": [{"dataIndex": "a"}]}"#).unwrap();

        let json = read_scenario(&path).unwrap();
        let report = Scenario::from_json(&json).unwrap().run();
        assert!(report.page.is_empty());
    }

    #[test]
    fn test_read_scenario_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_scenario(dir.path()), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::parse_from(["tableview", "--log-stderr", "-p", "-"]);
        assert!(cli.log_stderr);
        assert!(cli.pretty);
        assert_eq!(cli.scenario, PathBuf::from("-"));
    }
}
