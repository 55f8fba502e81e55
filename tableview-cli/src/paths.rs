//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "tableview";
const APPLICATION: &str = "tableview";

/// Name of the log file written by the running process.
const LATEST_LOG: &str = "latest.log";

/// Maximum number of old log files to keep.
const MAX_OLD_LOGS: usize = 25;

/// Get project directories, or None if home directory cannot be determined.
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the cache directory for logs.
///
/// - Linux: `$XDG_CACHE_HOME/tableview` or `~/.cache/tableview`
/// - macOS: `~/Library/Caches/dev.tableview.tableview`
/// - Windows: `C:\Users\<User>\AppData\Local\tableview\tableview\cache`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path to the latest log file inside `dir`.
pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(LATEST_LOG)
}

/// Rotate logs in `dir`: rename latest.log to a timestamped name and clean
/// up old logs.
///
/// Call this at startup before creating the new log file.
pub fn rotate_logs(dir: &Path) {
    let latest = log_file(dir);

    if latest.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
        let archived = dir.join(format!("{}.log", timestamp));
        if let Err(e) = fs::rename(&latest, &archived) {
            eprintln!("Could not archive {}: {}", latest.display(), e);
        }
    }

    cleanup_old_logs(dir);
}

/// Remove old log files, keeping only the most recent MAX_OLD_LOGS.
fn cleanup_old_logs(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut logs: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != LATEST_LOG
        })
        .collect();

    // Oldest first
    logs.sort_by_key(|e| (e.metadata().and_then(|m| m.modified()).ok(), e.file_name()));

    if logs.len() > MAX_OLD_LOGS {
        for entry in logs.iter().take(logs.len() - MAX_OLD_LOGS) {
            let _ = fs::remove_file(entry.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_archives_latest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(log_file(dir.path()), "previous run").unwrap();

        rotate_logs(dir.path());

        assert!(!log_file(dir.path()).exists());
        let archived: Vec<_> = fs::read_dir(dir.path()).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(archived.len(), 1);
        assert_eq!(fs::read_to_string(archived[0].path()).unwrap(), "previous run");
    }

    #[test]
    fn test_rotate_keeps_most_recent_logs() {
        let dir = tempfile::tempdir().unwrap();
        for n in 0..(MAX_OLD_LOGS + 5) {
            fs::write(dir.path().join(format!("2024{:04}.log", n)), "").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        rotate_logs(dir.path());

        let logs = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".log"))
            .count();
        assert_eq!(logs, MAX_OLD_LOGS);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_rotate_without_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        rotate_logs(&missing);
        assert!(!missing.exists());
    }
}
