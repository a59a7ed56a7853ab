// src/infra/paths.rs — Config and data directory resolution
//
// TSENGINE_HOME isolates everything: config lives in $TSENGINE_HOME and data
// in $TSENGINE_HOME/data. When unset, config uses ~/.tsengine/ and data uses
// the platform data directory (XDG_DATA_HOME/tsengine on Linux).

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<Option<ProjectDirs>> = OnceLock::new();

fn project_dirs() -> Option<&'static ProjectDirs> {
    PROJECT_DIRS
        .get_or_init(|| ProjectDirs::from("org", "tokenscript", "tsengine"))
        .as_ref()
}

/// Returns the TSENGINE_HOME override, if set.
fn tsengine_home() -> Option<PathBuf> {
    std::env::var_os("TSENGINE_HOME").map(PathBuf::from)
}

/// Home directory, or the working directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $TSENGINE_HOME/ or ~/.tsengine/
pub fn config_dir() -> PathBuf {
    if let Some(home) = tsengine_home() {
        return home;
    }
    dirs_home().join(".tsengine")
}

/// Data directory: $TSENGINE_HOME/data/ or the platform data dir
pub fn data_dir() -> PathBuf {
    if let Some(home) = tsengine_home() {
        return home.join("data");
    }
    match project_dirs() {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Directory backing the file store
pub fn definitions_dir() -> PathBuf {
    data_dir().join("definitions")
}

/// Database path for the SQLite store
pub fn db_path() -> PathBuf {
    data_dir().join("tsengine.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
