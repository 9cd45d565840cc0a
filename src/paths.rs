use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the default data directory: `<local data dir>/guild-stats/`
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guild-stats")
}

/// Returns the local tesseract directory: `<local data dir>/guild-stats/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    default_data_dir().join("tesseract")
}

/// Current analysis session (collection + sort state).
pub fn session_file(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

/// Saved analyses.
pub fn history_file(data_dir: &Path) -> PathBuf {
    data_dir.join("history.json")
}

/// Guild rosters.
pub fn rosters_file(data_dir: &Path) -> PathBuf {
    data_dir.join("rosters.json")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories(data_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(data_dir)?;
    Ok(())
}

/// Serializes `value` as pretty JSON and atomically replaces `path`.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::io::Write;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .context(format!("Failed to create directory: {}", parent.display()))?;

    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    let mut temp = tempfile::NamedTempFile::new_in(parent).context("Failed to create temp file")?;
    temp.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;
    temp.persist(path)
        .context(format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_json_atomic_creates_parent_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let restored: Vec<i32> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, vec![4]);
    }

    #[test]
    fn test_data_files_live_in_data_dir() {
        let base = Path::new("/tmp/guild");
        assert_eq!(session_file(base), base.join("session.json"));
        assert_eq!(history_file(base), base.join("history.json"));
        assert_eq!(rosters_file(base), base.join("rosters.json"));
    }
}
