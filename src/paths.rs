use std::path::PathBuf;
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

/// Returns the bundled pdfium directory: `<exe_dir>/lib/`
pub fn get_pdfium_dir() -> PathBuf {
    get_exe_dir().join("lib")
}

/// Returns the per-user config directory, e.g. `~/.config/scrap-fill/`
pub fn get_user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scrap-fill"))
}

/// Candidate locations for `config.json`, in lookup order.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![get_exe_dir().join("config.json")];
    if let Some(dir) = get_user_config_dir() {
        candidates.push(dir.join("config.json"));
    }
    candidates
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
