use std::path::PathBuf;

use directories_next::{BaseDirs, UserDirs};

pub fn config_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.config_dir().join("Themeforge"))
}

pub fn cache_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.cache_dir().join("Themeforge"))
}

/// Where theme documents live by default.
pub fn default_themes_dir() -> PathBuf {
    let primary = UserDirs::new()
        .and_then(|ud| ud.document_dir().map(|p| p.join("Themeforge")));
    let fallback = BaseDirs::new()
        .map(|bd| bd.home_dir().to_path_buf().join("Themeforge"));

    primary
        .or(fallback)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Themes")
}
