//! Locating export files by glob pattern and modification time.

use devscope_output::OutputFormatter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default export file pattern.
pub const DEFAULT_PATTERN: &str = "DeviceScope_Merged*.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid export pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error(transparent)]
    Inventory(#[from] devscope_inventory::InventoryError),
}

/// An export file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportInfo {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl ExportInfo {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Local modification time as `%Y-%m-%d %H:%M:%S`.
    pub fn modified_display(&self) -> String {
        chrono::DateTime::<chrono::Local>::from(self.modified)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    pub fn describe(&self) -> ExportDescription {
        ExportDescription {
            file: self.file_name(),
            path: self.path.clone(),
            modified: self.modified_display(),
        }
    }
}

/// Serializable caption for the export in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ExportDescription {
    pub file: String,
    pub path: PathBuf,
    pub modified: String,
}

impl OutputFormatter for ExportDescription {
    fn format_text(&self) -> String {
        format!("Using file: {} (last updated {})", self.file, self.modified)
    }
}

/// All regular files in `dir` matching `pattern`. A missing directory yields none.
pub fn matching_exports(dir: &Path, pattern: &str) -> Result<Vec<ExportInfo>, ExportError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let paths =
        glob::glob(&full.to_string_lossy()).map_err(|source| ExportError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

    let mut found = Vec::new();
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable export candidate");
                continue;
            }
        };
        let modified = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(e) => Err(e),
        };
        match modified {
            Ok(modified) => found.push(ExportInfo { path, modified }),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "no modification time"),
        }
    }
    Ok(found)
}

/// Most recently modified export, if any.
pub fn latest_export(dir: &Path, pattern: &str) -> Result<Option<ExportInfo>, ExportError> {
    Ok(matching_exports(dir, pattern)?
        .into_iter()
        .max_by_key(|info| info.modified))
}

/// Exports modified within `within` of `now`, newest first.
pub fn recent_exports(
    dir: &Path,
    pattern: &str,
    within: Duration,
    now: SystemTime,
) -> Result<Vec<ExportInfo>, ExportError> {
    let mut recent: Vec<ExportInfo> = matching_exports(dir, pattern)?
        .into_iter()
        // Modification times in the future count as recent.
        .filter(|info| {
            now.duration_since(info.modified)
                .map(|age| age < within)
                .unwrap_or(true)
        })
        .collect();
    recent.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(recent)
}
