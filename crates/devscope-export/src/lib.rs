//! Export files on disk: discovery, a TTL load cache, and the refresh runner.

mod cache;
mod discovery;
mod refresh;

pub use cache::{DEFAULT_TTL, ExportCache};
pub use discovery::{
    DEFAULT_PATTERN, ExportDescription, ExportError, ExportInfo, latest_export, matching_exports,
    recent_exports,
};
pub use refresh::{LOCK_FILE, RefreshError, RefreshOutcome, RefreshRunner, RefreshSettings};
