//! Configuration for devscope.
//!
//! Loads config from:
//! 1. Global: ~/.config/devscope/config.toml
//! 2. Per-project: <root>/.devscope/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [export]
//! dir = "data"
//! pattern = "DeviceScope_Merged*.csv"
//!
//! [cache]
//! ttl_secs = 86400
//!
//! [refresh]
//! command = ["pwsh", "-File"]
//! script = "scripts/AllDeviceExports_Merge.ps1"
//! timeout_secs = 60
//!
//! [presence]
//! policy = "legacy"
//! ```

use devscope_core::Merge;
use devscope_export::{DEFAULT_PATTERN, DEFAULT_TTL, RefreshSettings};
use devscope_inventory::PresencePolicy;
use devscope_output::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where exports are found.
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct ExportConfig {
    /// Export directory, relative to the project root. Default: `data`
    pub dir: Option<PathBuf>,
    /// Glob matched against file names in the export directory.
    pub pattern: Option<String>,
}

impl Merge for ExportConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            dir: self.dir.merge(other.dir),
            pattern: self.pattern.merge(other.pattern),
        }
    }
}

impl ExportConfig {
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(self.dir.as_deref().unwrap_or(Path::new("data")))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or(DEFAULT_PATTERN)
    }
}

/// Loaded-export cache.
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds before a loaded export is re-read. Default: 86400
    pub ttl_secs: Option<u64>,
}

impl Merge for CacheConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            ttl_secs: self.ttl_secs.merge(other.ttl_secs),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        self.ttl_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TTL)
    }
}

/// Export script invoked by `devscope refresh`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct RefreshConfig {
    /// Program and arguments preceding the script path. Empty runs the script directly.
    pub command: Option<Vec<String>>,
    /// Script path, relative to the project root.
    pub script: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    /// An export modified this recently counts as new.
    pub recent_window_secs: Option<u64>,
}

impl Merge for RefreshConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            command: self.command.merge(other.command),
            script: self.script.merge(other.script),
            timeout_secs: self.timeout_secs.merge(other.timeout_secs),
            poll_interval_secs: self.poll_interval_secs.merge(other.poll_interval_secs),
            recent_window_secs: self.recent_window_secs.merge(other.recent_window_secs),
        }
    }
}

impl RefreshConfig {
    pub fn script(&self, root: &Path) -> PathBuf {
        root.join(
            self.script
                .as_deref()
                .unwrap_or(Path::new("scripts/AllDeviceExports_Merge.ps1")),
        )
    }

    /// Resolved runner settings, defaults filled in.
    pub fn settings(&self, root: &Path, export: &ExportConfig) -> RefreshSettings {
        let defaults = RefreshSettings::new(self.script(root), export.dir(root));
        RefreshSettings {
            command: self.command.clone().unwrap_or(defaults.command.clone()),
            pattern: export.pattern().to_string(),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            poll_interval: self
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            recent_window: self
                .recent_window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.recent_window),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct PresenceConfig {
    /// legacy (default), strict, or absent
    pub policy: Option<PresencePolicy>,
}

impl Merge for PresenceConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            policy: self.policy.merge(other.policy),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct DevscopeConfig {
    pub export: ExportConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub presence: PresenceConfig,
    pub pretty: PrettyConfig,
}

impl Merge for DevscopeConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            export: self.export.merge(other.export),
            cache: self.cache.merge(other.cache),
            refresh: self.refresh.merge(other.refresh),
            presence: self.presence.merge(other.presence),
            pretty: self.pretty.merge(other.pretty),
        }
    }
}

impl DevscopeConfig {
    /// Load configuration for a project root: global config, then
    /// `<root>/.devscope/config.toml` on top.
    pub fn load(root: &Path) -> Self {
        Self::load_layers(Self::global_config_path().as_deref(), root)
    }

    fn load_layers(global: Option<&Path>, root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global) = global.and_then(Self::load_file) {
            config = config.merge(global);
        }

        let project_path = root.join(".devscope").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("devscope").join("config.toml"))
    }

    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    pub fn presence_policy(&self) -> PresencePolicy {
        self.presence.policy.unwrap_or_default()
    }
}
