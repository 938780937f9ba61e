//! Command dispatch and the shared load path.

mod panels;
mod refresh;
mod table;

use crate::cli::{Cli, Command};
use crate::config::DevscopeConfig;
use anyhow::Context as _;
use devscope_export::{ExportCache, ExportInfo};
use devscope_inventory::{DeviceRecord, Inventory, PresencePolicy, device_records};
use devscope_output::{OutputFormat, OutputFormatter};
use std::path::PathBuf;
use std::sync::Arc;

/// State for one CLI invocation.
pub struct Session {
    pub root: PathBuf,
    pub config: DevscopeConfig,
    pub format: OutputFormat,
    pub policy: PresencePolicy,
    export_override: Option<PathBuf>,
    cache: ExportCache,
}

/// An export resolved into device records.
pub struct Loaded {
    pub info: ExportInfo,
    pub inventory: Arc<Inventory>,
    pub records: Vec<DeviceRecord>,
}

impl Session {
    pub fn new(
        root: PathBuf,
        config: DevscopeConfig,
        format: OutputFormat,
        export_override: Option<PathBuf>,
        policy: Option<PresencePolicy>,
    ) -> Self {
        let policy = policy.unwrap_or_else(|| config.presence_policy());
        let cache = ExportCache::new(config.cache.ttl());
        Self {
            root,
            config,
            format,
            policy,
            export_override,
            cache,
        }
    }

    /// Load the export in use through the cache. `Ok(None)` after telling the
    /// user when there is nothing to load.
    pub fn load(&mut self) -> anyhow::Result<Option<Loaded>> {
        let found = match &self.export_override {
            Some(path) => {
                let modified = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .with_context(|| format!("cannot read export {}", path.display()))?;
                let info = ExportInfo {
                    path: path.clone(),
                    modified,
                };
                let inventory = self
                    .cache
                    .get_or_load(&info)
                    .with_context(|| format!("cannot load export {}", path.display()))?;
                Some((info, inventory))
            }
            None => {
                let dir = self.config.export.dir(&self.root);
                self.cache
                    .load_latest(&dir, self.config.export.pattern())
                    .with_context(|| format!("cannot load export from {}", dir.display()))?
            }
        };

        let Some((info, inventory)) = found else {
            tracing::warn!(
                dir = %self.config.export.dir(&self.root).display(),
                pattern = self.config.export.pattern(),
                "no device export file found"
            );
            eprintln!("No device export file found.");
            return Ok(None);
        };

        let records = device_records(&inventory, self.policy)
            .with_context(|| format!("invalid export {}", info.path.display()))?;
        Ok(Some(Loaded {
            info,
            inventory,
            records,
        }))
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Print a result in the session's output format.
    pub fn emit<T: OutputFormatter>(&self, value: &T) -> anyhow::Result<()> {
        let lines = value
            .render(&self.format)
            .map_err(|e| anyhow::anyhow!("output error: {e}"))?;
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }
}

/// Run a parsed command line. Returns the process exit code.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let config = DevscopeConfig::load(&root);
    let format = OutputFormat::from_cli(
        cli.json,
        cli.jsonl,
        cli.jq.as_deref(),
        cli.pretty,
        cli.compact,
        &config.pretty,
    );
    tracing::debug!(root = %root.display(), ?format, "starting");
    let mut session = Session::new(root, config, format, cli.export, cli.presence);

    match cli.command {
        Command::Summary => panels::cmd_summary(&mut session),
        Command::Overlap => panels::cmd_overlap(&mut session),
        Command::Distribution => panels::cmd_distribution(&mut session),
        Command::Dashboard { watch, iterations } => {
            panels::cmd_dashboard(&mut session, watch, iterations)
        }
        Command::List(args) => table::cmd_list(&mut session, &args),
        Command::Options => table::cmd_options(&mut session),
        Command::Show { name } => table::cmd_show(&mut session, name.as_deref()),
        Command::Refresh => refresh::cmd_refresh(&mut session),
    }
}
