//! `devscope refresh`: run the export script, wait for its output, and load it.

use super::Session;
use anyhow::Context as _;
use devscope_export::RefreshRunner;

pub fn cmd_refresh(session: &mut Session) -> anyhow::Result<i32> {
    let settings = session
        .config
        .refresh
        .settings(&session.root, &session.config.export);
    let runner = RefreshRunner::new(settings);

    eprintln!("Running export script and waiting for a new device export...");
    let outcome = runner.run().context("refresh failed")?;

    session.invalidate_cache();
    let Some(loaded) = session.load()? else {
        return Ok(1);
    };
    tracing::info!(
        path = %loaded.info.path.display(),
        devices = loaded.records.len(),
        "reloaded export after refresh"
    );
    session.emit(&outcome)?;
    Ok(0)
}
