//! Aggregate panels: summary, overlap, distribution, and the combined dashboard.

use super::{Loaded, Session};
use devscope_export::ExportDescription;
use devscope_inventory::{ContextDistribution, DashboardMetrics, OverlapMatrix};
use devscope_output::OutputFormatter;
use serde::Serialize;
use std::time::Duration;

/// Metrics panel with the export caption.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct Summary {
    pub export: ExportDescription,
    pub metrics: DashboardMetrics,
}

impl OutputFormatter for Summary {
    fn format_text(&self) -> String {
        format!("{}\n{}", self.export.format_text(), self.metrics.format_text())
    }

    fn format_pretty(&self, colors: bool) -> String {
        format!(
            "{}\n\n{}",
            self.export.format_text(),
            self.metrics.format_pretty(colors)
        )
    }
}

/// Every aggregate panel for one export.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct Dashboard {
    pub export: ExportDescription,
    pub metrics: DashboardMetrics,
    pub overlap: OverlapMatrix,
    pub distribution: ContextDistribution,
}

impl Dashboard {
    fn compute(loaded: &Loaded) -> Self {
        Self {
            export: loaded.info.describe(),
            metrics: DashboardMetrics::compute(&loaded.records),
            overlap: OverlapMatrix::compute(&loaded.records),
            distribution: ContextDistribution::compute(&loaded.records),
        }
    }
}

impl OutputFormatter for Dashboard {
    fn format_text(&self) -> String {
        [
            self.export.format_text(),
            self.metrics.format_text(),
            self.overlap.format_text(),
            self.distribution.format_text(),
        ]
        .join("\n\n")
    }

    fn format_pretty(&self, colors: bool) -> String {
        [
            self.export.format_text(),
            self.metrics.format_pretty(colors),
            self.overlap.format_pretty(colors),
            self.distribution.format_pretty(colors),
        ]
        .join("\n\n")
    }
}

pub fn cmd_summary(session: &mut Session) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    session.emit(&Summary {
        export: loaded.info.describe(),
        metrics: DashboardMetrics::compute(&loaded.records),
    })?;
    Ok(0)
}

pub fn cmd_overlap(session: &mut Session) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    session.emit(&OverlapMatrix::compute(&loaded.records))?;
    Ok(0)
}

pub fn cmd_distribution(session: &mut Session) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    session.emit(&ContextDistribution::compute(&loaded.records))?;
    Ok(0)
}

/// Render the dashboard once, or every `watch` seconds. Each render goes
/// through the cache, so the export is only re-read when it is stale or a
/// newer file has appeared.
pub fn cmd_dashboard(
    session: &mut Session,
    watch: Option<u64>,
    iterations: Option<u64>,
) -> anyhow::Result<i32> {
    let Some(secs) = watch else {
        if let Some(loaded) = session.load()? {
            session.emit(&Dashboard::compute(&loaded))?;
        }
        return Ok(0);
    };

    let interval = Duration::from_secs(secs);
    let mut rendered = 0u64;
    loop {
        if rendered > 0 && !session.format.is_json() {
            println!();
        }
        tracing::debug!(stale = session.cache.is_stale(), "dashboard render");
        if let Some(loaded) = session.load()? {
            session.emit(&Dashboard::compute(&loaded))?;
        }
        rendered += 1;
        if iterations.is_some_and(|n| rendered >= n) {
            return Ok(0);
        }
        std::thread::sleep(interval);
    }
}
