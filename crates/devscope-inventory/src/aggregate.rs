//! Dashboard aggregates: headline metrics, context overlap, and context cardinality.

use crate::counting::adjust_count_for_duplicates;
use crate::{Context, DeviceRecord};
use devscope_output::{
    OutputFormatter, format_count, heading, heat_cell, progress_bar, progress_bar_colored,
};
use serde::Serialize;

/// Apply the duplicate adjustment to a subset of records.
pub fn adjusted_count<'a, I>(records: I) -> u64
where
    I: IntoIterator<Item = &'a DeviceRecord>,
{
    let mut entra = Vec::new();
    let mut sophos = Vec::new();
    for record in records {
        entra.push(record.entra_instances);
        sophos.push(record.sophos_instances);
    }
    adjust_count_for_duplicates(entra.len(), &entra, &sophos)
}

/// Every row plus duplicate instances.
pub fn count_total_devices(records: &[DeviceRecord]) -> u64 {
    adjusted_count(records)
}

/// Rows present in all five contexts, adjusted using only those rows' instance counts.
pub fn count_all_contexts(records: &[DeviceRecord]) -> u64 {
    adjusted_count(records.iter().filter(|r| r.in_all_contexts()))
}

/// Rows flagged as multi-instance.
pub fn count_multi_instance(records: &[DeviceRecord]) -> u64 {
    records.iter().filter(|r| r.multi_instance).count() as u64
}

/// Headline counts for the metrics panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct DashboardMetrics {
    pub total_devices: u64,
    pub devices_in_all_contexts: u64,
    pub multi_instance_devices: u64,
}

impl DashboardMetrics {
    pub fn compute(records: &[DeviceRecord]) -> Self {
        Self {
            total_devices: count_total_devices(records),
            devices_in_all_contexts: count_all_contexts(records),
            multi_instance_devices: count_multi_instance(records),
        }
    }

    /// Label/value pairs in display order.
    pub fn named_counts(&self) -> [(&'static str, u64); 3] {
        [
            ("Total devices", self.total_devices),
            ("Devices in all 5 contexts", self.devices_in_all_contexts),
            ("Multi-instance devices", self.multi_instance_devices),
        ]
    }
}

impl OutputFormatter for DashboardMetrics {
    fn format_text(&self) -> String {
        self.named_counts()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, format_count(*value)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_pretty(&self, colors: bool) -> String {
        let mut lines = vec![heading("Metrics", colors)];
        for (label, value) in self.named_counts() {
            lines.push(format!("  {:<28}{:>10}", label, format_count(value)));
        }
        lines.join("\n")
    }
}

/// One `(context1, context2)` entry of the melted overlap matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct OverlapCell {
    pub context1: Context,
    pub context2: Context,
    pub device_count: u64,
}

/// Adjusted pairwise overlap between contexts. Symmetric; the diagonal is the
/// adjusted per-context total.
///
/// Serialized both as the square `counts` and as the melted `cells` list, one
/// entry per ordered pair in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct OverlapMatrix {
    pub contexts: [Context; 5],
    pub counts: [[u64; 5]; 5],
    pub cells: Vec<OverlapCell>,
}

impl OverlapMatrix {
    /// Count rows present in both contexts. Entra extras are only added when Entra
    /// is one of the pair, likewise Sophos.
    pub fn compute(records: &[DeviceRecord]) -> Self {
        let mut counts = [[0u64; 5]; 5];
        for a in Context::ALL {
            for b in Context::ALL {
                let both: Vec<&DeviceRecord> = records
                    .iter()
                    .filter(|r| r.is_in(a) && r.is_in(b))
                    .collect();
                let involves = |c: Context| a == c || b == c;
                let entra: Vec<f64> = if involves(Context::Entra) {
                    both.iter().map(|r| r.entra_instances).collect()
                } else {
                    Vec::new()
                };
                let sophos: Vec<f64> = if involves(Context::Sophos) {
                    both.iter().map(|r| r.sophos_instances).collect()
                } else {
                    Vec::new()
                };
                counts[a.index()][b.index()] =
                    adjust_count_for_duplicates(both.len(), &entra, &sophos);
            }
        }
        Self {
            contexts: Context::ALL,
            counts,
            cells: melt(&counts),
        }
    }

    pub fn get(&self, a: Context, b: Context) -> u64 {
        self.counts[a.index()][b.index()]
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    fn cell_width(&self) -> usize {
        let widest_count = format_count(self.max()).len();
        let widest_label = Context::ALL
            .iter()
            .map(|c| c.label().len())
            .max()
            .unwrap_or(0);
        widest_count.max(widest_label)
    }
}

fn melt(counts: &[[u64; 5]; 5]) -> Vec<OverlapCell> {
    Context::ALL
        .into_iter()
        .flat_map(|a| {
            Context::ALL.into_iter().map(move |b| OverlapCell {
                context1: a,
                context2: b,
                device_count: counts[a.index()][b.index()],
            })
        })
        .collect()
}

impl OutputFormatter for OverlapMatrix {
    fn format_text(&self) -> String {
        let width = self.cell_width();
        let mut lines = Vec::new();
        let mut header = format!("{:<width$}", "");
        for context in self.contexts {
            header.push_str(&format!("  {:>width$}", context.label()));
        }
        lines.push(header.trim_end().to_string());
        for a in self.contexts {
            let mut line = format!("{:<width$}", a.label());
            for b in self.contexts {
                line.push_str(&format!("  {:>width$}", format_count(self.get(a, b))));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn format_pretty(&self, colors: bool) -> String {
        if !colors {
            return format!("{}\n{}", heading("Context Overlap", false), self.format_text());
        }
        let width = self.cell_width();
        let max = self.max().max(1) as f64;
        let mut lines = vec![heading("Context Overlap", true)];
        let mut header = format!("{:<width$}", "");
        for context in self.contexts {
            header.push_str(&format!("  {:>width$}", context.label()));
        }
        lines.push(header);
        for a in self.contexts {
            let mut line = format!("{:<width$}", a.label());
            for b in self.contexts {
                let value = self.get(a, b);
                let cell = format!("{:>width$}", format_count(value));
                line.push_str("  ");
                line.push_str(&heat_cell(&cell, value as f64 / max));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Adjusted device count for one context cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct DistributionBucket {
    /// How many of the five contexts the devices are present in.
    pub contexts_present: u8,
    /// Rows in the bucket before duplicate adjustment.
    pub rows: usize,
    pub device_count: u64,
}

/// Devices grouped by how many contexts they appear in. Only cardinalities that
/// occur are listed, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ContextDistribution {
    pub buckets: Vec<DistributionBucket>,
}

impl ContextDistribution {
    pub fn compute(records: &[DeviceRecord]) -> Self {
        let buckets = (0..=Context::ALL.len() as u8)
            .filter_map(|n| {
                let members: Vec<&DeviceRecord> =
                    records.iter().filter(|r| r.context_count() == n).collect();
                if members.is_empty() {
                    return None;
                }
                Some(DistributionBucket {
                    contexts_present: n,
                    rows: members.len(),
                    device_count: adjusted_count(members),
                })
            })
            .collect();
        Self { buckets }
    }

    pub fn get(&self, contexts_present: u8) -> Option<u64> {
        self.buckets
            .iter()
            .find(|b| b.contexts_present == contexts_present)
            .map(|b| b.device_count)
    }
}

impl OutputFormatter for ContextDistribution {
    fn format_text(&self) -> String {
        if self.buckets.is_empty() {
            return "No devices".to_string();
        }
        self.buckets
            .iter()
            .map(|b| {
                format!(
                    "{} {}: {}",
                    b.contexts_present,
                    if b.contexts_present == 1 { "context" } else { "contexts" },
                    format_count(b.device_count)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_pretty(&self, colors: bool) -> String {
        let mut lines = vec![heading("Device Context Distribution", colors)];
        let total: u64 = self.buckets.iter().map(|b| b.device_count).sum();
        for b in &self.buckets {
            let ratio = if total == 0 {
                0.0
            } else {
                b.device_count as f64 / total as f64
            };
            let bar = if colors {
                progress_bar_colored(ratio, 30)
            } else {
                progress_bar(ratio, 30)
            };
            lines.push(format!(
                "  {}  {}  {:>8}  {:>5.1}%",
                b.contexts_present,
                bar,
                format_count(b.device_count),
                ratio * 100.0
            ));
        }
        lines.join("\n")
    }
}
