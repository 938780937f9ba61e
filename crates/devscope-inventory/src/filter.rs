//! Data table filters: context, device type, OS, and duplicates.

use crate::record::{DEVICE_TYPE, OS};
use crate::{Context, DeviceRecord, Inventory};
use devscope_output::OutputFormatter;
use serde::Serialize;
use std::str::FromStr;

/// Which contexts a device must be present in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextSelection {
    /// No context filtering.
    #[default]
    All,
    /// Present in one context (optionally exclusively, see [`DeviceFilter::exclusive`]).
    Only(Context),
    /// Present in all five contexts.
    AllSystems,
}

impl FromStr for ContextSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ContextSelection::All),
            "all-systems" => Ok(ContextSelection::AllSystems),
            other => Context::from_name(other)
                .map(ContextSelection::Only)
                .ok_or_else(|| {
                    format!(
                        "unknown context `{}` (valid: all, all-systems, entra, intune, ad, sophos, kace)",
                        s
                    )
                }),
        }
    }
}

/// Filter on the multi-instance flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateFilter {
    #[default]
    All,
    /// Only multi-instance devices.
    Only,
    /// Only devices without duplicates.
    Exclude,
}

impl FromStr for DuplicateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DuplicateFilter::All),
            "only" => Ok(DuplicateFilter::Only),
            "none" | "exclude" => Ok(DuplicateFilter::Exclude),
            _ => Err(format!("unknown duplicate filter `{}` (valid: all, only, none)", s)),
        }
    }
}

/// Combined data table filter. Empty type/OS lists do not filter.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub context: ContextSelection,
    /// With [`ContextSelection::Only`], also require absence from every other context.
    pub exclusive: bool,
    pub device_types: Vec<String>,
    pub operating_systems: Vec<String>,
    pub duplicates: DuplicateFilter,
}

impl DeviceFilter {
    pub fn matches(&self, inventory: &Inventory, record: &DeviceRecord) -> bool {
        self.matches_context(record)
            && matches_any(&self.device_types, inventory.value(record.row, DEVICE_TYPE))
            && matches_any(&self.operating_systems, inventory.value(record.row, OS))
            && match self.duplicates {
                DuplicateFilter::All => true,
                DuplicateFilter::Only => record.multi_instance,
                DuplicateFilter::Exclude => !record.multi_instance,
            }
    }

    fn matches_context(&self, record: &DeviceRecord) -> bool {
        match self.context {
            ContextSelection::All => true,
            ContextSelection::AllSystems => record.in_all_contexts(),
            ContextSelection::Only(context) if self.exclusive => {
                record.is_in(context)
                    && Context::ALL
                        .into_iter()
                        .filter(|c| *c != context)
                        .all(|c| !record.is_in(c))
            }
            ContextSelection::Only(context) => record.is_in(context),
        }
    }

    /// Records passing the filter, in export order.
    pub fn apply<'a>(
        &self,
        inventory: &Inventory,
        records: &'a [DeviceRecord],
    ) -> Vec<&'a DeviceRecord> {
        records
            .iter()
            .filter(|r| self.matches(inventory, r))
            .collect()
    }
}

fn matches_any(allowed: &[String], value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.iter().any(|a| a == v))
}

/// Distinct values available to the type and OS filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct FilterOptions {
    pub device_types: Vec<String>,
    pub operating_systems: Vec<String>,
}

impl FilterOptions {
    pub fn collect(inventory: &Inventory) -> Self {
        Self {
            device_types: distinct_values(inventory, DEVICE_TYPE),
            operating_systems: distinct_values(inventory, OS),
        }
    }
}

/// Distinct non-empty values of a column in first-seen order.
pub fn distinct_values(inventory: &Inventory, column: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    (0..inventory.len())
        .filter_map(|row| inventory.value(row, column))
        .filter(|v| seen.insert(*v))
        .map(String::from)
        .collect()
}

impl OutputFormatter for FilterOptions {
    fn format_text(&self) -> String {
        let mut lines = vec!["Device types:".to_string()];
        lines.extend(self.device_types.iter().map(|t| format!("  {}", t)));
        lines.push("Operating systems:".to_string());
        lines.extend(self.operating_systems.iter().map(|o| format!("  {}", o)));
        lines.join("\n")
    }
}
