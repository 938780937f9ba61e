//! Device table, filter options, and the single-device overview.

use super::Session;
use crate::cli::ListArgs;
use devscope_inventory::{
    DeviceFilter, DeviceOverview, FilterOptions, InventoryError, TableListing, device_names,
};
use devscope_output::OutputFormatter;
use serde::Serialize;

pub fn cmd_list(session: &mut Session, args: &ListArgs) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    let filter = DeviceFilter {
        context: args.context,
        exclusive: args.exclusive,
        device_types: args.device_types.clone(),
        operating_systems: args.operating_systems.clone(),
        duplicates: args.duplicates,
    };
    let selected = filter.apply(&loaded.inventory, &loaded.records);
    tracing::debug!(
        kept = selected.len(),
        total = loaded.records.len(),
        "filtered devices"
    );
    let listing = TableListing::build(&loaded.inventory, &selected, &args.fields)?;
    session.emit(&listing)?;
    Ok(0)
}

pub fn cmd_options(session: &mut Session) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    session.emit(&FilterOptions::collect(&loaded.inventory))?;
    Ok(0)
}

/// Distinct device names, for picking one to `show`.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct DeviceNames {
    pub names: Vec<String>,
}

impl OutputFormatter for DeviceNames {
    fn format_text(&self) -> String {
        self.names.join("\n")
    }
}

pub fn cmd_show(session: &mut Session, name: Option<&str>) -> anyhow::Result<i32> {
    let Some(loaded) = session.load()? else {
        return Ok(0);
    };
    let Some(name) = name else {
        session.emit(&DeviceNames {
            names: device_names(&loaded.inventory),
        })?;
        return Ok(0);
    };

    match DeviceOverview::build(&loaded.inventory, &loaded.records, name) {
        Ok(overview) => {
            session.emit(&overview)?;
            Ok(0)
        }
        Err(InventoryError::DeviceNotFound(name)) => {
            tracing::warn!(%name, "device not found");
            eprintln!("No device named `{}` in {}", name, loaded.info.file_name());
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
