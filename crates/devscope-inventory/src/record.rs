//! Normalized per-row view used by aggregation and filtering.

use crate::presence::{PresencePolicy, normalize_presence, recognize};
use crate::{Context, Inventory, InventoryError};

pub const NAME: &str = "Name";
pub const DEVICE_TYPE: &str = "DeviceType";
pub const OS: &str = "OS";
pub const ENTRA_INSTANCE_COUNT: &str = "Entra_InstanceCount";
pub const SOPHOS_INSTANCE_COUNT: &str = "Sophos_InstanceCount";
pub const MULTI_INSTANCE_FLAG: &str = "MultiInstanceFlag";
pub const RAM_TOTAL: &str = "KACE_Machine_RAM_Total";

/// One export row with presence flags and instance counts resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    /// Row index in the source [`Inventory`].
    pub row: usize,
    /// Presence per context, indexed by [`Context::index`].
    pub presence: [bool; 5],
    pub entra_instances: f64,
    pub sophos_instances: f64,
    /// Set when the device has duplicate records somewhere in the export.
    pub multi_instance: bool,
}

impl DeviceRecord {
    pub fn is_in(&self, context: Context) -> bool {
        self.presence[context.index()]
    }

    pub fn in_all_contexts(&self) -> bool {
        self.presence.iter().all(|p| *p)
    }

    /// Number of contexts the device is present in (0–5).
    pub fn context_count(&self) -> u8 {
        self.presence.iter().filter(|p| **p).count() as u8
    }
}

/// Coerce an instance-count cell: non-numeric, missing, or non-finite becomes 0.
pub fn coerce_instance_count(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Interpret a `MultiInstanceFlag` cell: boolean literal, or numeric > 0.
pub fn multi_instance_flag(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return true;
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return false;
    }
    coerce_instance_count(Some(trimmed)) > 0.0
}

/// Resolve every row of `inventory` into a [`DeviceRecord`].
///
/// Fails fast when a presence or instance-count column is missing. The
/// multi-instance column is optional; without it no device is multi-instance.
pub fn device_records(
    inventory: &Inventory,
    policy: PresencePolicy,
) -> Result<Vec<DeviceRecord>, InventoryError> {
    let mut presence_cols = [0usize; 5];
    for context in Context::ALL {
        presence_cols[context.index()] = inventory.require_column(context.presence_column())?;
    }
    let entra_col = inventory.require_column(ENTRA_INSTANCE_COUNT)?;
    let sophos_col = inventory.require_column(SOPHOS_INSTANCE_COUNT)?;
    let multi_col = inventory.column_index(MULTI_INSTANCE_FLAG);

    let mut unrecognized = 0usize;
    let mut records = Vec::with_capacity(inventory.len());
    for row in 0..inventory.len() {
        let mut presence = [false; 5];
        for context in Context::ALL {
            let cell = inventory.cell(row, presence_cols[context.index()]);
            if recognize(&cell).is_none() {
                unrecognized += 1;
            }
            presence[context.index()] =
                normalize_presence(&cell, policy).map_err(|source| InventoryError::Presence {
                    row,
                    column: context.presence_column(),
                    source,
                })?;
        }

        records.push(DeviceRecord {
            row,
            presence,
            entra_instances: coerce_instance_count(inventory.cell(row, entra_col)),
            sophos_instances: coerce_instance_count(inventory.cell(row, sophos_col)),
            multi_instance: multi_col
                .map(|col| multi_instance_flag(inventory.cell(row, col)))
                .unwrap_or(false),
        });
    }

    if unrecognized > 0 {
        tracing::warn!(
            cells = unrecognized,
            ?policy,
            "presence cells outside true/false/1/0"
        );
    }

    Ok(records)
}
