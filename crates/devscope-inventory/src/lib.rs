//! Device inventory model for devscope.
//!
//! An export is read into an [`Inventory`] (raw cells by column name), resolved
//! into [`DeviceRecord`]s under a [`PresencePolicy`], and then aggregated:
//! duplicate-aware totals, the pairwise [`OverlapMatrix`], and the
//! [`ContextDistribution`] of how many systems each device appears in.

mod aggregate;
mod context;
mod counting;
mod fields;
mod filter;
mod memory;
mod presence;
mod record;
mod table;

pub use aggregate::{
    ContextDistribution, DashboardMetrics, DistributionBucket, OverlapCell, OverlapMatrix,
    adjusted_count, count_all_contexts, count_multi_instance, count_total_devices,
};
pub use context::Context;
pub use counting::{adjust_count_for_duplicates, duplicate_extras};
pub use fields::{
    CORE_FIELDS, DeviceOverview, FieldMap, Property, TableListing, data_table_fields,
    device_names, existing_columns, overview_fields, resolve_label,
};
pub use filter::{ContextSelection, DeviceFilter, DuplicateFilter, FilterOptions, distinct_values};
pub use memory::{format_ram_gigabytes, megabytes_to_gigabytes, parse_megabytes};
pub use presence::{
    PresenceError, PresenceMarker, PresencePolicy, normalize_presence, normalize_presence_column,
    recognize,
};
pub use record::{
    DEVICE_TYPE, DeviceRecord, ENTRA_INSTANCE_COUNT, MULTI_INSTANCE_FLAG, NAME, OS, RAM_TOTAL,
    SOPHOS_INSTANCE_COUNT, coerce_instance_count, device_records, multi_instance_flag,
};
pub use table::{Inventory, InventoryError};
