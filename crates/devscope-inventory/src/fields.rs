//! Display-name field maps, the filtered data table, and the single-device overview.

use crate::memory::format_ram_gigabytes;
use crate::record::{NAME, RAM_TOTAL};
use crate::{Context, DeviceRecord, Inventory, InventoryError};
use devscope_output::{OutputFormatter, heading, render_table};
use serde::Serialize;

/// `(display label, export column)` pairs.
pub type FieldMap = &'static [(&'static str, &'static str)];

/// Fields shown in both the data table and the device overview.
pub const CORE_FIELDS: FieldMap = &[
    ("Device Name", "Name"),
    ("In Entra", "InEntra"),
    ("In Intune", "InIntune"),
    ("In AD", "InAD"),
    ("In Sophos", "InSophos"),
    ("In KACE", "InKACE"),
    ("Device Type", "DeviceType"),
    ("OS", "OS"),
    ("Sophos Health", "Sophos_Health"),
    ("Total Memory (GB)", "KACE_Machine_RAM_Total"),
    ("Duplicate Devices", "MultiInstanceFlag"),
    ("Last Seen", "LastSeen"),
    ("Primary User", "PrimaryUser"),
    ("AD Object GUID", "AD_ObjectGUID"),
    ("Entra Device ID(s)", "Entra_DeviceIds"),
    ("Intune Entra Device ID", "Intune_AzureADDeviceIds"),
];

const DATA_TABLE_SPECIFIC_FIELDS: FieldMap = &[
    ("IP Address", "Sophos_ipv4Addresses"),
    ("Entra Device Instance Count", "Entra_InstanceCount"),
    ("Entra Hybrid Joined", "Entra_HybridCount"),
    ("Entra Device ID Matches AD Object GUID", "Entra_HybridIdMatchesAD"),
    ("Entra Device ID Mismatches AD Object GUID", "Entra_HybridIdMismatchExists"),
    ("Entra Registered", "Entra_RegisteredCount"),
    ("Sophos Device Instance Count", "Sophos_InstanceCount"),
];

const OVERVIEW_SPECIFIC_FIELDS: FieldMap = &[
    ("AD DNS Hostname", "AD_DNSHostName"),
    ("Serial Number", "SerialNumber"),
    ("Device Management Lists", "Contexts"),
    ("Physical Device Location", "Location"),
    ("Operating System", "KACE_Os_name"),
    ("Entra OS Version", "Entra_OperatingSystemVersion"),
    ("IPv4 Address", "KACE_Machine_Ip"),
    ("Installed RAM Total", "KACE_Machine_RAM_Total"),
    ("AD Device Object Enabled", "AD_Enabled"),
    ("AD Last Logon Date", "AD_LastLogonDate"),
    ("Entra Join Type", "Entra_JoinType"),
    ("Has a duplicate in Entra", "Entra_DuplicateFlag"),
    ("Has a duplicate in Intune", "Intune_DuplicateFlag"),
    ("Has a duplicate in Sophos", "Sophos_DuplicateFlag"),
    ("Intune Device ID", "Intune_DeviceId"),
    ("Sophos ID(s)", "Sophos_Ids"),
    ("KACE ID", "KACE_ID"),
    ("Intune Endpoint Management Agent", "Intune_ManagementAgent"),
    ("Sophos Device Health Status", "Sophos_Health"),
    ("Intune Compliance State", "Intune_ComplianceState"),
    ("Entra Compliant", "Entra_IsCompliant"),
    ("Entra Managed", "Entra_IsManaged"),
];

/// Data table fields: core fields followed by table-specific ones.
pub fn data_table_fields() -> impl Iterator<Item = (&'static str, &'static str)> {
    CORE_FIELDS
        .iter()
        .chain(DATA_TABLE_SPECIFIC_FIELDS)
        .copied()
}

/// Device overview fields: core fields followed by overview-specific ones.
pub fn overview_fields() -> impl Iterator<Item = (&'static str, &'static str)> {
    CORE_FIELDS.iter().chain(OVERVIEW_SPECIFIC_FIELDS).copied()
}

/// Keep the entries whose export column exists, preserving mapping order.
/// Matching is case-sensitive.
pub fn existing_columns<'a, I>(mapping: I, inventory: &Inventory) -> Vec<(&'a str, &'a str)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    mapping
        .into_iter()
        .filter(|(_, actual)| inventory.has_column(actual))
        .collect()
}

/// Mapping entry for a display label, matched case-insensitively. Returns the
/// canonical `(display, actual)` pair.
pub fn resolve_label<'a, I>(mapping: I, label: &str) -> Option<(&'a str, &'a str)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    mapping
        .into_iter()
        .find(|(display, _)| display.eq_ignore_ascii_case(label.trim()))
}

/// Cell as displayed: presence columns normalized, RAM in GB, everything else raw.
fn display_value(inventory: &Inventory, record: &DeviceRecord, column: &str) -> Option<String> {
    if let Some(context) = Context::ALL
        .into_iter()
        .find(|c| c.presence_column() == column)
    {
        return Some(if record.is_in(context) { "True" } else { "False" }.to_string());
    }
    let raw = inventory.value(record.row, column)?;
    if column == RAM_TOTAL {
        return format_ram_gigabytes(raw);
    }
    Some(raw.to_string())
}

/// Filtered rows projected onto the data table fields present in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct TableListing {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableListing {
    /// Build the listing. `labels` restricts and orders the columns by display label.
    pub fn build(
        inventory: &Inventory,
        records: &[&DeviceRecord],
        labels: &[String],
    ) -> Result<Self, InventoryError> {
        let fields = if labels.is_empty() {
            existing_columns(data_table_fields(), inventory)
        } else {
            let selected = labels
                .iter()
                .map(|label| {
                    resolve_label(data_table_fields(), label)
                        .ok_or_else(|| InventoryError::UnknownField(label.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            existing_columns(selected, inventory)
        };

        let rows = records
            .iter()
            .map(|record| {
                fields
                    .iter()
                    .map(|(_, actual)| display_value(inventory, record, actual))
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: fields.iter().map(|(d, _)| d.to_string()).collect(),
            rows,
        })
    }
}

impl OutputFormatter for TableListing {
    fn format_text(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.clone().unwrap_or_default()).collect())
            .collect();
        format!(
            "{}\n{} devices",
            render_table(&self.columns, &rows),
            self.rows.len()
        )
    }

    fn format_pretty(&self, colors: bool) -> String {
        format!("{}\n{}", heading("Data table", colors), self.format_text())
    }
}

/// One property of the device overview sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct Property {
    pub property: String,
    pub value: Option<String>,
}

/// Property sheet for a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct DeviceOverview {
    pub name: String,
    pub properties: Vec<Property>,
}

impl DeviceOverview {
    /// Overview of the first row whose `Name` equals `name`.
    pub fn build(
        inventory: &Inventory,
        records: &[DeviceRecord],
        name: &str,
    ) -> Result<Self, InventoryError> {
        let record = records
            .iter()
            .find(|r| inventory.value(r.row, NAME) == Some(name))
            .ok_or_else(|| InventoryError::DeviceNotFound(name.to_string()))?;

        let properties = existing_columns(overview_fields(), inventory)
            .into_iter()
            .map(|(display, actual)| Property {
                property: display.to_string(),
                value: display_value(inventory, record, actual),
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            properties,
        })
    }
}

impl OutputFormatter for DeviceOverview {
    fn format_text(&self) -> String {
        let headers = vec!["Property".to_string(), "Value".to_string()];
        let rows: Vec<Vec<String>> = self
            .properties
            .iter()
            .map(|p| vec![p.property.clone(), p.value.clone().unwrap_or_default()])
            .collect();
        format!(
            "Device Overview: {}\n{}",
            self.name,
            render_table(&headers, &rows)
        )
    }

    fn format_pretty(&self, colors: bool) -> String {
        let title = format!("Device Overview: {}", self.name);
        let width = self
            .properties
            .iter()
            .map(|p| p.property.chars().count())
            .max()
            .unwrap_or(0);
        let mut lines = vec![heading(&title, colors)];
        for p in &self.properties {
            lines.push(format!(
                "  {:<width$}  {}",
                p.property,
                p.value.as_deref().unwrap_or("")
            ));
        }
        lines.join("\n")
    }
}

/// Distinct non-empty device names in export order.
pub fn device_names(inventory: &Inventory) -> Vec<String> {
    crate::filter::distinct_values(inventory, NAME)
}
