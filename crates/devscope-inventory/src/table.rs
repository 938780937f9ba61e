//! Raw tabular view of a device export.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("failed to read export: {0}")]
    Csv(#[from] csv::Error),
    #[error("export is missing required column `{0}`")]
    MissingColumn(String),
    #[error("row {row}: column `{column}`: {source}")]
    Presence {
        row: usize,
        column: &'static str,
        source: crate::PresenceError,
    },
    #[error("no device named `{0}`")]
    DeviceNotFound(String),
    #[error("unknown field `{0}`")]
    UnknownField(String),
}

/// Column-named table of raw cells. Empty cells are `None`.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl Inventory {
    /// Build from headers and rows. Short rows are padded with empty cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self {
            columns,
            index,
            rows,
        }
    }

    /// Read a CSV export with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InventoryError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let columns: Vec<String> = csv.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            );
        }
        Ok(Self::new(columns, rows))
    }

    /// Read a CSV export from disk.
    pub fn from_path(path: &Path) -> Result<Self, InventoryError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        let inventory = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            rows = inventory.len(),
            columns = inventory.columns.len(),
            "loaded export"
        );
        Ok(inventory)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Column index, or `MissingColumn` naming it.
    pub fn require_column(&self, name: &str) -> Result<usize, InventoryError> {
        self.column_index(name)
            .ok_or_else(|| InventoryError::MissingColumn(name.to_string()))
    }

    /// Cell at `row` in column `column`; `None` if empty, out of range, or unknown column.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.cell(row, col)
    }

    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_maps_empty_cells_to_none() {
        let data = "Name,InEntra,OS\nPC-1,True,\nPC-2,,Windows\n";
        let inv = Inventory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.columns(), &["Name", "InEntra", "OS"]);
        assert_eq!(inv.value(0, "InEntra"), Some("True"));
        assert_eq!(inv.value(0, "OS"), None);
        assert_eq!(inv.value(1, "InEntra"), None);
        assert_eq!(inv.value(1, "OS"), Some("Windows"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let data = "Name,InEntra,OS\nPC-1\n";
        let inv = Inventory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(inv.value(0, "Name"), Some("PC-1"));
        assert_eq!(inv.value(0, "OS"), None);
    }

    #[test]
    fn test_column_lookup_is_case_sensitive() {
        let data = "actual1,actual2\n1,2\n";
        let inv = Inventory::from_reader(data.as_bytes()).unwrap();
        assert!(inv.has_column("actual1"));
        assert!(!inv.has_column("Actual1"));
        assert!(matches!(
            inv.require_column("Actual1"),
            Err(InventoryError::MissingColumn(name)) if name == "Actual1"
        ));
    }

    #[test]
    fn test_headers_only() {
        let inv = Inventory::from_reader("Name,OS\n".as_bytes()).unwrap();
        assert!(inv.is_empty());
        assert!(inv.has_column("OS"));
    }
}
