//! Owned item quantities from a CSV file with `item_id,quantity` columns.

use std::path::Path;

use anyhow::{Context, Result};
use raidplan_core::{Catalog, OwnedQuantities};
use raidplan_model::ItemId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OwnedRow {
    item_id: ItemId,
    quantity: u64,
}

pub fn load_owned(path: &Path, catalog: &Catalog) -> Result<OwnedQuantities> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open owned items {}", path.display()))?;
    read_owned(reader, catalog).with_context(|| format!("read owned items {}", path.display()))
}

/// Repeated rows for the same item are summed. Items missing from the
/// catalog are skipped with a warning.
pub fn read_owned<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    catalog: &Catalog,
) -> Result<OwnedQuantities> {
    let mut owned = OwnedQuantities::new();
    for (index, row) in reader.deserialize::<OwnedRow>().enumerate() {
        let row = row.with_context(|| format!("row {}", index + 1))?;
        if catalog.item(&row.item_id).is_none() {
            tracing::warn!(item = %row.item_id, "ignoring owned quantity for unknown item");
            continue;
        }
        *owned.entry(row.item_id).or_default() += row.quantity;
    }
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json_str(
            r#"{"items": [{"id": "bolts", "name": "Bolts"}, {"id": "gpu", "name": "GPU"}]}"#,
        )
        .unwrap()
    }

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn sums_duplicates_and_skips_unknown_items() {
        let owned = read_owned(
            reader("item_id,quantity\nbolts,3\ngpu, 1\nbolts,2\nmoonshine,9\n"),
            &catalog(),
        )
        .unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[&ItemId::new("bolts").unwrap()], 5);
        assert_eq!(owned[&ItemId::new("gpu").unwrap()], 1);
    }

    #[test]
    fn negative_quantity_is_an_error() {
        let error = read_owned(reader("item_id,quantity\nbolts,-1\n"), &catalog()).unwrap_err();
        assert!(error.to_string().contains("row 1"));
    }
}
