//! Catalog build command handler
//!
//! Runs the offline pipeline: raw snapshot in, catalog artifact out.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use modcat::RawSnapshot;

/// Handle the Build command.
///
/// Individual malformed records are skipped by the pipeline; a missing or
/// unparseable snapshot file is fatal and exits non-zero.
pub fn handle(input: &Path, output: &Path, pretty: bool) -> Result<()> {
    let data = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let snapshot: RawSnapshot = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse snapshot {}", input.display()))?;

    let (catalog, stats) = modcat::build_catalog(&snapshot).context("Catalog build failed")?;
    catalog
        .save(output, pretty)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Built catalog: {} mods over {} bases",
        catalog.meta.mod_count, catalog.meta.base_count
    );
    println!(
        "  Decoded {}/{} modifier records, {}/{} base records",
        stats.decode.mods_total - stats.decode.mods_skipped,
        stats.decode.mods_total,
        stats.decode.bases_total - stats.decode.bases_skipped,
        stats.decode.bases_total,
    );
    if stats.decode.bad_embedded_fields > 0 {
        println!(
            "  {} embedded fields failed to parse and were dropped",
            stats.decode.bad_embedded_fields
        );
    }
    println!("\nWritten to: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_input_is_fatal() {
        let result = handle(
            Path::new("/nonexistent/snapshot.json"),
            Path::new("/tmp/catalog.json"),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_build_writes_loadable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("snapshot.json");
        let output = dir.path().join("out/catalog.json");

        let snapshot = json!({
            "mods": [{
                "id": 1, "name": "Flaring", "affix": "prefix", "mtypes": "4",
                "tiers": {"1": {"ilvl": 10, "weight": 100, "values": "[[10,20]]"}}
            }],
            "bases": [{"id": 10, "name": "Maul", "group": 4}],
            "mtypes": [{"id": 4, "name": "Maces"}],
            "groups": []
        });
        fs::write(&input, snapshot.to_string()).unwrap();

        handle(&input, &output, true).unwrap();

        let catalog = modcat::ModCatalog::load(&output).unwrap();
        assert_eq!(catalog.meta.mod_count, 1);
        assert!(catalog.by_base.contains_key("Maul"));
    }

    #[test]
    fn test_unusable_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("snapshot.json");
        fs::write(&input, "{}").unwrap();

        let result = handle(&input, &dir.path().join("catalog.json"), false);
        assert!(result.is_err());
    }
}
