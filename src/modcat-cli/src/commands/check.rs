//! Selection validation command handler.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use modcat::ModCatalog;
use modcat_cdb::{CapPolicy, CraftingService, InMemoryCatalog, SelectedMod};

/// Handle the Check command.
///
/// Validation output is data: an invalid selection prints its reasons and
/// still exits 0. Only an unreadable selection file is an error.
pub fn handle(selection_path: &Path, corrupted_exempt: bool) -> Result<()> {
    let data = fs::read_to_string(selection_path)
        .with_context(|| format!("Failed to read {}", selection_path.display()))?;
    let selected: Vec<SelectedMod> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse selection {}", selection_path.display()))?;

    let service = CraftingService::with_policy(
        InMemoryCatalog::new(ModCatalog::empty()),
        CapPolicy { corrupted_exempt },
    );
    let report = service.validate_selection(&selected);

    if report.is_valid {
        println!("Selection OK: {} mods", selected.len());
    } else {
        println!("Selection INVALID:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_selection_file_is_error() {
        assert!(handle(Path::new("/nonexistent/selection.json"), false).is_err());
    }

    #[test]
    fn test_invalid_selection_still_exits_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        let four_prefixes: Vec<_> = (0..4)
            .map(|i| {
                json!({
                    "id": format!("m{}", i),
                    "tierRank": 1,
                    "affix": "prefix",
                    "source": "base"
                })
            })
            .collect();
        fs::write(&path, serde_json::to_string(&four_prefixes).unwrap()).unwrap();

        // Over the prefix cap, but the command itself succeeds.
        handle(&path, false).unwrap();
    }

    #[test]
    fn test_valid_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        let selection = json!([
            {"id": "a", "tierRank": 1, "affix": "prefix", "source": "base"},
            {"id": "b", "tierRank": 2, "affix": "suffix", "source": "essence"}
        ]);
        fs::write(&path, selection.to_string()).unwrap();
        handle(&path, true).unwrap();
    }
}
