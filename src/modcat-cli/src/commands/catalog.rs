//! Catalog query command handlers (stats, search, applicable).

use anyhow::{Context, Result};
use std::path::Path;

use modcat_cdb::{CatalogRepository, InMemoryCatalog, QueryOptions};
use modcat_worker::{FileSource, WorkerClient};

/// Handle the Stats command.
pub fn stats(catalog_path: &Path) -> Result<()> {
    let repo = InMemoryCatalog::load(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
    let stats = repo.stats();

    println!("Catalog: {}", catalog_path.display());
    println!("  Generated: {}", stats.generated_at);
    println!("  Pipeline version: {}", stats.version);
    println!("  Bases: {}", stats.base_count);
    println!("  Mods: {}", stats.mod_count);
    Ok(())
}

/// Handle the Search command: name search through the query worker.
pub fn search(catalog_path: &Path, query: &str, limit: usize) -> Result<()> {
    let client = WorkerClient::spawn(FileSource::new(catalog_path));
    client
        .load()
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
    let reply = client.search(query)?;

    if reply.hits.is_empty() {
        println!("No mods matching '{}'", query);
        return Ok(());
    }

    for modifier in reply.hits.iter().take(limit) {
        let best = modifier
            .tiers
            .first()
            .map(|t| format!("T{} (ilvl {}, score {:.1})", t.rank, t.ilvl, t.score))
            .unwrap_or_else(|| "no tiers".to_string());
        println!(
            "{:<40} {:<7} {:<11} {}",
            modifier.name, modifier.affix, modifier.source, best
        );
    }
    if reply.hits.len() > limit {
        println!("... and {} more", reply.hits.len() - limit);
    }
    if reply.truncated {
        println!("(result capped by the worker)");
    }
    client.shutdown();
    Ok(())
}

/// Handle the Applicable command: per-base query through the repository.
#[allow(clippy::too_many_arguments)] // One CLI flag per semantic filter
pub fn applicable(
    catalog_path: &Path,
    base: &str,
    ilvl: Option<u32>,
    affix: &str,
    source: &str,
    query: Option<String>,
) -> Result<()> {
    let options = QueryOptions {
        ilvl,
        affix: affix.parse()?,
        source: source.parse()?,
        query,
    };

    let mut repo = InMemoryCatalog::load(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
    let mods = repo.find_by_base(base, &options);

    if mods.is_empty() {
        println!("No applicable mods for '{}'", base);
        return Ok(());
    }

    println!("{} applicable mods for '{}':", mods.len(), base);
    for modifier in mods.iter() {
        let tiers = modifier.tiers.len();
        let group = modifier
            .exclusion_group
            .as_deref()
            .map(|g| format!(" [group: {}]", g))
            .unwrap_or_default();
        println!(
            "  {:<40} {:<7} {:<11} {} tiers{}",
            modifier.name, modifier.affix, modifier.source, tiers, group
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;

    fn write_catalog(dir: &Path) -> PathBuf {
        let snapshot: modcat::RawSnapshot = serde_json::from_value(json!({
            "mods": [{
                "id": 1, "name": "Flaring", "affix": "prefix", "mtypes": "4",
                "tiers": {"1": {"ilvl": 10, "weight": 100, "values": "[[10,20]]"}}
            }],
            "bases": [{"id": 10, "name": "Maul", "group": 4}],
            "mtypes": [{"id": 4, "name": "Maces"}],
            "groups": []
        }))
        .unwrap();
        let (catalog, _) = modcat::build_catalog(&snapshot).unwrap();
        let path = dir.join("catalog.json");
        catalog.save(&path, false).unwrap();
        path
    }

    #[test]
    fn test_stats_and_queries_on_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path());

        stats(&path).unwrap();
        search(&path, "flar", 10).unwrap();
        applicable(&path, "Maul", Some(20), "prefix", "all", None).unwrap();
        // Unknown base prints "none", not an error.
        applicable(&path, "Nonexistent", None, "all", "all", None).unwrap();
    }

    #[test]
    fn test_missing_catalog_is_error() {
        assert!(stats(Path::new("/nonexistent/catalog.json")).is_err());
        assert!(search(Path::new("/nonexistent/catalog.json"), "x", 5).is_err());
    }

    #[test]
    fn test_bad_filter_string_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path());
        assert!(applicable(&path, "Maul", None, "implicit", "all", None).is_err());
    }
}
