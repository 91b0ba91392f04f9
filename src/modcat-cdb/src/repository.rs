//! Repository trait for catalog query operations.
//!
//! This trait defines the interface the crafting service works against; the
//! in-memory implementation holds one loaded catalog artifact.

use std::path::Path;
use std::sync::Arc;

use modcat::{ModCatalog, NormalizedMod};

use crate::cache::QueryCache;
use crate::types::QueryOptions;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] modcat::CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoStats {
    pub base_count: usize,
    pub mod_count: usize,
    pub cached_queries: usize,
    pub generated_at: String,
    pub version: String,
}

/// Trait for catalog query operations.
///
/// "No results" is an empty collection, never an error; methods only fail
/// for genuine IO/parse problems during refresh-from-disk.
pub trait CatalogRepository {
    /// Mods applicable to a base (by display name), filtered by the given
    /// options. Results are name-sorted and cached per (base, options).
    fn find_by_base(&mut self, base: &str, options: &QueryOptions) -> Arc<Vec<NormalizedMod>>;

    /// Look up one logical mod by its stable id.
    fn mod_by_id(&self, id: &str) -> Option<NormalizedMod>;

    /// All base display names in the catalog.
    fn bases(&self) -> Vec<String>;

    /// Replace the loaded catalog and invalidate all cached queries.
    fn refresh(&mut self, catalog: ModCatalog);

    /// Drop all cached query results without touching the catalog.
    fn clear_cache(&mut self);

    /// Catalog and cache statistics.
    fn stats(&self) -> RepoStats;
}

/// In-memory repository over one loaded catalog artifact.
#[derive(Debug)]
pub struct InMemoryCatalog {
    catalog: ModCatalog,
    cache: QueryCache,
}

impl InMemoryCatalog {
    pub fn new(catalog: ModCatalog) -> Self {
        Self {
            catalog,
            cache: QueryCache::new(),
        }
    }

    /// Load a catalog artifact from disk.
    pub fn load(path: &Path) -> RepoResult<Self> {
        Ok(Self::new(ModCatalog::load(path)?))
    }

    pub fn catalog(&self) -> &ModCatalog {
        &self.catalog
    }

    fn matches(modifier: &NormalizedMod, options: &QueryOptions) -> bool {
        if let Some(ceiling) = options.ilvl {
            if !modifier.reachable_at(ceiling) {
                return false;
            }
        }
        if !options.affix.matches(modifier.affix) {
            return false;
        }
        if !options.source.matches(modifier.source) {
            return false;
        }
        if let Some(query) = options.query.as_deref() {
            let needle = query.to_ascii_lowercase();
            if !needle.is_empty() {
                let in_name = modifier.name.to_ascii_lowercase().contains(&needle);
                let in_tags = modifier
                    .mtype_names
                    .iter()
                    .any(|t| t.to_ascii_lowercase().contains(&needle));
                if !in_name && !in_tags {
                    return false;
                }
            }
        }
        true
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn find_by_base(&mut self, base: &str, options: &QueryOptions) -> Arc<Vec<NormalizedMod>> {
        let key = options.cache_key(base);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let mut mods: Vec<NormalizedMod> = self
            .catalog
            .by_base
            .get(base)
            .map(|entry| {
                entry
                    .mods
                    .iter()
                    .filter(|m| Self::matches(m, options))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        mods.sort_by(|a, b| a.name.cmp(&b.name));

        self.cache.insert(key, mods)
    }

    fn mod_by_id(&self, id: &str) -> Option<NormalizedMod> {
        self.catalog
            .by_base
            .values()
            .flat_map(|entry| entry.mods.iter())
            .find(|m| m.id == id)
            .cloned()
    }

    fn bases(&self) -> Vec<String> {
        self.catalog.by_base.keys().cloned().collect()
    }

    fn refresh(&mut self, catalog: ModCatalog) {
        self.catalog = catalog;
        self.cache.clear();
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn stats(&self) -> RepoStats {
        RepoStats {
            base_count: self.catalog.by_base.len(),
            mod_count: self.catalog.meta.mod_count,
            cached_queries: self.cache.len(),
            generated_at: self.catalog.meta.generated_at.clone(),
            version: self.catalog.meta.version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AffixFilter, SourceFilter};
    use modcat::{build_catalog, RawSnapshot};
    use serde_json::json;

    fn sample_catalog() -> ModCatalog {
        let snapshot: RawSnapshot = serde_json::from_value(json!({
            "mods": [
                {
                    "id": 1, "name": "Flaring", "affix": "prefix", "mtypes": "4", "group": 2,
                    "tiers": {
                        "1": {"ilvl": 10, "weight": 500, "values": "[[5,9]]"},
                        "9": {"ilvl": 75, "weight": 100, "values": "[[10,20]]"}
                    }
                },
                {
                    "id": 2, "name": "of the Polar Bear", "affix": "suffix", "mtypes": "4", "group": 3,
                    "tiers": {"1": {"ilvl": 60, "weight": 500, "values": "[[6,11]]"}}
                },
                {
                    "id": 3, "name": "Seething", "affix": "prefix", "mtypes": "4", "group": 2,
                    "tiers": {"1": {"ilvl": 30, "weight": 200, "values": "[[2,3]]"}}
                }
            ],
            "bases": [{"id": 10, "name": "Maul", "group": 4}],
            "mtypes": [{"id": 4, "name": "Maces"}],
            "groups": [{"id": 2, "name": "Standard"}, {"id": 3, "name": "Essence"}]
        }))
        .unwrap();
        build_catalog(&snapshot).unwrap().0
    }

    #[test]
    fn test_find_by_base_name_sorted() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        let mods = repo.find_by_base("Maul", &QueryOptions::default());
        let names: Vec<&str> = mods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Flaring", "Seething", "of the Polar Bear"]);
    }

    #[test]
    fn test_unknown_base_yields_empty_not_error() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        assert!(repo.find_by_base("Nonexistent", &QueryOptions::default()).is_empty());
    }

    #[test]
    fn test_ilvl_filter_uses_lowest_tier() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        // Flaring has a tier at ilvl 10, so it qualifies at ceiling 20.
        let mods = repo.find_by_base(
            "Maul",
            &QueryOptions {
                ilvl: Some(20),
                ..Default::default()
            },
        );
        let names: Vec<&str> = mods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Flaring"]);
    }

    #[test]
    fn test_affix_and_source_filters() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        let suffixes = repo.find_by_base(
            "Maul",
            &QueryOptions {
                affix: AffixFilter::Suffix,
                ..Default::default()
            },
        );
        assert_eq!(suffixes.len(), 1);
        assert_eq!(suffixes[0].name, "of the Polar Bear");

        let essence = repo.find_by_base(
            "Maul",
            &QueryOptions {
                source: SourceFilter::Essence,
                ..Default::default()
            },
        );
        assert_eq!(essence.len(), 1);
        assert_eq!(essence[0].name, "of the Polar Bear");
    }

    #[test]
    fn test_text_query_matches_name_and_tags_case_insensitive() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        let by_name = repo.find_by_base(
            "Maul",
            &QueryOptions {
                query: Some("flar".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_name.len(), 1);

        // "maces" only appears as a tag name.
        let by_tag = repo.find_by_base(
            "Maul",
            &QueryOptions {
                query: Some("MACES".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_tag.len(), 3);
    }

    #[test]
    fn test_results_are_cached_and_refresh_invalidates() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        let first = repo.find_by_base("Maul", &QueryOptions::default());
        assert_eq!(repo.stats().cached_queries, 1);
        let second = repo.find_by_base("Maul", &QueryOptions::default());
        assert!(Arc::ptr_eq(&first, &second));

        repo.refresh(sample_catalog());
        assert_eq!(repo.stats().cached_queries, 0);
        let third = repo.find_by_base("Maul", &QueryOptions::default());
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_mod_by_id() {
        let mut repo = InMemoryCatalog::new(sample_catalog());
        let mods = repo.find_by_base("Maul", &QueryOptions::default());
        let id = mods[0].id.clone();
        assert_eq!(repo.mod_by_id(&id).unwrap().name, mods[0].name);
        assert!(repo.mod_by_id("not-a-real-id").is_none());
    }

    #[test]
    fn test_stats() {
        let repo = InMemoryCatalog::new(sample_catalog());
        let stats = repo.stats();
        assert_eq!(stats.base_count, 1);
        assert_eq!(stats.mod_count, 3);
        assert_eq!(stats.cached_queries, 0);
    }
}
