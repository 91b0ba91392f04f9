//! Canonical catalog types and the serialized artifact.
//!
//! The catalog is built once per data refresh and treated as immutable at
//! runtime. Two views over the same normalized modifier set: `byMod` keyed
//! by display name, `byBase` keyed by base display name. Emission is a pure
//! function of the decoded input apart from the `generatedAt` metadata
//! field.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::raw::DecodedSnapshot;

/// Default catalog artifact location
pub const DEFAULT_CATALOG_PATH: &str = "share/catalog.json";

/// Affix kind: an item has independent slot caps for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixKind {
    Prefix,
    Suffix,
}

impl std::fmt::Display for AffixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Suffix => write!(f, "suffix"),
        }
    }
}

impl std::str::FromStr for AffixKind {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prefix" => Ok(Self::Prefix),
            "suffix" => Ok(Self::Suffix),
            _ => Err(ParseError::InvalidAffix(s.to_string())),
        }
    }
}

/// Where a mod can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModSource {
    /// Ordinary crafting.
    Base,
    Essence,
    Desecrated,
    Corrupted,
}

impl ModSource {
    /// Classify a source-category display name from the group lookup.
    /// Unrecognized names fall back to ordinary crafting.
    pub fn classify(group_name: Option<&str>, corrupted: bool) -> Self {
        if corrupted {
            return Self::Corrupted;
        }
        let Some(name) = group_name else {
            return Self::Base;
        };
        let name = name.to_ascii_lowercase();
        if name.contains("essence") {
            Self::Essence
        } else if name.contains("desecrat") {
            Self::Desecrated
        } else if name.contains("corrupt") {
            Self::Corrupted
        } else {
            Self::Base
        }
    }
}

impl std::fmt::Display for ModSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Essence => write!(f, "essence"),
            Self::Desecrated => write!(f, "desecrated"),
            Self::Corrupted => write!(f, "corrupted"),
        }
    }
}

impl std::str::FromStr for ModSource {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "essence" => Ok(Self::Essence),
            "desecrated" => Ok(Self::Desecrated),
            "corrupted" => Ok(Self::Corrupted),
            _ => Err(ParseError::InvalidSource(s.to_string())),
        }
    }
}

/// Parse errors for string conversions
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid affix kind: {0}")]
    InvalidAffix(String),
    #[error("Invalid mod source: {0}")]
    InvalidSource(String),
}

/// One canonical tier of a normalized mod.
///
/// `rank` is the power-consistent identifier (1 = strongest, contiguous);
/// `tier` is the raw scrape tier number, kept for traceability and display
/// only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTier {
    pub rank: u32,
    pub tier: u32,
    pub ilvl: u32,
    pub score: f64,
}

/// A logical modifier after merging and tier canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMod {
    /// Stable id derived from (name, affix, source).
    pub id: String,
    pub name: String,
    pub affix: AffixKind,
    pub source: ModSource,
    /// Base-groups this mod applies to.
    pub group_ids: Vec<u32>,
    pub mtype_ids: Vec<u32>,
    pub mtype_names: Vec<String>,
    /// Mutual-exclusion group shared by mods that cannot coexist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_group: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub corrupted: bool,
    /// Canonical tiers, rank ascending (rank 1 first).
    pub tiers: Vec<CanonicalTier>,
    /// Raw modifier ids merged into this record.
    pub variant_ids: Vec<u32>,
}

impl NormalizedMod {
    /// True if at least one tier can appear at or below the given item
    /// level ceiling.
    pub fn reachable_at(&self, ilvl: u32) -> bool {
        self.tiers.iter().any(|t| t.ilvl <= ilvl)
    }
}

/// Per-base occurrence of a logical modifier in the `byMod` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub base: String,
    pub id: String,
    pub source: ModSource,
    pub group_id: u32,
    pub tier_numbers: Vec<u32>,
    pub ranks: Vec<u32>,
}

/// `byMod` view entry: one display name, its canonical tier ladder, and
/// every base it occurs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByModEntry {
    pub name: String,
    pub canonical: Vec<CanonicalTier>,
    pub occurrences: Vec<Occurrence>,
}

/// `byBase` view entry: one concrete base and the mods applicable to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByBaseEntry {
    pub base_id: u32,
    pub base_name: String,
    pub group_id: u32,
    pub mods: Vec<NormalizedMod>,
}

/// Build metadata. `generated_at` is the only field that varies between
/// pipeline runs on identical input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta {
    pub generated_at: String,
    pub version: String,
    pub base_count: usize,
    pub mod_count: usize,
}

/// The catalog artifact: two views over one normalized mod set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModCatalog {
    pub meta: CatalogMeta,
    pub by_mod: BTreeMap<String, ByModEntry>,
    pub by_base: BTreeMap<String, ByBaseEntry>,
}

/// Error type for catalog artifact IO
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModCatalog {
    /// An empty catalog. Callers degrade to "no mods available" on load
    /// failure instead of blocking everything else.
    pub fn empty() -> Self {
        Self {
            meta: CatalogMeta {
                generated_at: String::new(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                base_count: 0,
                mod_count: 0,
            },
            by_mod: BTreeMap::new(),
            by_base: BTreeMap::new(),
        }
    }

    /// Assemble the catalog from normalized mods and the decoded snapshot.
    pub fn assemble(mods: &[NormalizedMod], snapshot: &DecodedSnapshot) -> Self {
        let by_base = build_by_base(mods, snapshot);
        let by_mod = build_by_mod(mods, snapshot);
        let meta = CatalogMeta {
            generated_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            base_count: by_base.len(),
            mod_count: mods.len(),
        };
        Self {
            meta,
            by_mod,
            by_base,
        }
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a catalog artifact from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Write the artifact to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        fs::write(path, json)?;
        Ok(())
    }
}

/// Derive the stable logical mod id from its merge identity.
///
/// sha256 over `name|affix|source`, hex-truncated to 16 chars. Raw scrape
/// ids are versioning artifacts; this id survives re-scrapes.
pub fn mod_id(name: &str, affix: AffixKind, source: ModSource) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    hasher.update(affix.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(source.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

fn build_by_base(
    mods: &[NormalizedMod],
    snapshot: &DecodedSnapshot,
) -> BTreeMap<String, ByBaseEntry> {
    let mut by_base = BTreeMap::new();
    for base in &snapshot.bases {
        let applicable: Vec<NormalizedMod> = mods
            .iter()
            .filter(|m| m.group_ids.contains(&base.group_id))
            .cloned()
            .collect();
        by_base.insert(
            base.name.clone(),
            ByBaseEntry {
                base_id: base.id,
                base_name: base.name.clone(),
                group_id: base.group_id,
                mods: applicable,
            },
        );
    }
    by_base
}

fn build_by_mod(
    mods: &[NormalizedMod],
    snapshot: &DecodedSnapshot,
) -> BTreeMap<String, ByModEntry> {
    let mut by_mod: BTreeMap<String, ByModEntry> = BTreeMap::new();
    for modifier in mods {
        let entry = by_mod
            .entry(modifier.name.clone())
            .or_insert_with(|| ByModEntry {
                name: modifier.name.clone(),
                canonical: Vec::new(),
                occurrences: Vec::new(),
            });

        for base in &snapshot.bases {
            if !modifier.group_ids.contains(&base.group_id) {
                continue;
            }
            entry.occurrences.push(Occurrence {
                base: base.name.clone(),
                id: modifier.id.clone(),
                source: modifier.source,
                group_id: base.group_id,
                tier_numbers: modifier.tiers.iter().map(|t| t.tier).collect(),
                ranks: modifier.tiers.iter().map(|t| t.rank).collect(),
            });
        }
    }

    // The canonical ladder for a name merges the tier ladders of every
    // variant sharing that name (prefix/suffix or source variants).
    for entry in by_mod.values_mut() {
        let ladders: Vec<&[CanonicalTier]> = mods
            .iter()
            .filter(|m| m.name == entry.name)
            .map(|m| m.tiers.as_slice())
            .collect();
        entry.canonical = crate::tiers::merge_canonical(&ladders);
    }
    by_mod
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affix_kind_parse() {
        assert_eq!("prefix".parse::<AffixKind>().unwrap(), AffixKind::Prefix);
        assert_eq!("Suffix".parse::<AffixKind>().unwrap(), AffixKind::Suffix);
        assert!("implicit".parse::<AffixKind>().is_err());
    }

    #[test]
    fn test_affix_kind_display() {
        assert_eq!(AffixKind::Prefix.to_string(), "prefix");
        assert_eq!(AffixKind::Suffix.to_string(), "suffix");
    }

    #[test]
    fn test_mod_source_parse() {
        assert_eq!("base".parse::<ModSource>().unwrap(), ModSource::Base);
        assert_eq!("essence".parse::<ModSource>().unwrap(), ModSource::Essence);
        assert_eq!("desecrated".parse::<ModSource>().unwrap(), ModSource::Desecrated);
        assert_eq!("corrupted".parse::<ModSource>().unwrap(), ModSource::Corrupted);
        assert!("implicit".parse::<ModSource>().is_err());
    }

    #[test]
    fn test_mod_source_classify() {
        assert_eq!(ModSource::classify(Some("Essence Crafting"), false), ModSource::Essence);
        assert_eq!(ModSource::classify(Some("Desecrated Mods"), false), ModSource::Desecrated);
        assert_eq!(ModSource::classify(Some("Vaal Corruption"), false), ModSource::Corrupted);
        assert_eq!(ModSource::classify(Some("Standard"), false), ModSource::Base);
        assert_eq!(ModSource::classify(None, false), ModSource::Base);
        // The record-level corrupted flag wins over the group name.
        assert_eq!(ModSource::classify(Some("Standard"), true), ModSource::Corrupted);
    }

    #[test]
    fn test_mod_id_deterministic() {
        let a = mod_id("Flaring", AffixKind::Prefix, ModSource::Base);
        let b = mod_id("Flaring", AffixKind::Prefix, ModSource::Base);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_mod_id_distinguishes_identity_fields() {
        let base = mod_id("Flaring", AffixKind::Prefix, ModSource::Base);
        assert_ne!(base, mod_id("Flaring", AffixKind::Suffix, ModSource::Base));
        assert_ne!(base, mod_id("Flaring", AffixKind::Prefix, ModSource::Essence));
        assert_ne!(base, mod_id("Glinting", AffixKind::Prefix, ModSource::Base));
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let catalog = ModCatalog {
            meta: CatalogMeta {
                generated_at: "2026-01-01T00:00:00Z".to_string(),
                version: "0.0.0".to_string(),
                base_count: 0,
                mod_count: 0,
            },
            by_mod: BTreeMap::new(),
            by_base: BTreeMap::new(),
        };
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"byMod\""));
        assert!(json.contains("\"byBase\""));
        assert!(json.contains("\"generatedAt\""));
        let back = ModCatalog::from_json(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
