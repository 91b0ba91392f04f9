//! Shared types for catalog queries and crafting selections.

use modcat::{AffixKind, ModSource};
use serde::{Deserialize, Serialize};

/// Affix slot cap per kind (prefix/suffix) on one item.
pub const MAX_AFFIX_SLOTS: usize = 3;

/// Affix filter for queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixFilter {
    Prefix,
    Suffix,
    #[default]
    All,
}

impl AffixFilter {
    pub fn matches(&self, affix: AffixKind) -> bool {
        match self {
            Self::Prefix => affix == AffixKind::Prefix,
            Self::Suffix => affix == AffixKind::Suffix,
            Self::All => true,
        }
    }
}

impl std::fmt::Display for AffixFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Suffix => write!(f, "suffix"),
            Self::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for AffixFilter {
    type Err = FilterParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prefix" => Ok(Self::Prefix),
            "suffix" => Ok(Self::Suffix),
            "all" => Ok(Self::All),
            _ => Err(FilterParseError::InvalidAffixFilter(s.to_string())),
        }
    }
}

/// Source-category filter for queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    Base,
    Essence,
    Desecrated,
    Corrupted,
    #[default]
    All,
}

impl SourceFilter {
    pub fn matches(&self, source: ModSource) -> bool {
        match self {
            Self::Base => source == ModSource::Base,
            Self::Essence => source == ModSource::Essence,
            Self::Desecrated => source == ModSource::Desecrated,
            Self::Corrupted => source == ModSource::Corrupted,
            Self::All => true,
        }
    }
}

impl std::fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Essence => write!(f, "essence"),
            Self::Desecrated => write!(f, "desecrated"),
            Self::Corrupted => write!(f, "corrupted"),
            Self::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for SourceFilter {
    type Err = FilterParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "essence" => Ok(Self::Essence),
            "desecrated" => Ok(Self::Desecrated),
            "corrupted" => Ok(Self::Corrupted),
            "all" => Ok(Self::All),
            _ => Err(FilterParseError::InvalidSourceFilter(s.to_string())),
        }
    }
}

/// Parse errors for filter strings
#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterParseError {
    #[error("Invalid affix filter: {0}")]
    InvalidAffixFilter(String),
    #[error("Invalid source filter: {0}")]
    InvalidSourceFilter(String),
}

/// Options for repository queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Inclusive item-level ceiling; a mod qualifies if any canonical tier
    /// has `ilvl <=` this bound.
    pub ilvl: Option<u32>,
    #[serde(default)]
    pub affix: AffixFilter,
    #[serde(default)]
    pub source: SourceFilter,
    /// Case-insensitive substring match against name or tag names.
    pub query: Option<String>,
}

impl QueryOptions {
    /// Cache key for a (category, options) pair. Canonical field order so
    /// equal option sets always map to the same key.
    pub fn cache_key(&self, category: &str) -> String {
        format!(
            "{}|ilvl={}|affix={}|source={}|q={}",
            category,
            self.ilvl.map_or_else(|| "-".to_string(), |v| v.to_string()),
            self.affix,
            self.source,
            self.query.as_deref().unwrap_or("").to_ascii_lowercase(),
        )
    }
}

/// A user's in-progress crafting choice. Owned by the selection state,
/// never by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMod {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Chosen canonical tier rank.
    pub tier_rank: u32,
    pub affix: AffixKind,
    pub source: ModSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_group: Option<String>,
}

/// Why a candidate mod cannot be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    AlreadySelected,
    GroupConflict,
    TypeLimit,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySelected => write!(f, "already_selected"),
            Self::GroupConflict => write!(f, "group_conflict"),
            Self::TypeLimit => write!(f, "type_limit"),
        }
    }
}

/// Result of checking one candidate against the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub can_select: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Selected mod ids the candidate conflicts with (group conflicts).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
}

impl Compatibility {
    pub fn ok() -> Self {
        Self {
            can_select: true,
            reason: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            can_select: false,
            reason: Some(reason),
            conflicts_with: Vec::new(),
        }
    }
}

/// Result of validating a whole selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Display grouping for applicable mods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCategory {
    Prefix,
    Suffix,
    EssencePrefix,
    EssenceSuffix,
    DesecratedPrefix,
    DesecratedSuffix,
    Corrupted,
}

impl DisplayCategory {
    /// Category for a mod given its source and affix kind.
    pub fn of(source: ModSource, affix: AffixKind) -> Self {
        match (source, affix) {
            (ModSource::Corrupted, _) => Self::Corrupted,
            (ModSource::Essence, AffixKind::Prefix) => Self::EssencePrefix,
            (ModSource::Essence, AffixKind::Suffix) => Self::EssenceSuffix,
            (ModSource::Desecrated, AffixKind::Prefix) => Self::DesecratedPrefix,
            (ModSource::Desecrated, AffixKind::Suffix) => Self::DesecratedSuffix,
            (ModSource::Base, AffixKind::Prefix) => Self::Prefix,
            (ModSource::Base, AffixKind::Suffix) => Self::Suffix,
        }
    }
}

impl std::fmt::Display for DisplayCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Suffix => write!(f, "suffix"),
            Self::EssencePrefix => write!(f, "essence_prefix"),
            Self::EssenceSuffix => write!(f, "essence_suffix"),
            Self::DesecratedPrefix => write!(f, "desecrated_prefix"),
            Self::DesecratedSuffix => write!(f, "desecrated_suffix"),
            Self::Corrupted => write!(f, "corrupted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affix_filter_parse() {
        assert_eq!("prefix".parse::<AffixFilter>().unwrap(), AffixFilter::Prefix);
        assert_eq!("all".parse::<AffixFilter>().unwrap(), AffixFilter::All);
        assert!("implicit".parse::<AffixFilter>().is_err());
    }

    #[test]
    fn test_affix_filter_matches() {
        assert!(AffixFilter::All.matches(AffixKind::Prefix));
        assert!(AffixFilter::Prefix.matches(AffixKind::Prefix));
        assert!(!AffixFilter::Prefix.matches(AffixKind::Suffix));
    }

    #[test]
    fn test_source_filter_parse() {
        assert_eq!("essence".parse::<SourceFilter>().unwrap(), SourceFilter::Essence);
        assert_eq!("all".parse::<SourceFilter>().unwrap(), SourceFilter::All);
        assert!("bogus".parse::<SourceFilter>().is_err());
    }

    #[test]
    fn test_cache_key_canonical() {
        let a = QueryOptions {
            ilvl: Some(75),
            affix: AffixFilter::Prefix,
            source: SourceFilter::All,
            query: Some("Fire".to_string()),
        };
        let b = QueryOptions {
            query: Some("fire".to_string()),
            ..a.clone()
        };
        // Query matching is case-insensitive, so keys normalize case.
        assert_eq!(a.cache_key("Maul"), b.cache_key("Maul"));
        assert_ne!(a.cache_key("Maul"), a.cache_key("Wand"));
        assert_ne!(a.cache_key("Maul"), QueryOptions::default().cache_key("Maul"));
    }

    #[test]
    fn test_display_category_mapping() {
        use AffixKind::*;
        use ModSource::*;
        assert_eq!(DisplayCategory::of(Base, Prefix), DisplayCategory::Prefix);
        assert_eq!(DisplayCategory::of(Base, Suffix), DisplayCategory::Suffix);
        assert_eq!(DisplayCategory::of(Essence, Prefix), DisplayCategory::EssencePrefix);
        assert_eq!(DisplayCategory::of(Desecrated, Suffix), DisplayCategory::DesecratedSuffix);
        // Corrupted collapses both affix kinds into one display bucket.
        assert_eq!(DisplayCategory::of(Corrupted, Prefix), DisplayCategory::Corrupted);
        assert_eq!(DisplayCategory::of(Corrupted, Suffix), DisplayCategory::Corrupted);
    }

    #[test]
    fn test_reject_reason_codes() {
        assert_eq!(RejectReason::AlreadySelected.to_string(), "already_selected");
        assert_eq!(RejectReason::GroupConflict.to_string(), "group_conflict");
        assert_eq!(RejectReason::TypeLimit.to_string(), "type_limit");
    }

    #[test]
    fn test_selected_mod_json_shape() {
        let selected = SelectedMod {
            id: "abc123".to_string(),
            name: Some("Flaring".to_string()),
            tier_rank: 1,
            affix: AffixKind::Prefix,
            source: ModSource::Base,
            exclusion_group: None,
        };
        let json = serde_json::to_string(&selected).unwrap();
        assert!(json.contains("\"tierRank\":1"));
        let back: SelectedMod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selected);
    }
}
