//! Crafting selection rules over the catalog repository.
//!
//! The repository answers "what applies here"; this layer answers "what may
//! the user still pick": affix slot caps, mutual-exclusion groups, display
//! grouping. Rule violations are structured results, never errors.

use std::collections::{BTreeMap, HashMap};

use modcat::NormalizedMod;
use serde::Serialize;

use crate::repository::CatalogRepository;
use crate::types::{
    Compatibility, DisplayCategory, QueryOptions, RejectReason, SelectedMod, SelectionReport,
    MAX_AFFIX_SLOTS,
};

/// Whether corrupted mods count toward the prefix/suffix caps.
///
/// The upstream data leaves corrupted mods under the ordinary caps even
/// though the game conventionally caps them independently. That is a policy
/// decision, so it is a switch here, defaulting to the observed behavior
/// (`corrupted_exempt = false`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapPolicy {
    pub corrupted_exempt: bool,
}

/// One applicable mod annotated with its selectability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    #[serde(flatten)]
    pub modifier: NormalizedMod,
    pub compat: Compatibility,
}

/// Business-rule layer over a [`CatalogRepository`].
#[derive(Debug)]
pub struct CraftingService<R: CatalogRepository> {
    repo: R,
    policy: CapPolicy,
}

impl<R: CatalogRepository> CraftingService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            policy: CapPolicy::default(),
        }
    }

    pub fn with_policy(repo: R, policy: CapPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn repository(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Applicable mods for a base, partitioned into display categories.
    /// Empty categories are omitted; mods within a category stay
    /// name-sorted. Each entry carries its compatibility against the
    /// current selection.
    pub fn mod_categories(
        &mut self,
        base: &str,
        selected: &[SelectedMod],
        options: &QueryOptions,
    ) -> BTreeMap<DisplayCategory, Vec<CategoryEntry>> {
        let mods = self.repo.find_by_base(base, options);
        let mut categories: BTreeMap<DisplayCategory, Vec<CategoryEntry>> = BTreeMap::new();
        for modifier in mods.iter() {
            let compat = self.check_compatibility(&candidate_of(modifier), selected);
            categories
                .entry(DisplayCategory::of(modifier.source, modifier.affix))
                .or_default()
                .push(CategoryEntry {
                    modifier: modifier.clone(),
                    compat,
                });
        }
        categories
    }

    /// Check one candidate against the current selection.
    ///
    /// Evaluation order is fixed, first match wins: `already_selected`,
    /// then `group_conflict`, then `type_limit`.
    pub fn check_compatibility(
        &self,
        candidate: &SelectedMod,
        selected: &[SelectedMod],
    ) -> Compatibility {
        if selected.iter().any(|s| s.id == candidate.id) {
            return Compatibility::rejected(RejectReason::AlreadySelected);
        }

        if let Some(group) = candidate.exclusion_group.as_deref() {
            let conflicts: Vec<String> = selected
                .iter()
                .filter(|s| s.exclusion_group.as_deref() == Some(group))
                .map(|s| s.id.clone())
                .collect();
            if !conflicts.is_empty() {
                return Compatibility {
                    can_select: false,
                    reason: Some(RejectReason::GroupConflict),
                    conflicts_with: conflicts,
                };
            }
        }

        if self.counts_toward_caps(candidate) {
            let used = selected
                .iter()
                .filter(|s| s.affix == candidate.affix && self.counts_toward_caps(s))
                .count();
            if used >= MAX_AFFIX_SLOTS {
                return Compatibility::rejected(RejectReason::TypeLimit);
            }
        }

        Compatibility::ok()
    }

    /// Batch-validate a whole selection set.
    pub fn validate_selection(&self, selected: &[SelectedMod]) -> SelectionReport {
        let mut errors = Vec::new();

        for affix in [modcat::AffixKind::Prefix, modcat::AffixKind::Suffix] {
            let count = selected
                .iter()
                .filter(|s| s.affix == affix && self.counts_toward_caps(s))
                .count();
            if count > MAX_AFFIX_SLOTS {
                errors.push(format!(
                    "Too many {}es selected: {} (maximum {})",
                    affix, count, MAX_AFFIX_SLOTS
                ));
            }
        }

        let mut by_group: HashMap<&str, Vec<&str>> = HashMap::new();
        for s in selected {
            if let Some(group) = s.exclusion_group.as_deref() {
                by_group.entry(group).or_default().push(s.id.as_str());
            }
        }
        let mut conflicting: Vec<(&str, usize)> = by_group
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(group, ids)| (group, ids.len()))
            .collect();
        conflicting.sort_unstable();
        for (group, count) in conflicting {
            errors.push(format!(
                "Mutual-exclusion group '{}' is claimed by {} selected mods",
                group, count
            ));
        }

        SelectionReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Applicable mods that the current selection still allows.
    pub fn compatible_mods(
        &mut self,
        base: &str,
        selected: &[SelectedMod],
        options: &QueryOptions,
    ) -> Vec<NormalizedMod> {
        let mods = self.repo.find_by_base(base, options);
        mods.iter()
            .filter(|m| {
                self.check_compatibility(&candidate_of(m), selected)
                    .can_select
            })
            .cloned()
            .collect()
    }

    /// First-N compatible suggestions. Naive ordering (name order), but
    /// never returns an incompatible mod.
    pub fn suggested_mods(
        &mut self,
        base: &str,
        selected: &[SelectedMod],
        options: &QueryOptions,
        limit: usize,
    ) -> Vec<NormalizedMod> {
        let mut mods = self.compatible_mods(base, selected, options);
        mods.truncate(limit);
        mods
    }

    fn counts_toward_caps(&self, selected: &SelectedMod) -> bool {
        !(self.policy.corrupted_exempt && selected.source == modcat::ModSource::Corrupted)
    }
}

/// Candidate view of a catalog mod for compatibility checks, defaulting to
/// its best tier.
pub fn candidate_of(modifier: &NormalizedMod) -> SelectedMod {
    SelectedMod {
        id: modifier.id.clone(),
        name: Some(modifier.name.clone()),
        tier_rank: modifier.tiers.first().map_or(1, |t| t.rank),
        affix: modifier.affix,
        source: modifier.source,
        exclusion_group: modifier.exclusion_group.clone(),
    }
}
