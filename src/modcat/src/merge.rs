//! Base-to-mod applicability mapping and duplicate-record merging.
//!
//! The scrape carries cosmetic/versioning duplicates: distinct raw modifier
//! ids that are the same logical mod. Records identical on
//! (name, affix, source) merge into one [`NormalizedMod`] keeping the union
//! of contributing raw ids and the union of their tier row pools, which is
//! canonicalized once as a whole.

use std::collections::BTreeMap;

use crate::catalog::{mod_id, AffixKind, ModSource, NormalizedMod};
use crate::index::ModIndex;
use crate::raw::{DecodedSnapshot, RawTierRow};
use crate::tiers;

/// Accumulator for one logical mod while merging raw records.
#[derive(Debug, Default)]
struct MergeSlot {
    variant_ids: Vec<u32>,
    group_ids: Vec<u32>,
    mtype_ids: Vec<u32>,
    exclusion_group: Option<String>,
    corrupted: bool,
    tier_pool: Vec<RawTierRow>,
}

/// Merge decoded modifiers into normalized logical mods.
///
/// A mod's applicable base-groups are the modifier-type tags it carries
/// that name an existing base-group (membership, not a foreign key). Mods
/// whose tags match no base-group are kept with an empty group set; they
/// still appear in the `byMod` view.
pub fn merge_mods(snapshot: &DecodedSnapshot, index: &ModIndex) -> Vec<NormalizedMod> {
    let mut slots: BTreeMap<(String, AffixKind, ModSource), MergeSlot> = BTreeMap::new();

    for modifier in &snapshot.mods {
        let group_name = modifier
            .source_group
            .and_then(|id| snapshot.group_names.get(&id))
            .map(String::as_str);
        let source = ModSource::classify(group_name, modifier.corrupted);

        let resolved_groups: Vec<u32> = modifier
            .mtype_ids
            .iter()
            .copied()
            .filter(|id| index.bases_by_group.contains_key(id))
            .collect();

        let slot = slots
            .entry((modifier.name.clone(), modifier.affix, source))
            .or_default();
        slot.variant_ids.push(modifier.id);
        for group in resolved_groups {
            if !slot.group_ids.contains(&group) {
                slot.group_ids.push(group);
            }
        }
        for &mtype in &modifier.mtype_ids {
            if !slot.mtype_ids.contains(&mtype) {
                slot.mtype_ids.push(mtype);
            }
        }
        if slot.exclusion_group.is_none() {
            slot.exclusion_group = modifier.exclusion_group.clone();
        }
        slot.corrupted |= modifier.corrupted;
        slot.tier_pool.extend(modifier.tier_rows.iter().cloned());
    }

    slots
        .into_iter()
        .map(|((name, affix, source), mut slot)| {
            slot.variant_ids.sort_unstable();
            slot.variant_ids.dedup();
            slot.group_ids.sort_unstable();
            slot.mtype_ids.sort_unstable();
            let mtype_names = slot
                .mtype_ids
                .iter()
                .filter_map(|id| snapshot.mtype_names.get(id).cloned())
                .collect();
            NormalizedMod {
                id: mod_id(&name, affix, source),
                name,
                affix,
                source,
                group_ids: slot.group_ids,
                mtype_ids: slot.mtype_ids,
                mtype_names,
                exclusion_group: slot.exclusion_group,
                corrupted: slot.corrupted,
                tiers: tiers::canonicalize(&slot.tier_pool),
                variant_ids: slot.variant_ids,
            }
        })
        .collect()
}
