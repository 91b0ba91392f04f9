//! Modifier and base indexing.
//!
//! Pure indexing over the decoded snapshot: no ranking, no merging.
//! Building twice from the same input yields identical indices.

use std::collections::BTreeMap;

use crate::raw::DecodedSnapshot;

/// Positional indices into a decoded snapshot's collections.
#[derive(Debug, Clone, Default)]
pub struct ModIndex {
    /// Modifier-type tag id to positions of mods carrying that tag.
    pub mods_by_mtype: BTreeMap<u32, Vec<usize>>,
    /// Base-group id to positions of bases in that group.
    pub bases_by_group: BTreeMap<u32, Vec<usize>>,
}

impl ModIndex {
    pub fn build(snapshot: &DecodedSnapshot) -> Self {
        let mut mods_by_mtype: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (pos, modifier) in snapshot.mods.iter().enumerate() {
            for &mtype in &modifier.mtype_ids {
                mods_by_mtype.entry(mtype).or_default().push(pos);
            }
        }

        let mut bases_by_group: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (pos, base) in snapshot.bases.iter().enumerate() {
            bases_by_group.entry(base.group_id).or_default().push(pos);
        }

        Self {
            mods_by_mtype,
            bases_by_group,
        }
    }

    /// Positions of mods applicable to a base-group via tag membership.
    pub fn mods_for_group(&self, group_id: u32) -> &[usize] {
        self.mods_by_mtype
            .get(&group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
