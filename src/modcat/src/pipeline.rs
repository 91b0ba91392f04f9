//! One-shot catalog build pipeline.
//!
//! Single-threaded batch transform: decode, index, merge, canonicalize,
//! emit. Individual bad records are skipped and counted; only an unusable
//! snapshot (nothing decodable) is fatal.

use crate::catalog::{CatalogError, ModCatalog};
use crate::index::ModIndex;
use crate::merge;
use crate::raw::{decode, DecodeStats, RawSnapshot};

/// Error type for whole-pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("snapshot contains no decodable modifier records")]
    NoModifiers,

    #[error("snapshot contains no decodable base items")]
    NoBases,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Counters reported after a pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub decode: DecodeStats,
    /// Logical mods after merging.
    pub merged_mods: usize,
    pub by_mod_entries: usize,
    pub by_base_entries: usize,
}

/// Run the full offline pipeline over one raw snapshot.
pub fn build_catalog(snapshot: &RawSnapshot) -> Result<(ModCatalog, PipelineStats), PipelineError> {
    let (decoded, decode_stats) = decode(snapshot);
    if decoded.mods.is_empty() {
        return Err(PipelineError::NoModifiers);
    }
    if decoded.bases.is_empty() {
        return Err(PipelineError::NoBases);
    }

    let index = ModIndex::build(&decoded);
    let mods = merge::merge_mods(&decoded, &index);
    let catalog = ModCatalog::assemble(&mods, &decoded);

    let stats = PipelineStats {
        decode: decode_stats,
        merged_mods: mods.len(),
        by_mod_entries: catalog.by_mod.len(),
        by_base_entries: catalog.by_base.len(),
    };
    tracing::debug!(
        mods = stats.merged_mods,
        bases = stats.by_base_entries,
        skipped = stats.decode.mods_skipped,
        "catalog build complete"
    );
    Ok((catalog, stats))
}
