//! # modcat
//!
//! Crafting modifier catalog library - snapshot decoding, normalization,
//! and catalog emission.
//!
//! This library provides functionality to:
//! - Decode raw scraped modifier/base/tag exports (pipe-delimited id lists,
//!   JSON-in-JSON tier tables) into typed records
//! - Merge duplicate raw modifier records into normalized logical mods
//! - Canonicalize tier lists into a power-consistent ranked ladder
//! - Emit and load the static catalog artifact (`byMod`/`byBase` views)
//!
//! ## Example
//!
//! ```no_run
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = fs::read_to_string("snapshot.json")?;
//! let snapshot: modcat::RawSnapshot = serde_json::from_str(&raw)?;
//!
//! let (catalog, stats) = modcat::build_catalog(&snapshot)?;
//! println!(
//!     "{} mods over {} bases ({} records skipped)",
//!     catalog.meta.mod_count, catalog.meta.base_count, stats.decode.mods_skipped
//! );
//!
//! catalog.save("share/catalog.json".as_ref(), false)?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod index;
pub mod merge;
pub mod pipeline;
pub mod raw;
pub mod tiers;

// Re-export commonly used items
#[doc(inline)]
pub use catalog::{
    mod_id, AffixKind, ByBaseEntry, ByModEntry, CanonicalTier, CatalogError, CatalogMeta,
    ModCatalog, ModSource, NormalizedMod, Occurrence, DEFAULT_CATALOG_PATH,
};
#[doc(inline)]
pub use index::ModIndex;
#[doc(inline)]
pub use pipeline::{build_catalog, PipelineError, PipelineStats};
#[doc(inline)]
pub use raw::{decode, DecodeStats, DecodedSnapshot, RawSnapshot};
