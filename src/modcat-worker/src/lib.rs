//! # modcat-worker
//!
//! Out-of-process query worker: a single long-lived worker thread holding a
//! reduced catalog projection, driven exclusively through an id-correlated
//! request/response message protocol. Meant for UI hosts that must not
//! block on catalog queries.
//!
//! ## Example
//!
//! ```no_run
//! use modcat_worker::{FileSource, WorkerClient};
//!
//! # fn main() -> Result<(), modcat_worker::WorkerError> {
//! let client = WorkerClient::spawn(FileSource::new("share/catalog.json"));
//! let load = client.load()?;
//! println!("{} mods loaded (cached: {})", load.mods, load.cached);
//!
//! let hits = client.search("fire")?;
//! for m in &hits.hits {
//!     println!("{} ({})", m.name, m.affix);
//! }
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod protocol;
pub mod worker;

// Re-export commonly used items
#[doc(inline)]
pub use client::WorkerClient;
#[doc(inline)]
pub use protocol::{
    ApplicableFilters, CraftMethod, EvParams, EvReply, HitsReply, LoadReply, Op, Reply, Request,
    Response, TierStat, TierStatsParams, TierStatsReply, WorkerCatalog, WorkerMod,
};
#[doc(inline)]
pub use worker::{
    expected_value, CatalogSource, FileSource, InlineSource, QueryWorker, WorkerError,
    APPLICABLE_CAP, SEARCH_CAP,
};
