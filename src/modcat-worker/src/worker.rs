//! The query worker loop and operation handlers.
//!
//! One long-lived worker owns one loaded catalog projection. Handler
//! failures become `ok: false` responses; the worker itself never dies on a
//! bad message.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};

use crate::protocol::{
    ApplicableFilters, CraftMethod, EvParams, EvReply, HitsReply, LoadReply, Op, Reply, Request,
    Response, TierStat, TierStatsParams, TierStatsReply, WorkerCatalog, WorkerMod,
};

/// Result cap for `search`.
pub const SEARCH_CAP: usize = 200;
/// Result cap for `applicable`.
pub const APPLICABLE_CAP: usize = 500;

/// Error type for worker operations
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("catalog source error: {0}")]
    Source(String),

    #[error("catalog not loaded")]
    NotLoaded,

    #[error("unknown mod id: {0}")]
    UnknownMod(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// An `ok: false` response, surfaced by the client conveniences.
    #[error("request failed: {0}")]
    Request(String),

    /// The worker is gone; raised on the client side only.
    #[error("worker terminated")]
    Terminated,
}

/// Where the worker's catalog projection comes from. Abstracted so tests
/// and embedders can supply projections without touching the filesystem.
pub trait CatalogSource: Send {
    fn fetch(&mut self) -> Result<WorkerCatalog, WorkerError>;
}

/// Loads the catalog artifact from disk and projects it.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for FileSource {
    fn fetch(&mut self) -> Result<WorkerCatalog, WorkerError> {
        let catalog = modcat::ModCatalog::load(&self.path)
            .map_err(|e| WorkerError::Source(e.to_string()))?;
        Ok(WorkerCatalog::project(&catalog))
    }
}

/// A ready-made projection, handed over once. Useful for tests and for
/// embedders that already hold a catalog in memory.
#[derive(Debug, Default)]
pub struct InlineSource(pub Option<WorkerCatalog>);

impl CatalogSource for InlineSource {
    fn fetch(&mut self) -> Result<WorkerCatalog, WorkerError> {
        self.0
            .take()
            .ok_or_else(|| WorkerError::Source("inline catalog already consumed".to_string()))
    }
}

/// The worker: one catalog projection, one handler per operation.
#[derive(Debug)]
pub struct QueryWorker<S: CatalogSource> {
    source: S,
    catalog: Option<WorkerCatalog>,
}

impl<S: CatalogSource> QueryWorker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            catalog: None,
        }
    }

    /// Handle one typed request. Always produces exactly one response;
    /// handler errors are folded into `ok: false`.
    pub fn handle(&mut self, req: Request) -> Response {
        tracing::trace!(id = req.id, "worker request");
        match self.dispatch(req.op) {
            Ok(reply) => Response::success(req.id, reply),
            Err(err) => Response::failure(req.id, err.to_string()),
        }
    }

    /// Handle one raw JSON message. A message that does not parse as a
    /// known request (unknown `type`, malformed payload) is answered with
    /// an error response echoing whatever id could be recovered.
    pub fn handle_json(&mut self, raw: &str) -> Response {
        match serde_json::from_str::<Request>(raw) {
            Ok(req) => self.handle(req),
            Err(err) => {
                let id = serde_json::from_str::<serde_json::Value>(raw)
                    .ok()
                    .and_then(|v| v.get("id").and_then(serde_json::Value::as_u64))
                    .unwrap_or(0);
                Response::failure(id, WorkerError::Protocol(err.to_string()).to_string())
            }
        }
    }

    /// Run until the request channel closes. Stops early if the response
    /// side is gone (client teardown).
    pub fn run(mut self, requests: Receiver<Request>, responses: Sender<Response>) {
        for req in requests.iter() {
            let resp = self.handle(req);
            if responses.send(resp).is_err() {
                break;
            }
        }
        tracing::debug!("worker loop exited");
    }

    fn dispatch(&mut self, op: Op) -> Result<Reply, WorkerError> {
        match op {
            Op::Load => self.op_load(),
            Op::Search { query } => self.op_search(&query),
            Op::Applicable { base, filters } => self.op_applicable(&base, &filters),
            Op::Ev(params) => Ok(Reply::Ev(expected_value(&params))),
            Op::TierStats(params) => self.op_tier_stats(&params),
        }
    }

    fn op_load(&mut self) -> Result<Reply, WorkerError> {
        if let Some(catalog) = &self.catalog {
            return Ok(Reply::Load(LoadReply {
                loaded: true,
                cached: true,
                mods: catalog.mods.len(),
            }));
        }
        let catalog = self.source.fetch()?;
        let mods = catalog.mods.len();
        self.catalog = Some(catalog);
        Ok(Reply::Load(LoadReply {
            loaded: true,
            cached: false,
            mods,
        }))
    }

    fn loaded(&self) -> Result<&WorkerCatalog, WorkerError> {
        self.catalog.as_ref().ok_or(WorkerError::NotLoaded)
    }

    fn op_search(&self, query: &str) -> Result<Reply, WorkerError> {
        let needle = query.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Ok(Reply::Hits(HitsReply {
                hits: Vec::new(),
                truncated: false,
            }));
        }
        let catalog = self.loaded()?;
        let mut hits = Vec::new();
        let mut truncated = false;
        for modifier in &catalog.mods {
            if modifier.name.to_ascii_lowercase().contains(&needle) {
                if hits.len() == SEARCH_CAP {
                    truncated = true;
                    break;
                }
                hits.push(modifier.clone());
            }
        }
        Ok(Reply::Hits(HitsReply { hits, truncated }))
    }

    fn op_applicable(
        &self,
        base: &str,
        filters: &ApplicableFilters,
    ) -> Result<Reply, WorkerError> {
        let catalog = self.loaded()?;
        let indices = catalog.by_base.get(base).map(Vec::as_slice).unwrap_or(&[]);

        let mut hits = Vec::new();
        let mut truncated = false;
        for &i in indices {
            let modifier = &catalog.mods[i];
            if !applicable_matches(modifier, filters) {
                continue;
            }
            if hits.len() == APPLICABLE_CAP {
                truncated = true;
                break;
            }
            hits.push(modifier.clone());
        }
        Ok(Reply::Hits(HitsReply { hits, truncated }))
    }

    fn op_tier_stats(&self, params: &TierStatsParams) -> Result<Reply, WorkerError> {
        let catalog = self.loaded()?;
        let modifier = catalog
            .mods
            .iter()
            .find(|m| m.id == params.mod_id)
            .ok_or_else(|| WorkerError::UnknownMod(params.mod_id.clone()))?;

        let attempt_cost = params.attempt_cost.max(0.0);
        let reachable_count = modifier
            .tiers
            .iter()
            .filter(|t| t.ilvl <= params.ilvl)
            .count();
        let pool = catalog.mods.len().max(1);

        let tiers = modifier
            .tiers
            .iter()
            .map(|t| {
                let reachable = t.ilvl <= params.ilvl;
                let hit_chance = if reachable && reachable_count > 0 {
                    // Uniform over reachable tiers; chaos additionally has
                    // to hit this mod out of the whole pool.
                    match params.method {
                        CraftMethod::Essence => 1.0 / reachable_count as f64,
                        CraftMethod::Chaos => 1.0 / (reachable_count * pool) as f64,
                    }
                } else {
                    0.0
                };
                let expected_cost = (hit_chance > 0.0).then(|| attempt_cost / hit_chance);
                TierStat {
                    rank: t.rank,
                    tier: t.tier,
                    ilvl: t.ilvl,
                    score: t.score,
                    reachable,
                    hit_chance,
                    expected_cost,
                }
            })
            .collect();

        Ok(Reply::TierStats(TierStatsReply {
            mod_id: params.mod_id.clone(),
            method: params.method,
            tiers,
        }))
    }
}

fn applicable_matches(modifier: &WorkerMod, filters: &ApplicableFilters) -> bool {
    if let Some(affix) = filters.affix {
        if modifier.affix != affix {
            return false;
        }
    }
    if let Some(mtype) = filters.mtype {
        if !modifier.mtype_ids.contains(&mtype) {
            return false;
        }
    }
    if let Some(source) = filters.source {
        if modifier.source != source {
            return false;
        }
    }
    if let Some(ceiling) = filters.ilvl {
        if !modifier.tiers.iter().any(|t| t.ilvl <= ceiling) {
            return false;
        }
    }
    true
}

/// Expected-value arithmetic: `p * price - cost` per attempt.
pub fn expected_value(params: &EvParams) -> EvReply {
    let p = (params.success_rate / 100.0).clamp(0.0, 1.0);
    let cost = params.attempt_cost.max(0.0);
    let price = params.target_sell_price.max(0.0);
    let ev_per_attempt = p * price - cost;

    let attempts = if params.attempts.is_finite() && params.attempts >= 1.0 {
        params.attempts.floor() as u32
    } else {
        1
    };

    EvReply {
        ev_per_attempt,
        total_ev: ev_per_attempt * attempts as f64,
        attempts,
    }
}
