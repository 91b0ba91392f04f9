//! Client handle for the query worker.
//!
//! The caller and worker communicate only via message passing. Each request
//! gets a monotonically increasing correlation id; a pump thread matches
//! responses back to the per-call reply channel through a pending table.
//!
//! Teardown terminates the worker and rejects every in-flight call with
//! [`WorkerError::Terminated`]; nothing is left pending forever.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Sender};

use crate::protocol::{
    ApplicableFilters, EvParams, EvReply, HitsReply, LoadReply, Op, Reply, Request, Response,
    TierStatsParams, TierStatsReply,
};
use crate::worker::{CatalogSource, QueryWorker, WorkerError};

type PendingTable = Arc<Mutex<HashMap<u64, Sender<Response>>>>;

/// Handle to one long-lived query worker thread.
#[derive(Debug)]
pub struct WorkerClient {
    requests: Option<Sender<Request>>,
    pending: PendingTable,
    next_id: AtomicU64,
    worker: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl WorkerClient {
    /// Spawn the worker and the response pump.
    pub fn spawn<S: CatalogSource + 'static>(source: S) -> Self {
        let (req_tx, req_rx) = unbounded::<Request>();
        let (resp_tx, resp_rx) = unbounded::<Response>();

        let worker = std::thread::spawn(move || QueryWorker::new(source).run(req_rx, resp_tx));

        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let pump_pending = Arc::clone(&pending);
        let pump = std::thread::spawn(move || {
            for resp in resp_rx.iter() {
                let slot = pump_pending
                    .lock()
                    .expect("pending table poisoned")
                    .remove(&resp.id);
                match slot {
                    Some(reply_tx) => {
                        let _ = reply_tx.send(resp);
                    }
                    None => tracing::warn!(id = resp.id, "response without a pending request"),
                }
            }
            // Worker is gone. Dropping the leftover reply senders makes
            // every still-pending call observe Terminated instead of
            // hanging.
            pump_pending
                .lock()
                .expect("pending table poisoned")
                .clear();
        });

        Self {
            requests: Some(req_tx),
            pending,
            next_id: AtomicU64::new(1),
            worker: Some(worker),
            pump: Some(pump),
        }
    }

    /// Send one operation and block until its response arrives.
    ///
    /// There is no timeout: the worker answers every request exactly once,
    /// and teardown rejects whatever is still in flight.
    pub fn request(&self, op: Op) -> Result<Response, WorkerError> {
        let requests = self.requests.as_ref().ok_or(WorkerError::Terminated)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let (reply_tx, reply_rx) = bounded(1);
        self.pending
            .lock()
            .expect("pending table poisoned")
            .insert(id, reply_tx);

        if requests.send(Request { id, op }).is_err() {
            self.pending
                .lock()
                .expect("pending table poisoned")
                .remove(&id);
            return Err(WorkerError::Terminated);
        }

        reply_rx.recv().map_err(|_| WorkerError::Terminated)
    }

    pub fn load(&self) -> Result<LoadReply, WorkerError> {
        match expect_result(self.request(Op::Load)?)? {
            Reply::Load(reply) => Ok(reply),
            _ => Err(unexpected("load")),
        }
    }

    pub fn search(&self, query: &str) -> Result<HitsReply, WorkerError> {
        let resp = self.request(Op::Search {
            query: query.to_string(),
        })?;
        match expect_result(resp)? {
            Reply::Hits(reply) => Ok(reply),
            _ => Err(unexpected("search")),
        }
    }

    pub fn applicable(
        &self,
        base: &str,
        filters: ApplicableFilters,
    ) -> Result<HitsReply, WorkerError> {
        let resp = self.request(Op::Applicable {
            base: base.to_string(),
            filters,
        })?;
        match expect_result(resp)? {
            Reply::Hits(reply) => Ok(reply),
            _ => Err(unexpected("applicable")),
        }
    }

    pub fn ev(&self, params: EvParams) -> Result<EvReply, WorkerError> {
        match expect_result(self.request(Op::Ev(params))?)? {
            Reply::Ev(reply) => Ok(reply),
            _ => Err(unexpected("ev")),
        }
    }

    pub fn tier_stats(&self, params: TierStatsParams) -> Result<TierStatsReply, WorkerError> {
        match expect_result(self.request(Op::TierStats(params))?)? {
            Reply::TierStats(reply) => Ok(reply),
            _ => Err(unexpected("tierStats")),
        }
    }

    /// Terminate the worker and reject pending calls.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        // Closing the request channel stops the worker loop after it has
        // answered everything already queued; the pump then rejects any
        // call that raced past it.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Some(pump) = self.pump.take() {
            let _ = pump.join();
        }
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn expect_result(resp: Response) -> Result<Reply, WorkerError> {
    if resp.ok {
        resp.result
            .ok_or_else(|| WorkerError::Protocol("response missing result".to_string()))
    } else {
        Err(WorkerError::Request(
            resp.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

fn unexpected(op: &str) -> WorkerError {
    WorkerError::Protocol(format!("unexpected reply shape for {op}"))
}
