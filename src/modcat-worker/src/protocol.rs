//! Worker message protocol.
//!
//! JSON-shaped request/response envelopes. Every request carries a caller
//! correlation id; the matching response echoes it, and every request gets
//! exactly one response.

use std::collections::BTreeMap;

use modcat::{AffixKind, CanonicalTier, ModCatalog, ModSource};
use serde::{Deserialize, Serialize};

/// Request envelope: `{ id, type, payload? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub op: Op,
}

/// Worker operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    Load,
    Search {
        query: String,
    },
    Applicable {
        base: String,
        #[serde(default)]
        filters: ApplicableFilters,
    },
    Ev(EvParams),
    TierStats(TierStatsParams),
}

/// Filters for the `applicable` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableFilters {
    #[serde(default)]
    pub affix: Option<AffixKind>,
    #[serde(default)]
    pub mtype: Option<u32>,
    #[serde(default)]
    pub source: Option<ModSource>,
    /// Inclusive item-level ceiling; a mod qualifies if any tier has
    /// `ilvl <=` this.
    #[serde(default)]
    pub ilvl: Option<u32>,
}

/// Parameters for the `ev` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvParams {
    /// Success rate as a percentage; divided by 100 and clamped to [0, 1].
    pub success_rate: f64,
    pub attempt_cost: f64,
    pub target_sell_price: f64,
    #[serde(default = "default_attempts")]
    pub attempts: f64,
}

fn default_attempts() -> f64 {
    1.0
}

/// Crafting method for `tierStats` cost arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftMethod {
    /// Re-roll from the full applicable pool.
    Chaos,
    /// The mod is guaranteed; only the tier is rolled.
    Essence,
}

impl std::fmt::Display for CraftMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chaos => write!(f, "chaos"),
            Self::Essence => write!(f, "essence"),
        }
    }
}

/// Parameters for the `tierStats` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStatsParams {
    pub mod_id: String,
    pub ilvl: u32,
    pub method: CraftMethod,
    pub attempt_cost: f64,
}

/// Response envelope: `{ id, ok, result?, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(id: u64, result: Reply) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: String) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Operation results. Untagged: each variant has a distinct field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Load(LoadReply),
    Hits(HitsReply),
    Ev(EvReply),
    TierStats(TierStatsReply),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReply {
    pub loaded: bool,
    /// True when the catalog was already resident and no fetch happened.
    pub cached: bool,
    pub mods: usize,
}

/// Result rows for `search` and `applicable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitsReply {
    pub hits: Vec<WorkerMod>,
    /// True when the result was cut at the operation's cap.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvReply {
    pub ev_per_attempt: f64,
    pub total_ev: f64,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStatsReply {
    pub mod_id: String,
    pub method: CraftMethod,
    pub tiers: Vec<TierStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStat {
    pub rank: u32,
    pub tier: u32,
    pub ilvl: u32,
    pub score: f64,
    pub reachable: bool,
    pub hit_chance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_cost: Option<f64>,
}

/// Reduced per-mod projection held by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMod {
    pub id: String,
    pub name: String,
    pub affix: AffixKind,
    pub source: ModSource,
    pub mtype_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_group: Option<String>,
    pub tiers: Vec<CanonicalTier>,
}

/// The worker's in-memory catalog projection: the deduplicated mod list
/// plus a base-name index into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerCatalog {
    pub mods: Vec<WorkerMod>,
    pub by_base: BTreeMap<String, Vec<usize>>,
}

impl WorkerCatalog {
    /// Project a full catalog artifact down to what the worker serves.
    pub fn project(catalog: &ModCatalog) -> Self {
        let mut by_id: BTreeMap<String, WorkerMod> = BTreeMap::new();
        for entry in catalog.by_base.values() {
            for modifier in &entry.mods {
                by_id
                    .entry(modifier.id.clone())
                    .or_insert_with(|| WorkerMod {
                        id: modifier.id.clone(),
                        name: modifier.name.clone(),
                        affix: modifier.affix,
                        source: modifier.source,
                        mtype_ids: modifier.mtype_ids.clone(),
                        exclusion_group: modifier.exclusion_group.clone(),
                        tiers: modifier.tiers.clone(),
                    });
            }
        }

        let mods: Vec<WorkerMod> = by_id.into_values().collect();
        let position: BTreeMap<&str, usize> = mods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.as_str(), i))
            .collect();

        let mut by_base = BTreeMap::new();
        for entry in catalog.by_base.values() {
            let indices: Vec<usize> = entry
                .mods
                .iter()
                .filter_map(|m| position.get(m.id.as_str()).copied())
                .collect();
            by_base.insert(entry.base_name.clone(), indices);
        }

        Self { mods, by_base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let req = Request {
            id: 7,
            op: Op::Search {
                query: "fire".to_string(),
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"id": 7, "type": "search", "payload": {"query": "fire"}}));
    }

    #[test]
    fn test_load_has_no_payload() {
        let req = Request { id: 1, op: Op::Load };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"id": 1, "type": "load"}));
        let back: Request = serde_json::from_value(value).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_tier_stats_type_tag_is_camel_case() {
        let req = Request {
            id: 2,
            op: Op::TierStats(TierStatsParams {
                mod_id: "abc".to_string(),
                ilvl: 80,
                method: CraftMethod::Chaos,
                attempt_cost: 1.0,
            }),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "tierStats");
        assert_eq!(value["payload"]["modId"], "abc");
    }

    #[test]
    fn test_unknown_op_fails_to_parse() {
        let raw = json!({"id": 3, "type": "selfDestruct"});
        assert!(serde_json::from_value::<Request>(raw).is_err());
    }

    #[test]
    fn test_response_round_trip() {
        let resp = Response::success(
            9,
            Reply::Ev(EvReply {
                ev_per_attempt: 40.0,
                total_ev: 80.0,
                attempts: 2,
            }),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"evPerAttempt\":40.0"));
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_failure_response_shape() {
        let resp = Response::failure(4, "catalog not loaded".to_string());
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"id": 4, "ok": false, "error": "catalog not loaded"}));
    }
}
