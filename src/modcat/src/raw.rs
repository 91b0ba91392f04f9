//! Raw snapshot decoding.
//!
//! The scraped export stores nested structures as pipe-delimited id lists or
//! JSON documents embedded inside JSON strings. All of that string-level
//! decoding happens here; the rest of the pipeline only ever sees typed
//! records.
//!
//! Decoding is tolerant by design: a record missing a critical field (name,
//! affix) is skipped and counted, a malformed embedded value yields an empty
//! value. Only the caller decides whether an empty result is fatal.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::AffixKind;

/// Top-level raw snapshot object as scraped from the upstream export.
///
/// Records are kept as loose JSON values so that one malformed record cannot
/// abort deserialization of the whole snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    /// Raw modifier records.
    #[serde(default)]
    pub mods: Vec<Value>,
    /// Concrete equippable base items.
    #[serde(default)]
    pub bases: Vec<Value>,
    /// Modifier-type tag id/name pairs.
    #[serde(default)]
    pub mtypes: Vec<Value>,
    /// Source-category (group) id/name pairs.
    #[serde(default)]
    pub groups: Vec<Value>,
}

/// External-format modifier record. Field types are permissive on purpose;
/// `decode` turns this into a [`DecodedModifier`] or skips it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawModifier {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    /// `"prefix"` or `"suffix"`.
    #[serde(default)]
    pub affix: Option<String>,
    /// Pipe-delimited modifier-type tag ids, e.g. `"12|55|9"`.
    #[serde(default)]
    pub mtypes: Option<String>,
    /// Source-category id.
    #[serde(default)]
    pub group: Option<u32>,
    /// Mutual-exclusion group names, JSON-encoded string array.
    #[serde(default)]
    pub mod_groups: Option<String>,
    #[serde(default)]
    pub corrupted: Option<bool>,
    /// Tier table keyed by *string* tier number. Each entry is one raw tier
    /// definition or an array of them.
    #[serde(default)]
    pub tiers: Option<Value>,
}

/// External-format base item record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBaseItem {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    /// Base-group id shared by related bases.
    #[serde(default)]
    pub group: Option<u32>,
}

/// One raw tier definition inside a modifier's tier table.
#[derive(Debug, Clone, Deserialize)]
struct RawTierDef {
    #[serde(default)]
    ilvl: Option<u32>,
    #[serde(default)]
    weight: Option<u32>,
    /// Numeric value ranges: either a JSON-encoded string (the usual scrape
    /// form) or an already-decoded array.
    #[serde(default)]
    values: Option<Value>,
}

/// A decoded raw tier row. Several rows may share the same tier number;
/// resolving that is the canonicalizer's job, not the decoder's.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTierRow {
    /// Raw tier number from the string key.
    pub tier: u32,
    /// Minimum item level required for this tier.
    pub ilvl: u32,
    /// Spawn weight.
    pub weight: u32,
    /// `[min, max]` value ranges; bare scalars arrive as `(v, v)`.
    pub values: Vec<(f64, f64)>,
}

/// Modifier record after string-level decoding.
#[derive(Debug, Clone)]
pub struct DecodedModifier {
    pub id: u32,
    pub name: String,
    pub affix: AffixKind,
    /// Ordered set of modifier-type tag ids (duplicates collapsed).
    pub mtype_ids: Vec<u32>,
    /// Source-category id, resolved against the group lookup later.
    pub source_group: Option<u32>,
    /// First mutual-exclusion group name, if the record carries any.
    pub exclusion_group: Option<String>,
    pub corrupted: bool,
    pub tier_rows: Vec<RawTierRow>,
}

/// Base item record after decoding.
#[derive(Debug, Clone)]
pub struct DecodedBase {
    pub id: u32,
    pub name: String,
    pub group_id: u32,
}

/// Typed collections produced from one raw snapshot.
#[derive(Debug, Clone, Default)]
pub struct DecodedSnapshot {
    pub mods: Vec<DecodedModifier>,
    pub bases: Vec<DecodedBase>,
    /// Modifier-type tag id to display name.
    pub mtype_names: BTreeMap<u32, String>,
    /// Source-category id to display name.
    pub group_names: BTreeMap<u32, String>,
}

/// Counters for records and fields dropped during decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub mods_total: usize,
    pub mods_skipped: usize,
    pub bases_total: usize,
    pub bases_skipped: usize,
    /// Embedded JSON fields that failed to parse and decayed to empty.
    pub bad_embedded_fields: usize,
}

/// Split a pipe-delimited id string into an ordered set of ids.
///
/// Non-numeric tokens are dropped, duplicates collapse to the first
/// occurrence.
pub fn split_pipe_ids(raw: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    for token in raw.split('|') {
        if let Ok(id) = token.trim().parse::<u32>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Parse a JSON document embedded in a string field. `None` on failure.
pub fn parse_embedded_json(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

/// Decode a numeric range array: elements are `[min, max]` pairs or bare
/// scalars treated as `[v, v]`. Anything non-numeric is dropped.
fn decode_value_ranges(value: &Value, stats: &mut DecodeStats) -> Vec<(f64, f64)> {
    let decoded = match value {
        Value::String(s) => match parse_embedded_json(s) {
            Some(v) => v,
            None => {
                stats.bad_embedded_fields += 1;
                return Vec::new();
            }
        },
        other => other.clone(),
    };

    let Value::Array(entries) = decoded else {
        stats.bad_embedded_fields += 1;
        return Vec::new();
    };

    let mut ranges = Vec::new();
    for entry in entries {
        match entry {
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    ranges.push((v, v));
                }
            }
            Value::Array(pair) => {
                let lo = pair.first().and_then(Value::as_f64);
                let hi = pair.get(1).and_then(Value::as_f64);
                match (lo, hi) {
                    (Some(lo), Some(hi)) => ranges.push((lo, hi)),
                    (Some(lo), None) => ranges.push((lo, lo)),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    ranges
}

/// Decode one tier-table entry (a tier definition or an array of them) into
/// raw tier rows under the given tier number.
fn decode_tier_entry(tier: u32, entry: &Value, rows: &mut Vec<RawTierRow>, stats: &mut DecodeStats) {
    let defs: Vec<&Value> = match entry {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    for def in defs {
        let Ok(parsed) = serde_json::from_value::<RawTierDef>(def.clone()) else {
            stats.bad_embedded_fields += 1;
            continue;
        };
        let values = parsed
            .values
            .as_ref()
            .map(|v| decode_value_ranges(v, stats))
            .unwrap_or_default();
        rows.push(RawTierRow {
            tier,
            ilvl: parsed.ilvl.unwrap_or(0),
            weight: parsed.weight.unwrap_or(0),
            values,
        });
    }
}

/// Decode a modifier's tier table: keys are string tier numbers, values are
/// one definition or an array of definitions. Multiple rows under one key
/// are preserved as separate raw rows.
fn decode_tier_table(table: &Value, stats: &mut DecodeStats) -> Vec<RawTierRow> {
    let table = match table {
        Value::String(s) => match parse_embedded_json(s) {
            Some(v) => v,
            None => {
                stats.bad_embedded_fields += 1;
                return Vec::new();
            }
        },
        other => other.clone(),
    };

    let Value::Object(entries) = table else {
        stats.bad_embedded_fields += 1;
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (key, entry) in &entries {
        let Ok(tier) = key.trim().parse::<u32>() else {
            stats.bad_embedded_fields += 1;
            continue;
        };
        decode_tier_entry(tier, entry, &mut rows, stats);
    }
    // Key order in the export is arbitrary; sort for stable downstream
    // processing.
    rows.sort_by(|a, b| a.tier.cmp(&b.tier));
    rows
}

/// Extract the first mutual-exclusion group name from a JSON-encoded string
/// array.
fn decode_exclusion_group(raw: &str, stats: &mut DecodeStats) -> Option<String> {
    let Some(Value::Array(names)) = parse_embedded_json(raw) else {
        stats.bad_embedded_fields += 1;
        return None;
    };
    names
        .into_iter()
        .find_map(|v| v.as_str().map(|s| s.to_string()))
}

fn decode_modifier(value: &Value, stats: &mut DecodeStats) -> Option<DecodedModifier> {
    let raw: RawModifier = serde_json::from_value(value.clone()).ok()?;

    let id = raw.id?;
    let name = raw.name.filter(|n| !n.trim().is_empty())?;
    let affix = raw.affix.as_deref()?.parse::<AffixKind>().ok()?;

    let mtype_ids = raw.mtypes.as_deref().map(split_pipe_ids).unwrap_or_default();
    let exclusion_group = raw
        .mod_groups
        .as_deref()
        .and_then(|g| decode_exclusion_group(g, stats));
    let tier_rows = raw
        .tiers
        .as_ref()
        .map(|t| decode_tier_table(t, stats))
        .unwrap_or_default();

    Some(DecodedModifier {
        id,
        name,
        affix,
        mtype_ids,
        source_group: raw.group,
        exclusion_group,
        corrupted: raw.corrupted.unwrap_or(false),
        tier_rows,
    })
}

fn decode_base(value: &Value) -> Option<DecodedBase> {
    let raw: RawBaseItem = serde_json::from_value(value.clone()).ok()?;
    Some(DecodedBase {
        id: raw.id?,
        name: raw.name.filter(|n| !n.trim().is_empty())?,
        group_id: raw.group?,
    })
}

/// Decode an id/name lookup table (modifier-type tags, source categories).
fn decode_lookup(values: &[Value]) -> BTreeMap<u32, String> {
    let mut lookup = BTreeMap::new();
    for value in values {
        let id = value.get("id").and_then(Value::as_u64);
        let name = value.get("name").and_then(Value::as_str);
        if let (Some(id), Some(name)) = (id, name) {
            lookup.insert(id as u32, name.to_string());
        }
    }
    lookup
}

/// Decode one raw snapshot into typed collections.
///
/// Never fails: malformed records are skipped and counted. The pipeline
/// decides whether an empty result is fatal.
pub fn decode(snapshot: &RawSnapshot) -> (DecodedSnapshot, DecodeStats) {
    let mut stats = DecodeStats {
        mods_total: snapshot.mods.len(),
        bases_total: snapshot.bases.len(),
        ..Default::default()
    };

    let mut mods = Vec::with_capacity(snapshot.mods.len());
    for value in &snapshot.mods {
        match decode_modifier(value, &mut stats) {
            Some(modifier) => mods.push(modifier),
            None => {
                stats.mods_skipped += 1;
                tracing::warn!("skipping undecodable modifier record");
            }
        }
    }

    let mut bases = Vec::with_capacity(snapshot.bases.len());
    for value in &snapshot.bases {
        match decode_base(value) {
            Some(base) => bases.push(base),
            None => {
                stats.bases_skipped += 1;
                tracing::warn!("base record missing critical fields, skipped");
            }
        }
    }

    let decoded = DecodedSnapshot {
        mods,
        bases,
        mtype_names: decode_lookup(&snapshot.mtypes),
        group_names: decode_lookup(&snapshot.groups),
    };
    (decoded, stats)
}
