//! Tier canonicalization.
//!
//! Raw tier numbers are scrape artifacts: the same nominal tier slot can be
//! reused with different numeric ranges across base occurrences, and the
//! numbering is not guaranteed to be power-ordered. The canonical rank
//! derived here from value magnitude is the only power-consistent ordering,
//! and the identifier callers should use for "best tier" semantics.

use std::collections::BTreeMap;

use crate::catalog::CanonicalTier;
use crate::raw::RawTierRow;

/// Score one raw tier row: the arithmetic mean of its range midpoints.
/// A row with no numeric values scores 0.
pub fn score_row(row: &RawTierRow) -> f64 {
    if row.values.is_empty() {
        return 0.0;
    }
    let sum: f64 = row.values.iter().map(|(lo, hi)| (lo + hi) / 2.0).sum();
    sum / row.values.len() as f64
}

/// Collapse a pool of raw tier rows into a canonical, ranked tier list.
///
/// 1. score every row;
/// 2. among rows sharing a raw tier number, keep the highest-scoring one
///    (ties keep the first encountered);
/// 3. sort by score descending and assign contiguous ranks from 1.
pub fn canonicalize(rows: &[RawTierRow]) -> Vec<CanonicalTier> {
    // Dedup by raw tier number. Strictly-greater comparison keeps the first
    // encountered row on equal scores, deterministic for stable input order.
    let mut best: BTreeMap<u32, (f64, &RawTierRow)> = BTreeMap::new();
    for row in rows {
        let score = score_row(row);
        let replace = match best.get(&row.tier) {
            Some((kept, _)) => score > *kept,
            None => true,
        };
        if replace {
            best.insert(row.tier, (score, row));
        }
    }

    let mut deduped: Vec<(f64, &RawTierRow)> = best.into_values().collect();
    // Stable sort: equal scores stay in tier-number order.
    deduped.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    deduped
        .into_iter()
        .enumerate()
        .map(|(i, (score, row))| CanonicalTier {
            rank: i as u32 + 1,
            tier: row.tier,
            ilvl: row.ilvl,
            score,
        })
        .collect()
}

/// Merge several already-canonical tier ladders into one, re-applying the
/// same dedup and ranking rules. Used for the name-keyed `byMod` ladder
/// when multiple variants share a display name.
pub fn merge_canonical(ladders: &[&[CanonicalTier]]) -> Vec<CanonicalTier> {
    let mut best: BTreeMap<u32, CanonicalTier> = BTreeMap::new();
    for ladder in ladders {
        for tier in *ladder {
            let replace = match best.get(&tier.tier) {
                Some(kept) => tier.score > kept.score,
                None => true,
            };
            if replace {
                best.insert(tier.tier, tier.clone());
            }
        }
    }

    let mut merged: Vec<CanonicalTier> = best.into_values().collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    for (i, tier) in merged.iter_mut().enumerate() {
        tier.rank = i as u32 + 1;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tier: u32, ilvl: u32, values: &[(f64, f64)]) -> RawTierRow {
        RawTierRow {
            tier,
            ilvl,
            weight: 100,
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_score_midpoint_mean() {
        assert_eq!(score_row(&row(1, 0, &[(10.0, 20.0)])), 15.0);
        assert_eq!(score_row(&row(1, 0, &[(10.0, 20.0), (0.0, 10.0)])), 10.0);
    }

    #[test]
    fn test_score_bare_scalar_and_empty() {
        assert_eq!(score_row(&row(1, 0, &[(7.0, 7.0)])), 7.0);
        assert_eq!(score_row(&row(1, 0, &[])), 0.0);
    }

    #[test]
    fn test_duplicate_tier_number_keeps_highest_score() {
        // Tier 9 arrives twice: [[10,20]] scores 15, [[8,18]] scores 13.
        let rows = vec![row(9, 75, &[(10.0, 20.0)]), row(9, 75, &[(8.0, 18.0)])];
        let canonical = canonicalize(&rows);
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].tier, 9);
        assert_eq!(canonical[0].score, 15.0);
    }

    #[test]
    fn test_duplicate_tier_tie_keeps_first_encountered() {
        let first = row(4, 10, &[(5.0, 5.0)]);
        let second = row(4, 99, &[(5.0, 5.0)]);
        let canonical = canonicalize(&[first, second]);
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].ilvl, 10);
    }

    #[test]
    fn test_ranks_contiguous_and_score_ordered() {
        let rows = vec![
            row(3, 20, &[(1.0, 4.0)]),
            row(9, 75, &[(10.0, 20.0)]),
            row(6, 50, &[(5.0, 9.0)]),
        ];
        let canonical = canonicalize(&rows);
        let ranks: Vec<u32> = canonical.iter().map(|t| t.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        // Rank 1 is the highest-scoring row regardless of raw tier numbering.
        assert_eq!(canonical[0].tier, 9);
        for pair in canonical.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_no_duplicate_tier_numbers_after_canonicalization() {
        let rows = vec![
            row(1, 1, &[(1.0, 1.0)]),
            row(1, 1, &[(2.0, 2.0)]),
            row(2, 2, &[(3.0, 3.0)]),
            row(2, 2, &[(1.5, 1.5)]),
        ];
        let canonical = canonicalize(&rows);
        let mut tiers: Vec<u32> = canonical.iter().map(|t| t.tier).collect();
        tiers.sort_unstable();
        tiers.dedup();
        assert_eq!(tiers.len(), canonical.len());
    }

    #[test]
    fn test_non_monotonic_raw_numbering_reranked() {
        // Raw tier 1 is weaker than raw tier 2 here; rank must follow score.
        let rows = vec![row(1, 10, &[(2.0, 4.0)]), row(2, 20, &[(10.0, 12.0)])];
        let canonical = canonicalize(&rows);
        assert_eq!(canonical[0].tier, 2);
        assert_eq!(canonical[0].rank, 1);
        assert_eq!(canonical[1].tier, 1);
        assert_eq!(canonical[1].rank, 2);
    }

    #[test]
    fn test_merge_canonical_reranks_across_ladders() {
        let a = canonicalize(&[row(1, 10, &[(10.0, 10.0)])]);
        let b = canonicalize(&[row(2, 20, &[(20.0, 20.0)])]);
        let merged = merge_canonical(&[&a, &b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].tier, 2);
        assert_eq!(merged[0].rank, 1);
        assert_eq!(merged[1].rank, 2);
    }

    #[test]
    fn test_merge_canonical_shared_tier_number_keeps_stronger() {
        let a = canonicalize(&[row(5, 10, &[(10.0, 10.0)])]);
        let b = canonicalize(&[row(5, 10, &[(12.0, 12.0)])]);
        let merged = merge_canonical(&[&a, &b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].score, 12.0);
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(canonicalize(&[]).is_empty());
    }
}
