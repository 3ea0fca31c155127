use crate::series::DailySeries;
use crate::types::{CandidatePair, Domain};
use std::collections::BTreeSet;

/// A candidate pair plus the indices of its series in the run's input.
#[derive(Debug, Clone)]
pub struct IndexedPair {
    pub pair: CandidatePair,
    pub a_idx: usize,
    pub b_idx: usize,
}

/// Build deduplicated candidate pairs from the available series.
///
/// Pairs are keyed order-independently so `A x B` and `B x A` never both run.
/// Same-metric pairs and pairs of two temporal flags are excluded; temporal
/// flags only appear as confounders or as one side of a pair. Lag testing is
/// skipped for pairs involving a temporal metric (shifting a weekday flag is
/// meaningless).
pub fn generate_pairs(series: &[DailySeries]) -> Vec<IndexedPair> {
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut out = Vec::new();
    for (a_idx, a) in series.iter().enumerate() {
        for (b_idx, b) in series.iter().enumerate().skip(a_idx + 1) {
            if a.id.key() == b.id.key() {
                continue;
            }
            if a.id.domain == Domain::Temporal && b.id.domain == Domain::Temporal {
                continue;
            }
            let check_time_lag =
                a.id.domain != Domain::Temporal && b.id.domain != Domain::Temporal;
            let pair = CandidatePair {
                a: a.id.clone(),
                b: b.id.clone(),
                check_time_lag,
            };
            if !seen.insert(pair.pair_key()) {
                continue;
            }
            out.push(IndexedPair { pair, a_idx, b_idx });
        }
    }
    out
}
