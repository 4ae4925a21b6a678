use std::collections::HashMap;

use crate::MatchResult;

/// Order scored results, optionally collapsing to one gig per seller,
/// and truncate to the result limit.
///
/// Ties are broken by ascending gig id so ranking is deterministic
/// regardless of retrieval order.
pub fn rank(results: Vec<MatchResult>, dedupe_by_seller: bool, limit: usize) -> Vec<MatchResult> {
    let mut results = if dedupe_by_seller {
        collapse_by_seller(results)
    } else {
        results
    };

    results.sort_by(|a, b| b.score.cmp(&a.score).then(a.gig.id.cmp(&b.gig.id)));
    results.truncate(limit);
    results
}

/// Keep only the best-scoring gig per seller, unioning the reason sets
/// of the collapsed entries.
fn collapse_by_seller(results: Vec<MatchResult>) -> Vec<MatchResult> {
    let mut order: Vec<i64> = Vec::new();
    let mut best: HashMap<i64, MatchResult> = HashMap::new();

    for result in results {
        let seller_id = result.gig.seller_id;
        match best.get_mut(&seller_id) {
            None => {
                order.push(seller_id);
                best.insert(seller_id, result);
            }
            Some(existing) => {
                let merged_reasons = union_reasons(&existing.reasons, &result.reasons);
                if result.score > existing.score {
                    *existing = result;
                }
                existing.reasons = merged_reasons;
            }
        }
    }

    order
        .into_iter()
        .filter_map(|seller_id| best.remove(&seller_id))
        .collect()
}

fn union_reasons(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = first.to_vec();
    for reason in second {
        if !merged.contains(reason) {
            merged.push(reason.clone());
        }
    }
    merged
}
