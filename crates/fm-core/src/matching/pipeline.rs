use tracing::{debug, instrument, warn};

use crate::MatchResult;
use crate::db::{PgPool, RetrievalError, fetch_sellers_by_ids, retrieve_candidates};
use crate::matching::rank::rank;
use crate::matching::requirement::CanonicalRequirement;
use crate::matching::scoring::{GigCandidate, MatchPolicy, RatioScorer, Scorer, WeightedScorer};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Tunables for one pipeline instance, fixed at startup.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub policy: MatchPolicy,
    pub dedupe_by_seller: bool,
    pub result_limit: usize,
    pub candidate_limit: i64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::Weighted,
            dedupe_by_seller: true,
            result_limit: 10,
            candidate_limit: 50,
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_usize(key: &str, default: usize) -> usize {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        }

        fn parse_i64(key: &str, default: i64) -> i64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        }

        let defaults = Self::default();
        let policy = std::env::var("FM_MATCH_POLICY")
            .ok()
            .and_then(|raw| MatchPolicy::parse(&raw))
            .unwrap_or(defaults.policy);

        Self {
            policy,
            dedupe_by_seller: parse_bool("FM_MATCH_DEDUPE_BY_SELLER", defaults.dedupe_by_seller),
            result_limit: parse_usize("FM_MATCH_RESULT_LIMIT", defaults.result_limit),
            candidate_limit: parse_i64("FM_MATCH_CANDIDATE_LIMIT", defaults.candidate_limit),
        }
    }
}

/// Score retrieved candidates under the configured policy and order
/// them. Pure so it can be exercised without a database.
pub fn score_and_rank(
    candidates: Vec<GigCandidate>,
    requirement: &CanonicalRequirement,
    config: &MatchConfig,
) -> Vec<MatchResult> {
    let scorer: &dyn Scorer = match config.policy {
        MatchPolicy::Weighted => &WeightedScorer,
        MatchPolicy::Ratio => &RatioScorer,
    };

    let results = candidates
        .iter()
        .filter_map(|candidate| scorer.score(candidate, requirement))
        .map(|scored| MatchResult {
            gig: scored.gig,
            seller: None,
            score: scored.score,
            reasons: scored.reasons,
        })
        .collect();

    rank(results, config.dedupe_by_seller, config.result_limit)
}

/// Retrieval, scoring, ranking and seller attachment in one call.
#[derive(Clone)]
pub struct MatchingPipeline {
    pool: PgPool,
    config: MatchConfig,
}

impl MatchingPipeline {
    pub fn new(pool: PgPool, config: MatchConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[instrument(skip(self, requirement))]
    pub async fn run(
        &self,
        requirement: &CanonicalRequirement,
    ) -> Result<Vec<MatchResult>, PipelineError> {
        if requirement.is_empty() {
            return Ok(Vec::new());
        }

        let candidates =
            retrieve_candidates(&self.pool, requirement, self.config.candidate_limit).await?;
        debug!(candidates = candidates.len(), "retrieved candidates");

        let mut ranked = score_and_rank(candidates, requirement, &self.config);
        self.attach_sellers(&mut ranked).await;

        Ok(ranked)
    }

    /// Attach seller profiles to the final page only. A failed lookup
    /// degrades the response (sellers stay `None`) rather than failing
    /// the whole match.
    async fn attach_sellers(&self, results: &mut [MatchResult]) {
        let mut seller_ids: Vec<i64> = Vec::new();
        for result in results.iter() {
            if !seller_ids.contains(&result.gig.seller_id) {
                seller_ids.push(result.gig.seller_id);
            }
        }

        let sellers = match fetch_sellers_by_ids(&self.pool, &seller_ids).await {
            Ok(sellers) => sellers,
            Err(error) => {
                warn!(%error, "seller lookup failed, returning matches without profiles");
                return;
            }
        };

        for result in results.iter_mut() {
            result.seller = sellers.get(&result.gig.seller_id).cloned();
        }
    }
}
