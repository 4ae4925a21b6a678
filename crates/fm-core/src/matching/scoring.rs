use super::categories::category_keywords;
use super::requirement::CanonicalRequirement;
use crate::GigListing;

/// Weighted-policy results below this score are dropped entirely.
pub const MIN_WEIGHTED_SCORE: i32 = 25;
/// Any match signal at all raises the weighted score to this floor.
pub const MATCH_SIGNAL_FLOOR: i32 = 20;

const BASE_SCORE_WEIGHT: f64 = 50.0;
const KEYWORD_SCORE_CAP: f64 = 30.0;
const UNMATCHED_PRIMARY_CAP: f64 = 50.0;

/// Per-term, per-field keyword weights. Which set applies depends on
/// whether a structured service field anchors the score: as a
/// refinement next to a service base the hits are small (and capped,
/// and coverage-scaled), while on a keyword-only search they carry the
/// whole score, so a strong title match alone clears the ranking
/// threshold. Longer terms are more specific, so title hits on them
/// weigh extra in standalone mode.
struct FieldWeights {
    title: f64,
    title_long: f64,
    category: f64,
    description: f64,
    features: f64,
}

const REFINEMENT_WEIGHTS: FieldWeights = FieldWeights {
    title: 15.0,
    title_long: 15.0,
    category: 12.0,
    description: 8.0,
    features: 10.0,
};

const STANDALONE_WEIGHTS: FieldWeights = FieldWeights {
    title: 30.0,
    title_long: 35.0,
    category: 20.0,
    description: 25.0,
    features: 25.0,
};

/// Term length above which the standalone title weight steps up.
const LONG_TERM_LEN: usize = 5;

const BUDGET_BONUS: f64 = 10.0;
const OVER_BUDGET_PENALTY: f64 = -5.0;
const OVER_BUDGET_FACTOR: f64 = 1.5;

/// Scoring strategy selector. The weighted policy is the default; the
/// ratio policy reproduces the simpler relevance/coverage blend and
/// applies no cutoff. The two are deliberately kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    #[default]
    Weighted,
    Ratio,
}

impl MatchPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weighted" => Some(Self::Weighted),
            "ratio" => Some(Self::Ratio),
            _ => None,
        }
    }
}

/// A candidate row coming out of retrieval: the gig snapshot plus the
/// catalog's full-text relevance for the query (0 when the query had
/// no full-text component).
#[derive(Debug, Clone, PartialEq)]
pub struct GigCandidate {
    pub gig: GigListing,
    pub text_rank: f32,
}

/// A candidate that survived scoring; seller projection is attached
/// later by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGig {
    pub gig: GigListing,
    pub score: i32,
    pub reasons: Vec<String>,
}

pub trait Scorer {
    /// Score one candidate against the requirement. `None` means the
    /// candidate fell below the policy's inclusion threshold.
    fn score(&self, candidate: &GigCandidate, requirement: &CanonicalRequirement)
    -> Option<ScoredGig>;
}

/// Default policy: primary-service correspondence anchors the score,
/// field-weighted keyword overlap and budget fit refine it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PrimaryMatch {
    strength: f64,
    /// True when a primary service was requested but nothing in the
    /// gig text corresponds to it; caps the achievable total at 50.
    capped: bool,
}

fn evaluate_primary(gig_text: &str, requirement: &CanonicalRequirement) -> PrimaryMatch {
    let mut strength = 0.0f64;

    if let Some(primary) = requirement.primary_service.as_deref() {
        if gig_text.contains(&primary.to_lowercase()) {
            strength = 1.0;
        }
    }

    if strength == 0.0 {
        if let Some(category) = requirement.service_category.as_deref() {
            if let Some(terms) = category_keywords(category) {
                let matched = terms.iter().filter(|t| gig_text.contains(*t)).count();
                if matched > 0 {
                    strength = (matched as f64 / terms.len() as f64).min(0.9);
                }
            }
            if strength == 0.0 && gig_text.contains(&category.to_lowercase()) {
                strength = 0.6;
            }
        }
    }

    PrimaryMatch {
        strength,
        capped: requirement.primary_service.is_some() && strength == 0.0,
    }
}

struct KeywordScore {
    raw: f64,
    matched_terms: usize,
    reasons: Vec<&'static str>,
}

fn score_keywords(gig: &GigListing, terms: &[String], weights: &FieldWeights) -> KeywordScore {
    if terms.is_empty() {
        return KeywordScore {
            raw: 0.0,
            matched_terms: 0,
            reasons: Vec::new(),
        };
    }

    let title = gig.title.to_lowercase();
    let category = gig.category.to_lowercase();
    let description = gig.description.to_lowercase();
    let features: Vec<String> = gig.features.iter().map(|f| f.to_lowercase()).collect();

    let mut raw_sum = 0.0f64;
    let mut matched_terms = 0usize;
    let mut reasons: Vec<&'static str> = Vec::new();
    let add_reason = |reasons: &mut Vec<&'static str>, tag: &'static str| {
        if !reasons.contains(&tag) {
            reasons.push(tag);
        }
    };

    for term in terms {
        let mut term_score = 0.0f64;
        if title.contains(term.as_str()) {
            term_score += if term.len() > LONG_TERM_LEN {
                weights.title_long
            } else {
                weights.title
            };
            add_reason(&mut reasons, "Title match");
        }
        if category.contains(term.as_str()) {
            term_score += weights.category;
            add_reason(&mut reasons, "Category match");
        }
        if description.contains(term.as_str()) {
            term_score += weights.description;
            add_reason(&mut reasons, "Description match");
        }
        if features.iter().any(|f| f.contains(term.as_str())) {
            term_score += weights.features;
            add_reason(&mut reasons, "Features match");
        }

        if term_score > 0.0 {
            matched_terms += 1;
        }
        raw_sum += term_score;
    }

    KeywordScore {
        raw: raw_sum,
        matched_terms,
        reasons,
    }
}

fn score_budget(gig: &GigListing, requirement: &CanonicalRequirement) -> (f64, bool) {
    if !requirement.budget.is_constrained() {
        return (0.0, false);
    }

    let price = gig.price_value();
    if price >= requirement.budget.min && price <= requirement.budget.max {
        (BUDGET_BONUS, true)
    } else if price > requirement.budget.max * OVER_BUDGET_FACTOR {
        (OVER_BUDGET_PENALTY, false)
    } else {
        (0.0, false)
    }
}

impl Scorer for WeightedScorer {
    fn score(
        &self,
        candidate: &GigCandidate,
        requirement: &CanonicalRequirement,
    ) -> Option<ScoredGig> {
        let gig = &candidate.gig;
        let gig_text = gig.combined_text();

        let primary = evaluate_primary(&gig_text, requirement);
        let base_score = primary.strength * BASE_SCORE_WEIGHT;

        // A structured service field anchors the score; keyword hits
        // then only refine it, capped and scaled by term coverage so
        // scattered overlap cannot rival the base signal. Without an
        // anchor the hits carry the whole score at full field weight.
        let anchored =
            requirement.primary_service.is_some() || requirement.service_category.is_some();
        let terms = requirement.terms();
        let keyword = score_keywords(
            gig,
            &terms,
            if anchored {
                &REFINEMENT_WEIGHTS
            } else {
                &STANDALONE_WEIGHTS
            },
        );
        let keyword_score = if anchored && !terms.is_empty() {
            let coverage = keyword.matched_terms as f64 / terms.len() as f64;
            keyword.raw.min(KEYWORD_SCORE_CAP) * coverage
        } else {
            keyword.raw
        };

        let (budget_score, budget_matched) = score_budget(gig, requirement);

        let cap = if primary.capped {
            UNMATCHED_PRIMARY_CAP
        } else {
            100.0
        };
        let mut total = (base_score + keyword_score + budget_score).min(cap);

        let any_signal = primary.strength > 0.0 || keyword.matched_terms > 0;
        if any_signal {
            total = total.max(f64::from(MATCH_SIGNAL_FLOOR));
        } else {
            total = 0.0;
        }

        let score = (total.round() as i32).clamp(0, 100);
        if score < MIN_WEIGHTED_SCORE {
            return None;
        }

        let mut reasons: Vec<String> = keyword.reasons.iter().map(|r| r.to_string()).collect();
        if budget_matched {
            reasons.push("Budget match".to_string());
        }
        if reasons.is_empty() {
            // Scored through the primary-service signal alone.
            reasons.push("Partial match".to_string());
        }

        Some(ScoredGig {
            gig: gig.clone(),
            score,
            reasons,
        })
    }
}

/// Alternative policy: blends the catalog's full-text relevance with
/// plain term coverage. Reasons are the matched terms themselves and
/// no minimum cutoff applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioScorer;

const TEXT_RANK_WEIGHT: f64 = 0.7;
const COVERAGE_WEIGHT: f64 = 0.3;

impl Scorer for RatioScorer {
    fn score(
        &self,
        candidate: &GigCandidate,
        requirement: &CanonicalRequirement,
    ) -> Option<ScoredGig> {
        let gig = &candidate.gig;
        let hay = gig.combined_text();

        let terms = requirement.terms();
        let matched: Vec<String> = terms
            .iter()
            .filter(|t| hay.contains(t.as_str()))
            .cloned()
            .collect();
        let coverage = if terms.is_empty() {
            0.0
        } else {
            matched.len() as f64 / terms.len() as f64
        };

        let combined =
            f64::from(candidate.text_rank) * TEXT_RANK_WEIGHT + coverage * 100.0 * COVERAGE_WEIGHT;
        let score = (combined.round() as i32).clamp(0, 100);

        Some(ScoredGig {
            gig: gig.clone(),
            score,
            reasons: matched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::requirement::{Budget, normalize};

    fn react_gig() -> GigListing {
        GigListing {
            id: 1,
            seller_id: 11,
            title: "React Developer for Hire".into(),
            description: "I will build your website frontend with React and Node".into(),
            category: "Web Development".into(),
            short_summary: "Modern web apps".into(),
            features: vec!["Responsive design".into(), "API integration".into()],
            price: "300".into(),
            ..GigListing::default()
        }
    }

    fn photography_gig() -> GigListing {
        GigListing {
            id: 2,
            seller_id: 22,
            title: "Wedding Photography".into(),
            description: "Capturing your special day".into(),
            category: "Photography".into(),
            short_summary: "Full day coverage".into(),
            features: vec!["Edited album".into()],
            price: "900".into(),
            ..GigListing::default()
        }
    }

    fn candidate(gig: GigListing) -> GigCandidate {
        GigCandidate {
            gig,
            text_rank: 0.0,
        }
    }

    #[test]
    fn keyword_search_scores_relevant_gig_and_drops_unrelated() {
        let requirement = normalize("React developer for my website", None);
        assert_eq!(requirement.keywords, vec!["react", "developer", "website"]);

        let scored = WeightedScorer
            .score(&candidate(react_gig()), &requirement)
            .expect("relevant gig should score");
        assert!(scored.score >= MIN_WEIGHTED_SCORE);
        assert!(scored.reasons.contains(&"Title match".to_string()));

        assert!(
            WeightedScorer
                .score(&candidate(photography_gig()), &requirement)
                .is_none()
        );
    }

    #[test]
    fn keyword_only_title_match_outscores_sixty() {
        // Free text with no structured hint: a filler term ("need")
        // matching nothing must not drag a strong title match down.
        let requirement = normalize("I need a React developer for my website", None);
        assert_eq!(
            requirement.keywords,
            vec!["need", "react", "developer", "website"]
        );

        let scored = WeightedScorer
            .score(&candidate(react_gig()), &requirement)
            .expect("title-matched gig should score");
        assert!(scored.score >= 60, "got {}", scored.score);
        assert!(scored.reasons.contains(&"Title match".to_string()));

        assert!(
            WeightedScorer
                .score(&candidate(photography_gig()), &requirement)
                .is_none()
        );
    }

    #[test]
    fn primary_service_match_lifts_score_past_sixty() {
        let hint = serde_json::from_value(serde_json::json!({
            "skills": ["react", "developer"],
            "keywords": ["website"],
            "primaryService": "React Developer",
        }))
        .unwrap();
        let requirement = normalize("I need a React developer for my website", Some(hint));

        let scored = WeightedScorer
            .score(&candidate(react_gig()), &requirement)
            .unwrap();

        assert!(scored.score >= 60, "got {}", scored.score);
        assert!(scored.reasons.contains(&"Title match".to_string()));
    }

    #[test]
    fn unmatched_primary_service_caps_score_at_fifty() {
        let mut requirement = normalize("logo design branding", None);
        requirement.primary_service = Some("Logo Design".into());
        // Heavy keyword overlap, but the gig text contains neither
        // "logo" nor "design".
        requirement.skills = vec!["react".into(), "website".into(), "developer".into()];
        requirement.keywords = vec!["frontend".into(), "node".into()];
        requirement.budget = Budget {
            min: 0.0,
            max: 500.0,
        };

        let gig = react_gig();
        assert!(!gig.combined_text().contains("logo design"));

        let scored = WeightedScorer.score(&candidate(gig), &requirement).unwrap();
        assert!(scored.score <= 50, "got {}", scored.score);
    }

    #[test]
    fn category_table_ratio_is_capped_below_literal_match() {
        let mut requirement = CanonicalRequirement::default();
        requirement.service_category = Some("Web Development".into());

        let primary = evaluate_primary(&react_gig().combined_text(), &requirement);
        assert!(primary.strength > 0.0);
        assert!(primary.strength <= 0.9);
        assert!(!primary.capped);
    }

    #[test]
    fn category_substring_fallback_scores_point_six() {
        let mut requirement = CanonicalRequirement::default();
        requirement.service_category = Some("Photography".into());

        let primary = evaluate_primary(&photography_gig().combined_text(), &requirement);
        assert_eq!(primary.strength, 0.6);
    }

    #[test]
    fn budget_bonus_splits_exactly_at_the_boundary() {
        let mut requirement = normalize("react developer website frontend", None);
        requirement.primary_service = Some("React Developer".into());
        requirement.budget = Budget {
            min: 0.0,
            max: 300.0,
        };

        let in_budget = WeightedScorer
            .score(&candidate(react_gig()), &requirement)
            .unwrap();

        let mut pricier = react_gig();
        pricier.price = "301".into();
        let over_budget = WeightedScorer
            .score(&candidate(pricier), &requirement)
            .unwrap();

        assert!(in_budget.score > over_budget.score);
        assert!(in_budget.reasons.contains(&"Budget match".to_string()));
        assert!(!over_budget.reasons.contains(&"Budget match".to_string()));
    }

    #[test]
    fn over_budget_penalty_applies_past_one_and_a_half_times_max() {
        let mut requirement = CanonicalRequirement::default();
        requirement.keywords = vec!["react".into()];
        requirement.budget = Budget {
            min: 0.0,
            max: 100.0,
        };

        let gig = react_gig(); // priced 300 > 150
        let (budget_score, matched) = score_budget(&gig, &requirement);
        assert_eq!(budget_score, OVER_BUDGET_PENALTY);
        assert!(!matched);
    }

    #[test]
    fn primary_only_match_carries_partial_match_reason() {
        let mut requirement = CanonicalRequirement::default();
        requirement.primary_service = Some("Wedding Photography".into());

        let scored = WeightedScorer
            .score(&candidate(photography_gig()), &requirement)
            .unwrap();

        assert_eq!(scored.score, 50);
        assert_eq!(scored.reasons, vec!["Partial match".to_string()]);
    }

    #[test]
    fn score_stays_within_bounds() {
        let hint = serde_json::from_value(serde_json::json!({
            "skills": ["react", "developer", "website", "frontend", "node"],
            "primaryService": "React Developer",
            "budget": { "min": 0, "max": 1000 },
        }))
        .unwrap();
        let requirement = normalize("react developer website frontend node", Some(hint));

        let scored = WeightedScorer
            .score(&candidate(react_gig()), &requirement)
            .unwrap();
        assert!(scored.score <= 100);
        assert!(scored.score >= MIN_WEIGHTED_SCORE);
    }

    #[test]
    fn ratio_policy_blends_rank_and_coverage_without_cutoff() {
        let requirement = normalize("react developer website", None);

        let scored = RatioScorer
            .score(
                &GigCandidate {
                    gig: react_gig(),
                    text_rank: 10.0,
                },
                &requirement,
            )
            .unwrap();

        // 10 * 0.7 + (3/3) * 100 * 0.3 = 37
        assert_eq!(scored.score, 37);
        assert_eq!(scored.reasons, vec!["react", "developer", "website"]);

        // No cutoff: an unrelated gig still yields a (zero-score) result.
        let weak = RatioScorer
            .score(&candidate(photography_gig()), &requirement)
            .unwrap();
        assert_eq!(weak.score, 0);
    }

    #[test]
    fn policy_parsing_accepts_known_names_only() {
        assert_eq!(MatchPolicy::parse("weighted"), Some(MatchPolicy::Weighted));
        assert_eq!(MatchPolicy::parse(" RATIO "), Some(MatchPolicy::Ratio));
        assert_eq!(MatchPolicy::parse("hybrid"), None);
    }
}
