use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::keywords::{build_search_text, extract_keywords};
use crate::parse_price;

pub const DEFAULT_TIMELINE: &str = "flexible";

/// Buyer budget in USD. Zero means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub min: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub max: f64,
}

impl Budget {
    pub fn is_constrained(&self) -> bool {
        self.max > 0.0
    }
}

/// Tolerates the number-or-string budget values an external extractor
/// tends to produce. Anything unparseable or negative collapses to 0.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let amount = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_price(&s),
        _ => 0.0,
    };
    Ok(if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    })
}

/// Structured requirement fields as returned by the external
/// extraction collaborator. Every field is optional; gaps are filled
/// from the raw text during [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequirementHint {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "primaryService")]
    pub primary_service: Option<String>,
    #[serde(default, alias = "serviceCategory")]
    pub service_category: Option<String>,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub timeline: Option<String>,
}

impl RequirementHint {
    /// Whether the hint carries anything a search could act on.
    pub fn has_terms(&self) -> bool {
        self.skills.iter().any(|s| !s.trim().is_empty())
            || self.keywords.iter().any(|k| !k.trim().is_empty())
            || non_empty(&self.primary_service).is_some()
            || non_empty(&self.service_category).is_some()
    }
}

/// Canonical requirement record, produced once per search or
/// conversation turn and consumed by retrieval and scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRequirement {
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
    pub primary_service: Option<String>,
    pub service_category: Option<String>,
    pub budget: Budget,
    pub timeline: String,
}

impl Default for CanonicalRequirement {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            keywords: Vec::new(),
            primary_service: None,
            service_category: None,
            budget: Budget::default(),
            timeline: DEFAULT_TIMELINE.to_string(),
        }
    }
}

impl CanonicalRequirement {
    /// A requirement with no usable signal short-circuits retrieval.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.keywords.is_empty()
            && self.primary_service.is_none()
            && self.service_category.is_none()
    }

    /// Merged skills + keywords, lowercased, deduplicated preserving
    /// first-seen order. The term set scoring iterates over.
    pub fn terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for term in self.skills.iter().chain(self.keywords.iter()) {
            let lowered = term.trim().to_lowercase();
            if !lowered.is_empty() && !terms.contains(&lowered) {
                terms.push(lowered);
            }
        }
        terms
    }

    /// Full-text query string over the merged term set.
    pub fn search_text(&self) -> String {
        build_search_text(&self.terms())
    }
}

/// Where a requirement came from. The merge over both variants is a
/// total function; structured fields always win over derived ones.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementSource {
    Structured(RequirementHint),
    Derived { keywords: Vec<String> },
}

impl RequirementSource {
    pub fn from_parts(raw_text: &str, hint: Option<RequirementHint>) -> Self {
        match hint {
            Some(hint) => Self::Structured(hint),
            None => Self::Derived {
                keywords: extract_keywords(raw_text),
            },
        }
    }
}

/// Merge a structured hint (if any) with terms derived from the raw
/// text into one canonical requirement. Pure; no I/O.
pub fn normalize(raw_text: &str, hint: Option<RequirementHint>) -> CanonicalRequirement {
    match RequirementSource::from_parts(raw_text, hint) {
        RequirementSource::Derived { keywords } => CanonicalRequirement {
            keywords,
            ..CanonicalRequirement::default()
        },
        RequirementSource::Structured(hint) => {
            let skills = clean_terms(&hint.skills);
            let mut keywords = clean_terms(&hint.keywords);

            // Fill gaps from the raw text: extracted terms not already
            // present in skills or keywords join the keyword set.
            let known: Vec<String> = skills
                .iter()
                .chain(keywords.iter())
                .map(|t| t.to_lowercase())
                .collect();
            for derived in extract_keywords(raw_text) {
                if !known.contains(&derived) && !keywords.iter().any(|k| k.eq_ignore_ascii_case(&derived)) {
                    keywords.push(derived);
                }
            }

            CanonicalRequirement {
                skills,
                keywords,
                primary_service: non_empty(&hint.primary_service),
                service_category: non_empty(&hint.service_category),
                budget: coerce_budget(hint.budget),
                timeline: hint
                    .timeline
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_TIMELINE)
                    .to_string(),
            }
        }
    }
}

fn clean_terms(terms: &[String]) -> Vec<String> {
    let mut cleaned = Vec::new();
    for term in terms {
        let trimmed = term.trim();
        if !trimmed.is_empty() && !cleaned.iter().any(|c: &String| c.eq_ignore_ascii_case(trimmed))
        {
            cleaned.push(trimmed.to_string());
        }
    }
    cleaned
}

fn coerce_budget(budget: Budget) -> Budget {
    let min = if budget.min.is_finite() && budget.min > 0.0 {
        budget.min
    } else {
        0.0
    };
    let max = if budget.max.is_finite() && budget.max > 0.0 {
        budget.max
    } else {
        0.0
    };
    Budget { min, max }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
