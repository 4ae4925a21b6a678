use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::types::ToSql;
use tracing::instrument;

use crate::GigListing;
use crate::db::PgPool;
use crate::matching::{CanonicalRequirement, GigCandidate};

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

const GIG_TEXT: &str = "concat_ws(' ', g.title, g.description, g.category, g.short_summary, \
     array_to_string(g.features, ' '))";

/// Prepared retrieval query: the SQL plus the owned parameter values it
/// binds. Parameter order is search text first, then the ILIKE patterns
/// in condition order, then the row limit.
#[derive(Debug)]
pub struct CandidateQueryPlan {
    pub sql: String,
    pub search_text: String,
    pub like_patterns: Vec<String>,
    pub limit: i64,
}

/// Build the broad candidate query for a requirement. Conditions are
/// OR'd so any single signal is enough to surface a gig. Returns `None`
/// when the requirement carries no usable search signal at all.
pub fn build_candidate_query(
    requirement: &CanonicalRequirement,
    limit: i64,
) -> Option<CandidateQueryPlan> {
    let search_text = requirement.search_text();
    let mut like_patterns: Vec<String> = Vec::new();
    let mut conditions: Vec<String> = Vec::new();

    // $1 is always the full-text search input, even when blank, so the
    // rank expression in the select list can reference it.
    if !search_text.is_empty() {
        conditions.push(format!(
            "to_tsvector('english', {GIG_TEXT}) @@ plainto_tsquery('english', $1)"
        ));
    }

    for token in service_tokens(requirement) {
        let param = 2 + like_patterns.len();
        like_patterns.push(format!("%{token}%"));
        conditions.push(format!(
            "(g.title ILIKE ${param} OR g.description ILIKE ${param} \
             OR g.category ILIKE ${param} OR g.short_summary ILIKE ${param})"
        ));
    }

    for term in requirement.terms() {
        let param = 2 + like_patterns.len();
        like_patterns.push(format!("%{term}%"));
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM unnest(g.features) AS feature WHERE feature ILIKE ${param})"
        ));
    }

    if conditions.is_empty() {
        return None;
    }

    let where_clause = conditions.join(" OR ");
    let limit_param = 2 + like_patterns.len();
    let sql = format!(
        "SELECT \
            g.id,\
            g.seller_id,\
            g.title,\
            g.description,\
            g.category,\
            g.short_summary,\
            g.features,\
            g.price,\
            g.total_stars,\
            g.star_count,\
            g.created_at,\
            CASE WHEN $1 = '' THEN 0::float4 \
                 ELSE ts_rank(to_tsvector('english', {GIG_TEXT}), \
                              plainto_tsquery('english', $1))::float4 \
            END AS text_rank \
        FROM fm.gigs g \
        WHERE {where_clause} \
        ORDER BY g.id \
        LIMIT ${limit_param}"
    );

    Some(CandidateQueryPlan {
        sql,
        search_text,
        like_patterns,
        limit,
    })
}

/// Tokens from the structured service fields worth probing with ILIKE.
/// Very short tokens ("a", "ui") match too broadly to be useful here.
fn service_tokens(requirement: &CanonicalRequirement) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for field in [&requirement.primary_service, &requirement.service_category] {
        let Some(value) = field else { continue };
        for token in value.split_whitespace() {
            let token = token.to_lowercase();
            if token.len() > 2 && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

#[instrument(skip(pool, requirement))]
pub async fn retrieve_candidates(
    pool: &PgPool,
    requirement: &CanonicalRequirement,
    limit: i64,
) -> Result<Vec<GigCandidate>, RetrievalError> {
    let Some(plan) = build_candidate_query(requirement, limit) else {
        return Ok(Vec::new());
    };

    let client = pool.get().await?;

    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(plan.like_patterns.len() + 2);
    params.push(&plan.search_text);
    for pattern in &plan.like_patterns {
        params.push(pattern);
    }
    params.push(&plan.limit);

    let rows = client.query(&plan.sql, &params).await?;

    let candidates = rows
        .into_iter()
        .map(|row| GigCandidate {
            gig: GigListing {
                id: row.get("id"),
                seller_id: row.get("seller_id"),
                title: row.get("title"),
                description: row.get("description"),
                category: row.get("category"),
                short_summary: row.get("short_summary"),
                features: row.get("features"),
                price: row.get("price"),
                total_stars: row.get("total_stars"),
                star_count: row.get("star_count"),
                created_at: row.get("created_at"),
            },
            text_rank: row.get("text_rank"),
        })
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::normalize;

    #[test]
    fn empty_requirement_yields_no_plan() {
        let requirement = CanonicalRequirement::default();
        assert!(build_candidate_query(&requirement, 50).is_none());
    }

    #[test]
    fn keyword_requirement_binds_search_text_and_feature_probes() {
        let requirement = normalize("react developer for my website", None);
        let plan = build_candidate_query(&requirement, 50).unwrap();

        assert_eq!(plan.search_text, "react developer website");
        assert!(plan.sql.contains("plainto_tsquery"));
        assert!(plan.sql.contains("unnest(g.features)"));
        assert_eq!(plan.limit, 50);
        // One feature probe per term.
        assert_eq!(plan.like_patterns.len(), 3);
        assert!(plan.like_patterns.contains(&"%react%".to_string()));
    }

    #[test]
    fn service_fields_add_ilike_conditions() {
        let mut requirement = normalize("logo", None);
        requirement.primary_service = Some("Logo Design".to_string());
        requirement.service_category = Some("graphic design".to_string());

        let plan = build_candidate_query(&requirement, 25).unwrap();

        assert!(plan.sql.contains("g.title ILIKE"));
        assert!(plan.like_patterns.contains(&"%logo%".to_string()));
        assert!(plan.like_patterns.contains(&"%design%".to_string()));
        assert!(plan.like_patterns.contains(&"%graphic%".to_string()));
        // "logo" appears once as a service token even though both
        // fields and the term list mention it.
        let logo_probes = plan
            .like_patterns
            .iter()
            .filter(|p| p.as_str() == "%logo%")
            .count();
        assert_eq!(logo_probes, 2); // one ILIKE probe, one feature probe
    }

    #[test]
    fn parameter_numbering_is_dense_and_ends_with_limit() {
        let requirement = normalize("python data analysis", None);
        let plan = build_candidate_query(&requirement, 10).unwrap();

        let last_param = format!("${}", 2 + plan.like_patterns.len());
        assert!(plan.sql.ends_with(&format!("LIMIT {last_param}")));
        for idx in 2..(2 + plan.like_patterns.len()) {
            assert!(plan.sql.contains(&format!("${idx}")), "missing param ${idx}");
        }
    }
}
