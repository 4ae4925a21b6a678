use std::collections::HashMap;

use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::SellerProfile;
use crate::db::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum SellerFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Bulk-fetch public seller profiles for a set of ids. Only the public
/// projection is selected; account fields never leave the database.
#[instrument(skip(pool))]
pub async fn fetch_sellers_by_ids(
    pool: &PgPool,
    seller_ids: &[i64],
) -> Result<HashMap<i64, SellerProfile>, SellerFetchError> {
    if seller_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT id, username, country, avatar_url, is_seller \
             FROM fm.sellers WHERE id = ANY($1)",
            &[&seller_ids],
        )
        .await?;

    let sellers = rows
        .into_iter()
        .map(|row| {
            let profile = SellerProfile {
                id: row.get("id"),
                username: row.get("username"),
                country: row.get("country"),
                avatar_url: row.get("avatar_url"),
                is_seller: row.get("is_seller"),
            };
            (profile.id, profile)
        })
        .collect();

    Ok(sellers)
}
