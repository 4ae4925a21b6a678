mod gigs;
mod migrations;
mod pool;
mod sellers;

pub use gigs::{RetrievalError, retrieve_candidates};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use sellers::{SellerFetchError, fetch_sellers_by_ids};
