//! Registered emails and the user id holding each one.
//!
//! A hit proves the address is taken; a miss proves nothing and callers fall
//! back to the database.

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use super::email_filter::normalize;

const CAPACITY: u64 = 200_000;
const TTL: Duration = Duration::from_secs(12 * 60 * 60);

static OWNERS: Lazy<Cache<String, u64>> =
    Lazy::new(|| Cache::builder().max_capacity(CAPACITY).time_to_live(TTL).build());

pub async fn remember(email: &str, user_id: u64) {
    OWNERS.insert(normalize(email), user_id).await;
}

pub async fn owner(email: &str) -> Option<u64> {
    OWNERS.get(&normalize(email)).await
}

/// Preloads accounts with a login in the last `days` days, `chunk` rows at a time.
pub async fn warmup_email_cache(pool: &MySqlPool, days: u32, chunk: usize) -> Result<usize> {
    let mut chunks = sqlx::query_as::<_, (u64, String)>(
        "SELECT id, email FROM users WHERE last_login_at >= NOW() - INTERVAL ? DAY",
    )
    .bind(days)
    .fetch(pool)
    .chunks(chunk.max(1));

    let mut loaded = 0;
    while let Some(rows) = chunks.next().await {
        let rows = rows.into_iter().collect::<Result<Vec<_>, _>>()?;
        loaded += rows.len();
        futures::future::join_all(rows.iter().map(|(id, email)| remember(email, *id))).await;
    }

    log::info!("Email cache holds {loaded} accounts active in the last {days} days");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn lookups_ignore_case_and_whitespace() {
        assert_eq!(owner("ghost@dayflow.test").await, None);

        remember(" Ada@Dayflow.test", 42).await;
        assert_eq!(owner("ada@dayflow.test").await, Some(42));
        assert_eq!(owner("ADA@DAYFLOW.TEST ").await, Some(42));
    }
}
