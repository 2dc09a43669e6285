use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMAIL_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check if an email might be registered (false positives possible).
/// A poisoned lock answers "maybe" so the caller falls back to the database.
pub fn might_exist(email: &str) -> bool {
    let email = normalize(email);
    EMAIL_FILTER
        .read()
        .map(|filter| filter.contains(&email))
        .unwrap_or(true)
}

pub fn insert(email: &str) {
    insert_batch(&[normalize(email)]);
}

/// Load every registered email, streaming in batches.
pub async fn warmup_email_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&email));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Email filter warmup complete: {} users", total);
    Ok(())
}

fn insert_batch(emails: &[String]) {
    match EMAIL_FILTER.write() {
        Ok(mut filter) => {
            for email in emails {
                filter.add(email);
            }
        }
        Err(_) => log::warn!("Email filter lock poisoned; skipping {} inserts", emails.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_emails_are_found_case_insensitively() {
        insert("Grace.Hopper@Dayflow.test");
        assert!(might_exist("grace.hopper@dayflow.test"));
        assert!(might_exist("  GRACE.HOPPER@dayflow.test "));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Ada@Example.COM "), "ada@example.com");
    }
}
